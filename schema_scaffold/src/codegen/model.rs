//! Per-table template records
//!
//! [`TableModel`] carries every naming variant and pre-formatted fragment the
//! per-table templates reference. Fragments are Rust source text.

use serde::Serialize;

use crate::codegen::classifier::ColumnRoles;
use crate::config::ColumnRolesConfig;
use crate::db::Dialect;
use crate::error::Result;
use crate::render::{Renderer, TemplateId};
use crate::schema::types::{Column, ColumnRole, Table};
use crate::utils::naming::{
    module_file_stem, pascal_first_lower, pascal_to_upper_snake, rust_ident, snake_to_pascal,
};

/// Record rendered by the model template
#[derive(Debug, Clone, Serialize)]
pub struct TableModel {
    pub table: String,
    pub table_pascal: String,
    pub table_camel: String,
    pub table_upper: String,
    /// `schema.table` when qualification is enabled, otherwise the raw name
    pub table_qualified: String,
    pub module: String,
    /// File name of the per-table module, without extension
    pub file_stem: String,
    /// Table comment, or the raw name when there is none
    pub comment: String,
    pub comment_literal: String,

    pub field_declarations: Vec<String>,
    pub schema_fields: Vec<String>,
    pub schema_values: Vec<String>,
    pub schema_bindings: String,
    pub field_list_literal: String,
    pub quoted_field_list: String,
    pub access_list: Vec<String>,
    pub access_map: Vec<String>,

    pub column_serial: String,
    pub column_created_at: String,
    pub column_updated_at: String,
    pub column_deleted_at: String,
    /// Serial and created-at columns, never written by an update
    pub immutable_fields: String,

    /// Raw names of the insert struct's fields
    pub insert_names: Vec<String>,
    pub insert_fields: Vec<String>,
    pub insert_primary_key: String,
    /// Raw names of the update struct's plain fields
    pub update_names: Vec<String>,
    pub update_fields: Vec<String>,
    /// Rendered primary-key sub-artifact, empty without a serial column
    pub primary_key: String,
    pub serial_column: Option<String>,
}

/// Record rendered by the primary-key template
#[derive(Debug, Clone, Serialize)]
struct PrimaryKeyRecord<'a> {
    table: &'a str,
    table_pascal: &'a str,
    key_name: &'a str,
    key_field: String,
    key_pascal: String,
    key_camel: String,
    key_upper: String,
    key_type: &'static str,
    key_comment: String,
}

/// Builds [`TableModel`]s for one dialect and role configuration
pub struct TableModelBuilder<'a> {
    dialect: Dialect,
    qualify_with_schema: bool,
    roles: &'a ColumnRolesConfig,
    renderer: Renderer<'a>,
}

impl<'a> TableModelBuilder<'a> {
    pub fn new(
        dialect: Dialect,
        qualify_with_schema: bool,
        roles: &'a ColumnRolesConfig,
        renderer: Renderer<'a>,
    ) -> Self {
        Self {
            dialect,
            qualify_with_schema,
            roles,
            renderer,
        }
    }

    pub fn build(&self, table: &Table) -> Result<TableModel> {
        let roles = ColumnRoles::classify(table, self.roles);
        let pascal = snake_to_pascal(&table.name);
        let comment = single_line(table.comment_or_name());

        let table_qualified = if self.qualify_with_schema && !table.schema.is_empty() {
            format!("{}.{}", table.schema, table.name)
        } else {
            table.name.clone()
        };

        let field_declarations = table
            .columns
            .iter()
            .map(|c| {
                format!(
                    "    #[serde(rename = \"{}\")]\n    pub {}: {},{}",
                    c.name,
                    rust_ident(&c.name),
                    c.field_type().rust_type(),
                    trailing_comment(c)
                )
            })
            .collect();

        let schema_fields = table
            .columns
            .iter()
            .map(|c| format!("    pub {}: &'static str,{}", rust_ident(&c.name), trailing_comment(c)))
            .collect();

        let schema_values = table
            .columns
            .iter()
            .map(|c| format!("            {}: \"{}\",", rust_ident(&c.name), c.name))
            .collect();

        let schema_bindings = table
            .columns
            .iter()
            .map(|c| rust_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");

        let field_list_literal = table
            .columns
            .iter()
            .map(|c| format!("\"{}\"", c.name))
            .collect::<Vec<_>>()
            .join(", ");

        let quoted_field_list = table
            .columns
            .iter()
            .map(|c| self.dialect.quote(&c.name))
            .collect::<Vec<_>>()
            .join(", ");

        let access_list = table
            .columns
            .iter()
            .map(|c| format!("            self.{},{}", rust_ident(&c.name), trailing_comment(c)))
            .collect();

        let access_map = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "            (self.{}, {}),{}",
                    rust_ident(&c.name),
                    i,
                    trailing_comment(c)
                )
            })
            .collect();

        let immutable_fields = roles
            .ignore_for_insert()
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");

        // Insert: role columns are filled in by the database or the data layer
        let insert_columns: Vec<&Column> = table
            .columns
            .iter()
            .filter(|c| !roles.is_serial_column(&c.name))
            .filter(|c| roles.role_of(&c.name) == ColumnRole::Ordinary)
            .collect();
        let insert_names = insert_columns.iter().map(|c| c.name.clone()).collect();
        let insert_fields = insert_columns
            .iter()
            .map(|c| {
                format!(
                    "    #[serde(rename = \"{}\")]\n    pub {}: {},{}",
                    c.name,
                    rust_ident(&c.name),
                    c.field_type().rust_type(),
                    trailing_comment(c)
                )
            })
            .collect();

        // Update: the serial column is replaced by the primary-key struct
        let ignore = roles.ignore_for_update_and_insert();
        let mut update_names = Vec::new();
        let mut update_fields = Vec::new();
        for c in &table.columns {
            if roles.is_serial_column(&c.name) {
                update_fields.push(format!(
                    "    #[serde(flatten)]\n    pub primary_key: PrimaryKey{},",
                    pascal
                ));
                continue;
            }
            if ignore.contains(c.name.as_str()) {
                continue;
            }
            update_names.push(c.name.clone());
            update_fields.push(format!(
                "    #[serde(rename = \"{}\", default, skip_serializing_if = \"Option::is_none\")]\n    pub {}: {},{}",
                c.name,
                rust_ident(&c.name),
                c.field_type().update_type(),
                trailing_comment(c)
            ));
        }

        let serial = roles
            .serial_column
            .as_deref()
            .and_then(|name| table.column(name));

        let (insert_primary_key, primary_key) = match serial {
            Some(column) => {
                let key_type = column.kind().rust_type();
                let insert_primary_key = format!(
                    "\nimpl Insert{} {{\n    /// Assigned by the database on insert\n    pub fn primary_key(&self) -> Option<{}> {{\n        None\n    }}\n}}\n",
                    pascal, key_type
                );
                let key_pascal = snake_to_pascal(&column.name);
                let record = PrimaryKeyRecord {
                    table: &table.name,
                    table_pascal: &pascal,
                    key_name: &column.name,
                    key_field: rust_ident(&column.name),
                    key_camel: pascal_first_lower(&column.name),
                    key_upper: pascal_to_upper_snake(&key_pascal),
                    key_pascal,
                    key_type,
                    key_comment: trailing_comment(column),
                };
                let primary_key = self.renderer.render(TemplateId::ModelPrimaryKey, &record)?;
                (insert_primary_key, primary_key)
            }
            None => (String::new(), String::new()),
        };

        Ok(TableModel {
            table: table.name.clone(),
            table_camel: pascal_first_lower(&table.name),
            table_upper: pascal_to_upper_snake(&pascal),
            table_pascal: pascal,
            table_qualified,
            module: rust_ident(&table.name),
            file_stem: module_file_stem(&table.name),
            comment_literal: format!("{:?}", comment),
            comment,
            field_declarations,
            schema_fields,
            schema_values,
            schema_bindings,
            field_list_literal,
            quoted_field_list,
            access_list,
            access_map,
            column_serial: roles.serial_accessor(),
            column_created_at: roles.created_accessor(),
            column_updated_at: roles.updated_accessor(),
            column_deleted_at: roles.deleted_accessor(),
            immutable_fields,
            insert_names,
            insert_fields,
            insert_primary_key,
            update_names,
            update_fields,
            primary_key,
            serial_column: roles.serial_column.clone(),
        })
    }
}

/// Comments end up in `//` comments and doc lines; keep them on one line
pub(crate) fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn trailing_comment(column: &Column) -> String {
    let comment = single_line(column.comment_text());
    if comment.is_empty() {
        String::new()
    } else {
        format!(" // {}", comment)
    }
}
