//! Aggregate artifacts: layer registries and the DDL dump

use serde::Serialize;

use crate::codegen::model::single_line;
use crate::schema::ddl::dump_entry;
use crate::schema::types::Table;
use crate::utils::naming::{module_file_stem, pascal_to_upper_snake, rust_ident, snake_to_pascal};

const SCHEMA_ID_PREFIX: &str = "Schema";

/// Record rendered by the registry templates
#[derive(Debug, Clone, Serialize)]
pub struct RegistryModel {
    pub schema_id: String,
    pub import_prefix: String,
    pub modules: Vec<String>,
    pub constants: Vec<String>,
    pub define: Vec<String>,
    pub assign: Vec<String>,
    pub storage: Vec<String>,
    pub slice: Vec<String>,
}

impl RegistryModel {
    /// `model/mod.rs`: column name sets of every table
    pub fn model(tables: &[Table], schema_id: &str, import_prefix: &str) -> Self {
        let mut registry = Self::empty(tables, schema_id, import_prefix);
        for table in tables {
            let module = rust_ident(&table.name);
            let pascal = snake_to_pascal(&table.name);
            registry.constants.push(format!(
                "pub const {}: &str = \"{}\";",
                pascal_to_upper_snake(&pascal),
                table.name
            ));
            registry
                .define
                .push(format!("    pub {}: {}::Schema{},", module, module, pascal));
            registry
                .assign
                .push(format!("            {}: {}::Schema{}::new(),", module, module, pascal));
            registry
                .storage
                .push(format!("            (self.{}.table(), self.{}.access()),", module, module));
            registry
                .slice
                .push(format!("            self.{}.table(),", module));
        }
        registry
    }

    /// `data/mod.rs`: one repository per table
    pub fn data(tables: &[Table], schema_id: &str, import_prefix: &str) -> Self {
        let mut registry = Self::empty(tables, schema_id, import_prefix);
        for table in tables {
            let module = rust_ident(&table.name);
            let pascal = snake_to_pascal(&table.name);
            registry
                .define
                .push(format!("    pub {}: {}::{}Data,", module, module, pascal));
            registry
                .assign
                .push(format!("            {}: {}::{}Data::new(),", module, module, pascal));
        }
        registry
    }

    /// `biz/mod.rs`: one service per table, built over the data registry
    pub fn biz(tables: &[Table], schema_id: &str, import_prefix: &str) -> Self {
        let mut registry = Self::empty(tables, schema_id, import_prefix);
        for table in tables {
            let module = rust_ident(&table.name);
            let pascal = snake_to_pascal(&table.name);
            registry
                .define
                .push(format!("    pub {}: {}::{}Biz,", module, module, pascal));
            registry.assign.push(format!(
                "            {}: {}::{}Biz::new(data.{}),",
                module, module, pascal, module
            ));
        }
        registry
    }

    fn empty(tables: &[Table], schema_id: &str, import_prefix: &str) -> Self {
        Self {
            schema_id: schema_id.to_string(),
            import_prefix: import_prefix.to_string(),
            modules: tables.iter().map(|t| module_declaration(&t.name)).collect(),
            constants: Vec::new(),
            define: Vec::new(),
            assign: Vec::new(),
            storage: Vec::new(),
            slice: Vec::new(),
        }
    }
}

/// `pub mod account;`, with a `#[path]` when the identifier differs from the file
fn module_declaration(table: &str) -> String {
    let ident = rust_ident(table);
    let stem = module_file_stem(table);
    if ident == stem || ident.strip_prefix("r#") == Some(stem.as_str()) {
        format!("pub mod {};", ident)
    } else {
        format!("#[path = \"{}.rs\"]\npub mod {};", stem, ident)
    }
}

/// Concatenate every table's normalized DDL, in the given order
pub fn ddl_dump(tables: &[Table]) -> String {
    let entries: Vec<String> = tables
        .iter()
        .map(|t| dump_entry(&t.name, &single_line(t.comment_or_name()), &t.ddl))
        .collect();
    let mut dump = entries.join("\n\n");
    dump.push('\n');
    dump
}

/// The registry struct name
///
/// A configured id is used as given, prefixed with `Schema` when it lacks
/// it; otherwise the id is derived from the DDL dump so it only changes with
/// the schema.
pub fn schema_id(configured: Option<&str>, dump: &str) -> String {
    match configured.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) if id.starts_with(SCHEMA_ID_PREFIX) => id.to_string(),
        Some(id) => format!("{}{}", SCHEMA_ID_PREFIX, snake_to_pascal(id)),
        None => {
            let digest = format!("{:x}", md5::compute(dump.as_bytes()));
            format!("{}{}", SCHEMA_ID_PREFIX, &digest[..9])
        }
    }
}
