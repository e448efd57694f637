//! Artifact planning
//!
//! Turns introspected tables into the full list of files to write, without
//! touching the database or the file system.

use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::codegen::model::{TableModel, TableModelBuilder};
use crate::codegen::registry::{ddl_dump, schema_id, RegistryModel};
use crate::config::{Config, Layer, TableFilter};
use crate::db::Dialect;
use crate::error::{Error, Result};
use crate::output::WritePolicy;
use crate::render::{Renderer, TemplateBundle, TemplateId};
use crate::schema::types::Table;
use crate::utils::naming::{pascal_to_snake, rust_ident, snake_to_pascal, validate_identifier};

/// One file to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub path: PathBuf,
    pub content: String,
    pub policy: WritePolicy,
}

impl GeneratedArtifact {
    fn new(path: PathBuf, content: String, policy: WritePolicy) -> Self {
        Self {
            path,
            content,
            policy,
        }
    }
}

/// Record for the per-table data and biz templates
#[derive(Debug, Serialize)]
struct LayerRecord<'a> {
    #[serde(flatten)]
    model: &'a TableModel,
    import_prefix: &'a str,
    lookups: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LookupRecord {
    column: String,
    column_literal: String,
    method_suffix: String,
    placeholder: &'static str,
}

/// Plans every artifact for a set of tables
pub struct Generator<'a> {
    config: &'a Config,
    dialect: Dialect,
    renderer: Renderer<'a>,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a Config, dialect: Dialect, bundle: &'a TemplateBundle) -> Self {
        Self {
            config,
            dialect,
            renderer: Renderer::new(bundle),
        }
    }

    /// Drop disabled tables and reject names that cannot become identifiers
    pub fn select_tables(&self, tables: Vec<Table>) -> Result<Vec<Table>> {
        let filter = TableFilter::new(&self.config.tables)?;
        let mut selected = Vec::with_capacity(tables.len());
        for table in tables {
            if filter.is_disabled(&table.name) {
                tracing::info!(table = %table.name, "Skipping disabled table");
                continue;
            }
            validate_identifier(&table.name)?;
            for column in &table.columns {
                validate_identifier(&column.name)?;
            }
            selected.push(table);
        }
        Ok(selected)
    }

    /// Every artifact for `tables`, in write order
    ///
    /// Per-table model files come first in table order, followed by the model
    /// registry and DDL dump, then the data and biz layers.
    pub fn plan(&self, tables: Vec<Table>) -> Result<Vec<GeneratedArtifact>> {
        self.check_layers()?;

        let mut tables = self.select_tables(tables)?;
        tables.sort_by(|a, b| a.name.cmp(&b.name));

        let output = &self.config.output;
        let root = Path::new(&output.directory);
        let builder = TableModelBuilder::new(
            self.dialect,
            output.qualify_with_schema,
            &self.config.columns,
            self.renderer,
        );

        let models = tables
            .iter()
            .map(|table| builder.build(table))
            .collect::<Result<Vec<_>>>()?;

        let dump = ddl_dump(&tables);
        let schema_id = schema_id(output.schema_id.as_deref(), &dump);
        let prefix = output.import_prefix.as_str();
        let mut artifacts = Vec::new();

        // model
        let model_dir = root.join(Layer::Model.dir_name());
        for model in &models {
            let content = self.renderer.render(TemplateId::Model, model)?;
            artifacts.push(GeneratedArtifact::new(
                model_dir.join(format!("{}.rs", model.file_stem)),
                content,
                WritePolicy::AlwaysRegenerate,
            ));
        }
        let registry = RegistryModel::model(&tables, &schema_id, prefix);
        artifacts.push(GeneratedArtifact::new(
            model_dir.join("mod.rs"),
            self.renderer.render(TemplateId::ModelRegistry, &registry)?,
            WritePolicy::AlwaysRegenerate,
        ));
        artifacts.push(GeneratedArtifact::new(
            model_dir.join("schema.sql"),
            dump,
            WritePolicy::AlwaysRegenerate,
        ));

        // data
        if self.config.has_layer(Layer::Data) {
            let lookups = parse_lookup_fields(&output.lookup_fields);
            let data_dir = root.join(Layer::Data.dir_name());
            for (table, model) in tables.iter().zip(&models) {
                let record = LayerRecord {
                    model,
                    import_prefix: prefix,
                    lookups: self.render_lookups(
                        table,
                        model.serial_column.as_deref(),
                        lookups.get(table.name.as_str()),
                    )?,
                };
                artifacts.push(GeneratedArtifact::new(
                    data_dir.join(format!("{}.rs", model.file_stem)),
                    self.renderer.render(TemplateId::Data, &record)?,
                    WritePolicy::PreserveCustomization,
                ));
            }
            let registry = RegistryModel::data(&tables, &schema_id, prefix);
            artifacts.push(GeneratedArtifact::new(
                data_dir.join("mod.rs"),
                self.renderer.render(TemplateId::DataRegistry, &registry)?,
                WritePolicy::AlwaysRegenerate,
            ));
        }

        // biz
        if self.config.has_layer(Layer::Biz) {
            let biz_dir = root.join(Layer::Biz.dir_name());
            for model in &models {
                let record = LayerRecord {
                    model,
                    import_prefix: prefix,
                    lookups: Vec::new(),
                };
                artifacts.push(GeneratedArtifact::new(
                    biz_dir.join(format!("{}.rs", model.file_stem)),
                    self.renderer.render(TemplateId::Biz, &record)?,
                    WritePolicy::PreserveCustomization,
                ));
            }
            let registry = RegistryModel::biz(&tables, &schema_id, prefix);
            artifacts.push(GeneratedArtifact::new(
                biz_dir.join("mod.rs"),
                self.renderer.render(TemplateId::BizRegistry, &registry)?,
                WritePolicy::AlwaysRegenerate,
            ));
        }

        tracing::debug!(count = artifacts.len(), %schema_id, "Planned artifacts");
        Ok(artifacts)
    }

    fn check_layers(&self) -> Result<()> {
        if self.config.has_layer(Layer::Biz) && !self.config.has_layer(Layer::Data) {
            return Err(Error::ConfigError(
                "the biz layer builds on the data layer; add \"data\" to output.layers".to_string(),
            ));
        }
        Ok(())
    }

    /// Primary-key lookup first, then the configured ones in order
    fn render_lookups(
        &self,
        table: &Table,
        serial_column: Option<&str>,
        configured: Option<&Vec<String>>,
    ) -> Result<Vec<String>> {
        let mut columns: Vec<&str> = Vec::new();
        if let Some(serial) = serial_column {
            columns.push(serial);
        }
        for name in configured.into_iter().flatten() {
            if table.column(name).is_none() {
                tracing::warn!(table = %table.name, column = %name, "Lookup column not found, skipping");
                continue;
            }
            if !columns.contains(&name.as_str()) {
                columns.push(name);
            }
        }

        let placeholder = match self.dialect {
            Dialect::MySql => "?",
            Dialect::Postgres => "$1",
        };

        columns
            .into_iter()
            .map(|column| {
                let record = LookupRecord {
                    column: column.to_string(),
                    column_literal: format!("{:?}", self.dialect.quote(column)),
                    method_suffix: rust_ident(&pascal_to_snake(&snake_to_pascal(column))),
                    placeholder,
                };
                self.renderer.render(TemplateId::DataLookup, &record)
            })
            .collect()
    }
}

/// `account.email, user.name` -> {account: [email], user: [name]}
fn parse_lookup_fields(fields: &str) -> IndexMap<&str, Vec<String>> {
    let mut lookups: IndexMap<&str, Vec<String>> = IndexMap::new();
    for entry in fields.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                lookups
                    .entry(table.trim())
                    .or_default()
                    .push(column.trim().to_string());
            }
            _ => tracing::warn!(entry, "Ignoring malformed lookup field, expected table.column"),
        }
    }
    lookups
}
