//! schema_scaffold: typed Rust scaffolds from a live database schema
//!
//! schema_scaffold reads table and column metadata from MySQL or PostgreSQL,
//! classifies columns by role (serial key, created/updated/deleted markers)
//! and renders model, data and biz modules plus a replayable DDL dump.

pub mod codegen;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod render;
pub mod schema;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

// Re-export main types for easier access
pub use codegen::{GeneratedArtifact, Generator};
pub use config::Config;
pub use db::{DatabaseConnection, Dialect};
pub use error::{Error, Result};
pub use output::{FileReconciler, WriteOutcome, WritePolicy};
pub use render::{Delimiters, Renderer, TemplateBundle, TemplateId};
pub use schema::{Introspector, Table};

/// Initialize schema_scaffold with the specified configuration file
pub fn init(config_path: &str) -> Result<ScaffoldClient> {
    let config = config::load_from_file(config_path)?;
    ScaffoldClient::new(config)
}

/// The main client driving a generation run
pub struct ScaffoldClient {
    config: Config,
    dialect: Dialect,
    schema: String,
    bundle: TemplateBundle,
}

impl ScaffoldClient {
    /// Validate configuration and load templates; does not touch the database
    pub fn new(config: Config) -> Result<Self> {
        let dialect = config.dialect()?;
        let schema = config.resolved_schema()?;
        if schema.is_empty() {
            return Err(Error::ConfigError(
                "no schema configured and none found in the connection URL".to_string(),
            ));
        }

        let override_dir = config
            .templates
            .as_ref()
            .and_then(|t| t.directory.as_deref())
            .map(Path::new);
        let bundle = TemplateBundle::load(Delimiters::default(), override_dir)?;

        Ok(Self {
            config,
            dialect,
            schema,
            bundle,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The schema (postgres) or database (mysql) being introspected
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Connect, read every table, and close the pool again
    pub async fn introspect(&self) -> Result<Vec<Table>> {
        let connection = DatabaseConnection::connect(&self.config.database).await?;
        tracing::info!(
            dialect = connection.dialect().name(),
            schema = %self.schema,
            "Connected to database"
        );
        let result = self.introspect_with(connection.introspector()).await;
        connection.close().await;
        result
    }

    /// Read every table through an existing introspector
    pub async fn introspect_with(&self, introspector: Arc<dyn Introspector>) -> Result<Vec<Table>> {
        schema::introspect_with_helpers(introspector, &self.schema).await
    }

    /// Render every artifact for `tables` without writing anything
    pub fn plan(&self, tables: Vec<Table>) -> Result<Vec<GeneratedArtifact>> {
        Generator::new(&self.config, self.dialect, &self.bundle).plan(tables)
    }

    /// Write artifacts sequentially, in order
    pub fn write(&self, artifacts: &[GeneratedArtifact]) -> Result<Vec<WriteOutcome>> {
        let mut reconciler = FileReconciler::new();
        for artifact in artifacts {
            reconciler.write(&artifact.path, &artifact.content, artifact.policy)?;
        }
        Ok(reconciler.into_outcomes())
    }

    /// Complete workflow: introspect, build, render and write
    pub async fn generate(&self) -> Result<Vec<WriteOutcome>> {
        let tables = self.introspect().await?;
        self.finish(tables)
    }

    /// Complete workflow against an existing introspector
    pub async fn generate_with(&self, introspector: Arc<dyn Introspector>) -> Result<Vec<WriteOutcome>> {
        let tables = self.introspect_with(introspector).await?;
        self.finish(tables)
    }

    fn finish(&self, tables: Vec<Table>) -> Result<Vec<WriteOutcome>> {
        let artifacts = self.plan(tables)?;
        let outcomes = self.write(&artifacts)?;

        let diverted = outcomes
            .iter()
            .filter(|o| matches!(o, WriteOutcome::Diverted { .. }))
            .count();
        tracing::info!(
            written = outcomes.len() - diverted,
            diverted,
            directory = %self.config.output.directory,
            "Generation complete"
        );
        Ok(outcomes)
    }
}
