//! End-to-end tests for schema_scaffold
//!
//! These drive the full pipeline through an in-memory introspector, so no
//! database is needed.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rstest::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use schema_scaffold::config::Layer;
use schema_scaffold::schema::ddl;
use schema_scaffold::schema::types::Column;
use schema_scaffold::{Config, Error, Introspector, Result, ScaffoldClient, Table, WriteOutcome};

/// Serves a fixed set of tables the way a dialect introspector would
struct FixtureIntrospector {
    tables: Vec<Table>,
}

#[async_trait]
impl Introspector for FixtureIntrospector {
    async fn list_tables(&self, schema: &str) -> Result<Vec<Table>> {
        let mut tables: Vec<Table> = self
            .tables
            .iter()
            .map(|t| Table {
                comment: t.comment.clone(),
                ..Table::new(schema, &t.name)
            })
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    async fn list_columns(&self, _schema: &str, table: &str) -> Result<Vec<Column>> {
        Ok(self
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn fetch_table_ddl(&self, table: &mut Table) -> Result<String> {
        let serial = ddl::postgres_serial(&table.columns);
        table.serial_column = serial.as_ref().map(|(column, _)| column.clone());
        let raw = self
            .tables
            .iter()
            .find(|t| t.name == table.name)
            .map(|t| t.ddl.clone())
            .unwrap_or_default();
        Ok(ddl::normalize_postgres(
            &raw,
            serial.as_ref().map(|(_, seq)| seq.as_str()),
        ))
    }
}

fn account() -> Table {
    let mut table = Table::new("public", "account");
    table.comment = Some("accounts".to_string());
    table.set_columns(vec![
        Column::new("id", "integer")
            .position(1)
            .default("nextval('account_id_seq'::regclass)"),
        Column::new("name", "character varying").position(2).max_length(64),
        Column::new("created_at", "bigint").position(3),
        Column::new("updated_at", "bigint").position(4),
    ]);
    table.ddl = "CREATE TABLE public.account (\n  id integer DEFAULT nextval('account_id_seq'::regclass) NOT NULL,\n  name character varying(64) NOT NULL,\n  created_at bigint NOT NULL,\n  updated_at bigint NOT NULL\n);\nCREATE UNIQUE INDEX account_name ON public.account USING btree (name);\n".to_string();
    table
}

fn audit_log() -> Table {
    let mut table = Table::new("public", "audit_log");
    table.set_columns(vec![
        Column::new("message", "text").position(1).comment("what happened"),
        Column::new("level", "smallint").position(2).nullable(true),
    ]);
    table.ddl = "CREATE TABLE public.audit_log (\n  message text NOT NULL,\n  level smallint\n);".to_string();
    table
}

// Helper function to create a test configuration
fn test_config(output: &Path) -> Config {
    let config_str = format!(
        r#"
        [database]
        dialect = "postgres"
        url = "postgres://u:p@localhost/mydb?sslmode=disable"

        [columns]
        serial = "id"
        created_at = "created_at,add_at"
        updated_at = "updated_at,mod_at"

        [output]
        directory = "{}"
        lookup_fields = "account.name"

        [tables]
        disable_match_rules = ["^zzz_"]
        "#,
        output.display()
    );
    toml::from_str(&config_str).unwrap()
}

#[fixture]
fn workspace() -> TempDir {
    tempdir().unwrap()
}

fn introspector() -> Arc<dyn Introspector> {
    let mut scratch = audit_log();
    scratch.name = "zzz_scratch".to_string();
    Arc::new(FixtureIntrospector {
        tables: vec![audit_log(), account(), scratch],
    })
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

#[rstest]
#[tokio::test]
async fn test_end_to_end_account(workspace: TempDir) {
    let client = ScaffoldClient::new(test_config(workspace.path())).unwrap();
    assert_eq!(client.schema(), "public");

    let tables = client.introspect_with(introspector()).await.unwrap();
    let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["account", "audit_log", "zzz_scratch"]);

    let account = &tables[0];
    assert_eq!(account.serial_column.as_deref(), Some("id"));
    assert!(account
        .ddl
        .starts_with("CREATE SEQUENCE IF NOT EXISTS account_id_seq START 1;\nCREATE TABLE IF NOT EXISTS public.account ("));

    client.write(&client.plan(tables).unwrap()).unwrap();
    let model = read(workspace.path(), "model/account.rs");

    // 4 field declarations, in column order
    assert!(model.contains(
        "pub struct Account {\n    #[serde(rename = \"id\")]\n    pub id: i32,\n    #[serde(rename = \"name\")]\n    pub name: String,\n    #[serde(rename = \"created_at\")]\n    pub created_at: i64,\n    #[serde(rename = \"updated_at\")]\n    pub updated_at: i64,\n}"
    ));
    assert!(model.contains("pub const IMMUTABLE: &[&str] = &[\"id\", \"created_at\"];"));

    // Role accessors
    assert!(model.contains("vec![id]"));
    assert!(model.contains("vec![created_at]"));
    assert!(model.contains("vec![updated_at]"));
    assert!(model.contains("vec![]"));

    // Insert takes only `name`; the key lives in its own struct
    assert!(model.contains(
        "pub struct InsertAccount {\n    #[serde(rename = \"name\")]\n    pub name: String,\n}"
    ));
    assert!(model.contains("pub struct PrimaryKeyAccount {"));
    assert!(model.contains("    #[serde(flatten)]\n    pub primary_key: PrimaryKeyAccount,"));
    assert!(model.contains("pub const FIELD_LIST: &str = r#\"\"id\", \"name\", \"created_at\", \"updated_at\"\"#;"));
    assert!(model.contains("pub const TABLE: &str = \"account\";"));
    assert!(!model.contains("{{{"));
}

#[rstest]
#[tokio::test]
async fn test_registry_and_ddl_dump(workspace: TempDir) {
    let client = ScaffoldClient::new(test_config(workspace.path())).unwrap();
    client.generate_with(introspector()).await.unwrap();

    let registry = read(workspace.path(), "model/mod.rs");
    assert!(registry.contains("pub mod account;\npub mod audit_log;\n"));
    assert!(registry.contains("pub const AUDIT_LOG: &str = \"audit_log\";"));
    assert!(!registry.contains("zzz_scratch"));

    let dump = read(workspace.path(), "model/schema.sql");
    assert!(dump.starts_with("/* account (accounts) */\nCREATE SEQUENCE IF NOT EXISTS account_id_seq START 1;\n"));
    assert!(dump.contains("CREATE UNIQUE INDEX IF NOT EXISTS account_name ON public.account"));
    assert!(dump.contains(";\n\n/* audit_log (audit_log) */\nCREATE TABLE IF NOT EXISTS public.audit_log ("));
    assert!(dump.ends_with("level smallint\n);\n"));

    // The schema id is derived from the dump, so it is stable across runs
    let schema_id = schema_scaffold::codegen::schema_id(None, &dump);
    assert!(registry.contains(&format!("pub const SCHEMA_ID: &str = \"{}\";", schema_id)));

    let data = read(workspace.path(), "data/account.rs");
    assert!(data.contains("pub fn select_by_id(&self) -> String"));
    assert!(data.contains("pub fn select_by_name(&self) -> String"));
    assert!(data.contains("use crate::model::account::{SchemaAccount, FIELD_LIST, TABLE};"));

    let biz = read(workspace.path(), "biz/mod.rs");
    assert!(biz.contains("            account: account::AccountBiz::new(data.account),"));
}

#[rstest]
#[tokio::test]
async fn test_regeneration_preserves_edits(workspace: TempDir) {
    let client = ScaffoldClient::new(test_config(workspace.path())).unwrap();
    client.generate_with(introspector()).await.unwrap();

    let edited = workspace.path().join("data/account.rs");
    let custom = "// hand written\npub fn custom() {}\n";
    fs::write(&edited, custom).unwrap();
    fs::write(workspace.path().join("model/account.rs"), "stale").unwrap();

    let outcomes = client.generate_with(introspector()).await.unwrap();

    assert_eq!(fs::read_to_string(&edited).unwrap(), custom);
    let draft = read(workspace.path(), "data/account.tmp");
    assert!(draft.contains("pub struct AccountData"));
    assert_ne!(read(workspace.path(), "model/account.rs"), "stale");

    let diverted: Vec<_> = outcomes
        .iter()
        .filter_map(|o| match o {
            WriteOutcome::Diverted { canonical, .. } => canonical.file_name(),
            WriteOutcome::Written(_) => None,
        })
        .collect();
    // Every untouched companion file is diverted too, since it exists already
    assert_eq!(diverted.len(), 4);
}

#[rstest]
#[tokio::test]
async fn test_model_layer_only(workspace: TempDir) {
    let mut config = test_config(workspace.path());
    config.output.layers = vec![Layer::Model];
    let client = ScaffoldClient::new(config).unwrap();

    let outcomes = client.generate_with(introspector()).await.unwrap();
    assert_eq!(outcomes.len(), 4);
    assert!(!workspace.path().join("data").exists());
    assert!(!workspace.path().join("biz").exists());
}

#[rstest]
#[tokio::test]
async fn test_table_named_mod_survives_regeneration(workspace: TempDir) {
    let mut module = audit_log();
    module.name = "mod".to_string();
    let fixture: Arc<dyn Introspector> = Arc::new(FixtureIntrospector {
        tables: vec![account(), module],
    });
    let client = ScaffoldClient::new(test_config(workspace.path())).unwrap();

    for _ in 0..2 {
        let outcomes = client.generate_with(Arc::clone(&fixture)).await.unwrap();
        let mut paths: Vec<_> = outcomes.iter().map(|o| o.path().to_path_buf()).collect();
        let total = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), total);
    }

    for layer in ["model", "data", "biz"] {
        let table_file = read(workspace.path(), &format!("{}/mod_.rs", layer));
        assert!(table_file.contains("Mod"), "{}", layer);
        let registry = read(workspace.path(), &format!("{}/mod.rs", layer));
        assert!(registry.contains("#[path = \"mod_.rs\"]\npub mod r#mod;"), "{}", layer);
    }
    assert!(workspace.path().join("data/mod_.tmp").exists());
    assert!(!workspace.path().join("data/mod.tmp").exists());
}

/// Fails every column fetch
struct BrokenIntrospector;

#[async_trait]
impl Introspector for BrokenIntrospector {
    async fn list_tables(&self, schema: &str) -> Result<Vec<Table>> {
        Ok(vec![Table::new(schema, "account")])
    }

    async fn list_columns(&self, _schema: &str, _table: &str) -> Result<Vec<Column>> {
        Err(Error::IntrospectionError {
            message: "permission denied".to_string(),
            schema: None,
            table: None,
        })
    }

    async fn fetch_table_ddl(&self, _table: &mut Table) -> Result<String> {
        Ok(String::new())
    }
}

#[rstest]
#[tokio::test]
async fn test_introspection_failure_writes_nothing(workspace: TempDir) {
    let client = ScaffoldClient::new(test_config(workspace.path())).unwrap();
    let result = client.generate_with(Arc::new(BrokenIntrospector)).await;

    match result {
        Err(Error::IntrospectionError { table, .. }) => {
            assert_eq!(table.as_deref(), Some("account"));
        }
        other => panic!("expected an introspection error, got {:?}", other),
    }
    assert!(!workspace.path().join("model").exists());
}

#[test]
fn test_unsupported_dialect_fails_before_io() {
    let mut config = Config::default();
    config.database.dialect = "sqlite".to_string();
    assert!(matches!(
        ScaffoldClient::new(config),
        Err(Error::UnsupportedDialect(_))
    ));
}

#[test]
fn test_mysql_schema_from_dsn() {
    let mut config = Config::default();
    config.database.dialect = "mysql".to_string();
    config.database.url = "u:p@tcp(h:3306)/mydb?x=y".to_string();
    let client = ScaffoldClient::new(config).unwrap();
    assert_eq!(client.schema(), "mydb");
}
