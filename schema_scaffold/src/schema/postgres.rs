//! PostgreSQL introspector
//!
//! `information_schema` has no comment columns, so comments are fetched with
//! one query per table and one per column. DDL comes from a helper function
//! installed by [`Introspector::prepare`] and removed by
//! [`Introspector::cleanup`].

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};

use crate::error::{Error, Result};
use crate::schema::ddl;
use crate::schema::introspector::Introspector;
use crate::schema::types::{Column, Table};

const SHOW_CREATE_FUNCTION: &str = include_str!("pg_show_create.sql");

const DROP_SHOW_CREATE_FUNCTION: &str =
    "DROP FUNCTION IF EXISTS show_create_table_schema(varchar, varchar)";

#[derive(FromRow)]
struct TableRow {
    table_schema: String,
    table_name: String,
}

#[derive(FromRow)]
struct ColumnRow {
    column_name: String,
    ordinal_position: i64,
    column_default: Option<String>,
    is_nullable: String,
    data_type: String,
    character_maximum_length: Option<i64>,
    character_octet_length: Option<i64>,
    numeric_precision: Option<i64>,
    numeric_scale: Option<i64>,
}

pub struct PostgresIntrospector {
    pool: Pool<Postgres>,
}

impl PostgresIntrospector {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn table_comment(&self, schema: &str, table: &str) -> Result<Option<String>> {
        let sql = r#"
            SELECT CAST(obj_description(c.oid, 'pg_class') AS TEXT)
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = $1 AND c.relname = $2
            LIMIT 1
        "#;

        let comment: Option<Option<String>> = sqlx::query_scalar(sql)
            .bind(schema)
            .bind(table)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::introspection(schema, table, e.to_string()))?;

        Ok(comment.flatten())
    }

    async fn column_comment(&self, schema: &str, table: &str, column: &str) -> Result<Option<String>> {
        let sql = r#"
            SELECT CAST(col_description(c.oid, a.attnum) AS TEXT)
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
            WHERE n.nspname = $1 AND c.relname = $2 AND a.attname = $3
              AND a.attnum > 0 AND NOT a.attisdropped
            LIMIT 1
        "#;

        let comment: Option<Option<String>> = sqlx::query_scalar(sql)
            .bind(schema)
            .bind(table)
            .bind(column)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::introspection(schema, table, e.to_string()))?;

        Ok(comment.flatten())
    }
}

#[async_trait]
impl Introspector for PostgresIntrospector {
    async fn prepare(&self) -> Result<()> {
        sqlx::query(SHOW_CREATE_FUNCTION)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::IntrospectionError {
                message: format!("failed to install DDL helper: {}", e),
                schema: None,
                table: None,
            })?;
        tracing::debug!("Installed show_create_table_schema helper");
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        sqlx::query(DROP_SHOW_CREATE_FUNCTION)
            .execute(&self.pool)
            .await?;
        tracing::debug!("Dropped show_create_table_schema helper");
        Ok(())
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<Table>> {
        let sql = r#"
            SELECT
                table_schema::text AS table_schema,
                table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name ASC
        "#;

        let rows = sqlx::query_as::<_, TableRow>(sql)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::IntrospectionError {
                message: e.to_string(),
                schema: Some(schema.to_string()),
                table: None,
            })?;

        Ok(rows
            .into_iter()
            .map(|row| Table::new(&row.table_schema, &row.table_name))
            .collect())
    }

    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<Column>> {
        let sql = r#"
            SELECT
                column_name::text AS column_name,
                ordinal_position::int8 AS ordinal_position,
                column_default::text AS column_default,
                is_nullable::text AS is_nullable,
                data_type::text AS data_type,
                character_maximum_length::int8 AS character_maximum_length,
                character_octet_length::int8 AS character_octet_length,
                numeric_precision::int8 AS numeric_precision,
                numeric_scale::int8 AS numeric_scale
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position ASC
        "#;

        let rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::introspection(schema, table, e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| Column {
                name: row.column_name,
                ordinal_position: row.ordinal_position,
                nullable: !row.is_nullable.eq_ignore_ascii_case("no"),
                data_type: row.data_type,
                character_maximum_length: row.character_maximum_length,
                character_octet_length: row.character_octet_length,
                numeric_precision: row.numeric_precision,
                numeric_scale: row.numeric_scale,
                default: row.column_default,
                comment: None,
                extra: String::new(),
            })
            .collect())
    }

    async fn describe_table(&self, table: &mut Table) -> Result<()> {
        let mut columns = self.list_columns(&table.schema, &table.name).await?;
        for column in columns.iter_mut() {
            column.comment = self
                .column_comment(&table.schema, &table.name, &column.name)
                .await?;
        }
        table.set_columns(columns);
        table.comment = self.table_comment(&table.schema, &table.name).await?;
        Ok(())
    }

    async fn fetch_table_ddl(&self, table: &mut Table) -> Result<String> {
        let serial = ddl::postgres_serial(&table.columns);
        table.serial_column = serial.as_ref().map(|(column, _)| column.clone());

        let create: Option<String> = sqlx::query_scalar("SELECT show_create_table_schema($1, $2)")
            .bind(table.schema.as_str())
            .bind(table.name.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::introspection(&table.schema, &table.name, e.to_string()))?;

        let sequence = serial.as_ref().map(|(_, sequence)| sequence.as_str());
        Ok(ddl::normalize_postgres(&create.unwrap_or_default(), sequence))
    }
}
