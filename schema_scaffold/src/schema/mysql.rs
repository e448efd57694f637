//! MySQL introspector

use async_trait::async_trait;
use sqlx::{FromRow, MySql, Pool, Row};

use crate::error::{Error, Result};
use crate::schema::ddl;
use crate::schema::introspector::Introspector;
use crate::schema::types::{Column, Table};

#[derive(FromRow)]
struct TableRow {
    table_schema: String,
    table_name: String,
    table_comment: Option<String>,
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
    column_comment: Option<String>,
    extra: Option<String>,
}

/// Reads tables and columns from `information_schema`
pub struct MySqlIntrospector {
    pool: Pool<MySql>,
}

impl MySqlIntrospector {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Introspector for MySqlIntrospector {
    async fn list_tables(&self, schema: &str) -> Result<Vec<Table>> {
        let sql = r#"
            SELECT
                CAST(TABLE_SCHEMA AS CHAR) AS table_schema,
                CAST(TABLE_NAME AS CHAR) AS table_name,
                CAST(TABLE_COMMENT AS CHAR) AS table_comment
            FROM information_schema.TABLES
            WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_SCHEMA = ?
            ORDER BY TABLE_NAME ASC
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
            .map(|row| {
                let mut table = Table::new(&row.table_schema, &row.table_name);
                table.comment = row.table_comment;
                table
            })
            .collect())
    }

    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<Column>> {
        let sql = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(ORDINAL_POSITION AS SIGNED) AS ordinal_position,
                CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
                CAST(IS_NULLABLE AS CHAR) AS is_nullable,
                CAST(DATA_TYPE AS CHAR) AS data_type,
                CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS character_maximum_length,
                CAST(CHARACTER_OCTET_LENGTH AS SIGNED) AS character_octet_length,
                CAST(NUMERIC_PRECISION AS SIGNED) AS numeric_precision,
                CAST(NUMERIC_SCALE AS SIGNED) AS numeric_scale,
                CAST(COLUMN_COMMENT AS CHAR) AS column_comment,
                CAST(EXTRA AS CHAR) AS extra
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION ASC
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
                comment: row.column_comment,
                extra: row.extra.unwrap_or_default(),
            })
            .collect())
    }

    async fn fetch_table_ddl(&self, table: &mut Table) -> Result<String> {
        table.serial_column = ddl::mysql_serial(&table.columns);

        let sql = format!(
            "SHOW CREATE TABLE `{}`.`{}`",
            table.schema.replace('`', "``"),
            table.name.replace('`', "``")
        );
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::introspection(&table.schema, &table.name, e.to_string()))?;

        let create: String = row
            .try_get(1)
            .map_err(|e| Error::introspection(&table.schema, &table.name, e.to_string()))?;

        Ok(ddl::normalize_mysql(&create))
    }
}
