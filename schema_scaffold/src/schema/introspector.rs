//! Schema introspection
//!
//! One [`Introspector`] implementation exists per dialect; [`introspect_schema`]
//! drives either of them through the full fetch.

use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::types::{Column, Table};

/// Catalog access for one SQL dialect
#[async_trait]
pub trait Introspector: Send + Sync {
    /// Install any server-side helpers needed for DDL extraction
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Remove what `prepare` installed
    async fn cleanup(&self) -> Result<()> {
        Ok(())
    }

    /// Base tables of a schema, ordered by name
    async fn list_tables(&self, schema: &str) -> Result<Vec<Table>>;

    /// Columns of a table, ordered by ordinal position
    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<Column>>;

    /// Fill in whatever `list_tables` could not provide (columns, comments)
    async fn describe_table(&self, table: &mut Table) -> Result<()> {
        let columns = self.list_columns(&table.schema, &table.name).await?;
        table.set_columns(columns);
        Ok(())
    }

    /// Detect the serial column and return the table's normalized DDL
    async fn fetch_table_ddl(&self, table: &mut Table) -> Result<String>;
}

/// Fetch every table of `schema` with columns, comments and DDL
///
/// Column and comment fetches run as one task per table. A failing task does
/// not cancel its siblings; the first error recorded is returned once all of
/// them have finished. DDL is then fetched sequentially in name order.
pub async fn introspect_schema(
    introspector: Arc<dyn Introspector>,
    schema: &str,
) -> Result<Vec<Table>> {
    let tables = introspector.list_tables(schema).await?;
    tracing::info!(schema, count = tables.len(), "Discovered tables");

    let first_error: Arc<OnceCell<Error>> = Arc::new(OnceCell::new());

    let handles = tables.into_iter().map(|mut table| {
        let introspector = Arc::clone(&introspector);
        let first_error = Arc::clone(&first_error);
        tokio::spawn(async move {
            match introspector.describe_table(&mut table).await {
                Ok(()) => Some(table),
                Err(e) => {
                    tracing::error!(table = %table.name, error = %e, "Failed to describe table");
                    let _ = first_error.set(scope_error(e, &table));
                    None
                }
            }
        })
    });

    let results = join_all(handles).await;

    let mut described = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(Some(table)) => described.push(table),
            Ok(None) => {}
            Err(join_error) => {
                let _ = first_error.set(Error::IntrospectionError {
                    message: format!("introspection task failed: {}", join_error),
                    schema: Some(schema.to_string()),
                    table: None,
                });
            }
        }
    }

    let first_error = match Arc::try_unwrap(first_error) {
        Ok(cell) => cell.into_inner(),
        Err(shared) => shared.get().map(|e| Error::IntrospectionError {
            message: e.to_string(),
            schema: Some(schema.to_string()),
            table: None,
        }),
    };
    if let Some(error) = first_error {
        return Err(error);
    }

    for table in described.iter_mut() {
        let ddl = introspector
            .fetch_table_ddl(table)
            .await
            .map_err(|e| scope_error(e, table))?;
        table.ddl = ddl;
        tracing::debug!(
            table = %table.name,
            serial = table.serial_column.as_deref().unwrap_or(""),
            "Fetched table DDL"
        );
    }

    Ok(described)
}

/// Run `prepare`, the full introspection and `cleanup`, in that order
///
/// Cleanup is attempted even when introspection fails.
pub async fn introspect_with_helpers(
    introspector: Arc<dyn Introspector>,
    schema: &str,
) -> Result<Vec<Table>> {
    introspector.prepare().await?;
    let result = introspect_schema(Arc::clone(&introspector), schema).await;
    if let Err(e) = introspector.cleanup().await {
        tracing::warn!(error = %e, "Failed to clean up introspection helpers");
    }
    result
}

/// Attach table context to errors that came back without it
fn scope_error(error: Error, table: &Table) -> Error {
    match error {
        Error::IntrospectionError {
            message,
            schema: None,
            table: None,
        } => Error::introspection(&table.schema, &table.name, message),
        other => other,
    }
}
