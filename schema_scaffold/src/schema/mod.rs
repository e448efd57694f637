//! Schema module for schema_scaffold
//!
//! This module handles catalog introspection for both dialects and the
//! rewriting of their DDL into an idempotent form.

pub mod ddl;
pub mod introspector;
pub mod mysql;
pub mod postgres;
pub mod types;

// Re-export key types
pub use introspector::{introspect_schema, introspect_with_helpers, Introspector};
pub use mysql::MySqlIntrospector;
pub use postgres::PostgresIntrospector;
pub use types::{CanonicalKind, Column, ColumnRole, FieldType, Table};
