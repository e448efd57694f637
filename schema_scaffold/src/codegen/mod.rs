//! Codegen module for schema_scaffold
//!
//! This module classifies columns, assembles the per-table and registry
//! records, and plans the generated artifacts.

pub mod classifier;
pub mod model;
pub mod pipeline;
pub mod registry;

// Re-export key types
pub use classifier::ColumnRoles;
pub use model::{TableModel, TableModelBuilder};
pub use pipeline::{GeneratedArtifact, Generator};
pub use registry::{ddl_dump, schema_id, RegistryModel};
