//! Output module for schema_scaffold
//!
//! This module decides how generated artifacts land on disk.

pub mod reconciler;

// Re-export key types
pub use reconciler::{FileReconciler, WriteOutcome, WritePolicy, DRAFT_EXTENSION};
