//! Database module for schema_scaffold
//!
//! This module handles dialect selection and connection pools.

pub mod connection;

// Re-export key types
pub use connection::{DatabaseConnection, Dialect};
