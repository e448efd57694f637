//! Utilities for schema_scaffold
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{
    is_ascii_identifier, module_file_stem, pascal_first_lower, pascal_to_snake,
    pascal_to_upper_snake, rust_ident, snake_to_pascal, validate_identifier,
};
