//! Render module for schema_scaffold
//!
//! This module holds the template bundle and the renderer that fills it.

pub mod bundle;
pub mod renderer;

// Re-export key types
pub use bundle::{Delimiters, Template, TemplateBundle, TemplateId};
pub use renderer::Renderer;
