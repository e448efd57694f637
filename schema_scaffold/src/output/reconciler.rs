//! File reconciliation
//!
//! Registries and the DDL dump are rewritten on every run. Per-table data and
//! biz files are meant to be edited by hand, so once they exist a fresh
//! rendering goes to a draft file beside them instead.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extension of the file a preserved artifact is diverted to
pub const DRAFT_EXTENSION: &str = "tmp";

/// How an artifact treats an existing file at its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritePolicy {
    /// Remove whatever is there and write the new content
    AlwaysRegenerate,
    /// Never touch an existing file; write a draft next to it instead
    PreserveCustomization,
}

/// What happened to one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    Diverted { canonical: PathBuf, draft: PathBuf },
}

impl WriteOutcome {
    /// The path that received the new content
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Written(path) => path,
            WriteOutcome::Diverted { draft, .. } => draft,
        }
    }
}

/// Writes artifacts one at a time according to their policy
#[derive(Debug, Default)]
pub struct FileReconciler {
    outcomes: Vec<WriteOutcome>,
}

impl FileReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `content` to `path` under `policy`
    pub fn write(&mut self, path: &Path, content: &str, policy: WritePolicy) -> Result<WriteOutcome> {
        ensure_parent(path)?;

        let outcome = match policy {
            WritePolicy::AlwaysRegenerate => {
                remove_create(path, content)?;
                tracing::info!(path = %path.display(), "Wrote file");
                WriteOutcome::Written(path.to_path_buf())
            }
            WritePolicy::PreserveCustomization if path.exists() => {
                let draft = draft_path(path);
                remove_create(&draft, content)?;
                tracing::info!(
                    path = %path.display(),
                    draft = %draft.display(),
                    "Existing file kept, wrote draft"
                );
                WriteOutcome::Diverted {
                    canonical: path.to_path_buf(),
                    draft,
                }
            }
            WritePolicy::PreserveCustomization => {
                remove_create(path, content)?;
                tracing::info!(path = %path.display(), "Wrote file");
                WriteOutcome::Written(path.to_path_buf())
            }
        };

        self.outcomes.push(outcome.clone());
        Ok(outcome)
    }

    /// Everything written so far, in write order
    pub fn outcomes(&self) -> &[WriteOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<WriteOutcome> {
        self.outcomes
    }
}

/// `data/account.rs` -> `data/account.tmp`
pub fn draft_path(path: &Path) -> PathBuf {
    path.with_extension(DRAFT_EXTENSION)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| Error::file_system(parent, e))
        }
        _ => Ok(()),
    }
}

fn remove_create(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| Error::file_system(path, e))?;
    }
    let mut file = File::create(path).map_err(|e| Error::file_system(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::file_system(path, e))
}
