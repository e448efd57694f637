//! Column role classification
//!
//! Splits a table's columns into the serial, created-at, updated-at and
//! deleted-at roles named by configuration. Only integer columns can hold a
//! role; the detected auto-increment column is always a serial member.

use indexmap::IndexSet;

use crate::config::ColumnRolesConfig;
use crate::schema::types::{ColumnRole, Table};
use crate::utils::naming::rust_ident;

/// Role membership of one table's columns
///
/// Member lists keep the order of the configured candidates and are pairwise
/// disjoint; a name claimed by an earlier role (serial, created, updated,
/// deleted) is dropped from later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub serial: Vec<String>,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    /// The column extracted into the primary-key artifact
    pub serial_column: Option<String>,
}

impl ColumnRoles {
    pub fn classify(table: &Table, config: &ColumnRolesConfig) -> Self {
        let integers: IndexSet<&str> = table
            .columns
            .iter()
            .filter(|c| c.kind().is_integer())
            .map(|c| c.name.as_str())
            .collect();

        let mut claimed: IndexSet<String> = IndexSet::new();
        let mut take = |candidates: &str| -> Vec<String> {
            candidates
                .split(',')
                .map(str::trim)
                .filter(|name| integers.contains(name))
                .filter_map(|name| {
                    if claimed.insert(name.to_string()) {
                        Some(name.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        };

        let mut serial = take(&config.serial);
        let created = take(&config.created_at);
        let updated = take(&config.updated_at);
        let deleted = take(&config.deleted_at);

        if let Some(detected) = table.serial_column.as_deref() {
            if !serial.iter().any(|name| name == detected) {
                serial.push(detected.to_string());
            }
        }

        let mut roles = Self {
            serial,
            created,
            updated,
            deleted,
            serial_column: None,
        };
        // The detected column may have been claimed by a later role first
        if let Some(detected) = table.serial_column.as_deref() {
            roles.created.retain(|name| name != detected);
            roles.updated.retain(|name| name != detected);
            roles.deleted.retain(|name| name != detected);
        }
        roles.serial_column = table
            .serial_column
            .clone()
            .or_else(|| roles.serial.first().cloned());
        roles
    }

    pub fn role_of(&self, column: &str) -> ColumnRole {
        let contains = |list: &[String]| list.iter().any(|name| name == column);
        if contains(&self.serial) {
            ColumnRole::Serial
        } else if contains(&self.created) {
            ColumnRole::CreatedAt
        } else if contains(&self.updated) {
            ColumnRole::UpdatedAt
        } else if contains(&self.deleted) {
            ColumnRole::DeletedAt
        } else {
            ColumnRole::Ordinary
        }
    }

    /// serial ∪ created
    pub fn ignore_for_insert(&self) -> IndexSet<&str> {
        self.serial
            .iter()
            .chain(self.created.iter())
            .map(String::as_str)
            .collect()
    }

    /// serial ∪ created ∪ updated ∪ deleted
    pub fn ignore_for_update_and_insert(&self) -> IndexSet<&str> {
        self.serial
            .iter()
            .chain(self.created.iter())
            .chain(self.updated.iter())
            .chain(self.deleted.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_serial_column(&self, column: &str) -> bool {
        self.serial_column.as_deref() == Some(column)
    }

    /// `[id]`, or `[]` when the table has no serial column
    pub fn serial_accessor(&self) -> String {
        accessor_list(self.serial.first().into_iter())
    }

    pub fn created_accessor(&self) -> String {
        accessor_list(self.created.iter())
    }

    pub fn updated_accessor(&self) -> String {
        accessor_list(self.updated.iter())
    }

    pub fn deleted_accessor(&self) -> String {
        accessor_list(self.deleted.iter())
    }
}

fn accessor_list<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let names: Vec<String> = names.map(|name| rust_ident(name)).collect();
    format!("[{}]", names.join(", "))
}
