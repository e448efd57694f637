//! Type definitions for introspected schema objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a database table as read from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub comment: Option<String>,
    /// Ordered by ascending ordinal position
    pub columns: Vec<Column>,
    /// Column the engine assigns on insert, if one was detected
    pub serial_column: Option<String>,
    /// Normalized, idempotent DDL
    pub ddl: String,
}

impl Table {
    /// Create a new table with the given schema and name
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            comment: None,
            columns: Vec::new(),
            serial_column: None,
            ddl: String::new(),
        }
    }

    /// Add a column to the table
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Replace the column list, restoring ordinal order
    pub fn set_columns(&mut self, mut columns: Vec<Column>) {
        columns.sort_by_key(|c| c.ordinal_position);
        self.columns = columns;
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The table comment, or the raw name when there is none
    pub fn comment_or_name(&self) -> &str {
        match self.comment.as_deref() {
            Some(comment) if !comment.is_empty() => comment,
            _ => &self.name,
        }
    }
}

/// Represents a database column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub ordinal_position: i64,
    pub nullable: bool,
    pub data_type: String,
    pub character_maximum_length: Option<i64>,
    pub character_octet_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub default: Option<String>,
    pub comment: Option<String>,
    /// Dialect specific marker, e.g. `auto_increment` on MySQL
    pub extra: String,
}

impl Column {
    /// Create a new non-null column with the given name and type
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            ordinal_position: 0,
            nullable: false,
            data_type: data_type.to_string(),
            character_maximum_length: None,
            character_octet_length: None,
            numeric_precision: None,
            numeric_scale: None,
            default: None,
            comment: None,
            extra: String::new(),
        }
    }

    /// Set the ordinal position
    pub fn position(mut self, position: i64) -> Self {
        self.ordinal_position = position;
        self
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set a default value for the column
    pub fn default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn extra(mut self, extra: &str) -> Self {
        self.extra = extra.to_string();
        self
    }

    pub fn max_length(mut self, length: i64) -> Self {
        self.character_maximum_length = Some(length);
        self.character_octet_length = Some(length * 4);
        self
    }

    pub fn kind(&self) -> CanonicalKind {
        CanonicalKind::from_sql(&self.data_type)
    }

    pub fn field_type(&self) -> FieldType {
        FieldType {
            kind: self.kind(),
            optional: self.nullable,
        }
    }

    /// Comment text, empty when the catalog had none
    pub fn comment_text(&self) -> &str {
        self.comment.as_deref().unwrap_or_default()
    }
}

/// Normalized scalar kinds shared by both dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Float64,
    String,
    Bool,
}

impl CanonicalKind {
    /// Map a raw column type; anything unrecognized is a string
    pub fn from_sql(data_type: &str) -> Self {
        match data_type.trim().to_lowercase().as_str() {
            "tinyint" => CanonicalKind::Int8,
            "smallint" | "smallserial" => CanonicalKind::Int16,
            "integer" | "serial" | "int" => CanonicalKind::Int32,
            "bigint" | "bigserial" => CanonicalKind::Int64,
            "decimal" | "numeric" | "real" | "double precision" | "double" | "float" => {
                CanonicalKind::Float64
            }
            "bool" | "boolean" => CanonicalKind::Bool,
            _ => CanonicalKind::String,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            CanonicalKind::Int8 | CanonicalKind::Int16 | CanonicalKind::Int32 | CanonicalKind::Int64
        )
    }

    /// The Rust scalar used in generated code
    pub fn rust_type(&self) -> &'static str {
        match self {
            CanonicalKind::Int8 => "i8",
            CanonicalKind::Int16 => "i16",
            CanonicalKind::Int32 => "i32",
            CanonicalKind::Int64 => "i64",
            CanonicalKind::Float64 => "f64",
            CanonicalKind::String => "String",
            CanonicalKind::Bool => "bool",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalKind::Int8 => "int8",
            CanonicalKind::Int16 => "int16",
            CanonicalKind::Int32 => "int32",
            CanonicalKind::Int64 => "int64",
            CanonicalKind::Float64 => "float64",
            CanonicalKind::String => "string",
            CanonicalKind::Bool => "bool",
        }
    }
}

impl fmt::Display for CanonicalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A canonical kind plus its optionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldType {
    pub kind: CanonicalKind,
    pub optional: bool,
}

impl FieldType {
    /// `i32` or `Option<i32>`
    pub fn rust_type(&self) -> String {
        if self.optional {
            format!("Option<{}>", self.kind.rust_type())
        } else {
            self.kind.rust_type().to_string()
        }
    }

    /// Type of a partial-update field: absent, or a value for the column
    ///
    /// Nullable columns become `Option<Option<T>>`, which keeps "leave
    /// unchanged" and "set to NULL" apart in Rust. The generated serde
    /// attributes (`default`, `skip_serializing_if`) read a JSON `null` as
    /// `None`, so over JSON both collapse to "leave unchanged".
    pub fn update_type(&self) -> String {
        format!("Option<{}>", self.rust_type())
    }
}

/// Structural role of a column, derived per rendering pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Ordinary,
    Serial,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("tinyint", CanonicalKind::Int8)]
    #[case("smallint", CanonicalKind::Int16)]
    #[case("smallserial", CanonicalKind::Int16)]
    #[case("integer", CanonicalKind::Int32)]
    #[case("serial", CanonicalKind::Int32)]
    #[case("INT", CanonicalKind::Int32)]
    #[case("bigint", CanonicalKind::Int64)]
    #[case("bigserial", CanonicalKind::Int64)]
    #[case("decimal", CanonicalKind::Float64)]
    #[case("numeric", CanonicalKind::Float64)]
    #[case("real", CanonicalKind::Float64)]
    #[case("double precision", CanonicalKind::Float64)]
    #[case("double", CanonicalKind::Float64)]
    #[case("float", CanonicalKind::Float64)]
    #[case("varchar", CanonicalKind::String)]
    #[case("character varying", CanonicalKind::String)]
    #[case("longtext", CanonicalKind::String)]
    #[case("enum", CanonicalKind::String)]
    #[case("boolean", CanonicalKind::Bool)]
    #[case("bool", CanonicalKind::Bool)]
    #[case("jsonb", CanonicalKind::String)]
    #[case("timestamp with time zone", CanonicalKind::String)]
    #[case("", CanonicalKind::String)]
    fn test_kind_mapping(#[case] raw: &str, #[case] expected: CanonicalKind) {
        assert_eq!(CanonicalKind::from_sql(raw), expected);
    }

    #[test]
    fn test_nullable_wraps_in_option() {
        let column = Column::new("age", "integer").nullable(true);
        assert_eq!(column.field_type().rust_type(), "Option<i32>");
        assert_eq!(column.field_type().update_type(), "Option<Option<i32>>");

        let column = Column::new("name", "varchar");
        assert_eq!(column.field_type().rust_type(), "String");
        assert_eq!(column.field_type().update_type(), "Option<String>");
    }

    #[test]
    fn test_set_columns_orders_by_position() {
        let mut table = Table::new("public", "account");
        table.set_columns(vec![
            Column::new("b", "text").position(2),
            Column::new("a", "text").position(1),
        ]);
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_comment_fallback() {
        let mut table = Table::new("public", "account");
        assert_eq!(table.comment_or_name(), "account");
        table.comment = Some(String::new());
        assert_eq!(table.comment_or_name(), "account");
        table.comment = Some("accounts".to_string());
        assert_eq!(table.comment_or_name(), "accounts");
    }
}
