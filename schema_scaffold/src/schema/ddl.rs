//! DDL normalization
//!
//! Rewrites the `CREATE` statements returned by the server so the dump can be
//! replayed against an existing database and does not change with row counts.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::types::Column;

static MYSQL_AUTO_INCREMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(AUTO_INCREMENT|auto_increment)=\d+").expect("valid regex"));

static PG_NEXTVAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^nextval\('([A-Za-z0-9_.]+)'::regclass\)$").expect("valid regex")
});

static PG_CREATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"CREATE (TABLE|INDEX|UNIQUE INDEX)( IF NOT EXISTS)?").expect("valid regex")
});

static MYSQL_CREATE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CREATE TABLE( IF NOT EXISTS)?").expect("valid regex"));

/// Normalize `SHOW CREATE TABLE` output
pub fn normalize_mysql(ddl: &str) -> String {
    let ddl = MYSQL_CREATE_TABLE.replace_all(ddl, "CREATE TABLE IF NOT EXISTS");
    MYSQL_AUTO_INCREMENT
        .replace_all(&ddl, "${1}=1")
        .into_owned()
}

/// Normalize Postgres DDL and prepend the sequence backing the serial column
pub fn normalize_postgres(ddl: &str, sequence: Option<&str>) -> String {
    let ddl = PG_CREATE.replace_all(ddl, "CREATE $1 IF NOT EXISTS");
    match sequence {
        Some(sequence) => format!(
            "CREATE SEQUENCE IF NOT EXISTS {} START 1;\n{}",
            sequence, ddl
        ),
        None => ddl.into_owned(),
    }
}

/// Sequence name from a `nextval('<seq>'::regclass)` default
///
/// Quotes are stripped, so a mixed-case sequence such as `"Order_id_seq"`
/// comes back unquoted and Postgres folds it to lowercase when the dump is
/// replayed.
pub fn nextval_sequence(default: &str) -> Option<String> {
    let default = default.replace('"', "");
    PG_NEXTVAL
        .captures(&default)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| !name.is_empty())
}

/// The Postgres serial column and its sequence; the last match wins
pub fn postgres_serial(columns: &[Column]) -> Option<(String, String)> {
    columns
        .iter()
        .filter_map(|c| {
            c.default
                .as_deref()
                .and_then(nextval_sequence)
                .map(|seq| (c.name.clone(), seq))
        })
        .last()
}

/// The MySQL auto-increment column; the last match wins
pub fn mysql_serial(columns: &[Column]) -> Option<String> {
    columns
        .iter()
        .filter(|c| c.extra.eq_ignore_ascii_case("auto_increment"))
        .map(|c| c.name.clone())
        .last()
}

/// Format one table's entry in the consolidated dump
pub fn dump_entry(name: &str, comment: &str, ddl: &str) -> String {
    let ddl = ddl.trim_end_matches('\n');
    let terminator = if ddl.ends_with(';') { "" } else { ";" };
    format!("/* {} ({}) */\n{}{}", name, comment, ddl, terminator)
}
