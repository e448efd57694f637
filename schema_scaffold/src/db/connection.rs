//! Database connection handling
//!
//! This module selects the SQL dialect and opens a small, short-lived pool
//! suited to a single introspection run.

use sqlx::{mysql::MySqlPoolOptions, postgres::PgPoolOptions, MySql, Pool, Postgres};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::schema::introspector::Introspector;
use crate::schema::mysql::MySqlIntrospector;
use crate::schema::postgres::PostgresIntrospector;

const MAX_CONNECTIONS: u32 = 8;
const CONNECTION_TTL: Duration = Duration::from_secs(3 * 60);

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
}

impl Dialect {
    /// Identifier quote character used in generated field lists
    pub fn quote_char(&self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Postgres => '"',
        }
    }

    /// Quote an identifier for this dialect
    pub fn quote(&self, name: &str) -> String {
        let q = self.quote_char();
        format!("{}{}{}", q, name, q)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pgsql" => Ok(Dialect::Postgres),
            other => Err(Error::UnsupportedDialect(other.to_string())),
        }
    }
}

/// Enumeration of supported database pools
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let dialect: Dialect = config.dialect.parse()?;
        let pool_size = config.pool_size.unwrap_or(MAX_CONNECTIONS).min(MAX_CONNECTIONS);
        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(30));

        tracing::debug!(dialect = dialect.name(), pool_size, "Opening connection pool");

        match dialect {
            Dialect::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(pool_size)
                    .min_connections(0)
                    .acquire_timeout(timeout)
                    .idle_timeout(CONNECTION_TTL)
                    .max_lifetime(CONNECTION_TTL)
                    .connect(&config.url)
                    .await
                    .map_err(|e| Error::ConnectionError(e.to_string()))?;

                Ok(DatabaseConnection::Postgres(pool))
            }
            Dialect::MySql => {
                let url = mysql_url(&config.url);
                let pool = MySqlPoolOptions::new()
                    .max_connections(pool_size)
                    .min_connections(0)
                    .acquire_timeout(timeout)
                    .idle_timeout(CONNECTION_TTL)
                    .max_lifetime(CONNECTION_TTL)
                    .connect(&url)
                    .await
                    .map_err(|e| Error::ConnectionError(e.to_string()))?;

                Ok(DatabaseConnection::MySql(pool))
            }
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            DatabaseConnection::Postgres(_) => Dialect::Postgres,
            DatabaseConnection::MySql(_) => Dialect::MySql,
        }
    }

    /// The introspector matching this connection's dialect
    pub fn introspector(&self) -> Arc<dyn Introspector> {
        match self {
            DatabaseConnection::Postgres(pool) => Arc::new(PostgresIntrospector::new(pool.clone())),
            DatabaseConnection::MySql(pool) => Arc::new(MySqlIntrospector::new(pool.clone())),
        }
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        match self {
            DatabaseConnection::Postgres(pool) => pool.close().await,
            DatabaseConnection::MySql(pool) => pool.close().await,
        }
    }
}

/// Convert a `user:pass@tcp(host:port)/db?params` DSN into a `mysql://` URL
///
/// URLs that already carry a scheme are returned unchanged. Driver parameters
/// of the tcp form are dropped since they have no URL counterpart.
pub fn mysql_url(dsn: &str) -> String {
    if dsn.contains("://") {
        return dsn.to_string();
    }

    let (credentials, rest) = match dsn.rfind('@') {
        Some(at) => (&dsn[..at], &dsn[at + 1..]),
        None => ("", dsn),
    };

    let rest = rest.split('?').next().unwrap_or_default();
    let (address, database) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash + 1..]),
        None => (rest, ""),
    };
    let host = address
        .strip_prefix("tcp(")
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(address);

    if credentials.is_empty() {
        format!("mysql://{}/{}", host, database)
    } else {
        format!("mysql://{}@{}/{}", credentials, host, database)
    }
}
