use super::Provider;
use crate::util::{sanitize_connection_error, sanitize_url, Result, SchemaError};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Postgres, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// A single-connection pool for one compare run.
pub enum DbConnection {
    Postgres(Pool<Postgres>),
    Sqlite(Pool<Sqlite>),
}

impl DbConnection {
    pub async fn connect(
        provider: Provider,
        connection_string: &str,
        timeout: Duration,
    ) -> Result<Self> {
        debug!(%provider, url = %sanitize_url(connection_string), "connecting");
        let map_err = |e: sqlx::Error| {
            let sanitized_error = sanitize_connection_error(connection_string, &e.to_string());
            SchemaError::DatabaseError(format!(
                "Failed to connect to {}: {sanitized_error}",
                sanitize_url(connection_string)
            ))
        };

        match provider {
            Provider::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(timeout)
                    .connect(connection_string)
                    .await
                    .map_err(map_err)?;
                Ok(DbConnection::Postgres(pool))
            }
            Provider::Sqlite => {
                let options = SqliteConnectOptions::from_str(connection_string)
                    .map_err(map_err)?
                    .read_only(true);
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await
                    .map_err(map_err)?;
                Ok(DbConnection::Sqlite(pool))
            }
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            DbConnection::Postgres(_) => Provider::Postgres,
            DbConnection::Sqlite(_) => Provider::Sqlite,
        }
    }

    /// Closes the pool and waits for the connection to be released.
    pub async fn close(&self) {
        match self {
            DbConnection::Postgres(pool) => pool.close().await,
            DbConnection::Sqlite(pool) => pool.close().await,
        }
    }

    pub(crate) fn postgres_pool(&self) -> Result<&Pool<Postgres>> {
        match self {
            DbConnection::Postgres(pool) => Ok(pool),
            other => Err(mismatch(Provider::Postgres, other.provider())),
        }
    }

    pub(crate) fn sqlite_pool(&self) -> Result<&Pool<Sqlite>> {
        match self {
            DbConnection::Sqlite(pool) => Ok(pool),
            other => Err(mismatch(Provider::Sqlite, other.provider())),
        }
    }
}

fn mismatch(expected: Provider, found: Provider) -> SchemaError {
    SchemaError::DatabaseError(format!(
        "{expected} introspector cannot read a {found} connection"
    ))
}
