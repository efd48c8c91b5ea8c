//! Reading the actual schema back from a live database.
//!
//! Each backend implements [`SchemaIntrospector`] and produces the same
//! [`DatabaseSchema`] shape the declared model uses. The backend is chosen by
//! an explicit [`Provider`] identifier.

pub mod connection;
pub mod postgres;
pub mod sqlite;

pub use connection::DbConnection;

use crate::model::{DatabaseSchema, IndexMethod, NameComparison};
use crate::util::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Postgres,
    Sqlite,
}

impl Provider {
    /// Guesses the provider from the URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Provider::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(Provider::Sqlite)
        } else {
            None
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            Provider::Postgres => Capabilities {
                provider: self,
                default_schema: "public",
                name_comparison: NameComparison::CaseSensitive,
                schemas: true,
                named_constraints: true,
                computed_columns: true,
                index_methods: &[
                    IndexMethod::BTree,
                    IndexMethod::Hash,
                    IndexMethod::Gin,
                    IndexMethod::Gist,
                    IndexMethod::Brin,
                    IndexMethod::SpGist,
                ],
            },
            Provider::Sqlite => Capabilities {
                provider: self,
                default_schema: "main",
                name_comparison: NameComparison::CaseInsensitive,
                schemas: false,
                named_constraints: false,
                computed_columns: false,
                index_methods: &[IndexMethod::BTree],
            },
        }
    }

    pub fn introspector(self) -> Box<dyn SchemaIntrospector> {
        match self {
            Provider::Postgres => Box::new(postgres::PostgresIntrospector),
            Provider::Sqlite => Box::new(sqlite::SqliteIntrospector),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Provider::Postgres),
            "sqlite" | "sqlite3" => Ok(Provider::Sqlite),
            _ => Err(format!(
                "Invalid provider '{s}'. Valid providers: postgres, sqlite"
            )),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::Postgres => "postgres",
            Provider::Sqlite => "sqlite",
        };
        write!(f, "{s}")
    }
}

/// What a backend's introspector can represent. Declared constructs outside
/// this set are configuration errors rather than findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub provider: Provider,
    pub default_schema: &'static str,
    pub name_comparison: NameComparison,
    /// Whether tables can live in schemas other than `default_schema`.
    pub schemas: bool,
    /// Whether primary, unique and foreign key constraint names survive a
    /// round trip through the catalog.
    pub named_constraints: bool,
    pub computed_columns: bool,
    pub index_methods: &'static [IndexMethod],
}

impl Capabilities {
    pub fn supports_index_method(&self, method: IndexMethod) -> bool {
        self.index_methods.contains(&method)
    }
}

#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    fn provider(&self) -> Provider;

    /// Reads every base table in `target_schemas`. An empty slice means the
    /// provider's default schema.
    async fn introspect(
        &self,
        connection: &DbConnection,
        target_schemas: &[String],
    ) -> Result<DatabaseSchema>;
}
