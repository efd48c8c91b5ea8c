use crate::filter::TableFilter;
use crate::introspect::Provider;
use crate::model::NameComparison;
use crate::report::IgnoreRule;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for checking a database against a declared model.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Model sources with optional prefix (e.g., "json:model.json", "toml:model.toml")
    pub model_sources: Vec<String>,
    /// Database connection URL
    pub database_url: String,
    /// Backend; guessed from the URL scheme when unset
    pub provider: Option<Provider>,
    /// Schemas to introspect (empty: the provider's default schema)
    pub target_schemas: Vec<String>,
    /// Identifier rule; the provider's rule when unset
    pub name_comparison: Option<NameComparison>,
    /// Glob patterns for actual tables never reported as extra
    pub ignore_tables: Vec<String>,
    /// Findings accepted without failing the check
    pub ignore_rules: Vec<IgnoreRule>,
    pub connect_timeout: Duration,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            model_sources: Vec::new(),
            database_url: String::new(),
            provider: None,
            target_schemas: Vec::new(),
            name_comparison: None,
            ignore_tables: Vec::new(),
            ignore_rules: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl CheckOptions {
    /// Create new check options with required fields.
    pub fn new(model_sources: Vec<String>, database_url: impl Into<String>) -> Self {
        Self {
            model_sources,
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set target schemas.
    pub fn with_target_schemas(mut self, schemas: Vec<String>) -> Self {
        self.target_schemas = schemas;
        self
    }

    pub fn with_name_comparison(mut self, name_comparison: NameComparison) -> Self {
        self.name_comparison = Some(name_comparison);
        self
    }

    pub fn with_ignore_tables(mut self, patterns: Vec<String>) -> Self {
        self.ignore_tables = patterns;
        self
    }

    pub fn with_ignore_rules(mut self, rules: Vec<IgnoreRule>) -> Self {
        self.ignore_rules = rules;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Options for reading a database's schema.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    /// Database connection URL
    pub database_url: String,
    pub provider: Option<Provider>,
    /// Schemas to introspect (empty: the provider's default schema)
    pub target_schemas: Vec<String>,
    /// Optional filter for including/excluding tables
    pub filter: Option<TableFilter>,
    pub connect_timeout: Duration,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            provider: None,
            target_schemas: Vec::new(),
            filter: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl IntrospectOptions {
    /// Create new introspect options with required fields.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set target schemas.
    pub fn with_target_schemas(mut self, schemas: Vec<String>) -> Self {
        self.target_schemas = schemas;
        self
    }

    /// Set filter for including/excluding tables.
    pub fn with_filter(mut self, filter: TableFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
