//! `schemaprobe.toml` handling.
//!
//! Every field is optional. Values given on the command line win over the
//! file.

use crate::api::CheckOptions;
use crate::introspect::Provider;
use crate::model::NameComparison;
use crate::report::IgnoreRule;
use crate::util::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub database_url: Option<String>,
    /// Model sources, as accepted by `--model`.
    #[serde(default)]
    pub model: Vec<String>,
    #[serde(default)]
    pub target_schemas: Vec<String>,
    #[serde(default)]
    pub name_comparison: Option<NameComparison>,
    #[serde(default)]
    pub ignore_tables: Vec<String>,
    #[serde(default)]
    pub connect_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub ignore: Vec<IgnoreRule>,
}

/// Load configuration from a TOML file.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<ProbeConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        SchemaError::ConfigError(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    ProbeConfig::from_toml_str(&content)
}

impl ProbeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ProbeConfig = toml::from_str(content)
            .map_err(|e| SchemaError::ConfigError(format!("Failed to parse config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects glob patterns that would never match.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignore_tables {
            glob::Pattern::new(pattern).map_err(|e| {
                SchemaError::ConfigError(format!("Invalid ignore_tables pattern '{pattern}': {e}"))
            })?;
        }
        for rule in &self.ignore {
            rule.validate().map_err(|e| {
                SchemaError::ConfigError(format!(
                    "Invalid ignore rule name '{}': {e}",
                    rule.name.as_deref().unwrap_or_default()
                ))
            })?;
        }
        Ok(())
    }

    /// Fills every option the caller left unset from this file. List options
    /// from the file are used only when the caller gave none; ignore rules
    /// and ignored tables are added to the caller's.
    pub fn apply_to(self, mut options: CheckOptions) -> CheckOptions {
        if options.model_sources.is_empty() {
            options.model_sources = self.model;
        }
        if options.database_url.is_empty() {
            options.database_url = self.database_url.unwrap_or_default();
        }
        if options.provider.is_none() {
            options.provider = self.provider;
        }
        if options.target_schemas.is_empty() {
            options.target_schemas = self.target_schemas;
        }
        if options.name_comparison.is_none() {
            options.name_comparison = self.name_comparison;
        }
        if let Some(seconds) = self.connect_timeout_seconds {
            if options.connect_timeout == crate::api::DEFAULT_CONNECT_TIMEOUT {
                options.connect_timeout = Duration::from_secs(seconds);
            }
        }
        options.ignore_tables.extend(self.ignore_tables);
        options.ignore_rules.extend(self.ignore);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{CompareAttributes, CompareState, CompareType};
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
        provider = "postgres"
        database_url = "postgres://localhost/library"
        model = ["json:model/library.json"]
        target_schemas = ["public", "audit"]
        name_comparison = "case_insensitive"
        ignore_tables = ["_sqlx_migrations", "audit.*"]
        connect_timeout_seconds = 5

        [[ignore]]
        type = "Column"
        state = "Different"
        name = "Books.UpdatedAt"
        attributes = ["DefaultSql"]

        [[ignore]]
        type = "Index"
        state = "ExtraInDatabase"
    "#;

    #[test]
    fn parses_full_config() {
        let config = ProbeConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.provider, Some(Provider::Postgres));
        assert_eq!(config.target_schemas, vec!["public", "audit"]);
        assert_eq!(config.name_comparison, Some(NameComparison::CaseInsensitive));
        assert_eq!(config.ignore.len(), 2);
        assert_eq!(config.ignore[0].compare_type, CompareType::Column);
        assert_eq!(config.ignore[0].attributes, Some(CompareAttributes::DEFAULT_SQL));
        assert_eq!(config.ignore[1].state, Some(CompareState::ExtraInDatabase));
        assert_eq!(config.ignore[1].name, None);
    }

    #[test]
    fn empty_config_is_valid() {
        assert_eq!(ProbeConfig::from_toml_str("").unwrap(), ProbeConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ProbeConfig::from_toml_str("databse_url = \"x\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let err = ProbeConfig::from_toml_str(
            r#"
            [[ignore]]
            type = "Column"
            attributes = ["Colour"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown compare attribute 'Colour'"));
    }

    #[test]
    fn invalid_table_pattern_is_rejected() {
        let err = ProbeConfig::from_toml_str(r#"ignore_tables = ["[oops"]"#).unwrap_err();
        assert!(err.to_string().contains("Invalid ignore_tables pattern '[oops'"));
    }

    #[test]
    fn command_line_values_win() {
        let config = ProbeConfig::from_toml_str(SAMPLE).unwrap();
        let options = CheckOptions::new(vec!["json:other.json".into()], "")
            .with_provider(Provider::Sqlite)
            .with_ignore_tables(vec!["tmp_*".into()]);

        let options = config.apply_to(options);

        assert_eq!(options.model_sources, vec!["json:other.json"]);
        assert_eq!(options.database_url, "postgres://localhost/library");
        assert_eq!(options.provider, Some(Provider::Sqlite));
        assert_eq!(options.target_schemas, vec!["public", "audit"]);
        assert_eq!(options.name_comparison, Some(NameComparison::CaseInsensitive));
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert_eq!(
            options.ignore_tables,
            vec!["tmp_*", "_sqlx_migrations", "audit.*"]
        );
        assert_eq!(options.ignore_rules.len(), 2);
    }

    #[test]
    fn loads_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schemaprobe.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.model, vec!["json:model/library.json"]);

        let err = load_from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
