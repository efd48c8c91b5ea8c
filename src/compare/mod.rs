//! Paired traversal of a declared schema and an introspected one.
//!
//! [`compare_schemas`] walks the declared tables in declaration order, finds
//! each one's actual counterpart under the provider's identifier rule and
//! records one [`CompareLog`] per comparison step. Findings never fail the
//! traversal; a declared table the provider cannot represent becomes a
//! [`ConstructError`] and its subtree is skipped.

mod columns;
mod engine;
mod foreign_keys;
mod keys;
pub mod log;
pub mod logger;

pub use engine::compare_schemas;
pub use log::{CompareAttributes, CompareLog, CompareState, CompareType};
pub use logger::{CompareLogger, CompareLogs};

use crate::filter::TableFilter;
use crate::introspect::{Capabilities, Provider};
use crate::model::NameComparison;
use serde::Serialize;
use thiserror::Error;

/// Inputs of a compare run other than the two schema trees.
#[derive(Debug, Clone)]
pub struct CompareSettings {
    pub capabilities: Capabilities,
    pub name_comparison: NameComparison,
    /// Actual tables excluded here are never reported as extra.
    pub table_filter: TableFilter,
}

impl CompareSettings {
    pub fn for_provider(provider: Provider) -> Self {
        let capabilities = provider.capabilities();
        Self {
            name_comparison: capabilities.name_comparison,
            capabilities,
            table_filter: TableFilter::default(),
        }
    }

    pub fn with_name_comparison(mut self, name_comparison: NameComparison) -> Self {
        self.name_comparison = name_comparison;
        self
    }

    pub fn with_table_filter(mut self, table_filter: TableFilter) -> Self {
        self.table_filter = table_filter;
        self
    }

    pub fn default_schema(&self) -> &'static str {
        self.capabilities.default_schema
    }

    /// The schema a table lives in once a missing schema is defaulted.
    pub fn effective_schema<'a>(&self, schema: Option<&'a str>) -> &'a str {
        schema.unwrap_or(self.capabilities.default_schema)
    }
}

/// A declared table that uses a construct the active provider cannot
/// represent. The table is not compared.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{table}: {message}")]
pub struct ConstructError {
    pub table: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompareOutcome {
    pub logs: CompareLogs,
    pub construct_errors: Vec<ConstructError>,
}

impl CompareOutcome {
    pub fn has_errors(&self) -> bool {
        !self.construct_errors.is_empty() || self.logs.iter().any(|l| l.state().is_error())
    }
}

pub(crate) fn join_columns(columns: &[String]) -> String {
    columns.join(", ")
}
