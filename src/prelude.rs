//! Convenient re-exports for common schemaprobe usage.
//!
//! # Example
//!
//! ```no_run
//! use schemaprobe::prelude::*;
//!
//! let result = check_blocking(
//!     CheckOptions::new(vec!["toml:model.toml".into()], "postgres://localhost/mydb")
//!         .with_ignore_tables(vec!["_sqlx_migrations".into()]),
//! ).unwrap();
//!
//! println!("{} findings", result.report.errors().count());
//! ```

// Async functions
pub use crate::api::{check, check_declared, introspect};

// Blocking functions
pub use crate::api::{check_blocking, check_declared_blocking, introspect_blocking};

// Options and results
pub use crate::api::{CheckOptions, CheckResult, IntrospectOptions, IntrospectResult};

// Error types
pub use crate::api::Error;

// Core types
pub use crate::compare::{
    compare_schemas, CompareAttributes, CompareLog, CompareLogger, CompareLogs, CompareOutcome,
    CompareSettings, CompareState, CompareType, ConstructError,
};
pub use crate::filter::TableFilter;
pub use crate::introspect::Provider;
pub use crate::model::{DatabaseSchema, NameComparison};
pub use crate::report::{CompareReport, IgnoreRule};
