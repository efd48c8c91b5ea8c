//! schemaprobe - checks a live database schema against a declared model.
//!
//! The declared model is plain data (JSON or TOML). The live schema is read
//! back through a per-backend introspector, and the two trees are compared
//! construct by construct. Every comparison step is recorded as a
//! [`CompareLog`](compare::CompareLog); the [`report`] decides whether the
//! run passes.
//!
//! # Quick Start
//!
//! ```no_run
//! use schemaprobe::prelude::*;
//!
//! let result = check_blocking(CheckOptions::new(
//!     vec!["json:model.json".into()],
//!     "sqlite://app.db",
//! )).unwrap();
//!
//! print!("{}", result.report.render_text(false));
//! ```
//!
//! # Modules
//!
//! - [`api`] - High-level API mirroring CLI commands
//! - [`compare`] - Comparison engine and the finding log
//! - [`introspect`] - Reading the actual schema from PostgreSQL or SQLite
//! - [`model`] - Schema tree shared by the declared and actual sides
//! - [`report`] - Pass/fail, ignore rules and rendering

pub mod api;
pub mod compare;
pub mod config;
pub mod filter;
pub mod introspect;
pub mod loader;
pub mod logging;
pub mod model;
pub mod prelude;
pub mod report;
pub mod util;
