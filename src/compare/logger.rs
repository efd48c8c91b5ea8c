//! Recording primitives used while comparing one construct.
//!
//! A [`CompareLogs`] accumulator is created per run and passed by `&mut`
//! through the traversal. A [`CompareLogger`] borrows it for the duration of
//! one construct's comparison and appends entries tagged with its
//! [`CompareType`] and default name.

use super::log::{CompareAttributes, CompareLog, CompareState, CompareType};
use crate::util::values_equal;
use serde::Serialize;
use tracing::debug;

/// Ordered, append-only list of findings for one compare run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompareLogs {
    entries: Vec<CompareLog>,
}

impl CompareLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompareLog> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[CompareLog] {
        &self.entries
    }

    /// Appends every entry of `other`, keeping its order.
    pub fn merge(&mut self, other: CompareLogs) {
        self.entries.extend(other.entries);
    }

    pub fn into_vec(self) -> Vec<CompareLog> {
        self.entries
    }

    fn push(&mut self, log: CompareLog) -> &CompareLog {
        self.entries.push(log);
        &self.entries[self.entries.len() - 1]
    }
}

impl<'a> IntoIterator for &'a CompareLogs {
    type Item = &'a CompareLog;
    type IntoIter = std::slice::Iter<'a, CompareLog>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

pub struct CompareLogger<'a> {
    compare_type: CompareType,
    default_name: String,
    table: Option<String>,
    logs: &'a mut CompareLogs,
}

impl<'a> CompareLogger<'a> {
    pub fn new(
        compare_type: CompareType,
        default_name: impl Into<String>,
        logs: &'a mut CompareLogs,
    ) -> Self {
        Self {
            compare_type,
            default_name: default_name.into(),
            table: None,
            logs,
        }
    }

    /// Tags every entry with the table that owns the construct.
    pub fn within_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn mark_as_ok(&mut self, expected: Option<&str>, name: Option<&str>) -> &CompareLog {
        self.add(
            CompareState::Ok,
            name,
            CompareAttributes::NOT_SET,
            expected,
            None,
        )
    }

    /// Returns true and records a `Different` entry when the two values are
    /// not equal after whitespace removal. Records nothing otherwise.
    pub fn check_different(
        &mut self,
        expected: Option<&str>,
        found: Option<&str>,
        attributes: CompareAttributes,
        name: Option<&str>,
    ) -> bool {
        if values_equal(expected, found) {
            return false;
        }
        self.add(CompareState::Different, name, attributes, expected, found);
        true
    }

    pub fn different(
        &mut self,
        expected: Option<&str>,
        found: Option<&str>,
        attributes: CompareAttributes,
        name: Option<&str>,
    ) {
        self.add(CompareState::Different, name, attributes, expected, found);
    }

    pub fn not_in_database(
        &mut self,
        expected: Option<&str>,
        attributes: CompareAttributes,
        name: Option<&str>,
    ) {
        self.add(CompareState::NotInDatabase, name, attributes, expected, None);
    }

    pub fn extra_in_database(
        &mut self,
        found: Option<&str>,
        attributes: CompareAttributes,
        name: Option<&str>,
    ) {
        self.add(CompareState::ExtraInDatabase, name, attributes, None, found);
    }

    /// True while the borrowed accumulator holds no entries. Tables are
    /// compared into their own accumulator, so this is a per-table check.
    pub fn log_is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    fn add(
        &mut self,
        state: CompareState,
        name: Option<&str>,
        attributes: CompareAttributes,
        expected: Option<&str>,
        found: Option<&str>,
    ) -> &CompareLog {
        let log = CompareLog::new(
            self.compare_type,
            state,
            name.unwrap_or(self.default_name.as_str()).to_string(),
            self.table.clone(),
            attributes,
            expected.map(str::to_string),
            found.map(str::to_string),
        );
        if state.is_error() {
            debug!(finding = %log, "schema difference");
        }
        self.logs.push(log)
    }
}
