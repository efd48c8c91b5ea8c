use crate::model::DatabaseSchema;
use crate::report::CompareReport;

/// Result of checking a database against a declared model.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// True when any finding is not Ok and not ignored, or a declared table
    /// could not be compared
    pub has_errors: bool,
    pub report: CompareReport,
}

/// Result of introspecting a database.
#[derive(Debug, Clone)]
pub struct IntrospectResult {
    pub schema: DatabaseSchema,
    pub fingerprint: String,
}

impl IntrospectResult {
    /// The schema in the declared-model JSON format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.schema)
    }
}
