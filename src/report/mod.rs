use crate::compare::{
    CompareAttributes, CompareLog, CompareLogs, CompareOutcome, CompareState, CompareType,
    ConstructError,
};
use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Accepted finding. A log entry matching a rule stays in the report but no
/// longer fails the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    #[serde(rename = "type")]
    pub compare_type: CompareType,
    #[serde(default)]
    pub state: Option<CompareState>,
    /// Glob over the construct name, or `table.name` for child constructs.
    #[serde(default)]
    pub name: Option<String>,
    /// Matches when the entry shares at least one attribute.
    #[serde(default)]
    pub attributes: Option<CompareAttributes>,
}

impl IgnoreRule {
    pub fn new(compare_type: CompareType) -> Self {
        Self {
            compare_type,
            state: None,
            name: None,
            attributes: None,
        }
    }

    pub fn validate(&self) -> Result<(), glob::PatternError> {
        if let Some(name) = &self.name {
            Pattern::new(name)?;
        }
        Ok(())
    }

    pub fn matches(&self, log: &CompareLog) -> bool {
        if log.compare_type() != self.compare_type {
            return false;
        }
        if self.state.is_some_and(|state| state != log.state()) {
            return false;
        }
        if let Some(attributes) = self.attributes {
            let hit = if attributes.is_empty() {
                log.attributes().is_empty()
            } else {
                log.attributes().intersects(attributes)
            };
            if !hit {
                return false;
            }
        }
        match &self.name {
            None => true,
            Some(name) => match Pattern::new(name) {
                Ok(pattern) => {
                    pattern.matches(log.name())
                        || log
                            .table()
                            .is_some_and(|table| pattern.matches(&format!("{table}.{}", log.name())))
                }
                Err(_) => false,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub ok: usize,
    pub different: usize,
    pub not_in_database: usize,
    pub extra_in_database: usize,
    pub ignored: usize,
    pub construct_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareReport {
    logs: CompareLogs,
    construct_errors: Vec<ConstructError>,
    ignored: Vec<bool>,
    pub expected_fingerprint: Option<String>,
    pub actual_fingerprint: Option<String>,
}

impl CompareReport {
    pub fn new(outcome: CompareOutcome) -> Self {
        let ignored = vec![false; outcome.logs.len()];
        Self {
            logs: outcome.logs,
            construct_errors: outcome.construct_errors,
            ignored,
            expected_fingerprint: None,
            actual_fingerprint: None,
        }
    }

    pub fn with_ignore_rules(mut self, rules: &[IgnoreRule]) -> Self {
        self.ignored = self
            .logs
            .iter()
            .map(|log| log.state().is_error() && rules.iter().any(|r| r.matches(log)))
            .collect();
        self
    }

    pub fn with_fingerprints(mut self, expected: String, actual: String) -> Self {
        self.expected_fingerprint = Some(expected);
        self.actual_fingerprint = Some(actual);
        self
    }

    /// Every entry of the run, in discovery order, ignored ones included.
    pub fn logs(&self) -> &[CompareLog] {
        self.logs.as_slice()
    }

    pub fn construct_errors(&self) -> &[ConstructError] {
        &self.construct_errors
    }

    pub fn is_ignored(&self, index: usize) -> bool {
        self.ignored.get(index).copied().unwrap_or(false)
    }

    /// Non-Ok entries that no ignore rule accepted.
    pub fn errors(&self) -> impl Iterator<Item = &CompareLog> {
        self.logs
            .iter()
            .enumerate()
            .filter(move |(i, log)| log.state().is_error() && !self.is_ignored(*i))
            .map(|(_, log)| log)
    }

    pub fn has_errors(&self) -> bool {
        !self.construct_errors.is_empty() || self.errors().next().is_some()
    }

    pub fn count(&self, state: CompareState) -> usize {
        self.logs.iter().filter(|l| l.state() == state).count()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            ok: self.count(CompareState::Ok),
            different: self.count(CompareState::Different),
            not_in_database: self.count(CompareState::NotInDatabase),
            extra_in_database: self.count(CompareState::ExtraInDatabase),
            ignored: self.ignored.iter().filter(|i| **i).count(),
            construct_errors: self.construct_errors.len(),
        }
    }

    pub fn render_text(&self, show_ok: bool) -> String {
        let mut output = String::new();
        output.push_str("=== schemaprobe check ===\n");

        for compare_type in CompareType::ALL {
            let lines: Vec<String> = self
                .logs
                .iter()
                .enumerate()
                .filter(|(_, log)| log.compare_type() == compare_type)
                .filter(|(_, log)| show_ok || log.state().is_error())
                .map(|(i, log)| {
                    let marker = match (log.state().is_error(), self.is_ignored(i)) {
                        (false, _) => "✓",
                        (true, true) => "-",
                        (true, false) => "✗",
                    };
                    let suffix = if self.is_ignored(i) { " (ignored)" } else { "" };
                    format!("  {marker} {log}{suffix}\n")
                })
                .collect();

            if lines.is_empty() {
                continue;
            }
            output.push('\n');
            output.push_str(&format!("{compare_type}:\n"));
            for line in lines {
                output.push_str(&line);
            }
        }

        if !self.construct_errors.is_empty() {
            output.push('\n');
            output.push_str("Configuration errors:\n");
            for error in &self.construct_errors {
                output.push_str(&format!("  ✗ {error}\n"));
            }
        }

        if let (Some(expected), Some(actual)) = (&self.expected_fingerprint, &self.actual_fingerprint) {
            output.push('\n');
            output.push_str(&format!("Expected fingerprint: {expected}\n"));
            output.push_str(&format!("Actual fingerprint:   {actual}\n"));
        }

        let summary = self.summary();
        output.push('\n');
        output.push_str(&format!(
            "Summary: {} ok, {} different, {} not in database, {} extra in database, {} ignored\n",
            summary.ok,
            summary.different,
            summary.not_in_database,
            summary.extra_in_database,
            summary.ignored
        ));
        output.push_str(&format!(
            "Result: {}\n",
            if self.has_errors() { "FAIL" } else { "PASS" }
        ));

        output
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        let view = ReportView {
            has_errors: self.has_errors(),
            summary: self.summary(),
            logs: self
                .logs
                .iter()
                .enumerate()
                .map(|(i, log)| LogView {
                    log,
                    ignored: self.is_ignored(i),
                })
                .collect(),
            construct_errors: &self.construct_errors,
            expected_fingerprint: self.expected_fingerprint.as_deref(),
            actual_fingerprint: self.actual_fingerprint.as_deref(),
        };
        serde_json::to_string_pretty(&view)
    }
}

#[derive(Serialize)]
struct ReportView<'a> {
    has_errors: bool,
    summary: ReportSummary,
    logs: Vec<LogView<'a>>,
    construct_errors: &'a [ConstructError],
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_fingerprint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_fingerprint: Option<&'a str>,
}

#[derive(Serialize)]
struct LogView<'a> {
    #[serde(flatten)]
    log: &'a CompareLog,
    ignored: bool,
}
