//! Reporting envelopes for suite runs and ad-hoc validations.

use crate::suite::SuiteState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Generic validation envelope: a verdict, a human-readable message and
/// arbitrary structured details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub message: String,
    pub details: HashMap<String, Value>,
}

impl ValidationReport {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid {
            write!(f, "✅ SUCCESS: {}", self.message)
        } else {
            write!(f, "❌ FAILURE: {}", self.message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of one case within a suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub status: CaseStatus,
    pub error: Option<String>,
    pub duration: Duration,
}

impl CaseReport {
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Passed,
            error: None,
            duration,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Failed,
            error: Some(error.into()),
            duration,
        }
    }

    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Skipped,
            error: None,
            duration: Duration::ZERO,
        }
    }
}

/// Aggregated outcome of a suite run.
///
/// A teardown failure is recorded here without flipping already-passed
/// cases; it does make the run as a whole fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub state: SuiteState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub setup_error: Option<String>,
    pub teardown_error: Option<String>,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.setup_error.is_none()
            && self.teardown_error.is_none()
            && self
                .cases
                .iter()
                .all(|case| case.status != CaseStatus::Failed)
    }

    pub fn failures(&self) -> Vec<&CaseReport> {
        self.cases
            .iter()
            .filter(|case| case.status == CaseStatus::Failed)
            .collect()
    }

    /// (passed, failed, skipped) counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for case in &self.cases {
            match case.status {
                CaseStatus::Passed => counts.0 += 1,
                CaseStatus::Failed => counts.1 += 1,
                CaseStatus::Skipped => counts.2 += 1,
            }
        }
        counts
    }

    pub fn summary(&self) -> ValidationReport {
        let (passed, failed, skipped) = self.counts();
        let base = if self.passed() {
            ValidationReport::ok(format!("suite '{}' passed", self.suite))
        } else if let Some(setup_error) = &self.setup_error {
            ValidationReport::fail(format!(
                "suite '{}' aborted: setup failed: {setup_error}",
                self.suite
            ))
        } else {
            ValidationReport::fail(format!("suite '{}' failed", self.suite))
        };

        let mut report = base
            .with_detail("state", Value::from(self.state.to_string()))
            .with_detail("passed", Value::from(passed))
            .with_detail("failed", Value::from(failed))
            .with_detail("skipped", Value::from(skipped));
        if let Some(teardown_error) = &self.teardown_error {
            report = report.with_detail("teardown_error", Value::from(teardown_error.clone()));
        }
        report
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (passed, failed, skipped) = self.counts();
        writeln!(
            f,
            "suite '{}' [{}]: {} passed, {} failed, {} skipped",
            self.suite, self.state, passed, failed, skipped
        )?;
        if let Some(setup_error) = &self.setup_error {
            writeln!(f, "  setup failed: {setup_error}")?;
        }
        for case in &self.cases {
            match case.status {
                CaseStatus::Passed => writeln!(f, "  ✅ {} ({:?})", case.name, case.duration)?,
                CaseStatus::Failed => writeln!(
                    f,
                    "  ❌ {}: {}",
                    case.name,
                    case.error.as_deref().unwrap_or("unknown failure")
                )?,
                CaseStatus::Skipped => writeln!(f, "  ⏭  {} (skipped)", case.name)?,
            }
        }
        if let Some(teardown_error) = &self.teardown_error {
            writeln!(f, "  teardown failed: {teardown_error}")?;
        }
        Ok(())
    }
}
