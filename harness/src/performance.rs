//! Duration thresholds for named operation categories.
//!
//! A `PerformanceGate` holds a fixed registry of per-category thresholds
//! and validates observed durations against them. Exceeding the maximum is
//! an error; landing between the warning mark and the maximum succeeds but
//! is logged at warn level.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerformanceError {
    #[error("Unknown operation category: {operation}")]
    UnknownOperation { operation: String },

    #[error("{operation} took {observed:?}, over the {max:?} maximum")]
    ThresholdExceeded {
        operation: String,
        observed: Duration,
        max: Duration,
    },
}

pub type PerformanceResult<T> = Result<T, PerformanceError>;

/// Duration budget for one operation category. `warning <= max` is a
/// convention the constructors do not enforce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationThreshold {
    pub operation: String,
    pub max: Duration,
    pub warning: Duration,
}

impl DurationThreshold {
    pub fn new(operation: impl Into<String>, max: Duration, warning: Duration) -> Self {
        Self {
            operation: operation.into(),
            max,
            warning,
        }
    }

    pub fn from_millis(operation: impl Into<String>, max_ms: u64, warning_ms: u64) -> Self {
        Self::new(
            operation,
            Duration::from_millis(max_ms),
            Duration::from_millis(warning_ms),
        )
    }
}

/// Registry of duration thresholds, fixed after construction.
#[derive(Debug, Clone, Default)]
pub struct PerformanceGate {
    thresholds: HashMap<String, DurationThreshold>,
}

impl PerformanceGate {
    /// Empty registry. Callers extend it with [`Self::with_threshold`]
    /// before validating.
    pub fn new() -> Self {
        Self {
            thresholds: HashMap::new(),
        }
    }

    /// Registry with the stock calculator operation categories.
    pub fn with_default_thresholds() -> Self {
        Self::new()
            .with_threshold(DurationThreshold::from_millis("simple_operation", 1, 0))
            .with_threshold(DurationThreshold::from_millis("complex_operation", 5, 2))
            .with_threshold(DurationThreshold::from_millis("error_handling", 1, 0))
            .with_threshold(DurationThreshold::from_millis("data_access", 10, 5))
    }

    pub fn with_threshold(mut self, threshold: DurationThreshold) -> Self {
        self.thresholds
            .insert(threshold.operation.clone(), threshold);
        self
    }

    pub fn thresholds(&self) -> impl Iterator<Item = &DurationThreshold> {
        self.thresholds.values()
    }

    pub fn validate(&self, operation: &str, observed: Duration) -> PerformanceResult<()> {
        let threshold = self.thresholds.get(operation).ok_or_else(|| {
            PerformanceError::UnknownOperation {
                operation: operation.to_string(),
            }
        })?;

        if observed > threshold.max {
            return Err(PerformanceError::ThresholdExceeded {
                operation: operation.to_string(),
                observed,
                max: threshold.max,
            });
        }

        if observed > threshold.warning {
            warn!(
                operation,
                observed_us = observed.as_micros() as u64,
                warning_us = threshold.warning.as_micros() as u64,
                "operation over warning threshold"
            );
        }

        Ok(())
    }
}
