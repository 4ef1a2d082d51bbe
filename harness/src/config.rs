use crate::tolerance::DEFAULT_EPSILON;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Knobs for the built-in verification scenarios and suite defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Concurrent workers for the isolation stress case.
    pub workers: usize,
    /// Evaluations each worker performs.
    pub ops_per_worker: usize,
    /// Advisory deadline handed to each case.
    pub default_deadline: Duration,
    /// Tolerance for comparing evaluated values against fixtures.
    pub epsilon: f64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            ops_per_worker: 100,
            default_deadline: Duration::from_secs(5),
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_ops_per_worker(mut self, ops_per_worker: usize) -> Self {
        self.ops_per_worker = ops_per_worker;
        self
    }

    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Worker count must be greater than 0".to_string());
        }

        if self.ops_per_worker == 0 {
            return Err("Operations per worker must be greater than 0".to_string());
        }

        if self.default_deadline.is_zero() {
            return Err("Default deadline must be greater than 0".to_string());
        }

        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err("Epsilon must be a finite, non-negative number".to_string());
        }

        Ok(())
    }
}
