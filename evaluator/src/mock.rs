//! Canned-response evaluator for harness tests.
//!
//! A `MockEvaluator` is programmed per test with `set_result`/`set_error`
//! and answers `evaluate` without touching a real calculator backend.
//! Lookup order: canned results, then canned errors, then a small built-in
//! table of literal expressions, then `UnknownExpression`.
//!
//! Instances are not internally synchronized. Concurrent cases each own
//! their own instance; sharing one across tasks requires external locking.

use crate::provider::{EvalError, EvalResult, Evaluator};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MockEvaluator {
    results: HashMap<String, f64>,
    errors: HashMap<String, EvalError>,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    /// Record a canned numeric result for an expression, overwriting any
    /// prior result. An error recorded for the same expression stays in
    /// place but is shadowed by the result-first lookup order.
    pub fn set_result(&mut self, expression: impl Into<String>, value: f64) {
        self.results.insert(expression.into(), value);
    }

    /// Record a canned failure for an expression, overwriting any prior
    /// error for it.
    pub fn set_error(&mut self, expression: impl Into<String>, error: EvalError) {
        self.errors.insert(expression.into(), error);
    }

    pub fn configured_results(&self) -> usize {
        self.results.len()
    }

    pub fn configured_errors(&self) -> usize {
        self.errors.len()
    }

    /// Built-in answers for a handful of literal expressions, so an
    /// unprogrammed mock still behaves like a minimal calculator.
    fn fallback(expression: &str) -> Option<EvalResult<f64>> {
        match expression {
            "2 + 3" => Some(Ok(5.0)),
            "10 - 4" => Some(Ok(6.0)),
            "3 * 4" => Some(Ok(12.0)),
            "15 / 3" => Some(Ok(5.0)),
            "10 / 0" => Some(Err(EvalError::DivisionByZero {
                expression: expression.to_string(),
            })),
            _ => None,
        }
    }
}

#[async_trait]
impl Evaluator for MockEvaluator {
    async fn evaluate(&self, expression: &str) -> EvalResult<f64> {
        if let Some(value) = self.results.get(expression) {
            debug!(expression, value = *value, "returning canned result");
            return Ok(*value);
        }

        if let Some(error) = self.errors.get(expression) {
            debug!(expression, %error, "returning canned error");
            return Err(error.clone());
        }

        if let Some(result) = Self::fallback(expression) {
            debug!(expression, "answering from fallback table");
            return result;
        }

        Err(EvalError::UnknownExpression {
            expression: expression.to_string(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
