use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EvalError {
    #[error("Unknown expression: {expression}")]
    UnknownExpression { expression: String },

    #[error("Division by zero: {expression}")]
    DivisionByZero { expression: String },

    #[error("Simulated failure: {message}")]
    Simulated { message: String },
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Seam to whatever actually evaluates calculator expressions. Production
/// backends sit behind this trait; harness tests program a [`crate::mock::MockEvaluator`].
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, expression: &str) -> EvalResult<f64>;

    fn name(&self) -> &str;
}
