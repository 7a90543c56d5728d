use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropInvestError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Infeasible constraint: {0}")]
    InfeasibleConstraint(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    NotConverged {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Undefined metric: {metric}: {reason}")]
    UndefinedMetric { metric: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PropInvestError {
    fn from(e: serde_json::Error) -> Self {
        PropInvestError::SerializationError(e.to_string())
    }
}
