use thiserror::Error;

#[derive(Debug, Error)]
pub enum TvmError {
    #[error("Invalid rate: {rate} — {reason}")]
    InvalidRate { rate: String, reason: String },

    #[error("Invalid period count: {periods} — {reason}")]
    InvalidPeriods { periods: String, reason: String },

    #[error("Invalid principal: {principal} — principal must be greater than zero")]
    InvalidPrincipal { principal: String },

    #[error("Unknown periodicity: '{0}'")]
    UnknownPeriodicity(String),

    #[error("Incomplete input: {field} — {reason}")]
    IncompleteInput { field: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for TvmError {
    fn from(e: serde_json::Error) -> Self {
        TvmError::SerializationError(e.to_string())
    }
}
