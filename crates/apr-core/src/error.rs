use thiserror::Error;

#[derive(Debug, Error)]
pub enum AprError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Cannot add a line item after the series has been marked complete")]
    SeriesCompleted,

    #[error("Line item series has not been marked complete")]
    NotCompleted,

    #[error("Unresolvable period: {0}")]
    UnresolvablePeriod(String),

    #[error("Line items must be set before calculating an APR")]
    MissingSeries,

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Convergence failure: APR did not converge after {iterations} iterations (final balance: {final_balance})")]
    ConvergenceFailure { iterations: u32, final_balance: f64 },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AprError {
    fn from(e: serde_json::Error) -> Self {
        AprError::SerializationError(e.to_string())
    }
}
