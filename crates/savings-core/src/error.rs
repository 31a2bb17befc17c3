use thiserror::Error;

#[derive(Debug, Error)]
pub enum SavingsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Failed to load '{path}': {reason}")]
    DataLoad { path: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for SavingsError {
    fn from(e: serde_json::Error) -> Self {
        SavingsError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "bank")]
impl From<csv::Error> for SavingsError {
    fn from(e: csv::Error) -> Self {
        SavingsError::Csv(e.to_string())
    }
}
