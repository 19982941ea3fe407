use thiserror::Error;

#[derive(Debug, Error)]
pub enum SellerFinanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SellerFinanceError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        SellerFinanceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for SellerFinanceError {
    fn from(e: serde_json::Error) -> Self {
        SellerFinanceError::SerializationError(e.to_string())
    }
}
