use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Event error: {0}")]
    EventError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Payment {0} already exists")]
    DuplicatePayment(String),
    #[error("Payment {0} not found")]
    UnknownPayment(String),
    #[error("Position {0} is held by payment {1}")]
    PositionConflict(usize, String),
    #[error("Unsupported event kind: {0}")]
    UnsupportedEvent(String),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
