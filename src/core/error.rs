use thiserror::Error;

#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Incompatible draft payload: {0}")]
    IncompatiblePayload(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, DraftError>;

impl<T> From<std::sync::PoisonError<T>> for DraftError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DraftError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
