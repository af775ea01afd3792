use thiserror::Error;

use crate::payment::PaymentError;

/// Unified error type for the domain, service and storage layers.
#[derive(Debug, Error)]
pub enum AutoServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

pub type Result<T> = std::result::Result<T, AutoServeError>;
