use thiserror::Error;

#[derive(Error, Debug)]
pub enum DsaError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("randomness source unavailable: {0}")]
    Randomness(String),

    #[error("internal computation error: {0}")]
    Internal(String),

    #[error("parameter generation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DsaError>;
