use thiserror::Error;

/// Fuel chain operation errors.
#[derive(Debug, Error)]
pub enum FuelError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("recovery error: {0}")]
    RecoveryError(String),
}
