use thiserror::Error;

use chain_fuel::FuelError;

/// Failure reported by a network provider, passed through unmodified.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
    /// Library-specific details (GraphQL error extensions and the like).
    pub metadata: Option<serde_json::Value>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(message: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            metadata: Some(metadata),
        }
    }
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid data in {field}: {reason}")]
    InvalidData { field: &'static str, reason: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid vault config: {0}")]
    InvalidConfig(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Fuel: {0}")]
    Fuel(#[from] FuelError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No passkey identity in session")]
    MissingIdentity,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VaultError {
    pub(crate) fn invalid_data(field: &'static str, reason: impl Into<String>) -> Self {
        VaultError::InvalidData {
            field,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::Serialization(e.to_string())
    }
}
