//! Normalises raw network failures into a stable set of error codes.

use std::error::Error as StdError;

use log::warn;
use serde::Serialize;
use thiserror::Error;

use crate::error::{ProviderError, VaultError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UtxoNotExists,
    PredicateValidationFailed,
    PredicateVerificationFailed,
    NotEnoughCoins,
    MaxCoinsReached,
    InsufficientMaxFee,
    InsufficientFeeAmount,
    HashAlreadyKnown,
    OutOfGas,
    Default,
}

/// Checked in order; the first substring contained in the message wins.
const PATTERNS: &[(ErrorCode, &str)] = &[
    (ErrorCode::UtxoNotExists, "UTXO does not exist"),
    (ErrorCode::PredicateValidationFailed, "PredicateReturnedNonOne"),
    (ErrorCode::PredicateVerificationFailed, "PredicateVerificationFailed"),
    (ErrorCode::NotEnoughCoins, "not enough coins to fit the target"),
    (ErrorCode::MaxCoinsReached, "max number of coins is reached"),
    (ErrorCode::InsufficientMaxFee, "InsufficientMaxFee"),
    (ErrorCode::InsufficientFeeAmount, "InsufficientFeeAmount"),
    (ErrorCode::HashAlreadyKnown, "Hash is already known"),
    (ErrorCode::OutOfGas, "OutOfGas"),
];

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{code:?}: {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub metadata: serde_json::Value,
}

fn classify(message: &str) -> ErrorCode {
    PATTERNS
        .iter()
        .find(|(_, needle)| message.contains(needle))
        .map(|(code, _)| *code)
        .unwrap_or(ErrorCode::Default)
}

pub fn parse(message: &str, metadata: Option<serde_json::Value>) -> DomainError {
    let code = classify(message);
    if code == ErrorCode::Default {
        warn!("unrecognised network error: {message}");
    }
    DomainError {
        code,
        message: message.to_string(),
        metadata: metadata.unwrap_or(serde_json::Value::Null),
    }
}

/// Classify any error by its display text.
pub fn parse_error(error: &dyn StdError) -> DomainError {
    parse(&error.to_string(), None)
}

pub fn parse_provider_error(error: &ProviderError) -> DomainError {
    parse(&error.message, error.metadata.clone())
}

/// Provider failures keep their metadata; everything else is classified
/// by message.
pub fn parse_vault_error(error: &VaultError) -> DomainError {
    match error {
        VaultError::Provider(inner) => parse_provider_error(inner),
        other => parse_error(other),
    }
}

impl From<VaultError> for DomainError {
    fn from(error: VaultError) -> Self {
        parse_vault_error(&error)
    }
}
