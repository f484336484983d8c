//! EIP-55 helpers for EVM addresses embedded in 32-byte Fuel addresses.
//!
//! An EVM account on Fuel is represented as the 20-byte address left-padded
//! with 12 zero bytes.

use sha3::{Digest, Keccak256};

use crate::error::FuelError;

/// Applies EIP-55 mixed-case checksum encoding to a 20-byte hex address.
///
/// Accepts `0x` + 40 hex characters in any case and returns the checksummed
/// form.
pub fn checksum_address(address: &str) -> Result<String, FuelError> {
    let hex_part = strip_0x(address).to_lowercase();

    if hex_part.len() != 40 {
        return Err(FuelError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FuelError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    let hash = Keccak256::digest(hex_part.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (i, c) in hex_part.chars().enumerate() {
        // High nibble for even positions, low nibble for odd.
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}

/// Validates a 20-byte EVM address string.
///
/// All-lowercase and all-uppercase addresses carry no checksum and are
/// accepted; mixed case must match the EIP-55 checksum.
pub fn validate_address(address: &str) -> Result<bool, FuelError> {
    let hex_part = strip_0x(address);

    if hex_part.len() != 40 {
        return Err(FuelError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FuelError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    let checksummed = checksum_address(hex_part)?;
    Ok(checksummed[2..] == *hex_part)
}

/// Whether a 32-byte hex value is a zero-left-padded EVM address with a
/// valid checksum.
///
/// Never fails: any malformed input yields `false`.
pub fn is_evm_compatible(raw: &str) -> bool {
    let hex_part = strip_0x(raw);
    if hex_part.len() != 64 || !hex_part.is_ascii() {
        return false;
    }

    let (padding, tail) = hex_part.split_at(24);
    if !padding.chars().all(|c| c == '0') {
        return false;
    }

    validate_address(tail).unwrap_or(false)
}

/// Left-pad a 20-byte EVM address into the 32-byte Fuel representation.
pub fn evm_to_b256(address: &str) -> Result<[u8; 32], FuelError> {
    let hex_part = strip_0x(address);
    if hex_part.len() != 40 {
        return Err(FuelError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }
    let bytes = hex::decode(hex_part)
        .map_err(|e| FuelError::InvalidAddress(format!("invalid hex: {e}")))?;

    let mut out = [0u8; 32];
    out[12..].copy_from_slice(&bytes);
    Ok(out)
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
