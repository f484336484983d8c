//! Fuel-native secp256k1 compact signatures.
//!
//! A signature is 64 bytes `r || s` with low-S normalization. The recovery
//! bit (y-parity) is stored in the otherwise unused high bit of `s`.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use zeroize::Zeroize;

use crate::address::Address;
use crate::error::FuelError;
use crate::types::Bytes32;

/// Sign a 32-byte message hash with a secp256k1 private key.
pub fn sign_fuel(private_key: &[u8; 32], message_hash: &Bytes32) -> Result<[u8; 64], FuelError> {
    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| FuelError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    let signing_key = signing_key?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash_recoverable(&message_hash.0)
        .map_err(|e| FuelError::SigningError(e.to_string()))?;

    let mut out = [0u8; 64];
    out.copy_from_slice(&signature.to_bytes());
    if recovery_id.is_y_odd() {
        out[32] |= 0x80;
    }
    Ok(out)
}

/// Recover the 64-byte uncompressed public key (without the 0x04 tag).
pub fn recover_public_key(
    message_hash: &Bytes32,
    signature: &[u8; 64],
) -> Result<[u8; 64], FuelError> {
    let mut bytes = *signature;
    let is_y_odd = bytes[32] & 0x80 != 0;
    bytes[32] &= 0x7f;

    let signature = Signature::from_slice(&bytes)
        .map_err(|e| FuelError::RecoveryError(format!("malformed signature: {e}")))?;
    let recovery_id = RecoveryId::new(is_y_odd, false);

    let key = VerifyingKey::recover_from_prehash(&message_hash.0, &signature, recovery_id)
        .map_err(|e| FuelError::RecoveryError(e.to_string()))?;

    Ok(uncompressed_64(&key))
}

/// Recover the address that produced `signature` over `message_hash`.
pub fn recover_fuel_signer(
    message_hash: &Bytes32,
    signature: &[u8; 64],
) -> Result<Address, FuelError> {
    recover_public_key(message_hash, signature).map(|pk| Address::from_public_key(&pk))
}

/// Public key for a private key, in the 64-byte form addresses are derived from.
pub fn public_key_from_private(private_key: &[u8; 32]) -> Result<[u8; 64], FuelError> {
    let signing_key = SigningKey::from_bytes(private_key.into())
        .map_err(|e| FuelError::InvalidPrivateKey(e.to_string()))?;
    Ok(uncompressed_64(signing_key.verifying_key()))
}

fn uncompressed_64(key: &VerifyingKey) -> [u8; 64] {
    let point = key.to_encoded_point(false);
    let mut out = [0u8; 64];
    out.copy_from_slice(&point.as_bytes()[1..]);
    out
}
