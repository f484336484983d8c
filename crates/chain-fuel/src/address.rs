use std::fmt;
use std::str::FromStr;

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32m, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::FuelError;
use crate::types::parse_hex32;

/// Human-readable prefix of ordinary account, contract and predicate addresses.
pub const FUEL_PREFIX: &str = "fuel";

/// Human-readable prefix of passkey-controlled addresses.
///
/// The bytes are identical to any other address; the prefix is only a tag
/// consumed by authentication flows.
pub const PASSKEY_PREFIX: &str = "passkey";

const FUEL_HRP: Hrp = Hrp::parse_unchecked(FUEL_PREFIX);
const PASSKEY_HRP: Hrp = Hrp::parse_unchecked(PASSKEY_PREFIX);

/// A 32-byte Fuel address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const fn zeroed() -> Self {
        Self([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Address owned by a secp256k1 key: SHA-256 of the 64-byte uncompressed
    /// public key (without the 0x04 tag).
    pub fn from_public_key(public_key: &[u8; 64]) -> Self {
        Self(Sha256::digest(public_key).into())
    }

    /// Parse a `0x`-prefixed (or bare) 64 character hex address.
    pub fn from_hex(s: &str) -> Result<Self, FuelError> {
        parse_hex32(s)
            .map(Self)
            .map_err(|e| FuelError::InvalidAddress(e.to_string()))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// The bech32m form under the default `fuel` prefix.
    pub fn to_readable(&self) -> String {
        to_readable(self)
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Accepts either raw hex or a bech32m string with a known prefix.
impl FromStr for Address {
    type Err = FuelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            from_readable(s)
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Encode a raw address as bech32m under the `fuel` prefix.
pub fn to_readable(address: &Address) -> String {
    encode_with_hrp(FUEL_HRP, address)
}

/// Encode a raw address as bech32m under an arbitrary prefix.
pub fn to_readable_with_prefix(address: &Address, prefix: &str) -> Result<String, FuelError> {
    let hrp = Hrp::parse(prefix)
        .map_err(|e| FuelError::InvalidAddress(format!("invalid prefix {prefix:?}: {e}")))?;
    Ok(encode_with_hrp(hrp, address))
}

/// Encode a raw address under the passkey namespace.
pub fn to_passkey_readable(address: &Address) -> String {
    encode_with_hrp(PASSKEY_HRP, address)
}

fn encode_with_hrp(hrp: Hrp, address: &Address) -> String {
    // 32 bytes is far below the bech32 code length limit.
    match bech32::encode::<Bech32m>(hrp, &address.0) {
        Ok(encoded) => encoded,
        Err(e) => unreachable!("32-byte payload exceeds bech32m limits: {e}"),
    }
}

/// Decode a bech32m address.
///
/// Fails if the checksum is invalid, the prefix is neither `fuel` nor
/// `passkey`, or the payload is not exactly 32 bytes.
pub fn from_readable(readable: &str) -> Result<Address, FuelError> {
    let (prefix, address) = decode_any(readable)?;
    if prefix != FUEL_PREFIX && prefix != PASSKEY_PREFIX {
        return Err(FuelError::Decode(format!("unrecognized prefix {prefix:?}")));
    }
    Ok(address)
}

/// Whether a bech32m string carries the passkey prefix.
///
/// Malformed input yields `false`.
pub fn is_passkey_namespace(readable: &str) -> bool {
    matches!(decode_any(readable), Ok((prefix, _)) if prefix == PASSKEY_PREFIX)
}

fn decode_any(readable: &str) -> Result<(String, Address), FuelError> {
    let checked = CheckedHrpstring::new::<Bech32m>(readable)
        .map_err(|e| FuelError::Decode(format!("invalid bech32m: {e}")))?;

    let prefix = checked.hrp().to_lowercase();
    let payload: Vec<u8> = checked.byte_iter().collect();

    let bytes: [u8; 32] = payload.as_slice().try_into().map_err(|_| {
        FuelError::Decode(format!("expected 32 byte payload, got {}", payload.len()))
    })?;

    Ok((prefix, Address(bytes)))
}
