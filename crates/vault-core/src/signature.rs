//! Vault witness encoding for signatures.
//!
//! Every witness consumed by the vault predicate has the layout:
//!
//! ```text
//! magic                  4 bytes  "BAKO" (0x42414b4f)
//! type                   u64 BE   0 = Fuel, 1 = WebAuthn
//! payload:
//!   Fuel                 signature (64)
//!   WebAuthn             signature (64)
//!                        authenticator_data_len u64 BE || authenticator_data
//!                        client_data_json_len   u64 BE || client_data_json
//! ```
//!
//! The predicate decodes this blob byte for byte. Both WebAuthn fields must
//! be non-empty and within [`MAX_AUTHENTICATOR_DATA_LEN`] and
//! [`MAX_CLIENT_DATA_JSON_LEN`], on encode and on decode alike.

use serde::{Deserialize, Serialize};

use chain_fuel::{recover_fuel_signer, Address, Bytes32};

use crate::error::VaultError;

pub const SIGNATURE_MAGIC: [u8; 4] = *b"BAKO";

/// Length of the secp256k1/secp256r1 signature component.
pub const SIGNATURE_LEN: usize = 64;

const HEADER_LEN: usize = SIGNATURE_MAGIC.len() + 8;

/// Length of an encoded Fuel witness.
pub const FUEL_WITNESS_LEN: usize = HEADER_LEN + SIGNATURE_LEN;

/// Largest authenticator data accepted in a WebAuthn witness.
pub const MAX_AUTHENTICATOR_DATA_LEN: usize = 128;

/// Largest client data JSON accepted in a WebAuthn witness.
pub const MAX_CLIENT_DATA_JSON_LEN: usize = 512;

/// Upper bound on the length of an encoded WebAuthn witness.
pub const MAX_WEBAUTHN_WITNESS_LEN: usize =
    HEADER_LEN + SIGNATURE_LEN + 8 + MAX_AUTHENTICATOR_DATA_LEN + 8 + MAX_CLIENT_DATA_JSON_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum SignatureType {
    Fuel = 0,
    WebAuthn = 1,
}

impl SignatureType {
    pub fn discriminator(self) -> u64 {
        self as u64
    }

    /// Largest witness a signature of this kind encodes to.
    pub fn max_witness_len(self) -> usize {
        match self {
            SignatureType::Fuel => FUEL_WITNESS_LEN,
            SignatureType::WebAuthn => MAX_WEBAUTHN_WITNESS_LEN,
        }
    }
}

/// A signature as produced by a signer, before witness encoding.
///
/// `signature` is hex (with or without `0x`); it is validated on encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Signature {
    #[serde(rename = "fuel")]
    Fuel { signature: String },
    #[serde(rename = "webauthn", rename_all = "camelCase")]
    WebAuthn {
        signature: String,
        #[serde(with = "hex_bytes")]
        authenticator_data: Vec<u8>,
        #[serde(with = "hex_bytes")]
        client_data_json: Vec<u8>,
    },
}

impl Signature {
    pub fn fuel_from_bytes(signature: &[u8; 64]) -> Self {
        Signature::Fuel {
            signature: format!("0x{}", hex::encode(signature)),
        }
    }

    pub fn kind(&self) -> SignatureType {
        match self {
            Signature::Fuel { .. } => SignatureType::Fuel,
            Signature::WebAuthn { .. } => SignatureType::WebAuthn,
        }
    }

    /// The validated 64-byte signature component.
    pub fn signature_bytes(&self) -> Result<[u8; 64], VaultError> {
        match self {
            Signature::Fuel { signature } | Signature::WebAuthn { signature, .. } => {
                parse_signature(signature)
            }
        }
    }

    /// Signer address for Fuel signatures; `None` for WebAuthn, whose key
    /// is only known to the passkey provider.
    pub fn recover_signer(&self, message_hash: &Bytes32) -> Result<Option<Address>, VaultError> {
        match self {
            Signature::Fuel { .. } => {
                let bytes = self.signature_bytes()?;
                Ok(Some(recover_fuel_signer(message_hash, &bytes)?))
            }
            Signature::WebAuthn { .. } => Ok(None),
        }
    }
}

/// Encoder/decoder pair for one signature variant.
pub struct SignatureCoder {
    pub kind: SignatureType,
    encode_payload: fn(&Signature, &mut Vec<u8>) -> Result<(), VaultError>,
    decode_payload: fn(&[u8]) -> Result<Signature, VaultError>,
}

impl std::fmt::Debug for SignatureCoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureCoder").field("kind", &self.kind).finish()
    }
}

impl SignatureCoder {
    /// Encode a full witness (header and payload).
    pub fn encode(&self, signature: &Signature) -> Result<Vec<u8>, VaultError> {
        if signature.kind() != self.kind {
            return Err(VaultError::invalid_data(
                "type",
                format!("{:?} coder cannot encode {:?}", self.kind, signature.kind()),
            ));
        }
        let mut out = Vec::with_capacity(FUEL_WITNESS_LEN);
        out.extend_from_slice(&SIGNATURE_MAGIC);
        out.extend_from_slice(&self.kind.discriminator().to_be_bytes());
        (self.encode_payload)(signature, &mut out)?;
        Ok(out)
    }

    /// Decode the payload that follows the header.
    pub fn decode_payload(&self, payload: &[u8]) -> Result<Signature, VaultError> {
        (self.decode_payload)(payload)
    }
}

static CODERS: [SignatureCoder; 2] = [
    SignatureCoder {
        kind: SignatureType::Fuel,
        encode_payload: encode_fuel,
        decode_payload: decode_fuel,
    },
    SignatureCoder {
        kind: SignatureType::WebAuthn,
        encode_payload: encode_webauthn,
        decode_payload: decode_webauthn,
    },
];

/// Coder for a type discriminator, or `None` if the discriminator is unknown.
pub fn get_coder(discriminator: u64) -> Option<&'static SignatureCoder> {
    CODERS.iter().find(|c| c.kind.discriminator() == discriminator)
}

fn coder_for(kind: SignatureType) -> &'static SignatureCoder {
    match kind {
        SignatureType::Fuel => &CODERS[0],
        SignatureType::WebAuthn => &CODERS[1],
    }
}

/// Encode a signature into witness bytes.
pub fn encode(signature: &Signature) -> Result<Vec<u8>, VaultError> {
    coder_for(signature.kind()).encode(signature)
}

/// Encode a signature into `0x`-hex witness.
///
/// For Fuel signatures the caller's signature hex is appended verbatim.
pub fn encode_hex(signature: &Signature) -> Result<String, VaultError> {
    let bytes = encode(signature)?;
    match signature {
        Signature::Fuel { signature } => Ok(format!(
            "0x{}{}",
            hex::encode(&bytes[..HEADER_LEN]),
            strip_0x(signature)
        )),
        Signature::WebAuthn { .. } => Ok(format!("0x{}", hex::encode(bytes))),
    }
}

/// Decode witness bytes back into a signature.
pub fn decode(bytes: &[u8]) -> Result<Signature, VaultError> {
    if bytes.len() < HEADER_LEN {
        return Err(VaultError::invalid_data(
            "witness",
            format!("expected at least {HEADER_LEN} bytes, got {}", bytes.len()),
        ));
    }
    if bytes[..4] != SIGNATURE_MAGIC {
        return Err(VaultError::invalid_data(
            "magic",
            format!("expected 0x{}, got 0x{}", hex::encode(SIGNATURE_MAGIC), hex::encode(&bytes[..4])),
        ));
    }

    let mut tag = [0u8; 8];
    tag.copy_from_slice(&bytes[4..HEADER_LEN]);
    let discriminator = u64::from_be_bytes(tag);

    let coder = get_coder(discriminator).ok_or_else(|| {
        VaultError::invalid_data("type", format!("unknown signature type {discriminator}"))
    })?;
    coder.decode_payload(&bytes[HEADER_LEN..])
}

pub fn decode_hex(witness: &str) -> Result<Signature, VaultError> {
    let bytes = hex::decode(strip_0x(witness))
        .map_err(|e| VaultError::invalid_data("witness", format!("invalid hex: {e}")))?;
    decode(&bytes)
}

fn encode_fuel(signature: &Signature, out: &mut Vec<u8>) -> Result<(), VaultError> {
    out.extend_from_slice(&signature.signature_bytes()?);
    Ok(())
}

fn decode_fuel(payload: &[u8]) -> Result<Signature, VaultError> {
    let bytes: &[u8; 64] = payload.try_into().map_err(|_| {
        VaultError::invalid_data(
            "signature",
            format!("expected {SIGNATURE_LEN} bytes, got {}", payload.len()),
        )
    })?;
    Ok(Signature::fuel_from_bytes(bytes))
}

fn encode_webauthn(signature: &Signature, out: &mut Vec<u8>) -> Result<(), VaultError> {
    let Signature::WebAuthn {
        authenticator_data,
        client_data_json,
        ..
    } = signature
    else {
        return Err(VaultError::invalid_data("type", "expected a WebAuthn signature"));
    };
    check_webauthn_field("authenticator_data", authenticator_data, MAX_AUTHENTICATOR_DATA_LEN)?;
    check_webauthn_field("client_data_json", client_data_json, MAX_CLIENT_DATA_JSON_LEN)?;

    out.extend_from_slice(&signature.signature_bytes()?);
    out.extend_from_slice(&(authenticator_data.len() as u64).to_be_bytes());
    out.extend_from_slice(authenticator_data);
    out.extend_from_slice(&(client_data_json.len() as u64).to_be_bytes());
    out.extend_from_slice(client_data_json);
    Ok(())
}

fn decode_webauthn(payload: &[u8]) -> Result<Signature, VaultError> {
    if payload.len() < SIGNATURE_LEN {
        return Err(VaultError::invalid_data(
            "signature",
            format!("expected {SIGNATURE_LEN} bytes, got {}", payload.len()),
        ));
    }
    let (sig, rest) = payload.split_at(SIGNATURE_LEN);
    let (authenticator_data, rest) = read_prefixed("authenticator_data", rest)?;
    let (client_data_json, rest) = read_prefixed("client_data_json", rest)?;
    if !rest.is_empty() {
        return Err(VaultError::invalid_data(
            "witness",
            format!("{} trailing bytes", rest.len()),
        ));
    }
    check_webauthn_field("authenticator_data", authenticator_data, MAX_AUTHENTICATOR_DATA_LEN)?;
    check_webauthn_field("client_data_json", client_data_json, MAX_CLIENT_DATA_JSON_LEN)?;

    Ok(Signature::WebAuthn {
        signature: format!("0x{}", hex::encode(sig)),
        authenticator_data: authenticator_data.to_vec(),
        client_data_json: client_data_json.to_vec(),
    })
}

/// Shared by encode and decode so every decodable witness re-encodes.
fn check_webauthn_field(field: &'static str, bytes: &[u8], max: usize) -> Result<(), VaultError> {
    if bytes.is_empty() {
        return Err(VaultError::invalid_data(field, "must not be empty"));
    }
    if bytes.len() > max {
        return Err(VaultError::invalid_data(
            field,
            format!("{} bytes exceeds the {max} byte limit", bytes.len()),
        ));
    }
    Ok(())
}

fn read_prefixed<'a>(
    field: &'static str,
    bytes: &'a [u8],
) -> Result<(&'a [u8], &'a [u8]), VaultError> {
    if bytes.len() < 8 {
        return Err(VaultError::invalid_data(field, "missing length prefix"));
    }
    let (len_bytes, rest) = bytes.split_at(8);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(len_bytes);
    let len = u64::from_be_bytes(buf);

    if len > rest.len() as u64 {
        return Err(VaultError::invalid_data(
            field,
            format!("declared length {len} overruns {} remaining bytes", rest.len()),
        ));
    }
    Ok(rest.split_at(len as usize))
}

fn parse_signature(signature: &str) -> Result<[u8; 64], VaultError> {
    let bytes = hex::decode(strip_0x(signature))
        .map_err(|e| VaultError::invalid_data("signature", format!("invalid hex: {e}")))?;
    bytes.as_slice().try_into().map_err(|_| {
        VaultError::invalid_data(
            "signature",
            format!("expected {SIGNATURE_LEN} bytes, got {}", bytes.len()),
        )
    })
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(super::strip_0x(&s)).map_err(serde::de::Error::custom)
    }
}
