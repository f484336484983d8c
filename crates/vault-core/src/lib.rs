pub mod error;
pub mod error_parser;
pub mod fee;
pub mod passkey;
pub mod provider;
pub mod session;
pub mod signature;
pub mod signers;
pub mod transfer;
pub mod vault;

pub use error::{ProviderError, VaultError};
pub use error_parser::{DomainError, ErrorCode};
pub use fee::{estimate_fee, estimate_fee_for, FeeBreakdown, PLACEHOLDER_WITNESS_LEN};
pub use passkey::{Credential, PasskeyProvider, WebAuthnAssertion};
pub use provider::{Coin, Provider, SpendQuery, TxCost};
pub use session::{IdentityStore, JsonFileStore, MemoryStore, Session, StoredIdentity};
pub use signature::{Signature, SignatureType};
pub use signers::{SignerSet, MAX_SIGNERS};
pub use transfer::TransferInstruction;
pub use vault::{PredicateTemplate, Vault, VaultConfig, CONFIGURABLES_LEN};

use chain_fuel::{Address, Bytes32};

// ─── Convenience entry points ────────────────────────────────────────

/// Encode a signature as the `0x`-hex witness the vault predicate reads
pub fn encode_signature(signature: &Signature) -> Result<String, VaultError> {
    signature::encode_hex(signature)
}

/// Decode a `0x`-hex witness back into a signature
pub fn decode_signature(witness: &str) -> Result<Signature, VaultError> {
    signature::decode_hex(witness)
}

/// Sign a vault hash with a secp256k1 key and wrap it as a Fuel signature
pub fn sign_hash(private_key: &[u8; 32], hash: &Bytes32) -> Result<Signature, VaultError> {
    let bytes = chain_fuel::sign_fuel(private_key, hash)?;
    Ok(Signature::fuel_from_bytes(&bytes))
}

/// Pack signer addresses into the predicate's fixed slot table
pub fn pack_signers(signers: &[Address]) -> [Address; MAX_SIGNERS] {
    signers::pack_signers(signers)
}

/// Map a raw network error message to a domain error
pub fn parse_error(message: &str) -> DomainError {
    error_parser::parse(message, None)
}
