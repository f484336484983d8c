//! Fuel chain support for the vault SDK.
//!
//! This crate provides:
//! - 32-byte addresses with bech32m (`fuel1…`) and passkey (`passkey1…`) presentations
//! - EIP-55 checks for EVM addresses embedded in Fuel addresses
//! - The transaction model and its canonical binary codec
//! - Transaction ids, UTXO fingerprints, and the vault signing hash
//! - Predicate owner addresses derived from bytecode
//! - secp256k1 compact signatures with recoverable signer addresses
//! - Network presets

pub mod address;
pub mod codec;
pub mod error;
pub mod evm;
pub mod hash;
pub mod network;
pub mod predicate;
pub mod signature;
pub mod transaction;
pub mod types;

pub use address::{
    from_readable, is_passkey_namespace, to_passkey_readable, to_readable, Address,
    FUEL_PREFIX, PASSKEY_PREFIX,
};
pub use error::FuelError;
pub use evm::is_evm_compatible;
pub use hash::{signing_hash, tx_id, utxo_id, TxSigningHash};
pub use predicate::predicate_address;
pub use signature::{recover_fuel_signer, sign_fuel};
pub use transaction::{Input, Output, Transaction, TransactionKind, UtxoId, Witness};
pub use types::{AssetId, Bytes32, ContractId, TxId};
