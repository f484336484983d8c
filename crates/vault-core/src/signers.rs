//! Fixed-capacity signer tables.
//!
//! The vault predicate is configured with exactly [`MAX_SIGNERS`] slots.
//! Slots are filled in caller order; unused slots hold a zero sentinel.

use log::warn;
use serde::{Deserialize, Serialize};

use chain_fuel::Address;

/// Number of signer slots in a vault predicate.
pub const MAX_SIGNERS: usize = 10;

/// Pack `items` into exactly [`MAX_SIGNERS`] slots.
///
/// Order is preserved and duplicates are kept. Items beyond capacity are
/// dropped; callers must validate the count if that matters to them.
pub fn pack_slots<T: Clone>(items: &[T], zero: T) -> [T; MAX_SIGNERS] {
    if items.len() > MAX_SIGNERS {
        warn!(
            "dropping {} items beyond the {MAX_SIGNERS} slot capacity",
            items.len() - MAX_SIGNERS
        );
    }
    std::array::from_fn(|i| items.get(i).cloned().unwrap_or_else(|| zero.clone()))
}

/// Pack signer addresses, padding with the zero address.
pub fn pack_signers(signers: &[Address]) -> [Address; MAX_SIGNERS] {
    pack_slots(signers, Address::zeroed())
}

/// Pack 64-byte signatures, padding with all-zero signatures.
pub fn pack_signatures(signatures: &[[u8; 64]]) -> [[u8; 64]; MAX_SIGNERS] {
    pack_slots(signatures, [0u8; 64])
}

/// An ordered signer table as it is baked into the predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSet {
    slots: [Address; MAX_SIGNERS],
    len: usize,
}

impl SignerSet {
    pub fn new(signers: &[Address]) -> Self {
        Self {
            slots: pack_signers(signers),
            len: signers.len().min(MAX_SIGNERS),
        }
    }

    pub fn slots(&self) -> &[Address; MAX_SIGNERS] {
        &self.slots
    }

    /// Signers actually configured, without padding.
    pub fn signers(&self) -> &[Address] {
        &self.slots[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.signers().contains(address)
    }

    /// Slot index of a signer.
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.signers().iter().position(|s| s == address)
    }
}
