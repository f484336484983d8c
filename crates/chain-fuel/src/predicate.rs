//! Predicate owner addresses.
//!
//! Coins locked by a predicate are owned by
//! `sha256("FUEL" || bytecode_root)`, where `bytecode_root` is the binary
//! Merkle root over 16 KiB chunks of the (8-byte padded) bytecode.

use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::types::Bytes32;

const PREDICATE_SEED: [u8; 4] = *b"FUEL";
const CHUNK_SIZE: usize = 16 * 1024;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

fn leaf_sum(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(data);
    hasher.finalize().into()
}

fn node_sum(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Merkle root over pre-hashed leaves. The left subtree always holds the
/// largest power of two strictly below the leaf count.
fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    match leaves.len() {
        0 => Sha256::digest(b"").into(),
        1 => leaves[0],
        n => {
            let split = n.next_power_of_two() / 2;
            let (left, right) = leaves.split_at(split);
            node_sum(&merkle_root(left), &merkle_root(right))
        }
    }
}

/// Merkle root of predicate or contract bytecode.
pub fn bytecode_root(bytecode: &[u8]) -> Bytes32 {
    let leaves: Vec<[u8; 32]> = bytecode
        .chunks(CHUNK_SIZE)
        .map(|chunk| {
            let pad = (8 - chunk.len() % 8) % 8;
            if pad == 0 {
                leaf_sum(chunk)
            } else {
                let mut padded = chunk.to_vec();
                padded.resize(chunk.len() + pad, 0);
                leaf_sum(&padded)
            }
        })
        .collect();
    Bytes32(merkle_root(&leaves))
}

/// Address owning coins locked by `bytecode`.
pub fn predicate_address(bytecode: &[u8]) -> Address {
    let root = bytecode_root(bytecode);
    let mut hasher = Sha256::new();
    hasher.update(PREDICATE_SEED);
    hasher.update(root.0);
    Address(hasher.finalize().into())
}
