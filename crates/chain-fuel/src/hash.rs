//! Transaction ids and the witness-independent vault signing hash.

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::FuelError;
use crate::transaction::{Input, Transaction, TransactionKind};
use crate::types::{Bytes32, TxId};

/// Result of [`signing_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSigningHash {
    /// `0x`-hex of the preimage that was hashed.
    pub hex: String,
    /// SHA-256 of the preimage; this is what signers sign.
    pub hash: Bytes32,
    /// Inputs removed during canonicalization, for restoration by the caller.
    pub original_inputs: Vec<Input>,
    /// Fingerprint of the last coin input, if any.
    pub utxo: Option<Bytes32>,
}

impl TxSigningHash {
    pub fn hash_hex(&self) -> String {
        self.hash.to_hex()
    }
}

/// Fingerprint of a UTXO: `sha256(tx_id || u64_be(output_index))`.
pub fn utxo_id(tx_id: &TxId, output_index: u16) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(tx_id.0);
    hasher.update(u64::from(output_index).to_be_bytes());
    Bytes32(hasher.finalize().into())
}

/// Network transaction id: `sha256(u64_be(chain_id) || canonical(tx'))`,
/// where `tx'` has its witnesses removed and script receipts root zeroed.
pub fn tx_id(tx: &Transaction, chain_id: u64) -> Result<TxId, FuelError> {
    let mut stripped = tx.clone();
    stripped.witnesses.clear();
    zero_receipts_root(&mut stripped);

    let mut hasher = Sha256::new();
    hasher.update(chain_id.to_be_bytes());
    hasher.update(stripped.to_bytes()?);
    Ok(Bytes32(hasher.finalize().into()))
}

/// Compute the hash every vault signer signs.
///
/// The hash does not depend on inputs or witnesses, so signatures can be
/// collected in parallel and attached afterwards. The last coin input's
/// UTXO fingerprint is appended instead; earlier coin inputs do not
/// contribute. Outputs are kept. The on-chain predicate recomputes exactly
/// this value.
pub fn signing_hash(tx: &Transaction, chain_id: u64) -> Result<TxSigningHash, FuelError> {
    // Serializing first surfaces malformed transactions before any mutation.
    tx.to_bytes()?;

    let mut utxo = None;
    for input in &tx.inputs {
        if let Input::Coin(coin) = input {
            utxo = Some(utxo_id(&coin.utxo_id.tx_id, coin.utxo_id.output_index));
        }
    }

    let mut canonical = tx.clone();
    zero_receipts_root(&mut canonical);
    let original_inputs = std::mem::take(&mut canonical.inputs);
    canonical.witnesses.clear();

    let mut preimage = Vec::new();
    preimage.extend_from_slice(&chain_id.to_be_bytes());
    preimage.extend_from_slice(&canonical.to_bytes()?);
    if let Some(utxo) = &utxo {
        preimage.extend_from_slice(&utxo.0);
    }

    let hash = Bytes32(Sha256::digest(&preimage).into());
    debug!(
        "signing hash {} over {} byte preimage ({} inputs cleared)",
        hash,
        preimage.len(),
        original_inputs.len()
    );

    Ok(TxSigningHash {
        hex: format!("0x{}", hex::encode(&preimage)),
        hash,
        original_inputs,
        utxo,
    })
}

fn zero_receipts_root(tx: &mut Transaction) {
    if let TransactionKind::Script(body) = &mut tx.kind {
        body.receipts_root = Bytes32::zeroed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::transaction::{Output, UtxoId, Witness};

    fn coin(tx_byte: u8, index: u16) -> Input {
        Input::predicate_coin(
            UtxoId {
                tx_id: Bytes32([tx_byte; 32]),
                output_index: index,
            },
            Address([0xaa; 32]),
            1_000,
            Bytes32::zeroed(),
            vec![1, 2, 3],
            vec![],
        )
    }

    fn base_tx() -> Transaction {
        let mut tx = Transaction::transfer();
        tx.add_input(coin(1, 0));
        tx.add_output(Output::Coin {
            to: Address([0xbb; 32]),
            amount: 10,
            asset_id: Bytes32::zeroed(),
        });
        tx
    }

    #[test]
    fn utxo_id_hashes_index_as_u64() {
        let tx_id = Bytes32([7; 32]);
        let mut data = tx_id.0.to_vec();
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 2]);
        let expected: [u8; 32] = Sha256::digest(&data).into();
        assert_eq!(utxo_id(&tx_id, 2).0, expected);
    }

    #[test]
    fn witnesses_do_not_change_hash() {
        let a = base_tx();
        let mut b = base_tx();
        b.add_witness(vec![1u8; 76]).unwrap();
        b.add_witness(vec![2u8; 120]).unwrap();

        let ha = signing_hash(&a, 0).unwrap();
        let hb = signing_hash(&b, 0).unwrap();
        assert_eq!(ha.hash, hb.hash);
        assert_eq!(ha.hex, hb.hex);
    }

    #[test]
    fn hashing_is_deterministic() {
        let tx = base_tx();
        assert_eq!(signing_hash(&tx, 9889).unwrap(), signing_hash(&tx, 9889).unwrap());
    }

    #[test]
    fn chain_id_changes_hash() {
        let tx = base_tx();
        assert_ne!(
            signing_hash(&tx, 0).unwrap().hash,
            signing_hash(&tx, 1).unwrap().hash
        );
    }

    #[test]
    fn preimage_layout() {
        let tx = base_tx();
        let result = signing_hash(&tx, 5).unwrap();

        let mut canonical = tx.clone();
        canonical.inputs.clear();
        let mut expected = 5u64.to_be_bytes().to_vec();
        expected.extend_from_slice(&canonical.to_bytes().unwrap());
        expected.extend_from_slice(&utxo_id(&Bytes32([1; 32]), 0).0);

        assert_eq!(result.hex, format!("0x{}", hex::encode(&expected)));
        assert_eq!(result.hash.0, <[u8; 32]>::from(Sha256::digest(&expected)));
    }

    #[test]
    fn only_last_coin_fingerprint_is_kept() {
        let mut tx = base_tx();
        tx.add_input(coin(2, 4));
        let result = signing_hash(&tx, 0).unwrap();
        assert_eq!(result.utxo, Some(utxo_id(&Bytes32([2; 32]), 4)));

        // Changing the first coin alone leaves the hash unchanged.
        let mut other = tx.clone();
        other.inputs[0] = coin(9, 9);
        assert_eq!(signing_hash(&other, 0).unwrap().hash, result.hash);
    }

    #[test]
    fn outputs_are_not_cleared() {
        let a = base_tx();
        let mut b = base_tx();
        b.add_output(Output::Change {
            to: Address([0xaa; 32]),
            amount: 0,
            asset_id: Bytes32::zeroed(),
        });
        assert_ne!(signing_hash(&a, 0).unwrap().hash, signing_hash(&b, 0).unwrap().hash);
    }

    #[test]
    fn receipts_root_is_ignored() {
        let a = base_tx();
        let mut b = base_tx();
        if let TransactionKind::Script(body) = &mut b.kind {
            body.receipts_root = Bytes32([0xee; 32]);
        }
        assert_eq!(signing_hash(&a, 0).unwrap().hash, signing_hash(&b, 0).unwrap().hash);
    }

    #[test]
    fn original_inputs_are_returned() {
        let tx = base_tx();
        let result = signing_hash(&tx, 0).unwrap();
        assert_eq!(result.original_inputs, tx.inputs);
    }

    #[test]
    fn no_coin_inputs_has_no_fingerprint() {
        let tx = Transaction::transfer();
        let result = signing_hash(&tx, 0).unwrap();
        assert!(result.utxo.is_none());
    }

    #[test]
    fn tx_id_ignores_witnesses() {
        let a = base_tx();
        let mut b = base_tx();
        b.add_witness(vec![3u8; 64]).unwrap();
        assert_eq!(tx_id(&a, 0).unwrap(), tx_id(&b, 0).unwrap());
    }

    #[test]
    fn signing_hash_rejects_oversized_output_count() {
        let mut tx = base_tx();
        let output = tx.outputs[0].clone();
        tx.outputs = vec![output; usize::from(u16::MAX) + 1];
        assert!(matches!(signing_hash(&tx, 0), Err(FuelError::Codec(_))));
    }

    #[test]
    fn signing_hash_rejects_oversized_witness_count() {
        let mut tx = base_tx();
        tx.witnesses = vec![Witness::default(); usize::from(u16::MAX) + 1];
        assert!(matches!(signing_hash(&tx, 0), Err(FuelError::Codec(_))));
        assert!(matches!(tx_id(&tx, 0), Ok(_)));
    }
}
