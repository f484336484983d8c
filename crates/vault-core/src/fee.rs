use log::debug;

use chain_fuel::Transaction;

use crate::error::VaultError;
use crate::provider::Provider;
use crate::signature::{SignatureType, MAX_WEBAUTHN_WITNESS_LEN};

/// Placeholder length when the signer kinds are unknown: the largest
/// witness any signer can produce.
pub const PLACEHOLDER_WITNESS_LEN: usize = MAX_WEBAUTHN_WITNESS_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub min_fee: u64,
    pub max_fee: u64,
    /// `min_fee + max_fee`, the value written to the max-fee policy.
    pub max_fee_inclusive: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
}

impl FeeBreakdown {
    /// Set the max-fee policy and the script gas limit on `tx`.
    pub fn apply_to(&self, tx: &mut Transaction) {
        tx.set_max_fee(self.max_fee_inclusive);
        tx.set_script_gas_limit(self.gas_limit);
    }
}

/// Estimate fees for `tx` once `required_witnesses` signatures of any kind
/// are attached.
///
/// Works on a copy; the caller's transaction is left untouched.
pub async fn estimate_fee<P: Provider + ?Sized>(
    tx: &Transaction,
    provider: &P,
    required_witnesses: usize,
) -> Result<FeeBreakdown, VaultError> {
    let lens = vec![PLACEHOLDER_WITNESS_LEN; required_witnesses];
    estimate_with_placeholders(tx, provider, &lens).await
}

/// Like [`estimate_fee`], with one placeholder per expected signature sized
/// for its kind.
pub async fn estimate_fee_for<P: Provider + ?Sized>(
    tx: &Transaction,
    provider: &P,
    signers: &[SignatureType],
) -> Result<FeeBreakdown, VaultError> {
    let lens: Vec<usize> = signers.iter().map(|kind| kind.max_witness_len()).collect();
    estimate_with_placeholders(tx, provider, &lens).await
}

async fn estimate_with_placeholders<P: Provider + ?Sized>(
    tx: &Transaction,
    provider: &P,
    lens: &[usize],
) -> Result<FeeBreakdown, VaultError> {
    let mut sized = tx.clone();
    for len in lens {
        sized.add_witness(vec![0u8; *len])?;
    }

    let cost = provider.estimate_tx_cost(&sized).await?;
    let fees = FeeBreakdown {
        min_fee: cost.min_fee,
        max_fee: cost.max_fee,
        max_fee_inclusive: cost.min_fee.saturating_add(cost.max_fee),
        gas_limit: cost.gas_limit,
        gas_used: cost.gas_used,
    };
    debug!(
        "fee estimate with {} placeholder witnesses: min={} max={} gas_limit={}",
        lens.len(),
        fees.min_fee,
        fees.max_fee,
        fees.gas_limit
    );
    Ok(fees)
}
