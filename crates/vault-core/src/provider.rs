//! The network capabilities the vault needs from a node client.
//!
//! Concrete clients (GraphQL over HTTP, test doubles) live outside this
//! crate. Failures are returned as [`ProviderError`] and are never
//! rewritten on the way up.

use async_trait::async_trait;
use log::debug;

use chain_fuel::transaction::TxPointer;
use chain_fuel::{signing_hash, Address, AssetId, Transaction, TxId, TxSigningHash, UtxoId};

use crate::error::{ProviderError, VaultError};

/// Gas and fee figures the node computes for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxCost {
    pub min_fee: u64,
    pub max_fee: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
}

/// A spendable coin returned by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub utxo_id: UtxoId,
    pub owner: Address,
    pub amount: u64,
    pub asset_id: AssetId,
    pub tx_pointer: TxPointer,
}

/// How much of an asset the caller needs to spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendQuery {
    pub asset_id: AssetId,
    pub amount: u64,
}

#[async_trait]
pub trait Provider: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Estimate gas and fees for a transaction as it would be submitted.
    async fn estimate_tx_cost(&self, tx: &Transaction) -> Result<TxCost, ProviderError>;

    /// Submit a canonically encoded transaction and return its id.
    async fn submit(&self, tx_bytes: &[u8]) -> Result<TxId, ProviderError>;

    /// Coins owned by `owner` covering every query.
    async fn resources_to_spend(
        &self,
        owner: &Address,
        queries: &[SpendQuery],
    ) -> Result<Vec<Coin>, ProviderError>;
}

/// Compute the vault signing hash using the provider's chain id.
pub async fn signing_hash_for<P: Provider + ?Sized>(
    tx: &Transaction,
    provider: &P,
) -> Result<TxSigningHash, VaultError> {
    let chain_id = provider.chain_id().await?;
    debug!("computing signing hash for chain {chain_id}");
    Ok(signing_hash(tx, chain_id)?)
}
