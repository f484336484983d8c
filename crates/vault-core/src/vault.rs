//! Vault configuration and transaction assembly.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use chain_fuel::transaction::CoinInput;
use chain_fuel::{
    predicate_address, signing_hash, Address, AssetId, Bytes32, Input, Output, Transaction, TxId,
    TxSigningHash,
};

use crate::error::VaultError;
use crate::error_parser::{parse_provider_error, DomainError};
use crate::provider::{Provider, SpendQuery};
use crate::signature::{encode, Signature};
use crate::signers::{SignerSet, MAX_SIGNERS};
use crate::transfer::{group_by_asset, group_by_destination, to_u64, TransferInstruction};

/// Length of [`VaultConfig::encode_configurables`].
pub const CONFIGURABLES_LEN: usize = 8 + MAX_SIGNERS * 32 + 32;

/// Constants baked into a vault predicate instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    pub signatures_count: u8,
    pub signers: Vec<Address>,
    /// Salt distinguishing vaults with identical signer sets.
    pub hash_predicate: Bytes32,
}

impl VaultConfig {
    pub fn validate(&self) -> Result<(), VaultError> {
        let required = self.signatures_count as usize;
        if self.signers.is_empty() {
            return Err(VaultError::InvalidConfig("no signers".into()));
        }
        if self.signers.len() > MAX_SIGNERS {
            return Err(VaultError::InvalidConfig(format!(
                "{} signers exceed the {MAX_SIGNERS} slot capacity",
                self.signers.len()
            )));
        }
        if required == 0 || required > self.signers.len() {
            return Err(VaultError::InvalidConfig(format!(
                "signatures_count {required} must be between 1 and {}",
                self.signers.len()
            )));
        }
        if let Some(i) = self.signers.iter().position(Address::is_zero) {
            return Err(VaultError::InvalidConfig(format!("signer {i} is the zero address")));
        }
        Ok(())
    }

    pub fn signer_set(&self) -> SignerSet {
        SignerSet::new(&self.signers)
    }

    /// The bytes the predicate reads as its configurable constants:
    ///
    /// ```text
    /// signatures_count   u64 BE
    /// signers            10 x 32 bytes, zero-padded slots
    /// hash_predicate     32 bytes
    /// ```
    pub fn encode_configurables(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CONFIGURABLES_LEN);
        out.extend_from_slice(&u64::from(self.signatures_count).to_be_bytes());
        for slot in self.signer_set().slots() {
            out.extend_from_slice(slot.as_bytes());
        }
        out.extend_from_slice(self.hash_predicate.as_bytes());
        out
    }

    pub fn from_json(json: &str) -> Result<Self, VaultError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, VaultError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Compiled vault predicate with a reserved region for its configurables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateTemplate {
    bytecode: Vec<u8>,
    configurables_offset: usize,
}

impl PredicateTemplate {
    pub fn new(bytecode: Vec<u8>, configurables_offset: usize) -> Result<Self, VaultError> {
        let end = configurables_offset.checked_add(CONFIGURABLES_LEN);
        if end.map_or(true, |end| end > bytecode.len()) {
            return Err(VaultError::InvalidConfig(format!(
                "configurables at offset {configurables_offset} overrun {} bytes of bytecode",
                bytecode.len()
            )));
        }
        Ok(Self {
            bytecode,
            configurables_offset,
        })
    }

    /// Bytecode with `config` written over the configurables region.
    pub fn instantiate(&self, config: &VaultConfig) -> Vec<u8> {
        let mut bytecode = self.bytecode.clone();
        let start = self.configurables_offset;
        bytecode[start..start + CONFIGURABLES_LEN].copy_from_slice(&config.encode_configurables());
        bytecode
    }
}

/// A multi-signature vault: a predicate instance guarding coins.
#[derive(Debug, Clone)]
pub struct Vault {
    config: VaultConfig,
    signers: SignerSet,
    predicate: Vec<u8>,
    address: Address,
}

impl Vault {
    /// Instantiate `template` with `config`. The vault address commits to
    /// the threshold, every signer slot and the salt.
    pub fn new(config: VaultConfig, template: &PredicateTemplate) -> Result<Self, VaultError> {
        config.validate()?;
        let predicate_bytecode = template.instantiate(&config);
        let address = predicate_address(&predicate_bytecode);
        debug!(
            "vault {} ({}-of-{})",
            address.to_readable(),
            config.signatures_count,
            config.signers.len()
        );
        Ok(Self {
            signers: config.signer_set(),
            config,
            predicate: predicate_bytecode,
            address,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn signers(&self) -> &SignerSet {
        &self.signers
    }

    /// Instantiated predicate bytecode attached to every coin input.
    pub fn predicate(&self) -> &[u8] {
        &self.predicate
    }

    /// Witnesses needed for a spend; pass this to the fee estimator.
    pub fn required_witnesses(&self) -> usize {
        self.config.signatures_count as usize
    }

    /// Assemble a transfer spending the vault's coins.
    ///
    /// `fee_reserve` base-asset units are requested on top of the
    /// transfers so the change output can cover the fee.
    pub async fn build_transfer<P: Provider + ?Sized>(
        &self,
        provider: &P,
        transfers: &[TransferInstruction],
        base_asset_id: AssetId,
        fee_reserve: u64,
    ) -> Result<Transaction, VaultError> {
        if transfers.is_empty() {
            return Err(VaultError::invalid_data("transfers", "no transfers given"));
        }

        let mut queries = Vec::new();
        for asset in group_by_asset(transfers) {
            queries.push(SpendQuery {
                asset_id: asset.asset_id,
                amount: to_u64(asset.amount)?,
            });
        }
        match queries.iter().position(|q| q.asset_id == base_asset_id) {
            Some(i) => {
                queries[i].amount = queries[i].amount.checked_add(fee_reserve).ok_or_else(|| {
                    VaultError::InvalidAmount("base asset total exceeds u64 range".into())
                })?;
            }
            None if fee_reserve > 0 => queries.push(SpendQuery {
                asset_id: base_asset_id,
                amount: fee_reserve,
            }),
            None => {}
        }

        let coins = provider.resources_to_spend(&self.address, &queries).await?;
        for query in &queries {
            let available: u64 = coins
                .iter()
                .filter(|c| c.asset_id == query.asset_id)
                .fold(0u64, |acc, c| acc.saturating_add(c.amount));
            if available < query.amount {
                return Err(VaultError::InvalidAmount(format!(
                    "not enough coins to fit the target: asset {} needs {}, vault holds {available}",
                    query.asset_id, query.amount
                )));
            }
        }

        let mut tx = Transaction::transfer();
        for coin in &coins {
            tx.add_input(Input::Coin(CoinInput {
                utxo_id: coin.utxo_id,
                owner: coin.owner,
                amount: coin.amount,
                asset_id: coin.asset_id,
                tx_pointer: coin.tx_pointer,
                witness_index: 0,
                predicate_gas_used: 0,
                predicate: self.predicate.clone(),
                predicate_data: Vec::new(),
            }));
        }
        for dest in group_by_destination(transfers) {
            tx.add_output(Output::Coin {
                to: dest.to,
                amount: to_u64(dest.amount)?,
                asset_id: dest.asset_id,
            });
        }
        for query in &queries {
            tx.add_output(Output::Change {
                to: self.address,
                amount: 0,
                asset_id: query.asset_id,
            });
        }

        debug!(
            "built transfer: {} inputs, {} outputs",
            tx.inputs.len(),
            tx.outputs.len()
        );
        Ok(tx)
    }

    pub fn signing_hash(&self, tx: &Transaction, chain_id: u64) -> Result<TxSigningHash, VaultError> {
        Ok(signing_hash(tx, chain_id)?)
    }

    /// Encode `signatures` and append them as witnesses.
    ///
    /// Fuel signatures must recover to distinct vault signers and are
    /// written in signer slot order. WebAuthn signatures follow in the
    /// order given. Returns the witness indices.
    pub fn attach_witnesses(
        &self,
        tx: &mut Transaction,
        hash: &Bytes32,
        signatures: &[Signature],
    ) -> Result<Vec<u16>, VaultError> {
        let required = self.required_witnesses();
        if signatures.len() < required {
            return Err(VaultError::invalid_data(
                "signatures",
                format!("need {required}, got {}", signatures.len()),
            ));
        }

        let mut keyed: Vec<(usize, &Signature)> = Vec::with_capacity(signatures.len());
        let mut passkeys: Vec<&Signature> = Vec::new();
        for signature in signatures {
            match signature.recover_signer(hash)? {
                Some(signer) => {
                    let slot = self.signers.position(&signer).ok_or_else(|| {
                        VaultError::invalid_data(
                            "signature",
                            format!("{signer} is not a signer of this vault"),
                        )
                    })?;
                    if keyed.iter().any(|(s, _)| *s == slot) {
                        return Err(VaultError::invalid_data(
                            "signature",
                            format!("duplicate signature from {signer}"),
                        ));
                    }
                    keyed.push((slot, signature));
                }
                None => passkeys.push(signature),
            }
        }
        keyed.sort_by_key(|(slot, _)| *slot);

        let mut encoded = Vec::with_capacity(signatures.len());
        for signature in keyed.into_iter().map(|(_, s)| s).chain(passkeys) {
            encoded.push(encode(signature)?);
        }

        let mut indices = Vec::with_capacity(encoded.len());
        for witness in encoded {
            indices.push(tx.add_witness(witness)?);
        }
        Ok(indices)
    }

    /// Submit a signed transaction. Failures come back classified.
    pub async fn send<P: Provider + ?Sized>(
        &self,
        provider: &P,
        tx: &Transaction,
    ) -> Result<TxId, DomainError> {
        let bytes = tx.to_bytes().map_err(|e| DomainError::from(VaultError::from(e)))?;
        let id = provider
            .submit(&bytes)
            .await
            .map_err(|e| parse_provider_error(&e))?;
        info!("vault {} submitted {id}", self.address);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::error_parser::ErrorCode;
    use crate::provider::{Coin, TxCost};
    use crate::signature::decode;
    use async_trait::async_trait;
    use chain_fuel::signature::public_key_from_private;
    use chain_fuel::transaction::TxPointer;
    use chain_fuel::{sign_fuel, UtxoId};

    const BASE: AssetId = Bytes32([0xf8; 32]);
    const USDC: AssetId = Bytes32([0x0c; 32]);
    const CODE_LEN: usize = 16;

    fn key(n: u8) -> [u8; 32] {
        let mut k = [0u8; 32];
        k[31] = n;
        k
    }

    fn signer(n: u8) -> Address {
        Address::from_public_key(&public_key_from_private(&key(n)).unwrap())
    }

    fn config(count: u8, signers: Vec<Address>) -> VaultConfig {
        VaultConfig {
            signatures_count: count,
            signers,
            hash_predicate: Bytes32([9; 32]),
        }
    }

    fn template() -> PredicateTemplate {
        let mut bytecode = vec![0x1a; CODE_LEN];
        bytecode.extend_from_slice(&[0u8; CONFIGURABLES_LEN]);
        PredicateTemplate::new(bytecode, CODE_LEN).unwrap()
    }

    fn vault() -> Vault {
        Vault::new(config(2, vec![signer(1), signer(2), signer(3)]), &template()).unwrap()
    }

    struct Wallet {
        coins: Vec<Coin>,
        submit_error: Option<String>,
    }

    impl Wallet {
        fn holding(owner: Address, coins: &[(AssetId, u64)]) -> Self {
            let coins = coins
                .iter()
                .enumerate()
                .map(|(i, (asset_id, amount))| Coin {
                    utxo_id: UtxoId {
                        tx_id: Bytes32([i as u8 + 1; 32]),
                        output_index: i as u16,
                    },
                    owner,
                    amount: *amount,
                    asset_id: *asset_id,
                    tx_pointer: TxPointer {
                        block_height: 7,
                        tx_index: i as u16,
                    },
                })
                .collect();
            Self {
                coins,
                submit_error: None,
            }
        }
    }

    #[async_trait]
    impl Provider for Wallet {
        async fn chain_id(&self) -> Result<u64, ProviderError> {
            Ok(0)
        }

        async fn estimate_tx_cost(&self, _tx: &Transaction) -> Result<TxCost, ProviderError> {
            Ok(TxCost::default())
        }

        async fn submit(&self, tx_bytes: &[u8]) -> Result<TxId, ProviderError> {
            match &self.submit_error {
                Some(message) => Err(ProviderError::new(message.clone())),
                None => Ok(Bytes32([tx_bytes.len() as u8; 32])),
            }
        }

        async fn resources_to_spend(
            &self,
            owner: &Address,
            queries: &[SpendQuery],
        ) -> Result<Vec<Coin>, ProviderError> {
            Ok(self
                .coins
                .iter()
                .filter(|c| &c.owner == owner && queries.iter().any(|q| q.asset_id == c.asset_id))
                .cloned()
                .collect())
        }
    }

    #[test]
    fn config_validation() {
        assert!(config(1, vec![signer(1)]).validate().is_ok());
        assert!(config(0, vec![signer(1)]).validate().is_err());
        assert!(config(2, vec![signer(1)]).validate().is_err());
        assert!(config(1, vec![]).validate().is_err());
        assert!(config(1, vec![signer(1), Address::zeroed()]).validate().is_err());
        let eleven: Vec<Address> = (1..=11).map(signer).collect();
        assert!(matches!(
            config(1, eleven).validate(),
            Err(VaultError::InvalidConfig(_))
        ));
    }

    #[test]
    fn configurables_layout() {
        let cfg = config(2, vec![signer(1), signer(2)]);
        let bytes = cfg.encode_configurables();
        assert_eq!(bytes.len(), CONFIGURABLES_LEN);
        assert_eq!(&bytes[..8], &2u64.to_be_bytes());
        assert_eq!(&bytes[8..40], signer(1).as_bytes());
        assert_eq!(&bytes[40..72], signer(2).as_bytes());
        assert!(bytes[72..328].iter().all(|b| *b == 0));
        assert_eq!(&bytes[328..], &[9u8; 32]);
    }

    #[test]
    fn address_commits_to_configuration() {
        let base = vault();
        let swapped = Vault::new(
            config(2, vec![signer(1), signer(2), signer(4)]),
            &template(),
        )
        .unwrap();
        let reordered = Vault::new(
            config(2, vec![signer(2), signer(1), signer(3)]),
            &template(),
        )
        .unwrap();
        let threshold = Vault::new(
            config(3, vec![signer(1), signer(2), signer(3)]),
            &template(),
        )
        .unwrap();
        let mut salted_cfg = config(2, vec![signer(1), signer(2), signer(3)]);
        salted_cfg.hash_predicate = Bytes32([8; 32]);
        let salted = Vault::new(salted_cfg, &template()).unwrap();

        for other in [&swapped, &reordered, &threshold, &salted] {
            assert_ne!(base.address(), other.address());
        }
        assert_eq!(base.address(), vault().address());
    }

    #[test]
    fn template_must_hold_configurables() {
        assert!(PredicateTemplate::new(vec![0; CONFIGURABLES_LEN], 0).is_ok());
        assert!(matches!(
            PredicateTemplate::new(vec![0; CONFIGURABLES_LEN], 1),
            Err(VaultError::InvalidConfig(_))
        ));
        assert!(PredicateTemplate::new(vec![0; 8], usize::MAX).is_err());
    }

    #[test]
    fn config_json_is_camel_case() {
        let cfg = config(1, vec![signer(1)]);
        let json = cfg.to_json().unwrap();
        assert!(json.contains("\"signaturesCount\":1"));
        assert!(json.contains("\"hashPredicate\""));
        assert_eq!(VaultConfig::from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn address_is_predicate_address() {
        let vault = vault();
        assert_eq!(vault.address(), &predicate_address(vault.predicate()));
        assert_eq!(&vault.predicate()[..CODE_LEN], &[0x1a; CODE_LEN]);
        assert_eq!(
            &vault.predicate()[CODE_LEN..],
            vault.config().encode_configurables().as_slice()
        );
        assert_eq!(self::vault().signers().len(), 3);
        assert_eq!(self::vault().required_witnesses(), 2);
    }

    #[tokio::test]
    async fn build_transfer_shapes_transaction() {
        let vault = vault();
        let wallet = Wallet::holding(*vault.address(), &[(BASE, 1_000), (USDC, 500), (BASE, 50)]);
        let alice = Address([0xaa; 32]);
        let bob = Address([0xbb; 32]);
        let transfers = vec![
            TransferInstruction::from_units(alice, USDC, 100),
            TransferInstruction::from_units(bob, BASE, 200),
            TransferInstruction::from_units(alice, USDC, 50),
        ];

        let tx = vault.build_transfer(&wallet, &transfers, BASE, 10).await.unwrap();
        assert_eq!(tx.inputs.len(), 3);
        assert!(tx.coin_inputs().all(|c| c.predicate == vault.predicate() && c.owner == *vault.address()));
        assert_eq!(tx.coin_inputs().next().unwrap().tx_pointer.block_height, 7);

        assert_eq!(
            tx.outputs,
            vec![
                Output::Coin { to: alice, amount: 150, asset_id: USDC },
                Output::Coin { to: bob, amount: 200, asset_id: BASE },
                Output::Change { to: *vault.address(), amount: 0, asset_id: USDC },
                Output::Change { to: *vault.address(), amount: 0, asset_id: BASE },
            ]
        );
    }

    #[tokio::test]
    async fn build_transfer_rejects_shortfall() {
        let vault = vault();
        let wallet = Wallet::holding(*vault.address(), &[(BASE, 100)]);
        let transfers = vec![TransferInstruction::from_units(Address([1; 32]), BASE, 95)];

        let err = vault.build_transfer(&wallet, &transfers, BASE, 10).await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidAmount(_)));
        assert_eq!(DomainError::from(err).code, ErrorCode::NotEnoughCoins);

        assert!(vault.build_transfer(&wallet, &[], BASE, 0).await.is_err());
    }

    #[test]
    fn attach_orders_by_signer_slot() {
        let vault = vault();
        let mut tx = Transaction::transfer();
        let hash = Bytes32([0x42; 32]);
        let sig3 = Signature::fuel_from_bytes(&sign_fuel(&key(3), &hash).unwrap());
        let sig1 = Signature::fuel_from_bytes(&sign_fuel(&key(1), &hash).unwrap());

        let indices = vault
            .attach_witnesses(&mut tx, &hash, &[sig3.clone(), sig1.clone()])
            .unwrap();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(decode(&tx.witnesses[0].0).unwrap(), sig1);
        assert_eq!(decode(&tx.witnesses[1].0).unwrap(), sig3);
    }

    #[test]
    fn attach_rejects_outsiders_duplicates_and_shortfall() {
        let vault = vault();
        let hash = Bytes32([0x42; 32]);
        let sig1 = Signature::fuel_from_bytes(&sign_fuel(&key(1), &hash).unwrap());
        let outsider = Signature::fuel_from_bytes(&sign_fuel(&key(9), &hash).unwrap());

        let mut tx = Transaction::transfer();
        assert!(vault.attach_witnesses(&mut tx, &hash, &[sig1.clone(), outsider]).is_err());
        assert!(vault
            .attach_witnesses(&mut tx, &hash, &[sig1.clone(), sig1.clone()])
            .is_err());
        assert!(vault.attach_witnesses(&mut tx, &hash, &[sig1]).is_err());
        assert!(tx.witnesses.is_empty());
    }

    #[tokio::test]
    async fn send_classifies_failures() {
        let vault = vault();
        let mut wallet = Wallet::holding(*vault.address(), &[]);
        let tx = Transaction::transfer();
        assert!(vault.send(&wallet, &tx).await.is_ok());

        wallet.submit_error = Some("Transaction input UTXO does not exist".into());
        let err = vault.send(&wallet, &tx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UtxoNotExists);
    }
}
