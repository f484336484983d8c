//! Cross-crate integration tests exercising the full vault pipeline:
//! build -> estimate fee -> hash -> sign (key + passkey) -> attach -> send.
//!
//! The node and the passkey authenticator are in-memory doubles; everything
//! else is the public API of vault_core and chain_fuel.

use std::sync::Mutex;

use async_trait::async_trait;
use chain_fuel::network::{BASE_ASSET_ID, DEFAULT_DECIMALS, LOCAL};
use chain_fuel::signature::public_key_from_private;
use chain_fuel::transaction::TxPointer;
use chain_fuel::{signing_hash, Address, Bytes32, Output, Transaction, TxId, UtxoId};
use vault_core::provider::signing_hash_for;
use vault_core::signature::decode;
use vault_core::*;

const PREDICATE_CODE: [u8; 24] = [0x1a; 24];
const PASSKEY_ADDRESS: Address = Address([0x5e; 32]);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn key(n: u8) -> [u8; 32] {
    let mut k = [0u8; 32];
    k[31] = n;
    k
}

fn signer(n: u8) -> Address {
    Address::from_public_key(&public_key_from_private(&key(n)).unwrap())
}

struct MockNode {
    owner: Address,
    submitted: Mutex<Vec<Vec<u8>>>,
    estimated_witnesses: Mutex<Vec<usize>>,
    estimated_sizes: Mutex<Vec<usize>>,
    submit_error: Option<&'static str>,
}

impl MockNode {
    fn new(owner: Address) -> Self {
        Self {
            owner,
            submitted: Mutex::new(Vec::new()),
            estimated_witnesses: Mutex::new(Vec::new()),
            estimated_sizes: Mutex::new(Vec::new()),
            submit_error: None,
        }
    }
}

#[async_trait]
impl Provider for MockNode {
    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(LOCAL.chain_id)
    }

    async fn estimate_tx_cost(&self, tx: &Transaction) -> Result<TxCost, ProviderError> {
        self.estimated_witnesses
            .lock()
            .unwrap()
            .push(tx.witnesses.len());
        let size = tx
            .to_bytes()
            .map_err(|e| ProviderError::new(e.to_string()))?
            .len();
        self.estimated_sizes.lock().unwrap().push(size);
        Ok(TxCost {
            min_fee: 120,
            max_fee: 480,
            gas_used: 3_000,
            gas_limit: 100_000,
        })
    }

    async fn submit(&self, tx_bytes: &[u8]) -> Result<TxId, ProviderError> {
        if let Some(message) = self.submit_error {
            return Err(ProviderError::with_metadata(
                message,
                serde_json::json!({ "path": ["submit"] }),
            ));
        }
        self.submitted.lock().unwrap().push(tx_bytes.to_vec());
        let tx = Transaction::from_bytes(tx_bytes)
            .map_err(|e| ProviderError::new(e.to_string()))?;
        chain_fuel::tx_id(&tx, LOCAL.chain_id).map_err(|e| ProviderError::new(e.to_string()))
    }

    async fn resources_to_spend(
        &self,
        owner: &Address,
        queries: &[SpendQuery],
    ) -> Result<Vec<Coin>, ProviderError> {
        if owner != &self.owner {
            return Ok(Vec::new());
        }
        Ok(queries
            .iter()
            .enumerate()
            .map(|(i, q)| Coin {
                utxo_id: UtxoId {
                    tx_id: Bytes32([0x70 + i as u8; 32]),
                    output_index: i as u16,
                },
                owner: *owner,
                amount: q.amount + 1_000_000,
                asset_id: q.asset_id,
                tx_pointer: TxPointer {
                    block_height: 100,
                    tx_index: 0,
                },
            })
            .collect())
    }
}

struct MockAuthenticator;

#[async_trait]
impl PasskeyProvider for MockAuthenticator {
    async fn create_credential(
        &self,
        username: &str,
        _challenge: &str,
    ) -> Result<Credential, ProviderError> {
        Ok(Credential {
            id: format!("{username}-credential"),
            public_key_hex: format!("0x04{}", "ab".repeat(64)),
            address: PASSKEY_ADDRESS,
        })
    }

    async fn sign_challenge(
        &self,
        _credential_id: &str,
        challenge_hex: &str,
        _public_key_hex: &str,
    ) -> Result<WebAuthnAssertion, ProviderError> {
        let client_data = format!(r#"{{"type":"webauthn.get","challenge":"{challenge_hex}"}}"#);
        Ok(WebAuthnAssertion {
            signature: format!("0x{}", "cd".repeat(64)),
            authenticator_data: vec![0x49; 37],
            client_data_json: client_data.into_bytes(),
        })
    }
}

fn two_of_three() -> Vault {
    let config = VaultConfig {
        signatures_count: 2,
        signers: vec![signer(1), signer(2), PASSKEY_ADDRESS],
        hash_predicate: Bytes32([0x11; 32]),
    };
    let mut bytecode = PREDICATE_CODE.to_vec();
    bytecode.extend_from_slice(&[0u8; CONFIGURABLES_LEN]);
    let template = PredicateTemplate::new(bytecode, PREDICATE_CODE.len()).unwrap();
    Vault::new(config, &template).unwrap()
}

// ─── Transfer: build -> fee -> hash -> sign -> attach -> send ─────────

#[tokio::test]
async fn vault_transfer_full_pipeline() {
    init_logging();
    let vault = two_of_three();
    let node = MockNode::new(*vault.address());
    let alice = Address([0xaa; 32]);

    // 1. Build from aggregated instructions
    let transfers = vec![
        TransferInstruction::new(alice, BASE_ASSET_ID, "0.1", DEFAULT_DECIMALS).unwrap(),
        TransferInstruction::new(alice, BASE_ASSET_ID, "0.25", DEFAULT_DECIMALS).unwrap(),
    ];
    let mut tx = vault
        .build_transfer(&node, &transfers, BASE_ASSET_ID, 10_000)
        .await
        .unwrap();
    assert_eq!(
        tx.outputs[0],
        Output::Coin {
            to: alice,
            amount: 350_000_000,
            asset_id: BASE_ASSET_ID
        }
    );

    // 2. Estimate fees with placeholder witnesses and apply them
    let fees = estimate_fee(&tx, &node, vault.required_witnesses())
        .await
        .unwrap();
    assert_eq!(*node.estimated_witnesses.lock().unwrap(), vec![2]);
    assert!(tx.witnesses.is_empty());
    assert_eq!(fees.max_fee_inclusive, 600);
    fees.apply_to(&mut tx);

    // 3. Hash
    let hash = signing_hash_for(&tx, &node).await.unwrap();
    assert_eq!(hash, signing_hash(&tx, LOCAL.chain_id).unwrap());
    assert!(hash.utxo.is_some());

    // 4. Collect one key signature and one passkey signature
    let key_sig = sign_hash(&key(2), &hash.hash).unwrap();
    let mut session = Session::open(MemoryStore::default()).unwrap();
    session
        .recall_or_create(&MockAuthenticator, "alice", "register")
        .await
        .unwrap();
    let passkey_sig = session.sign(&MockAuthenticator, &hash.hash).await.unwrap();
    assert_eq!(passkey_sig.kind(), SignatureType::WebAuthn);

    // 5. Attach; the hash does not move
    let indices = vault
        .attach_witnesses(&mut tx, &hash.hash, &[passkey_sig.clone(), key_sig.clone()])
        .unwrap();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(decode(&tx.witnesses[0].0).unwrap(), key_sig);
    assert_eq!(decode(&tx.witnesses[1].0).unwrap(), passkey_sig);
    assert_eq!(
        signing_hash(&tx, LOCAL.chain_id).unwrap().hash,
        hash.hash
    );
    let estimated_size = node.estimated_sizes.lock().unwrap()[0];
    assert!(tx.to_bytes().unwrap().len() <= estimated_size);

    // 6. Send
    let id = vault.send(&node, &tx).await.unwrap();
    let submitted = node.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    let on_wire = Transaction::from_bytes(&submitted[0]).unwrap();
    assert_eq!(on_wire, tx);
    assert_eq!(on_wire.policies.max_fee, Some(600));
    assert_eq!(id, chain_fuel::tx_id(&tx, LOCAL.chain_id).unwrap());
}

#[tokio::test]
async fn witness_hex_layout_matches_predicate_format() {
    init_logging();
    let hash = Bytes32([0x42; 32]);
    let sig = sign_hash(&key(1), &hash).unwrap();
    let Signature::Fuel { signature } = &sig else {
        panic!("expected a fuel signature");
    };

    let witness = encode_signature(&sig).unwrap();
    assert!(witness.starts_with("0x42414b4f0000000000000000"));
    assert!(witness.ends_with(&signature[2..]));

    let assertion = MockAuthenticator
        .sign_challenge("id", &hash.to_hex(), "0x04")
        .await
        .unwrap();
    let webauthn = encode_signature(&assertion.into_signature()).unwrap();
    assert!(webauthn.starts_with("0x42414b4f0000000000000001"));
}

// ─── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_submission_is_classified() {
    init_logging();
    let vault = two_of_three();
    let mut node = MockNode::new(*vault.address());
    node.submit_error = Some("Invalid transaction: UTXO does not exist 0x7070");

    let err = vault.send(&node, &Transaction::transfer()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UtxoNotExists);
    assert_eq!(err.metadata["path"][0], "submit");

    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["code"], "UTXO_NOT_EXISTS");
}

#[tokio::test]
async fn empty_vault_cannot_fund_transfer() {
    init_logging();
    let vault = two_of_three();
    let node = MockNode::new(Address([0xee; 32]));
    let transfers =
        vec![TransferInstruction::from_units(Address([1; 32]), BASE_ASSET_ID, 5)];

    let err = vault
        .build_transfer(&node, &transfers, BASE_ASSET_ID, 0)
        .await
        .unwrap_err();
    assert_eq!(DomainError::from(err).code, ErrorCode::NotEnoughCoins);
}

#[test]
fn readable_addresses_roundtrip_across_crates() {
    let vault = two_of_three();
    let readable = chain_fuel::to_readable(vault.address());
    assert!(readable.starts_with("fuel1"));
    assert_eq!(chain_fuel::from_readable(&readable).unwrap(), *vault.address());

    let passkey = chain_fuel::to_passkey_readable(&PASSKEY_ADDRESS);
    assert!(chain_fuel::is_passkey_namespace(&passkey));
    assert_eq!(chain_fuel::from_readable(&passkey).unwrap(), PASSKEY_ADDRESS);
}
