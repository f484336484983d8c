//! Fuel transaction model.
//!
//! The types here are plain data: the caller owns a [`Transaction`] while
//! assembling it and hands it to [`crate::codec`] for serialization or to
//! [`crate::hash`] for the signing hash.

use crate::address::Address;
use crate::error::FuelError;
use crate::types::{AssetId, Bytes32, ContractId, TxId};

/// Reference to a previous transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UtxoId {
    pub tx_id: TxId,
    pub output_index: u16,
}

/// Location of a transaction on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxPointer {
    pub block_height: u32,
    pub tx_index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinInput {
    pub utxo_id: UtxoId,
    pub owner: Address,
    pub amount: u64,
    pub asset_id: AssetId,
    pub tx_pointer: TxPointer,
    pub witness_index: u16,
    pub predicate_gas_used: u64,
    pub predicate: Vec<u8>,
    pub predicate_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInput {
    pub utxo_id: UtxoId,
    pub balance_root: Bytes32,
    pub state_root: Bytes32,
    pub tx_pointer: TxPointer,
    pub contract_id: ContractId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInput {
    pub sender: Address,
    pub recipient: Address,
    pub amount: u64,
    pub nonce: Bytes32,
    pub witness_index: u16,
    pub predicate_gas_used: u64,
    pub data: Vec<u8>,
    pub predicate: Vec<u8>,
    pub predicate_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Coin(CoinInput),
    Contract(ContractInput),
    Message(MessageInput),
}

impl Input {
    /// Coin input spent by a predicate: no witness, the predicate bytecode
    /// authorizes the spend.
    pub fn predicate_coin(
        utxo_id: UtxoId,
        owner: Address,
        amount: u64,
        asset_id: AssetId,
        predicate: Vec<u8>,
        predicate_data: Vec<u8>,
    ) -> Self {
        Input::Coin(CoinInput {
            utxo_id,
            owner,
            amount,
            asset_id,
            tx_pointer: TxPointer::default(),
            witness_index: 0,
            predicate_gas_used: 0,
            predicate,
            predicate_data,
        })
    }

    pub fn as_coin(&self) -> Option<&CoinInput> {
        match self {
            Input::Coin(coin) => Some(coin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Coin {
        to: Address,
        amount: u64,
        asset_id: AssetId,
    },
    Contract {
        input_index: u16,
        balance_root: Bytes32,
        state_root: Bytes32,
    },
    Change {
        to: Address,
        amount: u64,
        asset_id: AssetId,
    },
    Variable {
        to: Address,
        amount: u64,
        asset_id: AssetId,
    },
    ContractCreated {
        contract_id: ContractId,
        state_root: Bytes32,
    },
}

/// Raw witness bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Witness(pub Vec<u8>);

impl From<Vec<u8>> for Witness {
    fn from(bytes: Vec<u8>) -> Self {
        Witness(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Policies {
    pub tip: Option<u64>,
    pub witness_limit: Option<u64>,
    pub maturity: Option<u32>,
    pub max_fee: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSlot {
    pub key: Bytes32,
    pub value: Bytes32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBody {
    pub script_gas_limit: u64,
    /// Only known after execution; zero while assembling.
    pub receipts_root: Bytes32,
    pub script: Vec<u8>,
    pub script_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBody {
    pub bytecode_witness_index: u16,
    pub salt: Bytes32,
    pub storage_slots: Vec<StorageSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Script(ScriptBody),
    Create(CreateBody),
}

/// A Fuel transaction under assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub policies: Policies,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub witnesses: Vec<Witness>,
}

/// Script that returns immediately: `RET(1)`. Used for plain transfers.
pub const RETURN_ONE_SCRIPT: [u8; 4] = [0x24, 0x04, 0x00, 0x00];

impl Transaction {
    pub fn script(script_gas_limit: u64, script: Vec<u8>, script_data: Vec<u8>) -> Self {
        Self {
            kind: TransactionKind::Script(ScriptBody {
                script_gas_limit,
                receipts_root: Bytes32::zeroed(),
                script,
                script_data,
            }),
            policies: Policies::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            witnesses: Vec::new(),
        }
    }

    /// A script transaction carrying [`RETURN_ONE_SCRIPT`].
    pub fn transfer() -> Self {
        Self::script(0, RETURN_ONE_SCRIPT.to_vec(), Vec::new())
    }

    pub fn create(bytecode_witness_index: u16, salt: Bytes32) -> Self {
        Self {
            kind: TransactionKind::Create(CreateBody {
                bytecode_witness_index,
                salt,
                storage_slots: Vec::new(),
            }),
            policies: Policies::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            witnesses: Vec::new(),
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self.kind, TransactionKind::Script(_))
    }

    pub fn add_input(&mut self, input: Input) -> &mut Self {
        self.inputs.push(input);
        self
    }

    pub fn add_output(&mut self, output: Output) -> &mut Self {
        self.outputs.push(output);
        self
    }

    /// Append a witness and return its index.
    pub fn add_witness(&mut self, witness: impl Into<Witness>) -> Result<u16, FuelError> {
        let index = u16::try_from(self.witnesses.len())
            .map_err(|_| FuelError::Codec("witness count exceeds u16".into()))?;
        self.witnesses.push(witness.into());
        Ok(index)
    }

    pub fn coin_inputs(&self) -> impl Iterator<Item = &CoinInput> {
        self.inputs.iter().filter_map(Input::as_coin)
    }

    pub fn set_max_fee(&mut self, max_fee: u64) {
        self.policies.max_fee = Some(max_fee);
    }

    /// No-op for create transactions.
    pub fn set_script_gas_limit(&mut self, gas_limit: u64) {
        if let TransactionKind::Script(body) = &mut self.kind {
            body.script_gas_limit = gas_limit;
        }
    }

    pub fn script_gas_limit(&self) -> Option<u64> {
        match &self.kind {
            TransactionKind::Script(body) => Some(body.script_gas_limit),
            TransactionKind::Create(_) => None,
        }
    }

    /// Canonical binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FuelError> {
        crate::codec::encode_transaction(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FuelError> {
        crate::codec::decode_transaction(bytes)
    }
}
