//! Canonical binary encoding of Fuel transactions.
//!
//! Every scalar is a big-endian 8-byte word and every variable-length byte
//! field is zero-padded to a multiple of 8. Counts precede their arrays in
//! the header so the body can be decoded in one pass.
//!
//! ```text
//! Script:
//!   type (0)              u64
//!   script_gas_limit      u64
//!   receipts_root         32 bytes
//!   script_len            u64
//!   script_data_len       u64
//!   policy_types          u64 (bitmask)
//!   inputs_count          u64
//!   outputs_count         u64
//!   witnesses_count       u64
//!   script                padded
//!   script_data           padded
//!   policies              u64 * popcount(policy_types)
//!   inputs / outputs / witnesses
//!
//! Create:
//!   type (1)              u64
//!   bytecode_witness_idx  u64
//!   salt                  32 bytes
//!   storage_slots_count   u64
//!   policy_types          u64
//!   inputs_count          u64
//!   outputs_count         u64
//!   witnesses_count       u64
//!   storage_slots         64 bytes * count
//!   policies / inputs / outputs / witnesses
//! ```

use crate::address::Address;
use crate::error::FuelError;
use crate::transaction::{
    CoinInput, ContractInput, CreateBody, Input, MessageInput, Output, Policies, ScriptBody,
    StorageSlot, Transaction, TransactionKind, TxPointer, UtxoId, Witness,
};
use crate::types::Bytes32;

const TX_SCRIPT: u64 = 0;
const TX_CREATE: u64 = 1;

const INPUT_COIN: u64 = 0;
const INPUT_CONTRACT: u64 = 1;
const INPUT_MESSAGE: u64 = 2;

const OUTPUT_COIN: u64 = 0;
const OUTPUT_CONTRACT: u64 = 1;
const OUTPUT_CHANGE: u64 = 2;
const OUTPUT_VARIABLE: u64 = 3;
const OUTPUT_CONTRACT_CREATED: u64 = 4;

const POLICY_TIP: u64 = 1;
const POLICY_WITNESS_LIMIT: u64 = 1 << 1;
const POLICY_MATURITY: u64 = 1 << 2;
const POLICY_MAX_FEE: u64 = 1 << 3;
const POLICY_ALL: u64 = POLICY_TIP | POLICY_WITNESS_LIMIT | POLICY_MATURITY | POLICY_MAX_FEE;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn word(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn bytes32(&mut self, value: &[u8; 32]) {
        self.buf.extend_from_slice(value);
    }

    fn padded(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        let pad = padding_for(data.len());
        self.buf.extend(std::iter::repeat(0u8).take(pad));
    }

    fn count(&mut self, len: usize, what: &str) -> Result<(), FuelError> {
        let n = u16::try_from(len)
            .map_err(|_| FuelError::Codec(format!("{what} count {len} exceeds u16")))?;
        self.word(u64::from(n));
        Ok(())
    }
}

fn padding_for(len: usize) -> usize {
    (8 - len % 8) % 8
}

/// Serialize a transaction into its canonical encoding.
///
/// Fails if any count exceeds the u16 range the network accepts.
pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>, FuelError> {
    let mut w = Writer::default();
    let policy_types = policy_bits(&tx.policies);

    match &tx.kind {
        TransactionKind::Script(body) => {
            w.word(TX_SCRIPT);
            w.word(body.script_gas_limit);
            w.bytes32(&body.receipts_root.0);
            w.word(body.script.len() as u64);
            w.word(body.script_data.len() as u64);
            w.word(policy_types);
            w.count(tx.inputs.len(), "input")?;
            w.count(tx.outputs.len(), "output")?;
            w.count(tx.witnesses.len(), "witness")?;
            w.padded(&body.script);
            w.padded(&body.script_data);
        }
        TransactionKind::Create(body) => {
            w.word(TX_CREATE);
            w.word(u64::from(body.bytecode_witness_index));
            w.bytes32(&body.salt.0);
            w.count(body.storage_slots.len(), "storage slot")?;
            w.word(policy_types);
            w.count(tx.inputs.len(), "input")?;
            w.count(tx.outputs.len(), "output")?;
            w.count(tx.witnesses.len(), "witness")?;
            for slot in &body.storage_slots {
                w.bytes32(&slot.key.0);
                w.bytes32(&slot.value.0);
            }
        }
    }

    encode_policies(&mut w, &tx.policies);

    for input in &tx.inputs {
        encode_input(&mut w, input);
    }
    for output in &tx.outputs {
        encode_output(&mut w, output);
    }
    for witness in &tx.witnesses {
        w.word(witness.0.len() as u64);
        w.padded(&witness.0);
    }

    Ok(w.buf)
}

fn policy_bits(policies: &Policies) -> u64 {
    let mut bits = 0;
    if policies.tip.is_some() {
        bits |= POLICY_TIP;
    }
    if policies.witness_limit.is_some() {
        bits |= POLICY_WITNESS_LIMIT;
    }
    if policies.maturity.is_some() {
        bits |= POLICY_MATURITY;
    }
    if policies.max_fee.is_some() {
        bits |= POLICY_MAX_FEE;
    }
    bits
}

fn encode_policies(w: &mut Writer, policies: &Policies) {
    if let Some(tip) = policies.tip {
        w.word(tip);
    }
    if let Some(limit) = policies.witness_limit {
        w.word(limit);
    }
    if let Some(maturity) = policies.maturity {
        w.word(u64::from(maturity));
    }
    if let Some(max_fee) = policies.max_fee {
        w.word(max_fee);
    }
}

fn encode_utxo_id(w: &mut Writer, utxo_id: &UtxoId) {
    w.bytes32(&utxo_id.tx_id.0);
    w.word(u64::from(utxo_id.output_index));
}

fn encode_tx_pointer(w: &mut Writer, pointer: &TxPointer) {
    w.word(u64::from(pointer.block_height));
    w.word(u64::from(pointer.tx_index));
}

fn encode_input(w: &mut Writer, input: &Input) {
    match input {
        Input::Coin(coin) => {
            w.word(INPUT_COIN);
            encode_utxo_id(w, &coin.utxo_id);
            w.bytes32(&coin.owner.0);
            w.word(coin.amount);
            w.bytes32(&coin.asset_id.0);
            encode_tx_pointer(w, &coin.tx_pointer);
            w.word(u64::from(coin.witness_index));
            w.word(coin.predicate_gas_used);
            w.word(coin.predicate.len() as u64);
            w.word(coin.predicate_data.len() as u64);
            w.padded(&coin.predicate);
            w.padded(&coin.predicate_data);
        }
        Input::Contract(contract) => {
            w.word(INPUT_CONTRACT);
            encode_utxo_id(w, &contract.utxo_id);
            w.bytes32(&contract.balance_root.0);
            w.bytes32(&contract.state_root.0);
            encode_tx_pointer(w, &contract.tx_pointer);
            w.bytes32(&contract.contract_id.0);
        }
        Input::Message(message) => {
            w.word(INPUT_MESSAGE);
            w.bytes32(&message.sender.0);
            w.bytes32(&message.recipient.0);
            w.word(message.amount);
            w.bytes32(&message.nonce.0);
            w.word(u64::from(message.witness_index));
            w.word(message.predicate_gas_used);
            w.word(message.data.len() as u64);
            w.word(message.predicate.len() as u64);
            w.word(message.predicate_data.len() as u64);
            w.padded(&message.data);
            w.padded(&message.predicate);
            w.padded(&message.predicate_data);
        }
    }
}

fn encode_output(w: &mut Writer, output: &Output) {
    match output {
        Output::Coin { to, amount, asset_id } => {
            w.word(OUTPUT_COIN);
            w.bytes32(&to.0);
            w.word(*amount);
            w.bytes32(&asset_id.0);
        }
        Output::Contract {
            input_index,
            balance_root,
            state_root,
        } => {
            w.word(OUTPUT_CONTRACT);
            w.word(u64::from(*input_index));
            w.bytes32(&balance_root.0);
            w.bytes32(&state_root.0);
        }
        Output::Change { to, amount, asset_id } => {
            w.word(OUTPUT_CHANGE);
            w.bytes32(&to.0);
            w.word(*amount);
            w.bytes32(&asset_id.0);
        }
        Output::Variable { to, amount, asset_id } => {
            w.word(OUTPUT_VARIABLE);
            w.bytes32(&to.0);
            w.word(*amount);
            w.bytes32(&asset_id.0);
        }
        Output::ContractCreated {
            contract_id,
            state_root,
        } => {
            w.word(OUTPUT_CONTRACT_CREATED);
            w.bytes32(&contract_id.0);
            w.bytes32(&state_root.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FuelError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                FuelError::Codec(format!(
                    "unexpected end of input: need {n} bytes at offset {}",
                    self.pos
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn word(&mut self) -> Result<u64, FuelError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn word_as<T: TryFrom<u64>>(&mut self, what: &str) -> Result<T, FuelError> {
        let value = self.word()?;
        T::try_from(value).map_err(|_| FuelError::Codec(format!("{what} {value} out of range")))
    }

    fn len(&mut self, what: &str) -> Result<usize, FuelError> {
        let len: usize = self.word_as(what)?;
        if len > self.bytes.len() - self.pos {
            return Err(FuelError::Codec(format!(
                "{what} {len} overruns remaining {} bytes",
                self.bytes.len() - self.pos
            )));
        }
        Ok(len)
    }

    fn bytes32(&mut self) -> Result<Bytes32, FuelError> {
        let mut buf = [0u8; 32];
        buf.copy_from_slice(self.take(32)?);
        Ok(Bytes32(buf))
    }

    fn address(&mut self) -> Result<Address, FuelError> {
        Ok(Address(self.bytes32()?.0))
    }

    fn padded(&mut self, len: usize) -> Result<Vec<u8>, FuelError> {
        let data = self.take(len)?.to_vec();
        let pad = self.take(padding_for(len))?;
        if pad.iter().any(|b| *b != 0) {
            return Err(FuelError::Codec("non-zero padding".into()));
        }
        Ok(data)
    }

    fn is_empty(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

/// Decode a transaction from its canonical encoding.
pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction, FuelError> {
    let mut r = Reader::new(bytes);

    let tx_type = r.word()?;
    let (kind, policy_types, counts) = match tx_type {
        TX_SCRIPT => {
            let script_gas_limit = r.word()?;
            let receipts_root = r.bytes32()?;
            let script_len = r.len("script length")?;
            let script_data_len = r.len("script data length")?;
            let policy_types = r.word()?;
            let counts = read_counts(&mut r)?;
            let script = r.padded(script_len)?;
            let script_data = r.padded(script_data_len)?;
            let body = ScriptBody {
                script_gas_limit,
                receipts_root,
                script,
                script_data,
            };
            (TransactionKind::Script(body), policy_types, counts)
        }
        TX_CREATE => {
            let bytecode_witness_index = r.word_as("bytecode witness index")?;
            let salt = r.bytes32()?;
            let slots_count: u16 = r.word_as("storage slot count")?;
            let policy_types = r.word()?;
            let counts = read_counts(&mut r)?;
            let mut storage_slots = Vec::with_capacity(usize::from(slots_count).min(64));
            for _ in 0..slots_count {
                storage_slots.push(StorageSlot {
                    key: r.bytes32()?,
                    value: r.bytes32()?,
                });
            }
            let body = CreateBody {
                bytecode_witness_index,
                salt,
                storage_slots,
            };
            (TransactionKind::Create(body), policy_types, counts)
        }
        other => return Err(FuelError::Codec(format!("unknown transaction type {other}"))),
    };

    let policies = decode_policies(&mut r, policy_types)?;

    let (inputs_count, outputs_count, witnesses_count) = counts;
    let mut inputs = Vec::with_capacity(usize::from(inputs_count).min(64));
    for _ in 0..inputs_count {
        inputs.push(decode_input(&mut r)?);
    }
    let mut outputs = Vec::with_capacity(usize::from(outputs_count).min(64));
    for _ in 0..outputs_count {
        outputs.push(decode_output(&mut r)?);
    }
    let mut witnesses = Vec::with_capacity(usize::from(witnesses_count).min(64));
    for _ in 0..witnesses_count {
        let len = r.len("witness length")?;
        witnesses.push(Witness(r.padded(len)?));
    }

    if !r.is_empty() {
        return Err(FuelError::Codec(format!(
            "{} trailing bytes after transaction",
            bytes.len() - r.pos
        )));
    }

    Ok(Transaction {
        kind,
        policies,
        inputs,
        outputs,
        witnesses,
    })
}

fn read_counts(r: &mut Reader<'_>) -> Result<(u16, u16, u16), FuelError> {
    Ok((
        r.word_as("input count")?,
        r.word_as("output count")?,
        r.word_as("witness count")?,
    ))
}

fn decode_policies(r: &mut Reader<'_>, bits: u64) -> Result<Policies, FuelError> {
    if bits & !POLICY_ALL != 0 {
        return Err(FuelError::Codec(format!("unknown policy bits {bits:#x}")));
    }
    let mut policies = Policies::default();
    if bits & POLICY_TIP != 0 {
        policies.tip = Some(r.word()?);
    }
    if bits & POLICY_WITNESS_LIMIT != 0 {
        policies.witness_limit = Some(r.word()?);
    }
    if bits & POLICY_MATURITY != 0 {
        policies.maturity = Some(r.word_as("maturity")?);
    }
    if bits & POLICY_MAX_FEE != 0 {
        policies.max_fee = Some(r.word()?);
    }
    Ok(policies)
}

fn decode_utxo_id(r: &mut Reader<'_>) -> Result<UtxoId, FuelError> {
    Ok(UtxoId {
        tx_id: r.bytes32()?,
        output_index: r.word_as("output index")?,
    })
}

fn decode_tx_pointer(r: &mut Reader<'_>) -> Result<TxPointer, FuelError> {
    Ok(TxPointer {
        block_height: r.word_as("block height")?,
        tx_index: r.word_as("tx index")?,
    })
}

fn decode_input(r: &mut Reader<'_>) -> Result<Input, FuelError> {
    match r.word()? {
        INPUT_COIN => {
            let utxo_id = decode_utxo_id(r)?;
            let owner = r.address()?;
            let amount = r.word()?;
            let asset_id = r.bytes32()?;
            let tx_pointer = decode_tx_pointer(r)?;
            let witness_index = r.word_as("witness index")?;
            let predicate_gas_used = r.word()?;
            let predicate_len = r.len("predicate length")?;
            let predicate_data_len = r.len("predicate data length")?;
            Ok(Input::Coin(CoinInput {
                utxo_id,
                owner,
                amount,
                asset_id,
                tx_pointer,
                witness_index,
                predicate_gas_used,
                predicate: r.padded(predicate_len)?,
                predicate_data: r.padded(predicate_data_len)?,
            }))
        }
        INPUT_CONTRACT => Ok(Input::Contract(ContractInput {
            utxo_id: decode_utxo_id(r)?,
            balance_root: r.bytes32()?,
            state_root: r.bytes32()?,
            tx_pointer: decode_tx_pointer(r)?,
            contract_id: r.bytes32()?,
        })),
        INPUT_MESSAGE => {
            let sender = r.address()?;
            let recipient = r.address()?;
            let amount = r.word()?;
            let nonce = r.bytes32()?;
            let witness_index = r.word_as("witness index")?;
            let predicate_gas_used = r.word()?;
            let data_len = r.len("message data length")?;
            let predicate_len = r.len("predicate length")?;
            let predicate_data_len = r.len("predicate data length")?;
            Ok(Input::Message(MessageInput {
                sender,
                recipient,
                amount,
                nonce,
                witness_index,
                predicate_gas_used,
                data: r.padded(data_len)?,
                predicate: r.padded(predicate_len)?,
                predicate_data: r.padded(predicate_data_len)?,
            }))
        }
        other => Err(FuelError::Codec(format!("unknown input type {other}"))),
    }
}

fn decode_output(r: &mut Reader<'_>) -> Result<Output, FuelError> {
    match r.word()? {
        OUTPUT_COIN => Ok(Output::Coin {
            to: r.address()?,
            amount: r.word()?,
            asset_id: r.bytes32()?,
        }),
        OUTPUT_CONTRACT => Ok(Output::Contract {
            input_index: r.word_as("contract input index")?,
            balance_root: r.bytes32()?,
            state_root: r.bytes32()?,
        }),
        OUTPUT_CHANGE => Ok(Output::Change {
            to: r.address()?,
            amount: r.word()?,
            asset_id: r.bytes32()?,
        }),
        OUTPUT_VARIABLE => Ok(Output::Variable {
            to: r.address()?,
            amount: r.word()?,
            asset_id: r.bytes32()?,
        }),
        OUTPUT_CONTRACT_CREATED => Ok(Output::ContractCreated {
            contract_id: r.bytes32()?,
            state_root: r.bytes32()?,
        }),
        other => Err(FuelError::Codec(format!("unknown output type {other}"))),
    }
}
