//! Transfer instructions and their aggregation by asset and destination.
//!
//! Amounts are decimal strings converted to base units with the asset's
//! decimal precision. All arithmetic is on 256-bit integers; floating point
//! never touches an amount.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use alloy_primitives::U256;
use serde::Serialize;

use chain_fuel::{Address, AssetId};

use crate::error::VaultError;

/// Parse a decimal string into base units.
///
/// `"0.1"` with 6 decimals is `100000`. Rejects signs, exponents, more than
/// one dot, and more fractional digits than `decimals`.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, VaultError> {
    let trimmed = amount.trim();
    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(VaultError::InvalidAmount(format!("{amount:?} has no digits")));
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(VaultError::InvalidAmount(format!(
            "{amount:?} is not a decimal number"
        )));
    }
    if frac_part.len() > usize::from(decimals) {
        return Err(VaultError::InvalidAmount(format!(
            "{amount:?} has more than {decimals} decimal places"
        )));
    }

    let mut digits = String::with_capacity(int_part.len() + usize::from(decimals));
    digits.push_str(int_part);
    digits.push_str(frac_part);
    digits.extend(std::iter::repeat('0').take(usize::from(decimals) - frac_part.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 10)
        .map_err(|e| VaultError::InvalidAmount(format!("{amount:?}: {e}")))
}

/// Render base units as a decimal string, without trailing fractional zeros.
pub fn format_units(units: U256, decimals: u8) -> String {
    let decimals = usize::from(decimals);
    let raw = units.to_string();
    if decimals == 0 {
        return raw;
    }

    let padded = format!("{raw:0>width$}", width = decimals + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// A single transfer: `amount` of `asset_id` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInstruction {
    to: Address,
    asset_id: AssetId,
    amount: String,
    #[serde(skip)]
    units: U256,
}

impl TransferInstruction {
    pub fn new(
        to: Address,
        asset_id: AssetId,
        amount: &str,
        decimals: u8,
    ) -> Result<Self, VaultError> {
        let units = parse_units(amount, decimals)?;
        Ok(Self {
            to,
            asset_id,
            amount: amount.trim().to_string(),
            units,
        })
    }

    /// Build from an amount already expressed in base units.
    pub fn from_units(to: Address, asset_id: AssetId, units: u64) -> Self {
        Self {
            to,
            asset_id,
            amount: units.to_string(),
            units: U256::from(units),
        }
    }

    pub fn to(&self) -> &Address {
        &self.to
    }

    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    /// The amount as the caller wrote it.
    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn units(&self) -> U256 {
        self.units
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetAmount {
    pub asset_id: AssetId,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationAmount {
    pub to: Address,
    pub asset_id: AssetId,
    pub amount: U256,
}

/// Convert an aggregated amount to the u64 the network stores in outputs.
pub fn to_u64(amount: U256) -> Result<u64, VaultError> {
    u64::try_from(amount)
        .map_err(|_| VaultError::InvalidAmount(format!("{amount} exceeds u64 range")))
}

/// Sum transfers per asset, in order of first appearance.
pub fn group_by_asset(transfers: &[TransferInstruction]) -> Vec<AssetAmount> {
    let mut index: HashMap<AssetId, usize> = HashMap::new();
    let mut grouped: Vec<AssetAmount> = Vec::new();

    for transfer in transfers {
        match index.entry(transfer.asset_id) {
            Entry::Occupied(e) => {
                let slot = &mut grouped[*e.get()];
                slot.amount = slot.amount.saturating_add(transfer.units);
            }
            Entry::Vacant(e) => {
                e.insert(grouped.len());
                grouped.push(AssetAmount {
                    asset_id: transfer.asset_id,
                    amount: transfer.units,
                });
            }
        }
    }

    grouped
}

/// Sum transfers per `(to, asset_id)` pair, in order of first appearance.
pub fn group_by_destination(transfers: &[TransferInstruction]) -> Vec<DestinationAmount> {
    let mut index: HashMap<(Address, AssetId), usize> = HashMap::new();
    let mut grouped: Vec<DestinationAmount> = Vec::new();

    for transfer in transfers {
        match index.entry((transfer.to, transfer.asset_id)) {
            Entry::Occupied(e) => {
                let slot = &mut grouped[*e.get()];
                slot.amount = slot.amount.saturating_add(transfer.units);
            }
            Entry::Vacant(e) => {
                e.insert(grouped.len());
                grouped.push(DestinationAmount {
                    to: transfer.to,
                    asset_id: transfer.asset_id,
                    amount: transfer.units,
                });
            }
        }
    }

    grouped
}
