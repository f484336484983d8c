use serde::Serialize;

use crate::types::Bytes32;

/// Definition of a Fuel network the vault can target.
#[derive(Debug, Clone, Serialize)]
pub struct FuelNetwork {
    pub chain_id: u64,
    pub name: &'static str,
    pub graphql_url: &'static str,
    pub explorer_url: &'static str,
    /// Id of the asset fees are paid in.
    pub base_asset_id: Bytes32,
    pub decimals: u8,
    pub is_testnet: bool,
}

/// ETH on Fuel: the base asset id shared by the public networks.
pub const BASE_ASSET_ID: Bytes32 = Bytes32([
    0xf8, 0xf8, 0xb6, 0x28, 0x3d, 0x7f, 0xa5, 0xb6, 0x72, 0xb5, 0x30, 0xcb, 0xb8, 0x4f, 0xcc,
    0xcb, 0x4f, 0xf8, 0xdc, 0x40, 0xf8, 0x17, 0x6e, 0xf4, 0x54, 0x4d, 0xdb, 0x1f, 0x19, 0x52,
    0xad, 0x07,
]);

/// Decimal precision of the base asset.
pub const DEFAULT_DECIMALS: u8 = 9;

/// Fuel Ignition mainnet (chain ID 9889).
pub const MAINNET: FuelNetwork = FuelNetwork {
    chain_id: 9889,
    name: "Fuel Ignition",
    graphql_url: "https://mainnet.fuel.network/v1/graphql",
    explorer_url: "https://app.fuel.network",
    base_asset_id: BASE_ASSET_ID,
    decimals: DEFAULT_DECIMALS,
    is_testnet: false,
};

/// Fuel public testnet (chain ID 0).
pub const TESTNET: FuelNetwork = FuelNetwork {
    chain_id: 0,
    name: "Fuel Testnet",
    graphql_url: "https://testnet.fuel.network/v1/graphql",
    explorer_url: "https://app-testnet.fuel.network",
    base_asset_id: BASE_ASSET_ID,
    decimals: DEFAULT_DECIMALS,
    is_testnet: true,
};

/// A local fuel-core node with default settings.
pub const LOCAL: FuelNetwork = FuelNetwork {
    chain_id: 0,
    name: "Local",
    graphql_url: "http://127.0.0.1:4000/v1/graphql",
    explorer_url: "",
    base_asset_id: Bytes32([0u8; 32]),
    decimals: DEFAULT_DECIMALS,
    is_testnet: true,
};

/// All known networks.
pub const ALL_NETWORKS: &[FuelNetwork] = &[MAINNET, TESTNET, LOCAL];

/// Look up a network by its GraphQL endpoint.
pub fn network_by_url(url: &str) -> Option<&'static FuelNetwork> {
    let url = url.trim_end_matches('/');
    ALL_NETWORKS.iter().find(|n| n.graphql_url == url)
}
