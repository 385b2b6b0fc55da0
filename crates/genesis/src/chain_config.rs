//! Chain configuration types.

use serde::{Deserialize, Serialize};

/// The subset of a chain's configuration the replay engine consults.
///
/// Serialized configs use the geth-style JSON field names so that the bytes
/// stored in system state parse unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The chain id.
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    /// Rollup-specific parameters.
    #[serde(rename = "arbitrum")]
    pub arbitrum: ArbitrumChainParams,
}

/// Rollup parameters governing data availability and genesis placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArbitrumChainParams {
    /// Whether the rollup state machine is enabled at all.
    #[serde(rename = "EnableArbOS")]
    pub enable_arbos: bool,
    /// Whether batches may be committed through the DA committee.
    pub data_availability_committee: bool,
    /// Whether batches may be committed through Celestia.
    ///
    /// Mutually exclusive with the committee flag; the replay driver aborts
    /// when both are set.
    #[serde(rename = "CelestiaDA", default)]
    pub celestia_da: bool,
    /// The ArbOS version the chain launched with.
    #[serde(rename = "InitialArbOSVersion")]
    pub initial_arbos_version: u64,
    /// The L2 block number the genesis block was materialized at.
    pub genesis_block_num: u64,
}
