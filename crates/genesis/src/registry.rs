//! Compiled-in chain configurations.

use crate::ChainConfig;
use alloc::vec::Vec;
use alloy_primitives::map::{DefaultHashBuilder, HashMap};

/// The embedded chain table. Kept as JSON so the entries stay
/// byte-comparable with configs recovered from system state.
const CHAIN_SPECS: &str = include_str!("chains.json");

lazy_static::lazy_static! {
    /// Chain configurations compiled into the engine, keyed by chain id.
    pub static ref CHAIN_CONFIGS: HashMap<u64, ChainConfig, DefaultHashBuilder> = {
        let chains: Vec<ChainConfig> =
            serde_json::from_str(CHAIN_SPECS).expect("embedded chain table is well-formed");
        chains.into_iter().map(|config| (config.chain_id, config)).collect()
    };
}

/// Returns the compiled-in [ChainConfig] for `chain_id`, if one exists.
pub fn chain_config_by_id(chain_id: u64) -> Option<&'static ChainConfig> {
    CHAIN_CONFIGS.get(&chain_id)
}
