#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod chain_config;
pub use chain_config::{ArbitrumChainParams, ChainConfig};

mod registry;
pub use registry::{chain_config_by_id, CHAIN_CONFIGS};
