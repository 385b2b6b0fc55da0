#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod key;
pub use key::{PreimageKey, PreimageKind};

mod traits;
pub use traits::{PreimageOracle, ReplayTape, TapeClient};

mod errors;
pub use errors::{PreimageOracleError, PreimageOracleResult};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
