#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod errors;
pub use errors::{MessageError, MultiplexerError, ResolutionError};

pub mod message;
pub use message::{InitMessage, L1IncomingMessage, MessageWithMetadata, BATCH_POSTER_ADDRESS};

pub mod sources;
pub use sources::{BlobReader, CelestiaReader, DaProvider, DaProviders, DasReader};

mod traits;
pub use traits::InboxBackend;

mod multiplexer;
pub use multiplexer::{InboxMultiplexer, KeysetValidationMode};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
