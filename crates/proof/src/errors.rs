//! Error types for the replay driver.

use alloy_primitives::B256;
use thiserror::Error;
use vela_derive::errors::{MessageError, MultiplexerError};
use vela_preimage::PreimageOracleError;

/// Errors raised by oracle-backed providers.
#[derive(Error, Debug)]
pub enum OracleProviderError {
    /// A preimage query failed.
    #[error("preimage oracle error: {0}")]
    Preimage(#[from] PreimageOracleError),
    /// A resolved buffer failed to RLP-decode.
    #[error("rlp error: {0}")]
    Rlp(alloy_rlp::Error),
    /// A header resolved by hash carried a different number than requested.
    #[error("header {hash} has number {got}, requested {requested}")]
    HeaderNumberMismatch {
        /// The header hash that was resolved.
        hash: B256,
        /// The block number the caller asked for.
        requested: u64,
        /// The block number the resolved header carries.
        got: u64,
    },
}

/// Errors aborting a replay. Generic over the execution backend's error the
/// same way the backend itself is opaque to the driver.
#[derive(Error, Debug)]
pub enum ReplayError<E>
where
    E: core::error::Error,
{
    /// An oracle-backed provider failed.
    #[error("oracle provider error: {0}")]
    Provider(#[from] OracleProviderError),
    /// The inbox multiplexer failed.
    #[error("inbox multiplexer error: {0}")]
    Multiplexer(#[from] MultiplexerError),
    /// An inbox message failed to parse.
    #[error("message error: {0}")]
    Message(#[from] MessageError),
    /// The opaque execution backend failed.
    #[error("execution backend error: {0}")]
    Execution(E),
    /// Both DA backends were enabled by the chain params.
    #[error("both DataAvailabilityCommittee and CelestiaDA are enabled")]
    ConflictingDa,
    /// The chain config recovered from system state failed to parse.
    #[error("chain config json invalid: {0}")]
    ChainConfigParse(serde_json::Error),
    /// The parsed chain config disagrees with the chain id in system state.
    #[error("chain id mismatch: system state has {state}, chain config has {config}")]
    ChainIdMismatch {
        /// The chain id recovered from system state.
        state: u64,
        /// The chain id the config carries.
        config: u64,
    },
    /// The parsed chain config disagrees with the genesis block number in
    /// system state.
    #[error("genesis block number mismatch: system state has {state}, chain config has {config}")]
    GenesisMismatch {
        /// The genesis block number recovered from system state.
        state: u64,
        /// The genesis block number the config carries.
        config: u64,
    },
    /// No compiled-in chain config exists for the recovered chain id.
    #[error("no compiled-in chain config for chain id {0}")]
    MissingChainConfig(u64),
    /// The produced header deserialized with an ArbOS format version of
    /// zero, which marks a corrupt header.
    #[error("produced header {0} carries ArbOS format version 0")]
    ArbOsVersionZero(B256),
}
