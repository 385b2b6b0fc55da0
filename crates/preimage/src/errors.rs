//! Error types for preimage oracle queries.

use crate::PreimageKey;
use thiserror::Error;

/// A [Result] type for [PreimageOracleError].
pub type PreimageOracleResult<T> = Result<T, PreimageOracleError>;

/// Errors raised while querying the preimage oracle or the replay tape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreimageOracleError {
    /// The host has no preimage committed under the given key. Fatal: the
    /// replay cannot make progress without the witness.
    #[error("no preimage committed for key {0}")]
    UnknownPreimage(PreimageKey),
    /// The tape has no inbox slot at the given position.
    #[error("no sequencer inbox message at position {0}")]
    MissingInboxMessage(u64),
    /// The tape has no delayed inbox message with the given sequence number.
    #[error("no delayed inbox message with sequence number {0}")]
    MissingDelayedMessage(u64),
}
