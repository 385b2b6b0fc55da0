//! Error types for DA resolution and inbox multiplexing.

use alloy_primitives::{B256, U256};
use thiserror::Error;
use vela_preimage::PreimageOracleError;

/// Errors raised while reconstructing a committed payload through a DA
/// resolver. All of these are fatal to the replay.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The oracle had no preimage for a node the commitment requires.
    #[error("preimage oracle error: {0}")]
    Oracle(#[from] PreimageOracleError),
    /// A hash tree node carried a tag outside the internal/leaf alphabet.
    #[error("hash tree node carries unknown tag {0:#04x}")]
    MalformedNode(u8),
    /// A hash tree node was too short to carry its declared shape.
    #[error("hash tree node truncated at {0} bytes")]
    TruncatedNode(usize),
    /// A data-root leaf was not a 32-byte namespaced root hash.
    #[error("data root leaf of {0} bytes is not a 32-byte row root")]
    MalformedRoot(usize),
    /// The data root expanded to a leaf list that cannot split into row and
    /// column roots.
    #[error("data root expanded to {0} leaves, expected an even, non-trivial split")]
    UnevenSquare(usize),
    /// The blob pointer does not address a recoverable range of the square.
    #[error(
        "bad blob pointer: start {start}, shares length {shares_length}, square size {square_size}"
    )]
    BadPointer {
        /// The pointer's absolute start share.
        start: u64,
        /// The pointer's share count.
        shares_length: u64,
        /// The extended square width the pointer was resolved against.
        square_size: u64,
    },
    /// An ordering invariant that cannot hold for a well-formed commitment
    /// was violated.
    #[error("internal ordering violation: {0}")]
    InternalOrdering(&'static str),
    /// A share was shorter than the header it is required to carry.
    #[error("share of {len} bytes is shorter than its {need}-byte header")]
    ShortShare {
        /// The actual share length.
        len: usize,
        /// The minimum length the share's position requires.
        need: usize,
    },
    /// A declared payload length exceeded the bytes actually recovered.
    #[error("declared length {sequence_length} exceeds the {available} recovered bytes")]
    LengthMismatch {
        /// The declared payload length.
        sequence_length: u64,
        /// The number of bytes actually recovered.
        available: usize,
    },
    /// A versioned-hash preimage was not exactly one blob long.
    #[error("blob preimage for {hash} is {len} bytes, expected {expected}", expected = alloy_eips::eip4844::BYTES_PER_BLOB)]
    BadBlobLength {
        /// The versioned hash the preimage was requested under.
        hash: B256,
        /// The length the oracle returned.
        len: usize,
    },
    /// The sequencer inbox slot was empty.
    #[error("sequencer inbox slot is empty")]
    EmptySlot,
    /// No configured provider recognises the slot's framing byte.
    #[error("no DA provider recognises header byte {0:#04x}")]
    UnsupportedHeaderByte(u8),
    /// A provider's framing header was cut short.
    #[error("DA framing truncated: have {have} bytes, need {need}")]
    TruncatedFrame {
        /// The bytes present after the header byte.
        have: usize,
        /// The bytes the framing requires.
        need: usize,
    },
}

/// Errors raised while parsing inbox messages.
#[derive(Error, Debug)]
pub enum MessageError {
    /// The oracle failed while resolving a nested reference.
    #[error("preimage oracle error: {0}")]
    Oracle(#[from] PreimageOracleError),
    /// The message was shorter than its fixed header.
    #[error("incoming message truncated: have {have} bytes, need {need}")]
    Truncated {
        /// The bytes present.
        have: usize,
        /// The bytes required.
        need: usize,
    },
    /// A chain id that does not fit the registry's key width.
    #[error("init message chain id {0} does not fit in 64 bits")]
    OversizedChainId(U256),
    /// An init message was requested from a message of a different kind.
    #[error("message kind {0:#04x} is not an init message")]
    NotInit(u8),
    /// The init message's inlined chain config failed to parse.
    #[error("init message carries malformed chain config: {0}")]
    MalformedChainConfig(#[from] serde_json::Error),
}

/// Errors raised by the inbox multiplexer.
#[derive(Error, Debug)]
pub enum MultiplexerError {
    /// The tape failed underneath the inbox backend.
    #[error("replay tape error: {0}")]
    Tape(#[from] PreimageOracleError),
    /// A DA resolver failed to reconstruct the batch.
    #[error("batch resolution failed: {0}")]
    Resolution(#[from] ResolutionError),
    /// A delayed message failed to parse.
    #[error("delayed message invalid: {0}")]
    Message(#[from] MessageError),
    /// A keyset update carried a hash with no committed keyset behind it.
    #[error("keyset {0} failed validation")]
    KeysetInvalid(B256),
    /// The batch payload ended inside a header or segment.
    #[error("batch truncated: have {have} bytes, need {need}")]
    BatchTruncated {
        /// The bytes present.
        have: usize,
        /// The bytes required.
        need: usize,
    },
    /// A segment carried an unknown kind byte.
    #[error("unknown batch segment kind {0:#04x}")]
    UnknownSegment(u8),
    /// A segment's payload did not match its kind's fixed layout.
    #[error("segment kind {kind:#04x} carries a malformed {len}-byte payload")]
    MalformedSegment {
        /// The segment kind.
        kind: u8,
        /// The payload length found.
        len: usize,
    },
    /// The within-batch cursor points past the batch's emissions.
    #[error("position within message {pos} exceeds the batch's {total} emissions")]
    PositionPastBatch {
        /// The resume cursor.
        pos: u64,
        /// The number of emissions the batch yields.
        total: u64,
    },
}
