//! Traits for the preimage oracle and the replay tape.

use crate::{PreimageKey, PreimageOracleResult};
use alloc::{boxed::Box, vec::Vec};
use alloy_primitives::B256;
use async_trait::async_trait;

/// A synchronous-in-spirit, content-addressed preimage lookup.
///
/// Every call either returns a buffer whose digest under the key's hash
/// domain equals the key's content address, or fails with
/// [UnknownPreimage]. The futures involved never suspend on anything but
/// the hosting VM servicing the read, so the whole replay stays a pure
/// function of the tape.
///
/// [UnknownPreimage]: crate::PreimageOracleError::UnknownPreimage
#[async_trait]
pub trait PreimageOracle {
    /// Resolves the preimage behind `key`, handing out a freshly-allocated
    /// buffer.
    async fn get(&self, key: PreimageKey) -> PreimageOracleResult<Vec<u8>>;
}

/// The replay tape: the committed input/output channel of one replay
/// invocation.
///
/// The cursor operations are observable side effects on the proof tape.
/// [`advance_inbox_message`] must be called exactly once per fully-consumed
/// sequencer batch, and [`set_position_within_message`] is the only other
/// cursor mutation a replay may perform before the final two commitment
/// writes.
///
/// [`advance_inbox_message`]: ReplayTape::advance_inbox_message
/// [`set_position_within_message`]: ReplayTape::set_position_within_message
#[async_trait]
pub trait ReplayTape {
    /// Returns the current sequencer inbox position.
    async fn inbox_position(&self) -> u64;

    /// Advances the sequencer inbox cursor past the current batch.
    async fn advance_inbox_message(&self);

    /// Returns the resume offset within the currently-peeked batch.
    async fn position_within_message(&self) -> u64;

    /// Sets the resume offset within the currently-peeked batch.
    async fn set_position_within_message(&self, pos: u64);

    /// Reads the full sequencer inbox slot payload at `pos`.
    async fn read_inbox_message(&self, pos: u64) -> PreimageOracleResult<Vec<u8>>;

    /// Reads the delayed inbox message with sequence number `seq`.
    async fn read_delayed_inbox_message(&self, seq: u64) -> PreimageOracleResult<Vec<u8>>;

    /// Reads the committed hash of the block the replay builds on.
    async fn last_block_hash(&self) -> B256;

    /// Commits the hash of the freshly-produced block.
    async fn set_last_block_hash(&self, hash: B256);

    /// Commits the send root extracted from the freshly-produced block.
    async fn set_send_root(&self, root: B256);
}

/// A convenience bound for handles that serve both preimages and the tape.
pub trait TapeClient: PreimageOracle + ReplayTape {}

impl<T> TapeClient for T where T: PreimageOracle + ReplayTape {}
