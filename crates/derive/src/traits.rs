//! Traits for the components the multiplexer is wired to.

use crate::{errors::MessageError, message::L1IncomingMessage};
use alloc::boxed::Box;
use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use vela_preimage::PreimageOracleResult;

/// A cursor over the sequencer and delayed inboxes.
///
/// The backend is the only component that mutates the replay cursor; the
/// multiplexer drives it strictly through these methods.
#[async_trait]
pub trait InboxBackend {
    /// Returns the current sequencer batch payload plus its L1 block hash.
    /// The block hash may be zero: the oracle-backed resolvers never
    /// consult it.
    async fn peek_sequencer_inbox(&self) -> PreimageOracleResult<(Bytes, B256)>;

    /// Returns the sequencer inbox position.
    async fn sequencer_inbox_position(&self) -> u64;

    /// Moves the cursor past the current batch.
    async fn advance_sequencer_inbox(&self);

    /// Returns the number of emissions already produced from the current
    /// batch.
    async fn position_within_message(&self) -> u64;

    /// Records the number of emissions produced from the current batch.
    async fn set_position_within_message(&self, pos: u64);

    /// Reads and parses the delayed message with sequence number `seq`,
    /// resolving any nested batch references.
    async fn read_delayed_inbox(&self, seq: u64) -> Result<L1IncomingMessage, MessageError>;
}
