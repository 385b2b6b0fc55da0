//! The inbox multiplexer: the state machine that turns sequencer batches
//! and delayed messages into a single ordered message stream.

use crate::{
    errors::MultiplexerError,
    message::{read_u64_be, L1IncomingMessage, MessageWithMetadata, BATCH_POSTER_ADDRESS},
    sources::DaProviders,
    traits::InboxBackend,
};
use alloc::{sync::Arc, vec::Vec};
use alloy_primitives::{Bytes, B256, U256};
use tracing::debug;
use vela_preimage::{PreimageKey, PreimageOracle};

/// The length of the batch context header preceding the segments.
const BATCH_CONTEXT_LEN: usize = 16;
/// The length of a segment's kind-plus-length prefix.
const SEGMENT_PREFIX_LEN: usize = 5;

/// Segment kind: an L2 message to emit directly.
pub(crate) const SEGMENT_L2_MESSAGE: u8 = 0;
/// Segment kind: advance the delayed queue by a count.
pub(crate) const SEGMENT_ADVANCE_DELAYED: u8 = 1;
/// Segment kind: a keyset update referenced by hash.
pub(crate) const SEGMENT_KEYSET_UPDATE: u8 = 2;

/// How keyset-update segments are policed during a pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeysetValidationMode {
    /// A keyset hash with no committed keyset behind it aborts the replay.
    PanicIfInvalid,
    /// Keysets are accepted without consulting the oracle.
    AssumeValid,
    /// Keysets are passed through unchecked; forced whenever a batch is
    /// re-entered mid-way, because validation already ran on first entry.
    DontValidate,
}

/// L1 context shared by every sequencer-fed message of one batch.
#[derive(Debug, Clone, Copy)]
struct BatchContext {
    block_number: u64,
    timestamp: u64,
}

/// One decoded batch segment.
#[derive(Debug, Clone)]
enum BatchSegment {
    L2Message(Bytes),
    AdvanceDelayed(u64),
    KeysetUpdate(B256),
}

/// One planned emission of the current batch.
#[derive(Debug, Clone, Copy)]
enum PlannedEmission<'a> {
    /// Emit an L2 message synthesized from batch context.
    Sequencer(&'a Bytes),
    /// Emit the next delayed message.
    Delayed,
}

/// The inbox multiplexer.
///
/// `pop` produces exactly one [MessageWithMetadata] per call, resuming from
/// the within-batch cursor and advancing it (or the batch cursor itself)
/// as a side effect on the tape.
#[derive(Debug)]
pub struct InboxMultiplexer<B, T> {
    backend: B,
    providers: DaProviders<T>,
    oracle: Arc<T>,
    delayed_messages_read: u64,
    keyset_mode: KeysetValidationMode,
}

impl<B, T> InboxMultiplexer<B, T>
where
    B: InboxBackend + Send + Sync,
    T: PreimageOracle + Send + Sync,
{
    /// Creates a new multiplexer.
    ///
    /// `delayed_messages_read` seeds the running delayed total, recovered
    /// from the prior block header's nonce by the replay driver.
    pub const fn new(
        backend: B,
        delayed_messages_read: u64,
        providers: DaProviders<T>,
        keyset_mode: KeysetValidationMode,
        oracle: Arc<T>,
    ) -> Self {
        Self { backend, providers, oracle, delayed_messages_read, keyset_mode }
    }

    /// Returns the running delayed-message total.
    pub const fn delayed_messages_read(&self) -> u64 {
        self.delayed_messages_read
    }

    /// Produces the next message of the canonical stream.
    ///
    /// Batches that yield no emissions are advanced over; the loop only
    /// terminates once a message is emitted or the tape runs out of slots.
    pub async fn pop(&mut self) -> Result<MessageWithMetadata, MultiplexerError> {
        loop {
            let (slot, _batch_block_hash) = self.backend.peek_sequencer_inbox().await?;
            let pos = self.backend.position_within_message().await;
            // Re-entering a batch means keysets were already policed when
            // it was first decoded.
            let mode = if pos > 0 { KeysetValidationMode::DontValidate } else { self.keyset_mode };

            let batch = self.providers.resolve_batch(&slot).await?;
            let (context, segments) = decode_segments(&batch)?;
            let plan = self.plan_emissions(&segments, mode).await?;

            let total = plan.len() as u64;
            if total == 0 {
                let inbox_pos = self.backend.sequencer_inbox_position().await;
                debug!(target: "derive", inbox_pos, "batch yields no messages, advancing");
                self.backend.advance_sequencer_inbox().await;
                self.backend.set_position_within_message(0).await;
                continue;
            }
            if pos >= total {
                return Err(MultiplexerError::PositionPastBatch { pos, total });
            }

            let message = match plan[pos as usize] {
                PlannedEmission::Sequencer(payload) => MessageWithMetadata {
                    message: synthesize_l2_message(context, payload),
                    delayed_messages_read: self.delayed_messages_read,
                },
                PlannedEmission::Delayed => {
                    // The running total is exactly the sequence number of
                    // the next unread delayed message.
                    let seq = self.delayed_messages_read;
                    let message = self.backend.read_delayed_inbox(seq).await?;
                    self.delayed_messages_read = seq + 1;
                    MessageWithMetadata { message, delayed_messages_read: seq + 1 }
                }
            };

            if pos + 1 == total {
                self.backend.advance_sequencer_inbox().await;
                self.backend.set_position_within_message(0).await;
            } else {
                self.backend.set_position_within_message(pos + 1).await;
            }
            return Ok(message);
        }
    }

    /// Flattens the segments into per-emission entries, policing keyset
    /// updates along the way.
    async fn plan_emissions<'a>(
        &self,
        segments: &'a [BatchSegment],
        mode: KeysetValidationMode,
    ) -> Result<Vec<PlannedEmission<'a>>, MultiplexerError> {
        let mut plan = Vec::new();
        for segment in segments {
            match segment {
                BatchSegment::L2Message(payload) => plan.push(PlannedEmission::Sequencer(payload)),
                BatchSegment::AdvanceDelayed(count) => {
                    for _ in 0..*count {
                        plan.push(PlannedEmission::Delayed);
                    }
                }
                BatchSegment::KeysetUpdate(hash) => {
                    if mode == KeysetValidationMode::PanicIfInvalid
                        && self.oracle.get(PreimageKey::new_keccak256(*hash)).await.is_err()
                    {
                        return Err(MultiplexerError::KeysetInvalid(*hash));
                    }
                }
            }
        }
        Ok(plan)
    }
}

/// Synthesizes the incoming message wrapper around a sequencer-fed L2
/// message.
fn synthesize_l2_message(context: BatchContext, payload: &Bytes) -> L1IncomingMessage {
    L1IncomingMessage {
        kind: L1IncomingMessage::KIND_L2_MESSAGE,
        poster: BATCH_POSTER_ADDRESS,
        block_number: context.block_number,
        timestamp: context.timestamp,
        request_id: None,
        l1_base_fee: U256::ZERO,
        payload: payload.clone(),
    }
}

/// Decodes a resolved batch into its context header and segment list.
///
/// Layout: `l1_block_number(8) || l1_timestamp(8)` followed by segments of
/// `kind(1) || len(4) || payload`, all big-endian.
fn decode_segments(batch: &[u8]) -> Result<(BatchContext, Vec<BatchSegment>), MultiplexerError> {
    if batch.len() < BATCH_CONTEXT_LEN {
        return Err(MultiplexerError::BatchTruncated { have: batch.len(), need: BATCH_CONTEXT_LEN });
    }
    let context = BatchContext {
        block_number: read_u64_be(&batch[..8]),
        timestamp: read_u64_be(&batch[8..16]),
    };

    let mut segments = Vec::new();
    let mut offset = BATCH_CONTEXT_LEN;
    while offset < batch.len() {
        if batch.len() - offset < SEGMENT_PREFIX_LEN {
            return Err(MultiplexerError::BatchTruncated {
                have: batch.len(),
                need: offset + SEGMENT_PREFIX_LEN,
            });
        }
        let kind = batch[offset];
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&batch[offset + 1..offset + SEGMENT_PREFIX_LEN]);
        let len = u32::from_be_bytes(buf) as usize;
        offset += SEGMENT_PREFIX_LEN;
        if batch.len() - offset < len {
            return Err(MultiplexerError::BatchTruncated { have: batch.len(), need: offset + len });
        }
        let payload = &batch[offset..offset + len];
        offset += len;

        let segment = match kind {
            SEGMENT_L2_MESSAGE => BatchSegment::L2Message(Bytes::copy_from_slice(payload)),
            SEGMENT_ADVANCE_DELAYED => {
                if len != 8 {
                    return Err(MultiplexerError::MalformedSegment { kind, len });
                }
                BatchSegment::AdvanceDelayed(read_u64_be(payload))
            }
            SEGMENT_KEYSET_UPDATE => {
                if len != 32 {
                    return Err(MultiplexerError::MalformedSegment { kind, len });
                }
                BatchSegment::KeysetUpdate(B256::from_slice(payload))
            }
            _ => return Err(MultiplexerError::UnknownSegment(kind)),
        };
        segments.push(segment);
    }
    Ok((context, segments))
}
