//! Inbox message types and their wire format.

use crate::errors::MessageError;
use alloc::vec::Vec;
use alloy_primitives::{address, Address, Bytes, B256, U256};
use vela_genesis::ChainConfig;

/// The address credited as the poster of sequencer-fed L2 messages.
pub const BATCH_POSTER_ADDRESS: Address = address!("a4b000000000000000000073657175656e636572");

/// Reads a big-endian `u64` from the first eight bytes of `bytes`. Callers
/// bounds-check before invoking.
pub(crate) fn read_u64_be(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

/// A delayed (L1 to L2) message, identified by its position in the delayed
/// queue.
///
/// Wire layout, big-endian throughout:
/// `kind(1) || poster(20) || block_number(8) || timestamp(8) ||
/// request_id(32) || l1_base_fee(32) || payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1IncomingMessage {
    /// The message kind discriminator.
    pub kind: u8,
    /// The L1 address the message was posted from.
    pub poster: Address,
    /// The L1 block number the message was posted in.
    pub block_number: u64,
    /// The L1 timestamp the message was posted at.
    pub timestamp: u64,
    /// The L1 request id, absent on sequencer-synthesized messages.
    pub request_id: Option<B256>,
    /// The L1 base fee at posting time.
    pub l1_base_fee: U256,
    /// The kind-specific payload.
    pub payload: Bytes,
}

impl L1IncomingMessage {
    /// An L2 transaction batch entry.
    pub const KIND_L2_MESSAGE: u8 = 3;
    /// An explicit end-of-block marker.
    pub const KIND_END_OF_BLOCK: u8 = 6;
    /// An L2 message funded from L1.
    pub const KIND_L2_FUNDED_BY_L1: u8 = 7;
    /// A retryable ticket submission.
    pub const KIND_SUBMIT_RETRYABLE: u8 = 9;
    /// A gas-estimation-only batch.
    pub const KIND_BATCH_FOR_GAS_ESTIMATION: u8 = 10;
    /// The chain-initialization message.
    pub const KIND_INITIALIZE: u8 = 11;
    /// A plain ether deposit.
    pub const KIND_ETH_DEPOSIT: u8 = 12;
    /// A batch posting report used for fee accounting.
    pub const KIND_BATCH_POSTING_REPORT: u8 = 13;
    /// A message dropped as invalid by the inbox.
    pub const KIND_INVALID: u8 = 0xFF;

    /// The fixed header length preceding the payload.
    pub const HEADER_LEN: usize = 1 + 20 + 8 + 8 + 32 + 32;

    /// Parses a message from its wire encoding.
    pub fn parse(data: &[u8]) -> Result<Self, MessageError> {
        if data.len() < Self::HEADER_LEN {
            return Err(MessageError::Truncated { have: data.len(), need: Self::HEADER_LEN });
        }
        let kind = data[0];
        let poster = Address::from_slice(&data[1..21]);
        let block_number = read_u64_be(&data[21..29]);
        let timestamp = read_u64_be(&data[29..37]);
        let request_id = B256::from_slice(&data[37..69]);
        let l1_base_fee = U256::from_be_slice(&data[69..101]);
        Ok(Self {
            kind,
            poster,
            block_number,
            timestamp,
            request_id: Some(request_id),
            l1_base_fee,
            payload: Bytes::copy_from_slice(&data[Self::HEADER_LEN..]),
        })
    }

    /// Serializes the message into its wire encoding. An absent request id
    /// encodes as 32 zero bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::HEADER_LEN + self.payload.len());
        out.push(self.kind);
        out.extend_from_slice(self.poster.as_slice());
        out.extend_from_slice(&self.block_number.to_be_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(self.request_id.unwrap_or_default().as_slice());
        out.extend_from_slice(&self.l1_base_fee.to_be_bytes::<32>());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Reads the batch number and batch-data hash out of a batch posting
    /// report's payload: `batch_number(8) || batch_data_hash(32)`.
    pub fn batch_posting_report(&self) -> Result<(u64, B256), MessageError> {
        if self.payload.len() < 40 {
            return Err(MessageError::Truncated { have: self.payload.len(), need: 40 });
        }
        let batch_num = read_u64_be(&self.payload[..8]);
        let hash = B256::from_slice(&self.payload[8..40]);
        Ok((batch_num, hash))
    }

    /// Rewrites the batch-data hash of a batch posting report in place.
    pub fn set_batch_data_hash(&mut self, hash: B256) -> Result<(), MessageError> {
        if self.payload.len() < 40 {
            return Err(MessageError::Truncated { have: self.payload.len(), need: 40 });
        }
        let mut payload = self.payload.to_vec();
        payload[8..40].copy_from_slice(hash.as_slice());
        self.payload = payload.into();
        Ok(())
    }
}

/// The chain-initialization message carried by the first delayed message of
/// a fresh chain: `chain_id(32) || initial_l1_base_fee(32) || optional JSON
/// chain config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitMessage {
    /// The chain id the chain initializes with.
    pub chain_id: u64,
    /// The L1 base fee seeded into fee accounting.
    pub initial_l1_base_fee: U256,
    /// The inlined chain config, when the message carries one.
    pub chain_config: Option<ChainConfig>,
}

impl InitMessage {
    /// Parses the init message out of an initialize-kind incoming message.
    pub fn parse(message: &L1IncomingMessage) -> Result<Self, MessageError> {
        if message.kind != L1IncomingMessage::KIND_INITIALIZE {
            return Err(MessageError::NotInit(message.kind));
        }
        let payload = &message.payload;
        if payload.len() < 64 {
            return Err(MessageError::Truncated { have: payload.len(), need: 64 });
        }
        let raw_chain_id = U256::from_be_slice(&payload[..32]);
        let chain_id =
            u64::try_from(raw_chain_id).map_err(|_| MessageError::OversizedChainId(raw_chain_id))?;
        let initial_l1_base_fee = U256::from_be_slice(&payload[32..64]);
        let chain_config = if payload.len() > 64 {
            Some(serde_json::from_slice(&payload[64..])?)
        } else {
            None
        };
        Ok(Self { chain_id, initial_l1_base_fee, chain_config })
    }
}

/// The multiplexer's output: one message plus the running count of delayed
/// messages consumed once it is accounted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithMetadata {
    /// The emitted message.
    pub message: L1IncomingMessage,
    /// The delayed-message total after this message, mirrored into the
    /// produced block header's nonce.
    pub delayed_messages_read: u64,
}
