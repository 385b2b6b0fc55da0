//! Fixture builders and mock collaborators shared by the workspace's tests
//! and the replay harness.

use crate::{
    errors::MessageError,
    message::L1IncomingMessage,
    multiplexer::{SEGMENT_ADVANCE_DELAYED, SEGMENT_KEYSET_UPDATE, SEGMENT_L2_MESSAGE},
    sources::{tree, DAS_MESSAGE_HEADER_FLAG},
    traits::InboxBackend,
};
use alloc::{boxed::Box, vec::Vec};
use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use spin::Mutex;
use vela_preimage::{test_utils::TestOracle, PreimageOracleError, PreimageOracleResult};

/// Builds a balanced binary hash tree over pushed leaves, committing every
/// node preimage into a [TestOracle], and returns the root.
#[derive(Debug)]
pub struct HashTreeBuilder<'a> {
    oracle: &'a TestOracle,
    keccak: bool,
    leaves: Vec<Vec<u8>>,
}

impl<'a> HashTreeBuilder<'a> {
    /// Starts a keccak-committed tree.
    pub fn keccak(oracle: &'a TestOracle) -> Self {
        Self { oracle, keccak: true, leaves: Vec::new() }
    }

    /// Starts a sha2-committed tree.
    pub fn sha256(oracle: &'a TestOracle) -> Self {
        Self { oracle, keccak: false, leaves: Vec::new() }
    }

    /// Appends a leaf.
    pub fn leaf(mut self, content: &[u8]) -> Self {
        self.leaves.push(content.to_vec());
        self
    }

    /// Commits the tree and returns its root.
    pub fn build(self) -> B256 {
        assert!(!self.leaves.is_empty(), "a hash tree needs at least one leaf");
        self.commit(&self.leaves)
    }

    fn commit(&self, leaves: &[Vec<u8>]) -> B256 {
        if let [leaf] = leaves {
            let mut node = Vec::with_capacity(1 + leaf.len());
            node.push(tree::LEAF_TAG);
            node.extend_from_slice(leaf);
            return self.insert(&node);
        }
        let mid = leaves.len().div_ceil(2);
        let left = self.commit(&leaves[..mid]);
        let right = self.commit(&leaves[mid..]);
        let mut node = Vec::with_capacity(65);
        node.push(tree::INTERNAL_TAG);
        node.extend_from_slice(left.as_slice());
        node.extend_from_slice(right.as_slice());
        self.insert(&node)
    }

    fn insert(&self, node: &[u8]) -> B256 {
        if self.keccak {
            self.oracle.insert_keccak(node)
        } else {
            self.oracle.insert_sha256(node)
        }
    }
}

/// Commits `batch` behind a keccak tree and frames it as a DA-committee
/// inbox slot.
pub fn das_slot(oracle: &TestOracle, batch: &[u8]) -> Vec<u8> {
    let root = HashTreeBuilder::keccak(oracle).leaf(batch).build();
    let mut slot = Vec::with_capacity(33);
    slot.push(DAS_MESSAGE_HEADER_FLAG);
    slot.extend_from_slice(root.as_slice());
    slot
}

/// Builds a batch payload in the multiplexer's segment wire format.
#[derive(Debug)]
pub struct BatchBuilder {
    bytes: Vec<u8>,
}

impl BatchBuilder {
    /// Starts a batch with the given L1 context.
    pub fn new(block_number: u64, timestamp: u64) -> Self {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&block_number.to_be_bytes());
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        Self { bytes }
    }

    fn segment(mut self, kind: u8, payload: &[u8]) -> Self {
        self.bytes.push(kind);
        self.bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Appends an L2 message segment.
    pub fn l2_message(self, payload: &[u8]) -> Self {
        self.segment(SEGMENT_L2_MESSAGE, payload)
    }

    /// Appends an advance-delayed segment.
    pub fn advance_delayed(self, count: u64) -> Self {
        self.segment(SEGMENT_ADVANCE_DELAYED, &count.to_be_bytes())
    }

    /// Appends a keyset-update segment.
    pub fn keyset_update(self, keyset_hash: B256) -> Self {
        self.segment(SEGMENT_KEYSET_UPDATE, keyset_hash.as_slice())
    }

    /// Returns the batch payload.
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// An in-memory inbox backend over prebuilt slots and delayed messages.
#[derive(Debug)]
pub struct TestInboxBackend {
    slots: Vec<Vec<u8>>,
    delayed: Vec<L1IncomingMessage>,
    cursor: Mutex<(u64, u64)>,
}

impl TestInboxBackend {
    /// Creates a backend serving the given slots and delayed messages.
    pub fn new(slots: Vec<Vec<u8>>, delayed: Vec<L1IncomingMessage>) -> Self {
        Self { slots, delayed, cursor: Mutex::new((0, 0)) }
    }
}

#[async_trait]
impl InboxBackend for TestInboxBackend {
    async fn peek_sequencer_inbox(&self) -> PreimageOracleResult<(Bytes, B256)> {
        let pos = self.cursor.lock().0;
        self.slots
            .get(pos as usize)
            .map(|slot| (Bytes::copy_from_slice(slot), B256::ZERO))
            .ok_or(PreimageOracleError::MissingInboxMessage(pos))
    }

    async fn sequencer_inbox_position(&self) -> u64 {
        self.cursor.lock().0
    }

    async fn advance_sequencer_inbox(&self) {
        self.cursor.lock().0 += 1;
    }

    async fn position_within_message(&self) -> u64 {
        self.cursor.lock().1
    }

    async fn set_position_within_message(&self, pos: u64) {
        self.cursor.lock().1 = pos;
    }

    async fn read_delayed_inbox(&self, seq: u64) -> Result<L1IncomingMessage, MessageError> {
        self.delayed
            .get(seq as usize)
            .cloned()
            .ok_or(MessageError::Oracle(PreimageOracleError::MissingDelayedMessage(seq)))
    }
}
