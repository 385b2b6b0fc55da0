//! In-memory oracle and tape used across the workspace's tests and the
//! standalone replay harness.

use crate::{PreimageKey, PreimageKind, PreimageOracle, PreimageOracleError, PreimageOracleResult, ReplayTape};
use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};
use alloy_primitives::{keccak256, B256};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use spin::Mutex;

/// Mutable cursor state of a [TestOracle] tape.
#[derive(Debug, Default)]
struct TapeState {
    inbox_position: u64,
    position_within_message: u64,
    last_block_hash: B256,
    send_root: Option<B256>,
    sequencer_reads: u64,
}

/// A deterministic in-memory preimage oracle plus replay tape.
///
/// Preimages live in a [BTreeMap] so that nothing about the oracle depends
/// on hash-map iteration order. Every resolved key is appended to a query
/// log, which lets tests assert on the exact number and order of oracle
/// reads a reconstruction performs.
#[derive(Debug, Default)]
pub struct TestOracle {
    preimages: Mutex<BTreeMap<PreimageKey, Vec<u8>>>,
    sequencer_messages: Mutex<Vec<Vec<u8>>>,
    delayed_messages: Mutex<Vec<Vec<u8>>>,
    queries: Mutex<Vec<PreimageKey>>,
    state: Mutex<TapeState>,
}

impl TestOracle {
    /// Creates an empty oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a preimage under an explicit key.
    pub fn insert_preimage(&self, key: PreimageKey, data: Vec<u8>) {
        self.preimages.lock().insert(key, data);
    }

    /// Inserts `data` under its keccak-256 digest and returns the digest.
    pub fn insert_keccak(&self, data: &[u8]) -> B256 {
        let hash = keccak256(data);
        self.insert_preimage(PreimageKey::new_keccak256(hash), data.to_vec());
        hash
    }

    /// Inserts `data` under its sha2-256 digest and returns the digest.
    pub fn insert_sha256(&self, data: &[u8]) -> B256 {
        let hash = B256::from_slice(&Sha256::digest(data));
        self.insert_preimage(PreimageKey::new_sha256(hash), data.to_vec());
        hash
    }

    /// Inserts a blob preimage under the given versioned hash.
    ///
    /// Versioned hashes are not recomputable from the blob alone, so the
    /// caller supplies the key.
    pub fn insert_blob(&self, versioned_hash: B256, data: Vec<u8>) {
        self.insert_preimage(PreimageKey::new_blob(versioned_hash), data);
    }

    /// Appends a sequencer inbox slot and returns its position.
    pub fn push_sequencer_message(&self, data: Vec<u8>) -> u64 {
        let mut messages = self.sequencer_messages.lock();
        messages.push(data);
        messages.len() as u64 - 1
    }

    /// Appends a delayed inbox message and returns its sequence number.
    pub fn push_delayed_message(&self, data: Vec<u8>) -> u64 {
        let mut messages = self.delayed_messages.lock();
        messages.push(data);
        messages.len() as u64 - 1
    }

    /// Seeds the committed prior block hash at the tape head.
    pub fn seed_last_block_hash(&self, hash: B256) {
        self.state.lock().last_block_hash = hash;
    }

    /// Seeds the sequencer inbox cursor.
    pub fn seed_inbox_position(&self, pos: u64) {
        self.state.lock().inbox_position = pos;
    }

    /// Seeds the within-batch resume offset.
    pub fn seed_position_within_message(&self, pos: u64) {
        self.state.lock().position_within_message = pos;
    }

    /// Returns the send root written back by the replay, if any.
    pub fn committed_send_root(&self) -> Option<B256> {
        self.state.lock().send_root
    }

    /// Returns the block hash currently committed at the tape head.
    pub fn committed_block_hash(&self) -> B256 {
        self.state.lock().last_block_hash
    }

    /// Returns the number of sequencer inbox slot reads performed so far.
    pub fn sequencer_reads(&self) -> u64 {
        self.state.lock().sequencer_reads
    }

    /// Returns the preimage keys resolved so far, in query order.
    pub fn query_log(&self) -> Vec<PreimageKey> {
        self.queries.lock().clone()
    }

    /// Returns how many preimage queries hit the given hash domain.
    pub fn queries_of_kind(&self, kind: PreimageKind) -> usize {
        self.queries.lock().iter().filter(|k| k.kind == kind).count()
    }
}

#[async_trait]
impl PreimageOracle for TestOracle {
    async fn get(&self, key: PreimageKey) -> PreimageOracleResult<Vec<u8>> {
        self.queries.lock().push(key);
        self.preimages
            .lock()
            .get(&key)
            .cloned()
            .ok_or(PreimageOracleError::UnknownPreimage(key))
    }
}

#[async_trait]
impl ReplayTape for TestOracle {
    async fn inbox_position(&self) -> u64 {
        self.state.lock().inbox_position
    }

    async fn advance_inbox_message(&self) {
        self.state.lock().inbox_position += 1;
    }

    async fn position_within_message(&self) -> u64 {
        self.state.lock().position_within_message
    }

    async fn set_position_within_message(&self, pos: u64) {
        self.state.lock().position_within_message = pos;
    }

    async fn read_inbox_message(&self, pos: u64) -> PreimageOracleResult<Vec<u8>> {
        self.state.lock().sequencer_reads += 1;
        self.sequencer_messages
            .lock()
            .get(pos as usize)
            .cloned()
            .ok_or(PreimageOracleError::MissingInboxMessage(pos))
    }

    async fn read_delayed_inbox_message(&self, seq: u64) -> PreimageOracleResult<Vec<u8>> {
        self.delayed_messages
            .lock()
            .get(seq as usize)
            .cloned()
            .ok_or(PreimageOracleError::MissingDelayedMessage(seq))
    }

    async fn last_block_hash(&self) -> B256 {
        self.state.lock().last_block_hash
    }

    async fn set_last_block_hash(&self, hash: B256) {
        self.state.lock().last_block_hash = hash;
    }

    async fn set_send_root(&self, root: B256) {
        self.state.lock().send_root = Some(root);
    }
}
