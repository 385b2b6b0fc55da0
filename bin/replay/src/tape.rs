//! On-disk tape snapshots for the harness.

use alloy_primitives::{Bytes, B256};
use serde::Deserialize;
use std::collections::BTreeMap;
use vela_preimage::test_utils::TestOracle;

/// A recorded tape: the committed preimages, the two inboxes, and the
/// cursor seeds of one replay invocation. Hashes and byte strings are hex.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TapeFile {
    /// The prior block hash at the tape head; zero selects the genesis
    /// path.
    #[serde(default)]
    pub last_block_hash: B256,
    /// The sequencer inbox cursor seed.
    #[serde(default)]
    pub inbox_position: u64,
    /// The within-batch resume offset seed.
    #[serde(default)]
    pub position_within_message: u64,
    /// Keccak-committed preimages, keyed by their own digest on load.
    #[serde(default)]
    pub keccak_preimages: Vec<Bytes>,
    /// Sha2-committed preimages, keyed by their own digest on load.
    #[serde(default)]
    pub sha256_preimages: Vec<Bytes>,
    /// Blob preimages keyed by versioned hash.
    #[serde(default)]
    pub blob_preimages: BTreeMap<B256, Bytes>,
    /// Sequencer inbox slots, in position order.
    #[serde(default)]
    pub sequencer_messages: Vec<Bytes>,
    /// Delayed inbox messages, in sequence order.
    #[serde(default)]
    pub delayed_messages: Vec<Bytes>,
}

impl TapeFile {
    /// Materializes the snapshot into an in-memory oracle.
    pub fn into_oracle(self) -> TestOracle {
        let oracle = TestOracle::new();
        for preimage in &self.keccak_preimages {
            oracle.insert_keccak(preimage);
        }
        for preimage in &self.sha256_preimages {
            oracle.insert_sha256(preimage);
        }
        for (versioned_hash, blob) in self.blob_preimages {
            oracle.insert_blob(versioned_hash, blob.to_vec());
        }
        for slot in self.sequencer_messages {
            oracle.push_sequencer_message(slot.to_vec());
        }
        for message in self.delayed_messages {
            oracle.push_delayed_message(message.to_vec());
        }
        oracle.seed_last_block_hash(self.last_block_hash);
        oracle.seed_inbox_position(self.inbox_position);
        oracle.seed_position_within_message(self.position_within_message);
        oracle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_preimage::ReplayTape;

    #[test]
    fn test_parse_minimal_tape() {
        let raw = r#"{
            "sequencer_messages": ["0x00ff"],
            "delayed_messages": []
        }"#;
        let tape: TapeFile = serde_json::from_str(raw).unwrap();
        assert!(tape.last_block_hash.is_zero());
        assert_eq!(tape.sequencer_messages.len(), 1);

        let oracle = tape.into_oracle();
        assert_eq!(vela_proof::block_on(oracle.read_inbox_message(0)).unwrap(), vec![0x00, 0xff]);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_json::from_str::<TapeFile>(r#"{"bogus": 1}"#).is_err());
    }
}
