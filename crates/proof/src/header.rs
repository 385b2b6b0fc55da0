//! Block header recovery and the rollup extra-info encoding.

use crate::errors::OracleProviderError;
use alloc::sync::Arc;
use alloy_consensus::Header;
use alloy_primitives::{B256, B64};
use alloy_rlp::Decodable;
use vela_preimage::{PreimageKey, PreimageOracle};

/// Resolves and decodes the header committed under `hash`.
pub async fn header_by_hash<T: PreimageOracle>(
    oracle: &T,
    hash: B256,
) -> Result<Header, OracleProviderError> {
    let encoded = oracle.get(PreimageKey::new_keccak256(hash)).await?;
    Header::decode(&mut encoded.as_slice()).map_err(OracleProviderError::Rlp)
}

/// An oracle-backed header lookup for the execution backend.
///
/// The backend resolves ancestors by `(hash, number)` pairs; a header whose
/// decoded number disagrees with the requested one is a corrupt witness.
#[derive(Debug, Clone)]
pub struct ChainContext<T> {
    oracle: Arc<T>,
}

impl<T: PreimageOracle + Send + Sync> ChainContext<T> {
    /// Creates a new [ChainContext] over the given oracle.
    pub const fn new(oracle: Arc<T>) -> Self {
        Self { oracle }
    }
}

/// Witness-backed header lookups handed to the execution seam.
///
/// Object-safe so the seam stays free of the concrete tape type; the
/// replay driver passes a [ChainContext] through
/// [`produce_block`](crate::ExecutionBackend::produce_block).
pub trait HeaderReader {
    /// Resolves the header behind `hash`, checking it sits at `number`.
    fn header_by_number(&self, hash: B256, number: u64) -> Result<Header, OracleProviderError>;
}

impl<T: PreimageOracle + Send + Sync> HeaderReader for ChainContext<T> {
    /// Synchronous for the execution seam's benefit; blocks internally on
    /// the oracle read.
    fn header_by_number(&self, hash: B256, number: u64) -> Result<Header, OracleProviderError> {
        crate::block_on(async move {
            let header = header_by_hash(self.oracle.as_ref(), hash).await?;
            if header.number != number {
                return Err(OracleProviderError::HeaderNumberMismatch {
                    hash,
                    requested: number,
                    got: header.number,
                });
            }
            Ok(header)
        })
    }
}

/// The rollup fields a produced header carries outside the consensus
/// encoding: the send root in `extra_data`, the ArbOS format version and
/// the L1 block number packed big-endian into `mix_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderExtraInfo {
    /// The commitment to outgoing L2 to L1 messages.
    pub send_root: B256,
    /// The ArbOS format version; zero marks a corrupt header.
    pub arbos_format_version: u64,
    /// The L1 block number the block was derived against.
    pub l1_block_number: u64,
}

impl HeaderExtraInfo {
    /// Deserializes the extra info out of a header. A header whose
    /// `extra_data` is not a 32-byte send root decodes with a zero send
    /// root and whatever version `mix_hash` carries; the version check
    /// downstream rejects corrupt headers.
    pub fn decode(header: &Header) -> Self {
        let send_root = if header.extra_data.len() == 32 {
            B256::from_slice(&header.extra_data)
        } else {
            B256::ZERO
        };
        let mut version = [0u8; 8];
        version.copy_from_slice(&header.mix_hash[..8]);
        let mut l1_block = [0u8; 8];
        l1_block.copy_from_slice(&header.mix_hash[8..16]);
        Self {
            send_root,
            arbos_format_version: u64::from_be_bytes(version),
            l1_block_number: u64::from_be_bytes(l1_block),
        }
    }

    /// Serializes the extra info into a header, the inverse of
    /// [HeaderExtraInfo::decode].
    pub fn apply(&self, header: &mut Header) {
        header.extra_data = self.send_root.to_vec().into();
        let mut mix_hash = B256::ZERO;
        mix_hash[..8].copy_from_slice(&self.arbos_format_version.to_be_bytes());
        mix_hash[8..16].copy_from_slice(&self.l1_block_number.to_be_bytes());
        header.mix_hash = mix_hash;
    }
}

/// Recovers the delayed-message total from a header's nonce field.
pub fn delayed_messages_read(header: &Header) -> u64 {
    u64::from_be_bytes(header.nonce.0)
}

/// Encodes a delayed-message total into a header nonce.
pub fn nonce_from_delayed(delayed_messages_read: u64) -> B64 {
    B64::new(delayed_messages_read.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;
    use alloy_rlp::Encodable;
    use vela_preimage::test_utils::TestOracle;

    fn stamped_header(number: u64) -> Header {
        let mut header = Header { number, ..Default::default() };
        HeaderExtraInfo {
            send_root: keccak256(b"sends"),
            arbos_format_version: 11,
            l1_block_number: 19_000_000,
        }
        .apply(&mut header);
        header
    }

    fn commit_header(oracle: &TestOracle, header: &Header) -> B256 {
        let mut encoded = Vec::new();
        header.encode(&mut encoded);
        oracle.insert_keccak(&encoded)
    }

    #[test]
    fn test_extra_info_roundtrip() {
        let header = stamped_header(3);
        let info = HeaderExtraInfo::decode(&header);
        assert_eq!(info.send_root, keccak256(b"sends"));
        assert_eq!(info.arbos_format_version, 11);
        assert_eq!(info.l1_block_number, 19_000_000);
    }

    #[test]
    fn test_malformed_extra_decodes_zero_send_root() {
        let mut header = stamped_header(3);
        header.extra_data = vec![1, 2, 3].into();
        assert_eq!(HeaderExtraInfo::decode(&header).send_root, B256::ZERO);
    }

    #[test]
    fn test_nonce_roundtrip() {
        let nonce = nonce_from_delayed(77);
        let header = Header { nonce, ..Default::default() };
        assert_eq!(delayed_messages_read(&header), 77);
    }

    #[tokio::test]
    async fn test_header_by_hash_resolves_committed_header() {
        let oracle = TestOracle::new();
        let header = stamped_header(8);
        let hash = commit_header(&oracle, &header);
        let resolved = header_by_hash(&oracle, hash).await.unwrap();
        assert_eq!(resolved, header);
        assert_eq!(resolved.hash_slow(), hash);
    }

    #[test]
    fn test_chain_context_rejects_number_mismatch() {
        let oracle = Arc::new(TestOracle::new());
        let header = stamped_header(8);
        let hash = commit_header(&oracle, &header);

        let context = ChainContext::new(oracle);
        assert!(context.header_by_number(hash, 8).is_ok());
        let err = context.header_by_number(hash, 9).unwrap_err();
        assert!(matches!(
            err,
            OracleProviderError::HeaderNumberMismatch { requested: 9, got: 8, .. }
        ));
    }
}
