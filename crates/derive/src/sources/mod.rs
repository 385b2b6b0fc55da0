//! DA provider implementations and the framing selector.
//!
//! The first byte of a sequencer inbox slot selects how the batch payload
//! is recovered. The provider set is closed, so dispatch is a tagged enum
//! rather than an open trait object.

pub(crate) mod tree;

mod dastree;
pub use dastree::DasReader;

mod celestia;
pub use celestia::{BlobPointer, CelestiaReader, SquareData, NAMESPACE_SIZE, SHARE_SIZE};

mod blobs;
pub use blobs::{decode_blobs, encode_blobs, BlobReader};

use crate::errors::ResolutionError;
use alloc::vec::Vec;
use alloy_primitives::{Bytes, B256};
use tracing::debug;
use vela_preimage::PreimageOracle;

/// Header byte of a batch carried directly in the slot.
pub const CALLDATA_HEADER_BYTE: u8 = 0x00;

/// Header flag bit marking a DA-committee commitment. The whole upper half
/// of the byte space is reserved for committee framing variants.
pub const DAS_MESSAGE_HEADER_FLAG: u8 = 0x80;

/// Header byte of an EIP-4844 versioned-hash list.
pub const BLOB_HASHES_HEADER_BYTE: u8 = 0x50;

/// Header byte of a Celestia blob pointer.
pub const CELESTIA_MESSAGE_HEADER_BYTE: u8 = 0x63;

/// One configured DA resolver.
#[derive(Debug, Clone)]
pub enum DaProvider<T> {
    /// DA-committee payloads behind a keccak tree root.
    Das(DasReader<T>),
    /// Celestia payloads behind a blob pointer.
    Celestia(CelestiaReader<T>),
    /// EIP-4844 payloads behind a versioned-hash list.
    Blobs(BlobReader<T>),
}

impl<T: PreimageOracle + Send + Sync> DaProvider<T> {
    /// Whether this provider's framing matches the slot's header byte.
    pub fn recognizes(&self, header: u8) -> bool {
        match self {
            Self::Das(_) => header & DAS_MESSAGE_HEADER_FLAG != 0,
            Self::Celestia(_) => header == CELESTIA_MESSAGE_HEADER_BYTE,
            Self::Blobs(_) => header == BLOB_HASHES_HEADER_BYTE,
        }
    }

    /// Recovers the batch payload from a slot this provider recognises.
    pub async fn resolve(&self, slot: &[u8]) -> Result<Bytes, ResolutionError> {
        let Some((_, body)) = slot.split_first() else {
            return Err(ResolutionError::EmptySlot);
        };
        match self {
            Self::Das(reader) => {
                if body.len() < 32 {
                    return Err(ResolutionError::TruncatedFrame { have: body.len(), need: 32 });
                }
                reader.payload(B256::from_slice(&body[..32])).await
            }
            Self::Celestia(reader) => {
                let pointer = BlobPointer::decode(body)?;
                let (blob, square) = reader.read(&pointer).await?;
                debug!(
                    target: "derive",
                    height = pointer.block_height,
                    square_size = square.square_size,
                    rows = square.rows.len(),
                    "recovered celestia batch"
                );
                Ok(blob)
            }
            Self::Blobs(reader) => {
                if body.len() < 2 {
                    return Err(ResolutionError::TruncatedFrame { have: body.len(), need: 2 });
                }
                let count = u16::from_be_bytes([body[0], body[1]]) as usize;
                let need = 2 + count * 32;
                if body.len() < need {
                    return Err(ResolutionError::TruncatedFrame { have: body.len(), need });
                }
                let hashes: Vec<B256> =
                    body[2..need].chunks_exact(32).map(B256::from_slice).collect();
                let blobs = reader.get_blobs(&hashes).await?;
                decode_blobs(&blobs)
            }
        }
    }
}

/// The ordered provider list a multiplexer dispatches through.
#[derive(Debug, Clone)]
pub struct DaProviders<T> {
    providers: Vec<DaProvider<T>>,
}

impl<T: PreimageOracle + Send + Sync> DaProviders<T> {
    /// Creates a selector over an ordered provider list.
    pub const fn new(providers: Vec<DaProvider<T>>) -> Self {
        Self { providers }
    }

    /// Demultiplexes one slot into its batch payload: raw calldata is
    /// handled inline, anything else goes to the first provider whose
    /// discriminator matches.
    pub async fn resolve_batch(&self, slot: &[u8]) -> Result<Bytes, ResolutionError> {
        let Some(&header) = slot.first() else {
            return Err(ResolutionError::EmptySlot);
        };
        if header == CALLDATA_HEADER_BYTE {
            return Ok(Bytes::copy_from_slice(&slot[1..]));
        }
        for provider in &self.providers {
            if provider.recognizes(header) {
                return provider.resolve(slot).await;
            }
        }
        Err(ResolutionError::UnsupportedHeaderByte(header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::HashTreeBuilder;
    use alloc::sync::Arc;
    use alloy_primitives::b256;
    use vela_preimage::test_utils::TestOracle;

    fn all_providers(oracle: &Arc<TestOracle>) -> DaProviders<TestOracle> {
        DaProviders::new(vec![
            DaProvider::Das(DasReader::new(oracle.clone())),
            DaProvider::Celestia(CelestiaReader::new(oracle.clone())),
            DaProvider::Blobs(BlobReader::new(oracle.clone())),
        ])
    }

    #[tokio::test]
    async fn test_raw_calldata_passthrough() {
        let oracle = Arc::new(TestOracle::new());
        let providers = all_providers(&oracle);
        let mut slot = vec![CALLDATA_HEADER_BYTE];
        slot.extend_from_slice(b"inline batch");
        let batch = providers.resolve_batch(&slot).await.unwrap();
        assert_eq!(batch, Bytes::from_static(b"inline batch"));
    }

    #[tokio::test]
    async fn test_das_flag_dispatch() {
        let oracle = Arc::new(TestOracle::new());
        let root = HashTreeBuilder::keccak(&oracle).leaf(b"committee batch").build();
        let providers = all_providers(&oracle);
        // Any header with the high bit set selects the committee reader.
        let mut slot = vec![DAS_MESSAGE_HEADER_FLAG | 0x08];
        slot.extend_from_slice(root.as_slice());
        let batch = providers.resolve_batch(&slot).await.unwrap();
        assert_eq!(batch, Bytes::from_static(b"committee batch"));
    }

    #[tokio::test]
    async fn test_blob_hash_list_dispatch() {
        let oracle = Arc::new(TestOracle::new());
        let blobs = encode_blobs(b"blob batch");
        let hash = b256!("0109000000000000000000000000000000000000000000000000000000000001");
        oracle.insert_blob(hash, blobs[0].to_vec());

        let providers = all_providers(&oracle);
        let mut slot = vec![BLOB_HASHES_HEADER_BYTE];
        slot.extend_from_slice(&1u16.to_be_bytes());
        slot.extend_from_slice(hash.as_slice());
        let batch = providers.resolve_batch(&slot).await.unwrap();
        assert_eq!(batch, Bytes::from_static(b"blob batch"));
    }

    #[tokio::test]
    async fn test_empty_slot_rejected() {
        let oracle = Arc::new(TestOracle::new());
        let err = all_providers(&oracle).resolve_batch(&[]).await.unwrap_err();
        assert!(matches!(err, ResolutionError::EmptySlot));
    }

    #[tokio::test]
    async fn test_unrecognised_header_rejected() {
        let oracle = Arc::new(TestOracle::new());
        let err = all_providers(&oracle).resolve_batch(&[0x17, 0xff]).await.unwrap_err();
        assert!(matches!(err, ResolutionError::UnsupportedHeaderByte(0x17)));
    }

    #[tokio::test]
    async fn test_disabled_provider_does_not_match() {
        let oracle = Arc::new(TestOracle::new());
        // Blob reader only: committee framing has nowhere to go.
        let providers = DaProviders::new(vec![DaProvider::Blobs(BlobReader::new(oracle))]);
        let mut slot = vec![DAS_MESSAGE_HEADER_FLAG];
        slot.extend_from_slice(&[0u8; 32]);
        let err = providers.resolve_batch(&slot).await.unwrap_err();
        assert!(matches!(err, ResolutionError::UnsupportedHeaderByte(b) if b == DAS_MESSAGE_HEADER_FLAG));
    }

    #[tokio::test]
    async fn test_truncated_das_frame_rejected() {
        let oracle = Arc::new(TestOracle::new());
        let providers = all_providers(&oracle);
        let err = providers.resolve_batch(&[DAS_MESSAGE_HEADER_FLAG, 1, 2]).await.unwrap_err();
        assert!(matches!(err, ResolutionError::TruncatedFrame { have: 2, need: 32 }));
    }
}
