//! EIP-4844 blob resolution and payload recovery.

use crate::errors::ResolutionError;
use alloc::{boxed::Box, sync::Arc, vec::Vec};
use alloy_eips::eip4844::{Blob, BYTES_PER_BLOB};
use alloy_primitives::{Bytes, B256};
use vela_preimage::{PreimageKey, PreimageOracle};

/// Resolves EIP-4844 versioned hashes into blobs through the oracle.
#[derive(Debug, Clone)]
pub struct BlobReader<T> {
    oracle: Arc<T>,
}

impl<T: PreimageOracle> BlobReader<T> {
    /// Creates a new [BlobReader] over the given oracle.
    pub const fn new(oracle: Arc<T>) -> Self {
        Self { oracle }
    }

    /// Fetches the blobs behind `versioned_hashes`, in list order. Every
    /// preimage must be exactly one blob long.
    pub async fn get_blobs(
        &self,
        versioned_hashes: &[B256],
    ) -> Result<Vec<Box<Blob>>, ResolutionError> {
        let mut blobs = Vec::with_capacity(versioned_hashes.len());
        for hash in versioned_hashes {
            let preimage = self.oracle.get(PreimageKey::new_blob(*hash)).await?;
            if preimage.len() != BYTES_PER_BLOB {
                return Err(ResolutionError::BadBlobLength { hash: *hash, len: preimage.len() });
            }
            blobs.push(Box::new(Blob::from_slice(&preimage)));
        }
        Ok(blobs)
    }
}

/// Recovers the batch payload from a list of blobs.
///
/// Each 32-byte field element contributes its low 31 bytes (the leading
/// byte is reserved to keep the element canonical); the concatenation opens
/// with a 4-byte big-endian payload length.
pub fn decode_blobs(blobs: &[Box<Blob>]) -> Result<Bytes, ResolutionError> {
    let mut packed = Vec::with_capacity(blobs.len() * (BYTES_PER_BLOB / 32) * 31);
    for blob in blobs {
        for element in blob.as_slice().chunks_exact(32) {
            packed.extend_from_slice(&element[1..]);
        }
    }
    if packed.len() < 4 {
        return Err(ResolutionError::LengthMismatch { sequence_length: 4, available: packed.len() });
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&packed[..4]);
    let len = u32::from_be_bytes(buf) as usize;
    if len > packed.len() - 4 {
        return Err(ResolutionError::LengthMismatch {
            sequence_length: len as u64,
            available: packed.len() - 4,
        });
    }
    Ok(Bytes::copy_from_slice(&packed[4..4 + len]))
}

/// Packs a payload into blobs, for fixtures and the harness. Inverse of
/// [decode_blobs].
pub fn encode_blobs(payload: &[u8]) -> Vec<Box<Blob>> {
    let mut framed = (payload.len() as u32).to_be_bytes().to_vec();
    framed.extend_from_slice(payload);

    let usable_per_blob = (BYTES_PER_BLOB / 32) * 31;
    let mut blobs = Vec::with_capacity(framed.len().div_ceil(usable_per_blob));
    for chunk in framed.chunks(usable_per_blob) {
        let mut blob = Box::new(Blob::ZERO);
        for (i, element) in chunk.chunks(31).enumerate() {
            blob[i * 32 + 1..i * 32 + 1 + element.len()].copy_from_slice(element);
        }
        blobs.push(blob);
    }
    blobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use vela_preimage::test_utils::TestOracle;

    #[tokio::test]
    async fn test_blobs_resolve_in_list_order() {
        let oracle = Arc::new(TestOracle::new());
        let h1 = b256!("0101010101010101010101010101010101010101010101010101010101010101");
        let h2 = b256!("0202020202020202020202020202020202020202020202020202020202020202");
        oracle.insert_blob(h1, vec![0xaa; BYTES_PER_BLOB]);
        oracle.insert_blob(h2, vec![0xbb; BYTES_PER_BLOB]);

        let reader = BlobReader::new(oracle);
        let blobs = reader.get_blobs(&[h1, h2]).await.unwrap();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0][0], 0xaa);
        assert_eq!(blobs[1][0], 0xbb);
    }

    #[tokio::test]
    async fn test_short_blob_preimage_is_fatal() {
        let oracle = Arc::new(TestOracle::new());
        let hash = b256!("0303030303030303030303030303030303030303030303030303030303030303");
        oracle.insert_blob(hash, vec![0u8; BYTES_PER_BLOB - 1]);

        let reader = BlobReader::new(oracle);
        let err = reader.get_blobs(&[hash]).await.unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::BadBlobLength { hash: h, len } if h == hash && len == BYTES_PER_BLOB - 1
        ));
    }

    #[test]
    fn test_payload_roundtrip_through_blobs() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let blobs = encode_blobs(&payload);
        assert_eq!(blobs.len(), 1);
        assert_eq!(decode_blobs(&blobs).unwrap().as_ref(), payload.as_slice());
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let blobs = encode_blobs(&[]);
        assert_eq!(decode_blobs(&blobs).unwrap().len(), 0);
    }

    #[test]
    fn test_oversized_length_prefix_rejected() {
        let mut blob = Box::new(Blob::ZERO);
        // Claim more payload than a single blob can carry.
        blob[1..5].copy_from_slice(&u32::MAX.to_be_bytes());
        let err = decode_blobs(&[blob]).unwrap_err();
        assert!(matches!(err, ResolutionError::LengthMismatch { .. }));
    }
}
