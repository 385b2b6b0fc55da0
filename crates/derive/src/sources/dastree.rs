//! Payload reconstruction for DA-committee commitments.

use crate::{errors::ResolutionError, sources::tree::resolve_tree};
use alloc::{sync::Arc, vec::Vec};
use alloy_primitives::{Bytes, B256};
use vela_preimage::{PreimageKind, PreimageOracle};

/// Reconstructs DA-committee payloads committed as keccak hash trees.
#[derive(Debug, Clone)]
pub struct DasReader<T> {
    oracle: Arc<T>,
}

impl<T: PreimageOracle> DasReader<T> {
    /// Creates a new [DasReader] over the given oracle.
    pub const fn new(oracle: Arc<T>) -> Self {
        Self { oracle }
    }

    /// Walks the keccak tree under `root` and concatenates its leaves into
    /// the committed payload.
    pub async fn payload(&self, root: B256) -> Result<Bytes, ResolutionError> {
        let leaves =
            resolve_tree(self.oracle.as_ref(), PreimageKind::Keccak256, root).await?;
        let mut out = Vec::with_capacity(leaves.iter().map(|l| l.len()).sum());
        for leaf in leaves {
            out.extend_from_slice(&leaf);
        }
        Ok(out.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::HashTreeBuilder;
    use vela_preimage::test_utils::TestOracle;

    #[tokio::test]
    async fn test_payload_concatenates_leaves() {
        let oracle = Arc::new(TestOracle::new());
        let root = HashTreeBuilder::keccak(&oracle).leaf(b"hello ").leaf(b"world").build();
        let reader = DasReader::new(oracle);
        assert_eq!(reader.payload(root).await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_missing_commitment_is_fatal() {
        let oracle = Arc::new(TestOracle::new());
        let reader = DasReader::new(oracle);
        let err = reader.payload(B256::ZERO).await.unwrap_err();
        assert!(matches!(err, ResolutionError::Oracle(_)));
    }
}
