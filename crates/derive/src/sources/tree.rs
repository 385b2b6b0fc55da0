//! Binary hash-tree expansion through the preimage oracle.
//!
//! Committed payloads are Merkleized as perfectly-balanced binary trees
//! whose node preimages carry a one-byte tag: internal nodes resolve to the
//! tag followed by two 32-byte child hashes, leaves to the tag followed by
//! raw content. Verification is implicit, as the oracle only serves buffers
//! whose digest matches the requested hash.

use crate::errors::ResolutionError;
use alloc::{vec, vec::Vec};
use alloy_primitives::{Bytes, B256};
use vela_preimage::{PreimageKey, PreimageKind, PreimageOracle};

/// Tag byte of a leaf node preimage.
pub(crate) const LEAF_TAG: u8 = 0x00;
/// Tag byte of an internal node preimage.
pub(crate) const INTERNAL_TAG: u8 = 0x01;

/// Expands the tree rooted at `root` and returns its leaf contents in
/// left-to-right order.
///
/// Each node is resolved exactly once, so a tree with `n` leaves costs
/// `2n - 1` oracle queries.
pub(crate) async fn resolve_tree<T: PreimageOracle>(
    oracle: &T,
    kind: PreimageKind,
    root: B256,
) -> Result<Vec<Bytes>, ResolutionError> {
    let mut leaves = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let buf = oracle.get(PreimageKey::new(node, kind)).await?;
        match buf.split_first() {
            Some((&INTERNAL_TAG, children)) => {
                if children.len() != 64 {
                    return Err(ResolutionError::TruncatedNode(buf.len()));
                }
                // Right child first so the left subtree pops first.
                stack.push(B256::from_slice(&children[32..]));
                stack.push(B256::from_slice(&children[..32]));
            }
            Some((&LEAF_TAG, content)) => leaves.push(Bytes::copy_from_slice(content)),
            Some((&tag, _)) => return Err(ResolutionError::MalformedNode(tag)),
            None => return Err(ResolutionError::TruncatedNode(0)),
        }
    }
    Ok(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::HashTreeBuilder;
    use vela_preimage::test_utils::TestOracle;

    #[tokio::test]
    async fn test_single_leaf_tree() {
        let oracle = TestOracle::new();
        let root = HashTreeBuilder::keccak(&oracle).leaf(b"only").build();
        let leaves = resolve_tree(&oracle, PreimageKind::Keccak256, root).await.unwrap();
        assert_eq!(leaves, vec![Bytes::from_static(b"only")]);
        assert_eq!(oracle.queries_of_kind(PreimageKind::Keccak256), 1);
    }

    #[tokio::test]
    async fn test_leaves_in_left_to_right_order() {
        let oracle = TestOracle::new();
        let root = HashTreeBuilder::keccak(&oracle)
            .leaf(b"a")
            .leaf(b"b")
            .leaf(b"c")
            .leaf(b"d")
            .build();
        let leaves = resolve_tree(&oracle, PreimageKind::Keccak256, root).await.unwrap();
        let collected: Vec<&[u8]> = leaves.iter().map(|l| l.as_ref()).collect();
        assert_eq!(collected, [b"a".as_ref(), b"b", b"c", b"d"]);
    }

    #[tokio::test]
    async fn test_query_count_is_two_n_minus_one() {
        let oracle = TestOracle::new();
        let root = HashTreeBuilder::keccak(&oracle)
            .leaf(b"one")
            .leaf(b"two")
            .leaf(b"three")
            .leaf(b"four")
            .build();
        resolve_tree(&oracle, PreimageKind::Keccak256, root).await.unwrap();
        // Four leaves => three internal nodes => seven distinct queries.
        assert_eq!(oracle.queries_of_kind(PreimageKind::Keccak256), 7);
    }

    #[tokio::test]
    async fn test_malformed_tag_rejected() {
        let oracle = TestOracle::new();
        let root = oracle.insert_keccak(&[0x7f, 1, 2, 3]);
        let err = resolve_tree(&oracle, PreimageKind::Keccak256, root).await.unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedNode(0x7f)));
    }

    #[tokio::test]
    async fn test_truncated_internal_node_rejected() {
        let oracle = TestOracle::new();
        let mut node = vec![INTERNAL_TAG];
        node.extend_from_slice(&[0u8; 32]);
        let root = oracle.insert_keccak(&node);
        let err = resolve_tree(&oracle, PreimageKind::Keccak256, root).await.unwrap_err();
        assert!(matches!(err, ResolutionError::TruncatedNode(33)));
    }

    #[tokio::test]
    async fn test_unknown_root_propagates() {
        let oracle = TestOracle::new();
        let err = resolve_tree(&oracle, PreimageKind::Keccak256, B256::ZERO).await.unwrap_err();
        assert!(matches!(err, ResolutionError::Oracle(_)));
    }
}
