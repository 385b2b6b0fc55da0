//! Blob reconstruction from a Celestia data square.
//!
//! A batch committed to Celestia is addressed by a [BlobPointer]: a range of
//! shares inside the block's erasure-coded data square. The resolver expands
//! the committed data root into row and column roots, expands each touched
//! row's namespaced Merkle tree, discards the Reed-Solomon parity half, and
//! deframes the selected shares back into the batch payload.

use crate::{
    errors::ResolutionError,
    message::read_u64_be,
    sources::tree::resolve_tree,
};
use alloc::{sync::Arc, vec::Vec};
use alloy_primitives::{Bytes, B256};
use vela_preimage::{PreimageKind, PreimageOracle};

/// The namespace width, in bytes, agreed with the DA network.
pub const NAMESPACE_SIZE: usize = 29;

/// The fixed share width of the data square.
pub const SHARE_SIZE: usize = 512;

/// Bytes stripped from the head of a continuation share: the namespace
/// prefix plus the doubled namespace and info byte of the share header.
const CONTINUATION_HEADER: usize = 2 * NAMESPACE_SIZE + 1;

/// Bytes stripped from the head of the first share, which additionally
/// carries the 4-byte big-endian sequence length.
const FIRST_SHARE_HEADER: usize = CONTINUATION_HEADER + 4;

/// Addresses a blob inside a Celestia block.
///
/// Wire layout, big-endian: `block_height(8) || start(8) ||
/// shares_length(8) || tx_commitment(32) || data_root(32)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobPointer {
    /// The Celestia block height the blob was included at.
    pub block_height: u64,
    /// The absolute index of the blob's first share.
    pub start: u64,
    /// The number of shares the blob spans.
    pub shares_length: u64,
    /// The commitment of the PayForBlobs transaction.
    pub tx_commitment: B256,
    /// The data root of the block's extended square.
    pub data_root: B256,
}

impl BlobPointer {
    /// The pointer's fixed wire length.
    pub const ENCODED_LEN: usize = 8 * 3 + 32 * 2;

    /// Decodes a pointer from its fixed wire layout.
    pub fn decode(data: &[u8]) -> Result<Self, ResolutionError> {
        if data.len() != Self::ENCODED_LEN {
            return Err(ResolutionError::TruncatedFrame {
                have: data.len(),
                need: Self::ENCODED_LEN,
            });
        }
        Ok(Self {
            block_height: read_u64_be(&data[..8]),
            start: read_u64_be(&data[8..16]),
            shares_length: read_u64_be(&data[16..24]),
            tx_commitment: B256::from_slice(&data[24..56]),
            data_root: B256::from_slice(&data[56..88]),
        })
    }

    /// Encodes the pointer into its fixed wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.extend_from_slice(&self.block_height.to_be_bytes());
        out.extend_from_slice(&self.start.to_be_bytes());
        out.extend_from_slice(&self.shares_length.to_be_bytes());
        out.extend_from_slice(self.tx_commitment.as_slice());
        out.extend_from_slice(self.data_root.as_slice());
        out
    }
}

/// The reconstructed view of the touched part of a data square. Held only
/// for the duration of one multiplexer pop.
#[derive(Debug, Clone)]
pub struct SquareData {
    /// Row roots: the first half of the data root's leaves.
    pub row_roots: Vec<B256>,
    /// Column roots: the second half of the data root's leaves.
    pub column_roots: Vec<B256>,
    /// The raw shares of every touched row, parity included.
    pub rows: Vec<Vec<Bytes>>,
    /// The extended square width.
    pub square_size: u64,
    /// The first touched row.
    pub start_row: u64,
    /// The last touched row.
    pub end_row: u64,
}

/// Reconstructs Celestia-committed batches through the sha2 oracle.
#[derive(Debug, Clone)]
pub struct CelestiaReader<T> {
    oracle: Arc<T>,
}

impl<T: PreimageOracle> CelestiaReader<T> {
    /// Creates a new [CelestiaReader] over the given oracle.
    pub const fn new(oracle: Arc<T>) -> Self {
        Self { oracle }
    }

    /// Resolves the blob behind `pointer`, returning the payload and the
    /// square view it was cut from.
    pub async fn read(
        &self,
        pointer: &BlobPointer,
    ) -> Result<(Bytes, SquareData), ResolutionError> {
        let oracle = self.oracle.as_ref();
        let leaves =
            resolve_tree(oracle, PreimageKind::Sha256, pointer.data_root).await?;
        if leaves.len() < 4 || leaves.len() % 2 != 0 {
            return Err(ResolutionError::UnevenSquare(leaves.len()));
        }
        let square_size = (leaves.len() / 2) as u64;
        let ods_size = square_size / 2;
        let bad_pointer = || ResolutionError::BadPointer {
            start: pointer.start,
            shares_length: pointer.shares_length,
            square_size,
        };

        let row_roots = parse_roots(&leaves[..square_size as usize])?;
        let column_roots = parse_roots(&leaves[square_size as usize..])?;

        let start_row = pointer.start / square_size;
        let start_index = pointer.start % square_size;
        if start_index > ods_size {
            return Err(bad_pointer());
        }
        let first_row_shares = ods_size - start_index;
        if pointer.shares_length == 0 {
            return Err(bad_pointer());
        }

        let single_row = pointer.shares_length <= first_row_shares;
        let remaining = pointer.shares_length.saturating_sub(first_row_shares);
        let end_row = if single_row {
            start_row
        } else {
            let rows_needed = remaining / ods_size;
            let carry = u64::from(remaining % ods_size > 0);
            start_row
                .checked_add(rows_needed)
                .and_then(|row| row.checked_add(carry))
                .ok_or_else(bad_pointer)?
        };
        if end_row >= square_size {
            return Err(bad_pointer());
        }

        // end_index is row-local within the original data square.
        let end_index = if single_row {
            let last = pointer
                .start
                .checked_add(pointer.shares_length - 1)
                .ok_or_else(bad_pointer)?;
            last % square_size
        } else if pointer.shares_length % square_size > 0 {
            let tail = remaining % ods_size;
            if tail < 1 {
                return Err(ResolutionError::InternalOrdering(
                    "partial final row with no remaining shares",
                ));
            }
            tail - 1
        } else {
            if end_row * ods_size < 1 {
                return Err(ResolutionError::InternalOrdering(
                    "full final row at zero square width",
                ));
            }
            ods_size - 1
        };
        if end_index + 1 > ods_size {
            return Err(bad_pointer());
        }

        let mut rows = Vec::new();
        let mut shares: Vec<Bytes> = Vec::new();
        for i in start_row..=end_row {
            let row =
                resolve_tree(oracle, PreimageKind::Sha256, row_roots[i as usize]).await?;
            if (row.len() as u64) < ods_size {
                return Err(ResolutionError::InternalOrdering(
                    "row expansion narrower than the ods width",
                ));
            }
            let ods_row = &row[..ods_size as usize];
            if start_row == end_row {
                if start_index > end_index + 1 {
                    return Err(ResolutionError::InternalOrdering(
                        "single-row start index past end index",
                    ));
                }
                shares.extend_from_slice(&ods_row[start_index as usize..=end_index as usize]);
            } else if i == start_row {
                shares.extend_from_slice(&ods_row[start_index as usize..]);
            } else if i == end_row {
                shares.extend_from_slice(&ods_row[..=end_index as usize]);
            } else {
                shares.extend_from_slice(ods_row);
            }
            rows.push(row);
        }

        let blob = deframe_shares(&shares)?;
        let square = SquareData {
            row_roots,
            column_roots,
            rows,
            square_size,
            start_row,
            end_row,
        };
        Ok((blob, square))
    }
}

/// Parses data-root leaves into 32-byte namespaced root hashes.
fn parse_roots(leaves: &[Bytes]) -> Result<Vec<B256>, ResolutionError> {
    leaves
        .iter()
        .map(|leaf| {
            (leaf.len() == 32)
                .then(|| B256::from_slice(leaf))
                .ok_or(ResolutionError::MalformedRoot(leaf.len()))
        })
        .collect()
}

/// Strips the share headers and truncates the concatenation to the sequence
/// length declared by the first share.
fn deframe_shares(shares: &[Bytes]) -> Result<Bytes, ResolutionError> {
    let first = shares
        .first()
        .ok_or(ResolutionError::InternalOrdering("selection yielded no shares"))?;
    if first.len() < FIRST_SHARE_HEADER {
        return Err(ResolutionError::ShortShare { len: first.len(), need: FIRST_SHARE_HEADER });
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&first[CONTINUATION_HEADER..FIRST_SHARE_HEADER]);
    let sequence_length = u64::from(u32::from_be_bytes(buf));

    let mut data = Vec::new();
    for (i, share) in shares.iter().enumerate() {
        let header = if i == 0 { FIRST_SHARE_HEADER } else { CONTINUATION_HEADER };
        if share.len() < header {
            return Err(ResolutionError::ShortShare { len: share.len(), need: header });
        }
        data.extend_from_slice(&share[header..]);
    }
    if sequence_length > data.len() as u64 {
        return Err(ResolutionError::LengthMismatch { sequence_length, available: data.len() });
    }
    data.truncate(sequence_length as usize);
    Ok(data.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::HashTreeBuilder;
    use alloy_primitives::keccak256;
    use vela_preimage::test_utils::TestOracle;

    /// Builds a share: 512 bytes of `fill`, with the sequence length window
    /// populated when this is the blob's first share.
    fn share(first_with_len: Option<u32>, fill: u8) -> Vec<u8> {
        let mut share = vec![fill; SHARE_SIZE];
        if let Some(len) = first_with_len {
            share[CONTINUATION_HEADER..FIRST_SHARE_HEADER].copy_from_slice(&len.to_be_bytes());
        }
        share
    }

    /// Commits a 4x4 extended square (ods width 2) whose rows hold the
    /// given shares, and returns a pointer template over it.
    fn commit_square(oracle: &TestOracle, rows: &[Vec<Vec<u8>>]) -> B256 {
        let mut leaves = Vec::new();
        for row in rows {
            let mut tree = HashTreeBuilder::sha256(oracle);
            for share in row {
                tree = tree.leaf(share);
            }
            leaves.push(tree.build());
        }
        // Column roots are never expanded; any 32-byte leaf will do.
        for i in 0..rows.len() {
            leaves.push(keccak256([i as u8]));
        }
        let mut data_tree = HashTreeBuilder::sha256(oracle);
        for leaf in &leaves {
            data_tree = data_tree.leaf(leaf.as_slice());
        }
        data_tree.build()
    }

    fn four_by_four(oracle: &TestOracle, sequence_length: u32) -> BlobPointer {
        let parity = || share(None, 0xee);
        let rows = vec![
            vec![share(None, 0x11), share(Some(sequence_length), 0x22), parity(), parity()],
            vec![share(None, 0x33), share(None, 0x44), parity(), parity()],
            vec![share(None, 0x55), share(None, 0x66), parity(), parity()],
            vec![share(None, 0x77), share(None, 0x88), parity(), parity()],
        ];
        let data_root = commit_square(oracle, &rows);
        BlobPointer {
            block_height: 100,
            start: 1,
            shares_length: 2,
            tx_commitment: B256::ZERO,
            data_root,
        }
    }

    #[tokio::test]
    async fn test_pointer_wire_roundtrip() {
        let pointer = BlobPointer {
            block_height: 9,
            start: 17,
            shares_length: 3,
            tx_commitment: keccak256(b"commitment"),
            data_root: keccak256(b"root"),
        };
        assert_eq!(BlobPointer::decode(&pointer.encode()).unwrap(), pointer);
        assert!(matches!(
            BlobPointer::decode(&[0u8; 40]).unwrap_err(),
            ResolutionError::TruncatedFrame { have: 40, need: 88 }
        ));
    }

    #[tokio::test]
    async fn test_two_row_pointer_crosses_into_second_row() {
        let oracle = Arc::new(TestOracle::new());
        let pointer = four_by_four(&oracle, 700);
        let reader = CelestiaReader::new(oracle);
        let (blob, square) = reader.read(&pointer).await.unwrap();

        assert_eq!(square.square_size, 4);
        assert_eq!(square.start_row, 0);
        assert_eq!(square.end_row, 1);
        assert_eq!(square.rows.len(), 2);
        assert_eq!(square.row_roots.len(), 4);
        assert_eq!(square.column_roots.len(), 4);

        // One share from row 0 index 1, one from row 1 index 0; the blob is
        // truncated to the sequence length carried by the first share.
        assert_eq!(blob.len(), 700);
        assert!(blob[..SHARE_SIZE - FIRST_SHARE_HEADER].iter().all(|b| *b == 0x22));
        assert!(blob[SHARE_SIZE - FIRST_SHARE_HEADER..].iter().all(|b| *b == 0x33));
    }

    #[tokio::test]
    async fn test_single_row_boundary_pointer() {
        let oracle = Arc::new(TestOracle::new());
        let mut pointer = four_by_four(&oracle, 10);
        // Covers exactly the whole ods of row 0; needs the sequence length
        // in share 0 instead of share 1.
        let rows = vec![
            vec![share(Some(10), 0x11), share(None, 0x22), share(None, 0xee), share(None, 0xee)],
            vec![share(None, 0x33), share(None, 0x44), share(None, 0xee), share(None, 0xee)],
            vec![share(None, 0x55), share(None, 0x66), share(None, 0xee), share(None, 0xee)],
            vec![share(None, 0x77), share(None, 0x88), share(None, 0xee), share(None, 0xee)],
        ];
        pointer.data_root = commit_square(&oracle, &rows);
        pointer.start = 0;
        pointer.shares_length = 2;

        let reader = CelestiaReader::new(oracle);
        let (blob, square) = reader.read(&pointer).await.unwrap();
        assert_eq!(square.start_row, 0);
        assert_eq!(square.end_row, 0);
        assert_eq!(square.rows.len(), 1);
        assert_eq!(blob.len(), 10);
        assert!(blob.iter().all(|b| *b == 0x11));
    }

    #[tokio::test]
    async fn test_zero_shares_is_bad_pointer_without_row_reads() {
        let oracle = Arc::new(TestOracle::new());
        let mut pointer = four_by_four(&oracle, 700);
        pointer.shares_length = 0;
        let reader = CelestiaReader::new(oracle.clone());
        let err = reader.read(&pointer).await.unwrap_err();
        assert!(matches!(err, ResolutionError::BadPointer { shares_length: 0, .. }));
        // Only the data root tree was expanded: 8 leaves => 15 queries.
        assert_eq!(oracle.queries_of_kind(vela_preimage::PreimageKind::Sha256), 15);
    }

    #[tokio::test]
    async fn test_start_index_past_ods_is_bad_pointer() {
        let oracle = Arc::new(TestOracle::new());
        let mut pointer = four_by_four(&oracle, 700);
        pointer.start = 3;
        let reader = CelestiaReader::new(oracle);
        let err = reader.read(&pointer).await.unwrap_err();
        assert!(matches!(err, ResolutionError::BadPointer { start: 3, .. }));
    }

    #[tokio::test]
    async fn test_partial_row_with_zero_tail_is_flagged() {
        // start 1, length 3 in a width-4 square leaves a "partial" batch
        // whose remaining-share tail lands exactly on the row boundary; the
        // arithmetic cannot assign it an end index.
        let oracle = Arc::new(TestOracle::new());
        let mut pointer = four_by_four(&oracle, 700);
        pointer.shares_length = 3;
        let reader = CelestiaReader::new(oracle);
        let err = reader.read(&pointer).await.unwrap_err();
        assert!(matches!(err, ResolutionError::InternalOrdering(_)));
    }

    #[tokio::test]
    async fn test_exact_sequence_length_is_not_truncated() {
        let oracle = Arc::new(TestOracle::new());
        let exact = (2 * SHARE_SIZE - FIRST_SHARE_HEADER - CONTINUATION_HEADER) as u32;
        let pointer = four_by_four(&oracle, exact);
        let reader = CelestiaReader::new(oracle);
        let (blob, _) = reader.read(&pointer).await.unwrap();
        assert_eq!(blob.len(), exact as usize);
    }

    #[tokio::test]
    async fn test_oversized_sequence_length_is_rejected() {
        let oracle = Arc::new(TestOracle::new());
        let available = 2 * SHARE_SIZE - FIRST_SHARE_HEADER - CONTINUATION_HEADER;
        let pointer = four_by_four(&oracle, available as u32 + 1);
        let reader = CelestiaReader::new(oracle);
        let err = reader.read(&pointer).await.unwrap_err();
        assert!(
            matches!(err, ResolutionError::LengthMismatch { sequence_length, available: a }
                if sequence_length == available as u64 + 1 && a == available)
        );
    }

    #[tokio::test]
    async fn test_short_share_is_rejected() {
        let oracle = Arc::new(TestOracle::new());
        let rows = vec![
            vec![share(None, 0x11), vec![0x22; 40], share(None, 0xee), share(None, 0xee)],
            vec![share(None, 0x33), share(None, 0x44), share(None, 0xee), share(None, 0xee)],
            vec![share(None, 0x55), share(None, 0x66), share(None, 0xee), share(None, 0xee)],
            vec![share(None, 0x77), share(None, 0x88), share(None, 0xee), share(None, 0xee)],
        ];
        let data_root = commit_square(&oracle, &rows);
        let pointer = BlobPointer {
            block_height: 1,
            start: 1,
            shares_length: 2,
            tx_commitment: B256::ZERO,
            data_root,
        };
        let reader = CelestiaReader::new(oracle);
        let err = reader.read(&pointer).await.unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::ShortShare { len: 40, need } if need == FIRST_SHARE_HEADER
        ));
    }
}
