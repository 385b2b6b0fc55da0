//! Types for keying the preimage oracle.

use alloy_primitives::B256;

/// The hash domain a preimage is committed under.
///
/// The hosting VM maintains one table per kind; a query against the wrong
/// table never resolves, even when the 32-byte digests collide across
/// domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PreimageKind {
    /// The preimage is committed under its keccak-256 digest.
    Keccak256 = 0,
    /// The preimage is committed under its sha2-256 digest.
    Sha256 = 1,
    /// The preimage is an EIP-4844 blob committed under its versioned hash.
    EthVersionedBlobHash = 2,
}

/// A fully-qualified preimage oracle key: the hash domain plus the 32-byte
/// content address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreimageKey {
    /// The hash domain of the key.
    pub kind: PreimageKind,
    /// The content address within the domain.
    pub hash: B256,
}

impl PreimageKey {
    /// Creates a new [PreimageKey] from a kind and a content address.
    pub const fn new(hash: B256, kind: PreimageKind) -> Self {
        Self { kind, hash }
    }

    /// Creates a new keccak-256 keyed [PreimageKey].
    pub const fn new_keccak256(hash: B256) -> Self {
        Self::new(hash, PreimageKind::Keccak256)
    }

    /// Creates a new sha2-256 keyed [PreimageKey].
    pub const fn new_sha256(hash: B256) -> Self {
        Self::new(hash, PreimageKind::Sha256)
    }

    /// Creates a new versioned-blob-hash keyed [PreimageKey].
    pub const fn new_blob(hash: B256) -> Self {
        Self::new(hash, PreimageKind::EthVersionedBlobHash)
    }
}

impl core::fmt::Display for PreimageKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}/{}", self.kind, self.hash)
    }
}
