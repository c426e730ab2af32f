//! Canonical hashing types and domain separation constants.
//!
//! Algorithm: SHA-256 for all artifacts. One place defines canonical hashing
//! so that world ids, dataset entries, and GNN oracle digests never diverge.

use sha2::{Digest, Sha256};

/// A content-addressed hash with algorithm identifier.
///
/// Format: `"algorithm:hex_digest"` (e.g., `"sha256:abcdef..."`)
///
/// Invariant: the inner string always contains exactly one `:` separator,
/// with non-empty substrings on both sides (enforced by [`ContentHash::parse`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    full: String,
    colon: usize,
}

impl ContentHash {
    /// Parse from `"algorithm:hex_digest"` format.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let colon = s.find(':')?;
        if s[colon + 1..].contains(':') {
            return None;
        }
        let algorithm = &s[..colon];
        let digest = &s[colon + 1..];
        if algorithm.is_empty()
            || !algorithm
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return None;
        }
        if digest.is_empty()
            || !digest
                .bytes()
                .all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return None;
        }
        Some(Self {
            full: s.to_string(),
            colon,
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.full[..self.colon]
    }

    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.full[self.colon + 1..]
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The first 8 bytes of the digest as a `u64`, used as a compact world
    /// id where a full hex digest would be unwieldy.
    #[must_use]
    pub fn as_u64_prefix(&self) -> u64 {
        let mut bytes = [0u8; 8];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hex_pair = &self.hex_digest()[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(hex_pair, 16).unwrap_or(0);
        }
        u64::from_be_bytes(bytes)
    }
}

// Domain separation constants. Each prefix is null-terminated.

/// Domain prefix for Kripke world fluent-set hashing.
pub const DOMAIN_WORLD_FLUENTS: &[u8] = b"EPISTEMIC::WORLD_FLUENTS::V1\0";

/// Domain prefix for search-node/state fingerprint hashing.
pub const DOMAIN_SEARCH_STATE: &[u8] = b"EPISTEMIC::SEARCH_STATE::V1\0";

/// Domain prefix for dataset-entry hashing (visited-state dump).
pub const DOMAIN_DATASET_ENTRY: &[u8] = b"EPISTEMIC::DATASET_ENTRY::V1\0";

/// Domain prefix for GNN oracle graph-file hashing.
pub const DOMAIN_GNN_GRAPH: &[u8] = b"EPISTEMIC::GNN_GRAPH::V1\0";

/// Compute the canonical hash of a byte slice with domain separation.
///
/// Computes `sha256(domain_prefix || data)` and returns `"sha256:<hex_digest>"`.
/// The domain prefix must include the null terminator (all `DOMAIN_*`
/// constants in this module already do).
#[must_use]
pub fn canonical_hash(domain: &[u8], data: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    let digest = hasher.finalize();
    let hex = hex::encode(digest);
    let full = format!("sha256:{hex}");
    ContentHash { full, colon: 6 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_parse_valid() {
        let h = ContentHash::parse("sha256:abcdef0123456789").unwrap();
        assert_eq!(h.algorithm(), "sha256");
        assert_eq!(h.hex_digest(), "abcdef0123456789");
    }

    #[test]
    fn content_hash_parse_rejects_bad_format() {
        assert!(ContentHash::parse("nocolon").is_none());
        assert!(ContentHash::parse(":noalg").is_none());
        assert!(ContentHash::parse("nodigest:").is_none());
        assert!(ContentHash::parse("sha256:abc:def").is_none());
        assert!(ContentHash::parse("SHA256:abcdef").is_none());
        assert!(ContentHash::parse("sha256:ABCDEF").is_none());
    }

    #[test]
    fn domain_prefixes_are_null_terminated() {
        assert!(DOMAIN_WORLD_FLUENTS.ends_with(&[0]));
        assert!(DOMAIN_SEARCH_STATE.ends_with(&[0]));
        assert!(DOMAIN_DATASET_ENTRY.ends_with(&[0]));
        assert!(DOMAIN_GNN_GRAPH.ends_with(&[0]));
    }

    #[test]
    fn canonical_hash_deterministic() {
        let first = canonical_hash(DOMAIN_WORLD_FLUENTS, b"determinism");
        for _ in 0..10 {
            assert_eq!(canonical_hash(DOMAIN_WORLD_FLUENTS, b"determinism"), first);
        }
    }

    #[test]
    fn canonical_hash_varies_with_domain() {
        let a = canonical_hash(DOMAIN_WORLD_FLUENTS, b"x");
        let b = canonical_hash(DOMAIN_SEARCH_STATE, b"x");
        assert_ne!(a, b);
    }

    #[test]
    fn u64_prefix_is_stable() {
        let h = canonical_hash(DOMAIN_WORLD_FLUENTS, b"world-1");
        assert_eq!(h.as_u64_prefix(), h.as_u64_prefix());
    }
}
