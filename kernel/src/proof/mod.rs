//! Proof module: canonical content hashing.
//!
//! Leaf utility module; nothing else in the kernel depends on it except
//! `world`, which uses [`hash::canonical_hash`] to derive stable world ids,
//! and `state`, which uses it for `canonical_fingerprint`.

pub mod hash;
