//! Cache key derivation.
//!
//! Keys are `"{kind}:{digest}"` where the digest is the first
//! [`DIGEST_HEX_LEN`] hex characters of a SHA-256 over a length-prefixed
//! encoding of the kind, the canonical text and every parameter in sorted
//! order. Unlike the per-process `DefaultHasher`, SHA-256 is stable across
//! processes and restarts, so a shared cache backend can reuse the same keys.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::types::PayloadKind;

/// Hex characters of digest kept in each key (64 bits).
pub const DIGEST_HEX_LEN: usize = 16;

/// Opaque cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Derive the cache key for a request.
///
/// `params` is a `BTreeMap` so iteration order is fixed. Each field is
/// length-prefixed, which keeps `("ab", "c")` and `("a", "bc")` apart.
pub fn derive_key(
    kind: PayloadKind,
    canonical_text: &str,
    params: &BTreeMap<String, String>,
) -> CacheKey {
    let mut hasher = Sha256::new();
    write_field(&mut hasher, kind.as_str());
    write_field(&mut hasher, canonical_text);
    hasher.update((params.len() as u64).to_be_bytes());
    for (name, value) in params {
        write_field(&mut hasher, name);
        write_field(&mut hasher, value);
    }
    let digest = hex::encode(hasher.finalize());
    CacheKey(format!("{}:{}", kind.as_str(), &digest[..DIGEST_HEX_LEN]))
}

/// Convenience for callers with no auxiliary parameters.
pub fn derive_key_plain(kind: PayloadKind, canonical_text: &str) -> CacheKey {
    derive_key(kind, canonical_text, &BTreeMap::new())
}

fn write_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_be_bytes());
    hasher.update(field.as_bytes());
}
