use sha2::{Digest, Sha256};

/// Derive a filename-safe cache key from a seed, usually the source URL.
///
/// The key is the lowercase hex SHA-256 digest of the seed: always 64
/// characters, never containing a path separator.
pub fn derive_key(seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hex::encode(hasher.finalize())
}
