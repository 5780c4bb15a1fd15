//! Content hashing for response validators.

use blake3::Hasher;

/// BLAKE3 hex digest of an in-memory payload.
///
/// Used as the strong `ETag` of a rendered image, so identical renders of
/// the same request always carry the same validator.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize().to_hex().to_string()
}
