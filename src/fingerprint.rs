//! Content fingerprints for change detection.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `content`.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
