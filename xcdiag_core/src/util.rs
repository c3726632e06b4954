//! Fingerprinting used for deduplication.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 fingerprint of a diagnostic's identity tuple.
///
/// Fields are separated by a NUL byte so `("a:b", None)` and `("a", "b")`
/// cannot collide.
#[must_use]
pub fn fingerprint(kind: &str, file: Option<&str>, line: Option<u32>, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\0");
    hasher.update(file.unwrap_or_default().as_bytes());
    hasher.update(b"\0");
    if let Some(line) = line {
        hasher.update(line.to_string().as_bytes());
    }
    hasher.update(b"\0");
    hasher.update(message.as_bytes());
    format!("{:x}", hasher.finalize())
}
