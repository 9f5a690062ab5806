//! Shared SHA-256 hex digest utility.
//!
//! Used to fingerprint submitted consumer form data in the compliance log
//! and to compare admin API keys without handling the raw key twice.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Digest of a JSON document's canonical (serde_json) serialization.
pub fn json_sha256(value: &serde_json::Value) -> String {
    sha256_hex(value.to_string().as_bytes())
}
