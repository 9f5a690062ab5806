//! Admin API key comparison.
//!
//! Both sides are hashed first so the comparison always runs over two
//! equal-length digests, then compared with [`subtle::ConstantTimeEq`].

use leadbid_core::hashing::sha256_hex;
use subtle::ConstantTimeEq;

/// `true` iff `provided` equals the configured key.
pub fn api_key_matches(provided: &str, expected: &str) -> bool {
    let provided = sha256_hex(provided.as_bytes());
    let expected = sha256_hex(expected.as_bytes());
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
