//! Webhook HMAC signing, verification, and secret generation.
//!
//! Outbound PING/POST bodies are signed with the buyer's secret; inbound
//! buyer callbacks are verified here, optionally enforcing a replay window
//! through a `timestamp` field embedded in the JSON payload.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of a hex-encoded HMAC-SHA256 digest.
pub const SIGNATURE_HEX_LENGTH: usize = 64;

/// Number of random bytes in a generated signing secret.
pub const SECRET_BYTES: usize = 32;

/// Header carrying the hex signature of the request body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Header carrying the unix timestamp (seconds) the body was signed at.
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

/// Default replay window for inbound callbacks.
pub const DEFAULT_MAX_AGE_SECS: i64 = 300;

/// Unix timestamps above this are interpreted as milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a signed payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature is missing or malformed")]
    Malformed,

    #[error("Signature does not match payload")]
    Mismatch,

    #[error("Payload has no usable timestamp")]
    MissingTimestamp,

    #[error("Payload timestamp is {age_secs}s old (max {max_age_secs}s)")]
    Expired { age_secs: i64, max_age_secs: i64 },

    #[error("Payload timestamp is in the future")]
    FutureTimestamp,
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

/// Compute the lowercase hex HMAC-SHA256 of `payload` under `secret`.
pub fn generate_webhook_signature(payload: &str, secret: &str) -> String {
    let mut mac = mac_for(secret);
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Generate a new random signing secret (64 hex characters).
pub fn generate_webhook_secret() -> String {
    let bytes: [u8; SECRET_BYTES] = rand::random();
    hex::encode(bytes)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Check a signature without a replay window.
///
/// Hex is accepted in either case. The digest comparison is constant-time.
pub fn check_webhook_signature(
    payload: &str,
    signature: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    if signature.len() != SIGNATURE_HEX_LENGTH {
        return Err(SignatureError::Malformed);
    }
    let expected = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;

    let mut mac = mac_for(secret);
    mac.update(payload.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Check a signature and the payload's embedded `timestamp` against `now`.
pub fn check_webhook_signature_at(
    payload: &str,
    signature: &str,
    secret: &str,
    max_age_secs: i64,
    now: Timestamp,
) -> Result<(), SignatureError> {
    check_webhook_signature(payload, signature, secret)?;

    let signed_at = extract_payload_timestamp(payload).ok_or(SignatureError::MissingTimestamp)?;
    let age_secs = (now - signed_at).num_seconds();
    if signed_at > now {
        return Err(SignatureError::FutureTimestamp);
    }
    if age_secs > max_age_secs {
        return Err(SignatureError::Expired {
            age_secs,
            max_age_secs,
        });
    }
    Ok(())
}

/// `true` iff `signature` is the HMAC-SHA256 of `payload` under `secret`.
pub fn verify_webhook_signature(payload: &str, signature: &str, secret: &str) -> bool {
    check_webhook_signature(payload, signature, secret).is_ok()
}

/// Like [`verify_webhook_signature`], additionally rejecting payloads whose
/// `timestamp` is missing, in the future, or older than `max_age_secs`.
pub fn verify_webhook_signature_with_max_age(
    payload: &str,
    signature: &str,
    secret: &str,
    max_age_secs: i64,
) -> bool {
    check_webhook_signature_at(payload, signature, secret, max_age_secs, Utc::now()).is_ok()
}

/// Read the `timestamp` field of a JSON payload.
///
/// Accepts unix seconds, unix milliseconds, numeric strings, and RFC 3339.
pub fn extract_payload_timestamp(payload: &str) -> Option<Timestamp> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    match value.get("timestamp")? {
        serde_json::Value::Number(n) => from_unix(n.as_i64()?),
        serde_json::Value::String(s) => match s.parse::<i64>() {
            Ok(n) => from_unix(n),
            Err(_) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        },
        _ => None,
    }
}

fn from_unix(value: i64) -> Option<Timestamp> {
    if value >= MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
