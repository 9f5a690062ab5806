//! Interpreting buyer responses to PING and POST calls.

use leadbid_core::bidding::{clamp_bid, BidBounds, ClampedBid};
use serde_json::Value;

/// Keys checked, in order, for the bid amount.
const BID_KEYS: &[&str] = &["bid_amount", "bidAmount", "bid", "price"];

/// Keys checked, in order, for the interest flag.
const INTEREST_KEYS: &[&str] = &["interested", "accepted"];

/// Keys checked, in order, for the token echoed back on POST.
const PING_TOKEN_KEYS: &[&str] = &["ping_id", "pingId", "bid_id"];

/// Keys a buyer may set to `false` to refuse a POSTed lead.
const POST_ACCEPT_KEYS: &[&str] = &["accepted", "success"];

/// What a buyer said in response to a PING.
#[derive(Debug, Clone, PartialEq)]
pub struct PingReply {
    pub bid: Option<f64>,
    pub interested: bool,
    pub ping_token: Option<String>,
}

impl PingReply {
    /// The bid this reply contributes to the auction, if any.
    pub fn valid_bid(&self, bounds: BidBounds) -> Option<ClampedBid> {
        if !self.interested {
            return None;
        }
        clamp_bid(self.bid?, bounds)
    }
}

/// Parse a PING response body. Anything but a JSON object is unusable.
pub fn parse_ping_reply(body: &Value) -> Result<PingReply, String> {
    let obj = body
        .as_object()
        .ok_or_else(|| "PING response is not a JSON object".to_string())?;

    let bid = BID_KEYS.iter().find_map(|k| obj.get(*k).and_then(as_number));
    let interested = INTEREST_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(as_flag))
        .unwrap_or_else(|| bid.is_some_and(|b| b > 0.0));
    let ping_token = PING_TOKEN_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(as_token));

    Ok(PingReply {
        bid,
        interested,
        ping_token,
    })
}

/// Whether a 2xx POST response body accepts the lead.
///
/// Buyers that reply with an explicit `accepted: false` or `success: false`
/// refuse the lead; any other body counts as acceptance.
pub fn post_accepted(body: &Value) -> bool {
    !POST_ACCEPT_KEYS
        .iter()
        .any(|k| body.get(*k).and_then(as_flag) == Some(false))
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

fn as_token(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
