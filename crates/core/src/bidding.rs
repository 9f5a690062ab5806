//! Bid bounds, clamping, and winner selection for lead auctions.

use serde::Serialize;

use crate::error::CoreError;

/// Largest bid amount accepted anywhere in the system.
pub const MAX_BID_AMOUNT: f64 = 10_000.0;

/// Round a monetary amount to whole cents.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Validate a `[min_bid, max_bid]` pair supplied by an admin.
pub fn validate_bid_range(min_bid: f64, max_bid: f64) -> Result<(), CoreError> {
    if !min_bid.is_finite() || !max_bid.is_finite() {
        return Err(CoreError::Validation(
            "min_bid and max_bid must be finite numbers".to_string(),
        ));
    }
    if min_bid < 0.0 {
        return Err(CoreError::Validation(format!(
            "min_bid must not be negative (got {min_bid})"
        )));
    }
    if max_bid > MAX_BID_AMOUNT {
        return Err(CoreError::Validation(format!(
            "max_bid must not exceed {MAX_BID_AMOUNT} (got {max_bid})"
        )));
    }
    if min_bid >= max_bid {
        return Err(CoreError::Validation(format!(
            "min_bid ({min_bid}) must be less than max_bid ({max_bid})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Effective bid window for one buyer on one lead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BidBounds {
    pub min_bid: f64,
    pub max_bid: f64,
}

impl BidBounds {
    pub fn new(min_bid: f64, max_bid: f64) -> Result<Self, CoreError> {
        validate_bid_range(min_bid, max_bid)?;
        Ok(Self { min_bid, max_bid })
    }

    /// Resolve the window for a zone: each zone override replaces the
    /// matching config bound. An override pair that would invert the window
    /// is ignored in favour of the config bounds.
    pub fn resolve(
        config_min: f64,
        config_max: f64,
        zone_min: Option<f64>,
        zone_max: Option<f64>,
    ) -> Self {
        let min_bid = zone_min.unwrap_or(config_min);
        let max_bid = zone_max.unwrap_or(config_max);
        if min_bid < max_bid {
            Self { min_bid, max_bid }
        } else {
            Self {
                min_bid: config_min,
                max_bid: config_max,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Clamping
// ---------------------------------------------------------------------------

/// A buyer's bid after validation against its [`BidBounds`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClampedBid {
    /// Amount the buyer will be charged.
    pub amount: f64,
    /// Amount the buyer actually returned.
    pub original: f64,
    pub clamped: bool,
}

/// Clamp a raw bid into `bounds`.
///
/// Returns `None` for non-finite and non-positive bids, which never
/// participate in an auction.
pub fn clamp_bid(raw: f64, bounds: BidBounds) -> Option<ClampedBid> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let amount = round_to_cents(raw.clamp(bounds.min_bid, bounds.max_bid));
    Some(ClampedBid {
        amount,
        original: raw,
        clamped: raw < bounds.min_bid || raw > bounds.max_bid,
    })
}

// ---------------------------------------------------------------------------
// Winner selection
// ---------------------------------------------------------------------------

/// Anything that can take part in winner selection.
pub trait RankedBid {
    /// Position in the eligibility ranking (0 = most preferred).
    fn rank(&self) -> usize;
    /// Valid bid amount, or `None` if this buyer did not bid.
    fn amount(&self) -> Option<f64>;
}

/// Pick the highest valid bid. Ties go to the better-ranked buyer.
pub fn select_winner<T: RankedBid>(bids: &[T]) -> Option<&T> {
    bids.iter()
        .filter(|b| b.amount().is_some())
        .min_by(|a, b| {
            let (a_amt, b_amt) = (a.amount().unwrap_or(0.0), b.amount().unwrap_or(0.0));
            b_amt
                .total_cmp(&a_amt)
                .then_with(|| a.rank().cmp(&b.rank()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBid {
        rank: usize,
        amount: Option<f64>,
    }

    impl RankedBid for TestBid {
        fn rank(&self) -> usize {
            self.rank
        }
        fn amount(&self) -> Option<f64> {
            self.amount
        }
    }

    fn bounds() -> BidBounds {
        BidBounds::new(10.0, 50.0).unwrap()
    }

    #[test]
    fn range_must_be_ordered() {
        assert!(validate_bid_range(10.0, 50.0).is_ok());
        assert!(validate_bid_range(50.0, 50.0).is_err());
        assert!(validate_bid_range(60.0, 50.0).is_err());
        assert!(validate_bid_range(-1.0, 50.0).is_err());
        assert!(validate_bid_range(1.0, f64::INFINITY).is_err());
        assert!(validate_bid_range(1.0, MAX_BID_AMOUNT + 1.0).is_err());
    }

    #[test]
    fn bid_inside_bounds_is_untouched() {
        let bid = clamp_bid(25.5, bounds()).unwrap();
        assert_eq!(bid.amount, 25.5);
        assert!(!bid.clamped);
    }

    #[test]
    fn bid_above_max_is_clamped_down() {
        let bid = clamp_bid(75.0, bounds()).unwrap();
        assert_eq!(bid.amount, 50.0);
        assert_eq!(bid.original, 75.0);
        assert!(bid.clamped);
    }

    #[test]
    fn bid_below_min_is_clamped_up() {
        let bid = clamp_bid(5.0, bounds()).unwrap();
        assert_eq!(bid.amount, 10.0);
        assert_eq!(bid.original, 5.0);
        assert!(bid.clamped);
    }

    #[test]
    fn invalid_bids_are_dropped() {
        assert!(clamp_bid(0.0, bounds()).is_none());
        assert!(clamp_bid(-3.0, bounds()).is_none());
        assert!(clamp_bid(f64::NAN, bounds()).is_none());
    }

    #[test]
    fn amounts_are_rounded_to_cents() {
        assert_eq!(clamp_bid(12.345_6, bounds()).unwrap().amount, 12.35);
    }

    #[test]
    fn zone_overrides_replace_config_bounds() {
        let b = BidBounds::resolve(10.0, 50.0, Some(20.0), None);
        assert_eq!(b, BidBounds { min_bid: 20.0, max_bid: 50.0 });
    }

    #[test]
    fn inverted_zone_override_falls_back() {
        let b = BidBounds::resolve(10.0, 50.0, Some(60.0), None);
        assert_eq!(b, BidBounds { min_bid: 10.0, max_bid: 50.0 });
    }

    #[test]
    fn highest_bid_wins() {
        let bids = vec![
            TestBid { rank: 0, amount: Some(20.0) },
            TestBid { rank: 1, amount: Some(35.0) },
            TestBid { rank: 2, amount: None },
        ];
        assert_eq!(select_winner(&bids).unwrap().rank, 1);
    }

    #[test]
    fn ties_go_to_better_rank() {
        let bids = vec![
            TestBid { rank: 2, amount: Some(30.0) },
            TestBid { rank: 0, amount: Some(30.0) },
            TestBid { rank: 1, amount: Some(30.0) },
        ];
        assert_eq!(select_winner(&bids).unwrap().rank, 0);
    }

    #[test]
    fn no_valid_bids_means_no_winner() {
        let bids = vec![TestBid { rank: 0, amount: None }];
        assert!(select_winner(&bids).is_none());
        assert!(select_winner::<TestBid>(&[]).is_none());
    }
}
