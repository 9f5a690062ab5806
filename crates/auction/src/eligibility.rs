//! Buyer eligibility and ranking for a lead.
//!
//! The database narrows candidates to active buyers with an active config
//! and active coverage for the zip. Daily caps and compliance requirements
//! are applied here so every exclusion can be logged with its reason.

use leadbid_core::compliance::{ComplianceRequirements, ComplianceTokens};
use leadbid_core::types::DbId;
use leadbid_db::models::service_zone::EligibilityCandidate;
use leadbid_db::repositories::ServiceZoneRepo;
use sqlx::PgPool;

/// A buyer allowed to bid, in ranking order.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleBuyer {
    pub buyer_id: DbId,
    pub buyer_name: String,
    pub zone_id: DbId,
    pub priority: i32,
    /// 0 is the most preferred buyer; breaks bid ties.
    pub rank: usize,
    pub zone_min_bid: Option<f64>,
    pub zone_max_bid: Option<f64>,
}

/// Why a candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    DailyCapReached { cap: i32, sold_today: i64 },
    MissingCompliance(Vec<&'static str>),
}

/// Apply caps and compliance gating, then rank by priority (highest first)
/// and buyer id.
pub fn filter_candidates(
    mut candidates: Vec<EligibilityCandidate>,
    tokens: &ComplianceTokens,
) -> (Vec<EligibleBuyer>, Vec<(DbId, Exclusion)>) {
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.buyer_id.cmp(&b.buyer_id))
    });

    let mut eligible = Vec::with_capacity(candidates.len());
    let mut excluded = Vec::new();

    for c in candidates {
        if let Some(cap) = c.max_leads_per_day {
            if c.sold_today >= i64::from(cap) {
                excluded.push((
                    c.buyer_id,
                    Exclusion::DailyCapReached {
                        cap,
                        sold_today: c.sold_today,
                    },
                ));
                continue;
            }
        }

        let requirements = ComplianceRequirements {
            requires_trusted_form: c.requires_trusted_form,
            requires_jornaya: c.requires_jornaya,
        };
        let unmet = requirements.unmet(tokens);
        if !unmet.is_empty() {
            excluded.push((c.buyer_id, Exclusion::MissingCompliance(unmet)));
            continue;
        }

        eligible.push(EligibleBuyer {
            buyer_id: c.buyer_id,
            buyer_name: c.buyer_name,
            zone_id: c.zone_id,
            priority: c.priority,
            rank: eligible.len(),
            zone_min_bid: c.zone_min_bid,
            zone_max_bid: c.zone_max_bid,
        });
    }

    (eligible, excluded)
}

/// Finds the ranked buyers eligible for a lead.
#[derive(Clone)]
pub struct BuyerEligibilityService {
    pool: PgPool,
}

impl BuyerEligibilityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn eligible_buyers(
        &self,
        service_type_id: DbId,
        zip_code: &str,
        tokens: &ComplianceTokens,
    ) -> Result<Vec<EligibleBuyer>, sqlx::Error> {
        let candidates = ServiceZoneRepo::find_candidates(&self.pool, service_type_id, zip_code).await?;
        let candidate_count = candidates.len();
        let (eligible, excluded) = filter_candidates(candidates, tokens);

        for (buyer_id, reason) in &excluded {
            tracing::debug!(buyer_id, ?reason, service_type_id, zip_code, "Buyer excluded");
        }
        tracing::info!(
            service_type_id,
            zip_code,
            candidates = candidate_count,
            eligible = eligible.len(),
            "Eligibility resolved",
        );
        Ok(eligible)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn candidate(buyer_id: DbId, priority: i32) -> EligibilityCandidate {
        EligibilityCandidate {
            buyer_id,
            buyer_name: format!("buyer-{buyer_id}"),
            zone_id: buyer_id * 10,
            priority,
            max_leads_per_day: None,
            zone_min_bid: None,
            zone_max_bid: None,
            requires_trusted_form: false,
            requires_jornaya: false,
            sold_today: 0,
        }
    }

    #[test]
    fn ranks_by_priority_then_buyer_id() {
        let (eligible, excluded) = filter_candidates(
            vec![candidate(3, 100), candidate(2, 500), candidate(1, 100)],
            &ComplianceTokens::default(),
        );
        assert!(excluded.is_empty());
        let order: Vec<(DbId, usize)> = eligible.iter().map(|b| (b.buyer_id, b.rank)).collect();
        assert_eq!(order, vec![(2, 0), (1, 1), (3, 2)]);
    }

    #[test]
    fn daily_cap_excludes_buyer() {
        let mut capped = candidate(1, 100);
        capped.max_leads_per_day = Some(2);
        capped.sold_today = 2;
        let mut under = candidate(2, 100);
        under.max_leads_per_day = Some(2);
        under.sold_today = 1;

        let (eligible, excluded) =
            filter_candidates(vec![capped, under], &ComplianceTokens::default());
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].buyer_id, 2);
        assert_eq!(eligible[0].rank, 0);
        assert_matches!(
            excluded.as_slice(),
            [(1, Exclusion::DailyCapReached { cap: 2, sold_today: 2 })]
        );
    }

    #[test]
    fn compliance_requirements_gate_buyers() {
        let mut needs_tf = candidate(1, 100);
        needs_tf.requires_trusted_form = true;
        let mut needs_jornaya = candidate(2, 100);
        needs_jornaya.requires_jornaya = true;

        let tokens = ComplianceTokens {
            trusted_form_cert_url: Some("https://cert.trustedform.com/abc".into()),
            ..Default::default()
        };
        let (eligible, excluded) = filter_candidates(vec![needs_tf, needs_jornaya], &tokens);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].buyer_id, 1);
        assert_eq!(
            excluded,
            vec![(2, Exclusion::MissingCompliance(vec!["jornaya"]))]
        );
    }
}
