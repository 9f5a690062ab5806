//! The PING/POST auction.
//!
//! One run of [`AuctionEngine::run`]:
//!
//! 1. Append `AUCTION_STARTED` to the compliance log.
//! 2. Resolve eligible buyers (ranked) and load their configurations.
//! 3. PING every buyer concurrently, at most `max_concurrent_pings` at a
//!    time, each bounded by the buyer's PING timeout. Every call becomes a
//!    PING transaction row, successful or not.
//! 4. Clamp valid bids into each buyer's window and pick the highest; ties
//!    go to the better-ranked buyer.
//! 5. POST the full lead to the winner only. The POST row is reserved
//!    before the call so a lead can never be POSTed twice.
//! 6. Mark the lead SOLD or REJECTED and append the matching audit event.
//!
//! A lead that already has a POST row (an earlier run was interrupted after
//! reserving it) is settled from that row without contacting any buyer:
//! SUCCESS sells it, anything else rejects it with `POST_FAILED`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use leadbid_core::bidding::{select_winner, RankedBid};
use leadbid_core::status::{ComplianceEvent, LeadStatus, TransactionAction, TransactionStatus};
use leadbid_core::types::DbId;
use leadbid_db::models::compliance_audit::CreateComplianceAuditEntry;
use leadbid_db::models::lead::Lead;
use leadbid_db::models::transaction::{CreateTransaction, Transaction};
use leadbid_db::repositories::{ComplianceAuditRepo, LeadRepo, TransactionRepo};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::config::AuctionConfig;
use crate::eligibility::{BuyerEligibilityService, EligibleBuyer};
use crate::error::AuctionError;
use crate::payload::{build_ping_payload, build_post_payload, estimated_value};
use crate::registry::{BuyerAuctionConfig, BuyerConfigurationRegistry};
use crate::reply::{parse_ping_reply, post_accepted};
use crate::transport::{BuyerRequest, BuyerResponse, BuyerTransport, TransportError};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Final outcome of an auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Sold,
    NoEligibleBuyers,
    NoBids,
    PostFailed,
}

impl AuctionStatus {
    /// Wire form; also the lead's `rejection_reason` for unsold outcomes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sold => "SOLD",
            Self::NoEligibleBuyers => "NO_ELIGIBLE_BUYERS",
            Self::NoBids => "NO_BIDS",
            Self::PostFailed => "POST_FAILED",
        }
    }
}

/// One buyer's PING outcome.
#[derive(Debug, Clone, Serialize)]
pub struct BidRecord {
    pub buyer_id: DbId,
    pub buyer_name: String,
    pub rank: usize,
    pub transaction_id: DbId,
    /// Valid bid after clamping; `None` if the buyer did not bid.
    pub amount: Option<f64>,
    /// Bid exactly as the buyer returned it.
    pub original_amount: Option<f64>,
    pub clamped: bool,
    pub interested: bool,
    pub ping_token: Option<String>,
    pub response_time_ms: i32,
    pub error: Option<String>,
}

/// Recorded on a POST row whose call never reported back.
const POST_INTERRUPTED: &str = "POST interrupted before the outcome was recorded";

enum PostOutcome {
    Accepted,
    Failed,
    /// Another run already reserved this lead's POST.
    AlreadyReserved(Transaction),
}

impl RankedBid for BidRecord {
    fn rank(&self) -> usize {
        self.rank
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuctionResult {
    pub lead_id: DbId,
    pub status: AuctionStatus,
    pub winning_buyer_id: Option<DbId>,
    pub winning_bid_amount: Option<f64>,
    pub bids: Vec<BidRecord>,
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs auctions against buyers reached through `T`.
pub struct AuctionEngine<T> {
    pool: PgPool,
    registry: Arc<BuyerConfigurationRegistry>,
    eligibility: BuyerEligibilityService,
    transport: T,
    max_concurrent_pings: usize,
}

impl<T: BuyerTransport> AuctionEngine<T> {
    pub fn new(
        pool: PgPool,
        registry: Arc<BuyerConfigurationRegistry>,
        transport: T,
        config: &AuctionConfig,
    ) -> Self {
        Self {
            eligibility: BuyerEligibilityService::new(pool.clone()),
            pool,
            registry,
            transport,
            max_concurrent_pings: config.max_concurrent_pings.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<BuyerConfigurationRegistry> {
        &self.registry
    }

    /// Claim a PENDING lead by id and auction it.
    pub async fn run_for_lead_id(&self, lead_id: DbId) -> Result<AuctionResult, AuctionError> {
        if let Some(lead) = LeadRepo::claim_by_id(&self.pool, lead_id).await? {
            return self.run(&lead).await;
        }
        match LeadRepo::find_by_id(&self.pool, lead_id).await? {
            None => Err(AuctionError::LeadNotFound(lead_id)),
            Some(lead) if lead.lead_status() == LeadStatus::Pending => {
                Err(AuctionError::AuctionInProgress(lead_id))
            }
            Some(lead) => Err(AuctionError::LeadNotPending {
                lead_id,
                status: lead.status,
            }),
        }
    }

    /// Auction a lead the caller has already claimed.
    ///
    /// If the auction fails the claim is released, so the dispatcher retries
    /// the lead on a later tick.
    pub async fn run(&self, lead: &Lead) -> Result<AuctionResult, AuctionError> {
        let result = self.auction(lead).await;
        if let Err(e) = &result {
            if !matches!(
                e,
                AuctionError::LeadNotPending { .. } | AuctionError::LeadNotFound(_)
            ) {
                match LeadRepo::release_claim(&self.pool, lead.id).await {
                    Ok(_) => tracing::warn!(lead_id = lead.id, error = %e, "Auction failed, claim released"),
                    Err(release) => tracing::error!(
                        lead_id = lead.id,
                        error = %release,
                        "Failed to release auction claim",
                    ),
                }
            }
        }
        result
    }

    async fn auction(&self, lead: &Lead) -> Result<AuctionResult, AuctionError> {
        if lead.lead_status() != LeadStatus::Pending {
            return Err(AuctionError::LeadNotPending {
                lead_id: lead.id,
                status: lead.status.clone(),
            });
        }

        let started = Instant::now();
        if let Some(post) = TransactionRepo::find_post_for_lead(&self.pool, lead.id).await? {
            return self.settle_from_post(lead, post, Vec::new(), started).await;
        }

        let tokens = lead.compliance_tokens();
        tracing::info!(
            lead_id = lead.id,
            service_type_id = lead.service_type_id,
            zip_code = %lead.zip_code,
            "Auction started",
        );
        self.audit(
            lead.id,
            ComplianceEvent::AuctionStarted,
            json!({
                "service_type_id": lead.service_type_id,
                "zip_code": lead.zip_code,
                "estimated_value": estimated_value(&lead.form_data),
                "has_trusted_form": tokens.has_trusted_form(),
                "has_jornaya": tokens.has_jornaya(),
            }),
        )
        .await?;

        let eligible = self
            .eligibility
            .eligible_buyers(lead.service_type_id, &lead.zip_code, &tokens)
            .await?;
        let participants = self.load_configs(eligible, lead.service_type_id).await;
        if participants.is_empty() {
            return self
                .reject(lead, AuctionStatus::NoEligibleBuyers, Vec::new(), started)
                .await;
        }

        let configs: HashMap<DbId, Arc<BuyerAuctionConfig>> = participants
            .iter()
            .map(|(buyer, config)| (buyer.buyer_id, Arc::clone(config)))
            .collect();

        let mut bids: Vec<BidRecord> = stream::iter(participants)
            .map(|(buyer, config)| self.ping_buyer(lead, buyer, config))
            .buffer_unordered(self.max_concurrent_pings)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_, _>>()?;
        bids.sort_by_key(|b| b.rank);

        let Some(winner) = select_winner(&bids).cloned() else {
            return self.reject(lead, AuctionStatus::NoBids, bids, started).await;
        };
        let (Some(amount), Some(config)) = (winner.amount, configs.get(&winner.buyer_id)) else {
            return self.reject(lead, AuctionStatus::NoBids, bids, started).await;
        };

        tracing::info!(
            lead_id = lead.id,
            buyer_id = winner.buyer_id,
            bid_amount = amount,
            bids = bids.iter().filter(|b| b.amount.is_some()).count(),
            "Auction winner selected",
        );

        match self.post_to_winner(lead, &winner, amount, config).await? {
            PostOutcome::Accepted => {}
            PostOutcome::Failed => {
                return self.reject(lead, AuctionStatus::PostFailed, bids, started).await;
            }
            PostOutcome::AlreadyReserved(post) => {
                return self.settle_from_post(lead, post, bids, started).await;
            }
        }

        let details = json!({
            "buyer_id": winner.buyer_id,
            "bid_amount": amount,
            "original_bid": winner.original_amount,
            "clamped": winner.clamped,
            "bids_received": bids.len(),
        });
        self.sell(lead, winner.buyer_id, amount, details, bids, started)
            .await
    }

    /// Finish a lead from a POST row left by an earlier run.
    async fn settle_from_post(
        &self,
        lead: &Lead,
        post: Transaction,
        bids: Vec<BidRecord>,
        started: Instant,
    ) -> Result<AuctionResult, AuctionError> {
        tracing::warn!(
            lead_id = lead.id,
            transaction_id = post.id,
            buyer_id = post.buyer_id,
            post_status = %post.status,
            "Settling lead from an existing POST",
        );

        match (post.transaction_status(), post.bid_amount) {
            (TransactionStatus::Success, Some(amount)) => {
                let details = json!({
                    "buyer_id": post.buyer_id,
                    "bid_amount": amount,
                    "post_transaction_id": post.id,
                    "recovered": true,
                });
                self.sell(lead, post.buyer_id, amount, details, bids, started)
                    .await
            }
            (status, _) => {
                if status == TransactionStatus::Pending {
                    TransactionRepo::finish(
                        &self.pool,
                        post.id,
                        TransactionStatus::Failed,
                        None,
                        Some(POST_INTERRUPTED),
                        None,
                    )
                    .await?;
                }
                self.reject(lead, AuctionStatus::PostFailed, bids, started)
                    .await
            }
        }
    }

    /// Pair each eligible buyer with its configuration. Buyers whose
    /// configuration is gone or unreadable sit this auction out.
    async fn load_configs(
        &self,
        eligible: Vec<EligibleBuyer>,
        service_type_id: DbId,
    ) -> Vec<(EligibleBuyer, Arc<BuyerAuctionConfig>)> {
        let mut participants = Vec::with_capacity(eligible.len());
        for buyer in eligible {
            match self.registry.get(buyer.buyer_id, service_type_id).await {
                Ok(Some(config)) => participants.push((buyer, config)),
                Ok(None) => {
                    tracing::warn!(buyer_id = buyer.buyer_id, service_type_id, "No active config for eligible buyer");
                }
                Err(e) => {
                    tracing::error!(buyer_id = buyer.buyer_id, service_type_id, error = %e, "Failed to load buyer config");
                }
            }
        }
        participants
    }

    async fn ping_buyer(
        &self,
        lead: &Lead,
        buyer: EligibleBuyer,
        config: Arc<BuyerAuctionConfig>,
    ) -> Result<BidRecord, sqlx::Error> {
        let payload = build_ping_payload(&config, lead);
        let started = Instant::now();
        let outcome = match &config.ping_url {
            None => Err(TransportError::MissingUrl(TransactionAction::Ping)),
            Some(url) => {
                let request = BuyerRequest {
                    action: TransactionAction::Ping,
                    url: url.clone(),
                    payload: payload.clone(),
                    auth: config.auth.clone(),
                    signing_secret: config.webhook_secret.clone(),
                };
                self.call(request, config.ping_timeout).await
            }
        };
        let response_time_ms = elapsed_ms(started).min(i32::MAX as u64) as i32;

        let (reply, error, response_payload) = match outcome {
            Ok(response) => match parse_ping_reply(&response.body) {
                Ok(reply) => (Some(reply), None, Some(response.body)),
                Err(msg) => (None, Some(msg), Some(response.body)),
            },
            Err(e) => (None, Some(e.to_string()), e.response_body().cloned()),
        };

        let bounds = config.bounds(buyer.zone_min_bid, buyer.zone_max_bid);
        let bid = reply.as_ref().and_then(|r| r.valid_bid(bounds));
        let tokens = lead.compliance_tokens();

        let transaction = TransactionRepo::create(
            &self.pool,
            &CreateTransaction {
                lead_id: lead.id,
                buyer_id: buyer.buyer_id,
                action_type: TransactionAction::Ping,
                status: if error.is_none() {
                    TransactionStatus::Success
                } else {
                    TransactionStatus::Failed
                },
                bid_amount: bid.map(|b| b.amount),
                response_time_ms: Some(response_time_ms),
                error_message: error.clone(),
                request_payload: Some(payload),
                response_payload,
                has_trusted_form: tokens.has_trusted_form(),
                has_jornaya: tokens.has_jornaya(),
            },
        )
        .await?;

        match &error {
            Some(e) => tracing::warn!(
                lead_id = lead.id,
                buyer_id = buyer.buyer_id,
                response_time_ms,
                error = %e,
                "PING failed",
            ),
            None => tracing::debug!(
                lead_id = lead.id,
                buyer_id = buyer.buyer_id,
                response_time_ms,
                bid = ?bid.map(|b| b.amount),
                clamped = bid.is_some_and(|b| b.clamped),
                "PING answered",
            ),
        }

        Ok(BidRecord {
            buyer_id: buyer.buyer_id,
            buyer_name: buyer.buyer_name,
            rank: buyer.rank,
            transaction_id: transaction.id,
            amount: bid.map(|b| b.amount),
            original_amount: reply.as_ref().and_then(|r| r.bid),
            clamped: bid.is_some_and(|b| b.clamped),
            interested: reply.as_ref().is_some_and(|r| r.interested),
            ping_token: reply.and_then(|r| r.ping_token),
            response_time_ms,
            error,
        })
    }

    /// Send the single POST for this lead.
    async fn post_to_winner(
        &self,
        lead: &Lead,
        winner: &BidRecord,
        amount: f64,
        config: &BuyerAuctionConfig,
    ) -> Result<PostOutcome, AuctionError> {
        let payload = build_post_payload(config, lead, winner.ping_token.as_deref(), amount);
        let tokens = lead.compliance_tokens();

        let reserved = match TransactionRepo::create(
            &self.pool,
            &CreateTransaction {
                lead_id: lead.id,
                buyer_id: winner.buyer_id,
                action_type: TransactionAction::Post,
                status: TransactionStatus::Pending,
                bid_amount: Some(amount),
                response_time_ms: None,
                error_message: None,
                request_payload: Some(payload.clone()),
                response_payload: None,
                has_trusted_form: tokens.has_trusted_form(),
                has_jornaya: tokens.has_jornaya(),
            },
        )
        .await
        {
            Ok(row) => row,
            Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
                return match TransactionRepo::find_post_for_lead(&self.pool, lead.id).await? {
                    Some(existing) => Ok(PostOutcome::AlreadyReserved(existing)),
                    None => Err(AuctionError::PostAlreadySent(lead.id)),
                };
            }
            Err(e) => return Err(e.into()),
        };

        let started = Instant::now();
        let outcome = match &config.post_url {
            None => Err(TransportError::MissingUrl(TransactionAction::Post)),
            Some(url) => {
                let request = BuyerRequest {
                    action: TransactionAction::Post,
                    url: url.clone(),
                    payload,
                    auth: config.auth.clone(),
                    signing_secret: config.webhook_secret.clone(),
                };
                self.call(request, config.post_timeout).await
            }
        };
        let response_time_ms = elapsed_ms(started).min(i32::MAX as u64) as i32;

        let (status, error, response) = match outcome {
            Ok(BuyerResponse { body, .. }) if post_accepted(&body) => {
                (TransactionStatus::Success, None, Some(body))
            }
            Ok(BuyerResponse { body, .. }) => (
                TransactionStatus::Failed,
                Some("Buyer declined the lead".to_string()),
                Some(body),
            ),
            Err(e) => (
                TransactionStatus::Failed,
                Some(e.to_string()),
                e.response_body().cloned(),
            ),
        };

        TransactionRepo::finish(
            &self.pool,
            reserved.id,
            status,
            Some(response_time_ms),
            error.as_deref(),
            response.as_ref(),
        )
        .await?;

        if let Some(e) = &error {
            tracing::warn!(
                lead_id = lead.id,
                buyer_id = winner.buyer_id,
                response_time_ms,
                error = %e,
                "POST failed",
            );
        }
        Ok(if status == TransactionStatus::Success {
            PostOutcome::Accepted
        } else {
            PostOutcome::Failed
        })
    }

    async fn call(
        &self,
        request: BuyerRequest,
        limit: Duration,
    ) -> Result<BuyerResponse, TransportError> {
        match tokio::time::timeout(limit, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(limit)),
        }
    }

    async fn sell(
        &self,
        lead: &Lead,
        buyer_id: DbId,
        amount: f64,
        details: Value,
        bids: Vec<BidRecord>,
        started: Instant,
    ) -> Result<AuctionResult, AuctionError> {
        let mut tx = self.pool.begin().await?;
        if LeadRepo::mark_sold(&mut *tx, lead.id, buyer_id, amount)
            .await?
            .is_none()
        {
            return Err(self.not_pending(lead.id).await);
        }
        ComplianceAuditRepo::append(
            &mut *tx,
            &CreateComplianceAuditEntry::system(lead.id, ComplianceEvent::LeadSold, details),
        )
        .await?;
        tx.commit().await?;

        let duration_ms = elapsed_ms(started);
        tracing::info!(
            lead_id = lead.id,
            buyer_id,
            bid_amount = amount,
            duration_ms,
            "Lead sold",
        );
        Ok(AuctionResult {
            lead_id: lead.id,
            status: AuctionStatus::Sold,
            winning_buyer_id: Some(buyer_id),
            winning_bid_amount: Some(amount),
            bids,
            duration_ms,
        })
    }

    async fn reject(
        &self,
        lead: &Lead,
        status: AuctionStatus,
        bids: Vec<BidRecord>,
        started: Instant,
    ) -> Result<AuctionResult, AuctionError> {
        let reason = status.as_str();
        let mut tx = self.pool.begin().await?;
        if LeadRepo::mark_rejected(&mut *tx, lead.id, reason)
            .await?
            .is_none()
        {
            return Err(self.not_pending(lead.id).await);
        }
        ComplianceAuditRepo::append(
            &mut *tx,
            &CreateComplianceAuditEntry::system(
                lead.id,
                ComplianceEvent::LeadRejected,
                json!({
                    "reason": reason,
                    "bids_received": bids.iter().filter(|b| b.amount.is_some()).count(),
                    "buyers_pinged": bids.len(),
                }),
            ),
        )
        .await?;
        tx.commit().await?;

        let duration_ms = elapsed_ms(started);
        tracing::info!(lead_id = lead.id, reason, duration_ms, "Lead rejected");
        Ok(AuctionResult {
            lead_id: lead.id,
            status,
            winning_buyer_id: None,
            winning_bid_amount: None,
            bids,
            duration_ms,
        })
    }

    async fn audit(
        &self,
        lead_id: DbId,
        event: ComplianceEvent,
        data: Value,
    ) -> Result<(), sqlx::Error> {
        ComplianceAuditRepo::append(
            &self.pool,
            &CreateComplianceAuditEntry::system(lead_id, event, data),
        )
        .await?;
        Ok(())
    }

    /// Error for a lead that left PENDING underneath a running auction.
    async fn not_pending(&self, lead_id: DbId) -> AuctionError {
        match LeadRepo::find_by_id(&self.pool, lead_id).await {
            Ok(Some(lead)) => AuctionError::LeadNotPending {
                lead_id,
                status: lead.status,
            },
            Ok(None) => AuctionError::LeadNotFound(lead_id),
            Err(e) => AuctionError::Database(e),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
