//! Background auction dispatcher.
//!
//! Polls for PENDING leads whose auction has not started and auctions them
//! one at a time. Claims use `SELECT ... FOR UPDATE SKIP LOCKED` via
//! [`LeadRepo::claim_next_pending`], so several server processes can run a
//! dispatcher against the same database.
//!
//! Every tick first releases claims older than `stale_claim_after`, which
//! recovers leads whose auction was cut off (a dropped request, a crashed
//! process) while the server keeps running.

use std::sync::Arc;
use std::time::Duration;

use leadbid_db::repositories::LeadRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::AuctionConfig;
use crate::engine::AuctionEngine;
use crate::error::AuctionError;
use crate::transport::BuyerTransport;

/// Upper bound on leads auctioned per poll tick.
const MAX_LEADS_PER_TICK: usize = 50;

pub struct AuctionDispatcher<T> {
    pool: PgPool,
    engine: Arc<AuctionEngine<T>>,
    poll_interval: Duration,
    stale_claim_after: Duration,
}

impl<T: BuyerTransport> AuctionDispatcher<T> {
    pub fn new(pool: PgPool, engine: Arc<AuctionEngine<T>>, config: &AuctionConfig) -> Self {
        Self {
            pool,
            engine,
            poll_interval: config.poll_interval,
            stale_claim_after: config.stale_claim_after,
        }
    }

    /// Run the dispatcher loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Auction dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Auction dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.dispatch_pending(&cancel).await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }
    }

    /// One cycle: claim and auction PENDING leads until none remain, the
    /// per-tick limit is hit, or shutdown begins. Returns the number run.
    pub async fn dispatch_pending(&self, cancel: &CancellationToken) -> Result<usize, AuctionError> {
        if cancel.is_cancelled() {
            return Ok(0);
        }
        let released =
            LeadRepo::release_stale_claims(&self.pool, self.stale_claim_after.as_secs() as i64)
                .await?;
        if released > 0 {
            tracing::warn!(released, "Released stale auction claims");
        }

        let mut dispatched = 0;
        while dispatched < MAX_LEADS_PER_TICK && !cancel.is_cancelled() {
            let Some(lead) = LeadRepo::claim_next_pending(&self.pool).await? else {
                break;
            };
            dispatched += 1;

            match self.engine.run(&lead).await {
                Ok(result) => tracing::info!(
                    lead_id = lead.id,
                    status = result.status.as_str(),
                    duration_ms = result.duration_ms,
                    "Auction completed",
                ),
                Err(e) => {
                    // The engine released the claim; retry on the next tick.
                    tracing::error!(lead_id = lead.id, error = %e, "Auction failed");
                    break;
                }
            }
        }
        Ok(dispatched)
    }
}
