use leadbid_core::error::CoreError;
use leadbid_core::types::DbId;

/// Failures that stop an auction. Per-buyer call failures are not errors;
/// they are recorded on the buyer's transaction row.
#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    #[error("Lead {0} not found")]
    LeadNotFound(DbId),

    #[error("Lead {lead_id} is {status}, not PENDING")]
    LeadNotPending { lead_id: DbId, status: String },

    #[error("An auction is already running for lead {0}")]
    AuctionInProgress(DbId),

    #[error("A POST was already sent for lead {0}")]
    PostAlreadySent(DbId),

    #[error("Invalid buyer configuration: {0}")]
    Configuration(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
