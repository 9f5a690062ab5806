//! Admin handler for the PING/POST transaction log.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use leadbid_db::models::page::Page;
use leadbid_db::models::transaction::TransactionFilter;
use leadbid_db::repositories::TransactionRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/transactions
pub async fn list_transactions(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = page.resolve();
    let items = TransactionRepo::list(&state.pool, &filter, limit, offset).await?;
    let total_count = TransactionRepo::count(&state.pool, &filter).await?;

    Ok(Json(DataResponse {
        data: Page {
            items,
            total_count,
            limit,
            offset,
        },
    }))
}
