//! Handler for the consumer location typeahead.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use leadbid_core::search::{
    clamp_limit, parse_location_query, DEFAULT_LOCATION_LIMIT, MAX_LOCATION_LIMIT,
};
use leadbid_db::models::zip_code::ZipCodeLocation;
use leadbid_db::repositories::ZipCodeRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /locations/search`.
#[derive(Debug, Deserialize)]
pub struct LocationSearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

/// GET /api/v1/locations/search?q=&limit=
///
/// Digits match zip prefixes; anything else matches city prefixes, with an
/// optional `", ST"` state suffix. Short queries return an empty list.
pub async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<LocationSearchParams>,
) -> AppResult<impl IntoResponse> {
    let Some(query) = parse_location_query(&params.q) else {
        return Ok(Json(DataResponse { data: Vec::<ZipCodeLocation>::new() }));
    };
    let limit = clamp_limit(params.limit, DEFAULT_LOCATION_LIMIT, MAX_LOCATION_LIMIT);

    let locations = ZipCodeRepo::search(&state.pool, &query, limit).await?;

    Ok(Json(DataResponse { data: locations }))
}
