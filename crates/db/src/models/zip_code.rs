use serde::Serialize;
use sqlx::FromRow;

/// A row from the `zip_codes` reference table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ZipCodeLocation {
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub county: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
