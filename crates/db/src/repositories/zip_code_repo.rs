//! Lookups against the `zip_codes` reference table.

use leadbid_core::search::LocationQuery;
use sqlx::PgPool;

use crate::models::zip_code::ZipCodeLocation;

const COLUMNS: &str = "zip_code, city, state, county, latitude, longitude";

pub struct ZipCodeRepo;

impl ZipCodeRepo {
    /// Exact lookup by zip code.
    pub async fn find(pool: &PgPool, zip_code: &str) -> Result<Option<ZipCodeLocation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM zip_codes WHERE zip_code = $1");
        sqlx::query_as::<_, ZipCodeLocation>(&query)
            .bind(zip_code)
            .fetch_optional(pool)
            .await
    }

    /// Prefix search by zip or city name.
    pub async fn search(
        pool: &PgPool,
        query: &LocationQuery,
        limit: i64,
    ) -> Result<Vec<ZipCodeLocation>, sqlx::Error> {
        match query {
            LocationQuery::ZipPrefix(prefix) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM zip_codes WHERE zip_code LIKE $1 || '%' \
                     ORDER BY zip_code LIMIT $2"
                );
                sqlx::query_as::<_, ZipCodeLocation>(&sql)
                    .bind(prefix)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
            LocationQuery::City { name, state } => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM zip_codes \
                     WHERE LOWER(city) LIKE LOWER($1) || '%' \
                       AND ($2::text IS NULL OR state = $2) \
                     ORDER BY city, state, zip_code LIMIT $3"
                );
                sqlx::query_as::<_, ZipCodeLocation>(&sql)
                    .bind(name)
                    .bind(state)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
        }
    }
}
