//! Repository for the `service_types` table.

use leadbid_core::types::DbId;
use sqlx::PgPool;

use crate::models::service_type::{CreateServiceType, ServiceType, UpdateServiceType};

/// Column list for the `service_types` table.
const COLUMNS: &str = "id, name, display_name, form_schema, is_active, created_at, updated_at";

/// Provides CRUD operations for service types.
pub struct ServiceTypeRepo;

impl ServiceTypeRepo {
    /// Insert a new service type.
    pub async fn create(pool: &PgPool, input: &CreateServiceType) -> Result<ServiceType, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_types (name, display_name, form_schema, is_active) \
             VALUES ($1, $2, COALESCE($3, '{{}}'::jsonb), COALESCE($4, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(&input.name)
            .bind(&input.display_name)
            .bind(&input.form_schema)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a service type by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ServiceType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_types WHERE id = $1");
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List service types ordered by display name. `active_only` hides
    /// deactivated verticals from the public catalog.
    pub async fn list(pool: &PgPool, active_only: bool) -> Result<Vec<ServiceType>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_types \
             WHERE ($1 = false OR is_active) \
             ORDER BY display_name, id"
        );
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(active_only)
            .fetch_all(pool)
            .await
    }

    /// Update a service type. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateServiceType,
    ) -> Result<Option<ServiceType>, sqlx::Error> {
        let query = format!(
            "UPDATE service_types SET \
                 display_name = COALESCE($2, display_name), \
                 form_schema = COALESCE($3, form_schema), \
                 is_active = COALESCE($4, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(id)
            .bind(&input.display_name)
            .bind(&input.form_schema)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }
}
