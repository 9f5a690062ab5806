//! Repository layer: one zero-sized struct per table with async methods
//! taking a `&PgPool` (or any `PgExecutor` where the call may run inside a
//! transaction).

pub mod buyer_repo;
pub mod buyer_service_config_repo;
pub mod compliance_audit_repo;
pub mod lead_repo;
pub mod service_type_repo;
pub mod service_zone_repo;
pub mod transaction_repo;
pub mod zip_code_repo;

pub use buyer_repo::{BuyerRepo, SignupRecords};
pub use buyer_service_config_repo::BuyerServiceConfigRepo;
pub use compliance_audit_repo::ComplianceAuditRepo;
pub use lead_repo::LeadRepo;
pub use service_type_repo::ServiceTypeRepo;
pub use service_zone_repo::ServiceZoneRepo;
pub use transaction_repo::TransactionRepo;
pub use zip_code_repo::ZipCodeRepo;
