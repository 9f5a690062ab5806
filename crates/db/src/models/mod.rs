//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod buyer;
pub mod buyer_service_config;
pub mod compliance_audit;
pub mod lead;
pub mod page;
pub mod service_type;
pub mod service_zone;
pub mod transaction;
pub mod zip_code;
