//! Buyer credential shapes stored in `buyers.auth_config`.
//!
//! ```json
//! { "type": "bearer", "token": "..." }
//! { "type": "api_key", "header": "X-API-Key", "value": "..." }
//! { "type": "basic", "username": "...", "password": "..." }
//! { "type": "headers", "headers": { "X-Account": "42" } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Header used by `api_key` credentials when none is given.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

/// How to authenticate outbound PING/POST calls to a buyer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BuyerAuthConfig {
    #[default]
    None,
    Bearer {
        token: String,
    },
    ApiKey {
        #[serde(default = "default_api_key_header")]
        header: String,
        value: String,
    },
    Basic {
        username: String,
        password: String,
    },
    Headers {
        headers: BTreeMap<String, String>,
    },
}

impl BuyerAuthConfig {
    /// Parse and validate a stored credential document. `null` means none.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        if value.is_null() {
            return Ok(Self::None);
        }
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid auth_config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::None => Ok(()),
            Self::Bearer { token } => require_non_empty("token", token),
            Self::ApiKey { header, value } => {
                validate_header_name(header)?;
                require_non_empty("value", value)
            }
            Self::Basic { username, .. } => require_non_empty("username", username),
            Self::Headers { headers } => {
                if headers.is_empty() {
                    return Err(CoreError::Validation(
                        "auth_config.headers must not be empty".to_string(),
                    ));
                }
                headers.keys().try_for_each(|h| validate_header_name(h))
            }
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "auth_config.{field} must not be empty"
        )));
    }
    Ok(())
}

/// RFC 7230 token characters only.
fn validate_header_name(name: &str) -> Result<(), CoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c));
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid header name in auth_config: '{name}'"
        )))
    }
}
