//! Outbound buyer calls.
//!
//! [`BuyerTransport`] is the seam between the auction engine and the
//! network; [`HttpBuyerTransport`] is the production implementation on
//! `reqwest`. Timeouts are enforced by the engine, not here.

use std::future::Future;
use std::time::Duration;

use leadbid_core::auth_config::BuyerAuthConfig;
use leadbid_core::status::TransactionAction;
use leadbid_core::webhook_signature::{generate_webhook_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use serde_json::Value;

/// Connect timeout applied to every buyer call.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a single buyer call failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("No {0} URL configured")]
    MissingUrl(TransactionAction),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Buyer returned HTTP {status}")]
    HttpStatus { status: u16, body: Value },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TransportError {
    /// Response body to record on the transaction row, if one was received.
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            Self::HttpStatus { body, .. } => Some(body),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One PING or POST to a buyer.
#[derive(Debug, Clone)]
pub struct BuyerRequest {
    pub action: TransactionAction,
    pub url: String,
    pub payload: Value,
    pub auth: BuyerAuthConfig,
    /// When set, the body is signed and the signature headers are added.
    pub signing_secret: Option<String>,
}

/// A 2xx buyer response. Non-JSON bodies are kept as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyerResponse {
    pub status: u16,
    pub body: Value,
}

/// Sends buyer requests.
pub trait BuyerTransport: Send + Sync {
    fn send(
        &self,
        request: BuyerRequest,
    ) -> impl Future<Output = Result<BuyerResponse, TransportError>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// `reqwest`-backed transport shared by all auctions.
#[derive(Clone)]
pub struct HttpBuyerTransport {
    client: reqwest::Client,
}

impl HttpBuyerTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("leadbid/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl BuyerTransport for HttpBuyerTransport {
    async fn send(&self, request: BuyerRequest) -> Result<BuyerResponse, TransportError> {
        let body = serde_json::to_string(&request.payload)?;

        let mut builder = self
            .client
            .post(&request.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        builder = apply_auth(builder, &request.auth);
        if let Some(secret) = &request.signing_secret {
            builder = builder
                .header(TIMESTAMP_HEADER, chrono::Utc::now().timestamp().to_string())
                .header(SIGNATURE_HEADER, generate_webhook_signature(&body, secret));
        }

        let response = builder.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = parse_body(&text);

        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(BuyerResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn apply_auth(builder: reqwest::RequestBuilder, auth: &BuyerAuthConfig) -> reqwest::RequestBuilder {
    match auth {
        BuyerAuthConfig::None => builder,
        BuyerAuthConfig::Bearer { token } => builder.bearer_auth(token),
        BuyerAuthConfig::ApiKey { header, value } => builder.header(header.as_str(), value.as_str()),
        BuyerAuthConfig::Basic { username, password } => builder.basic_auth(username, Some(password)),
        BuyerAuthConfig::Headers { headers } => headers
            .iter()
            .fold(builder, |b, (name, value)| b.header(name.as_str(), value.as_str())),
    }
}

/// Empty bodies become `null`; non-JSON text is kept verbatim.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
