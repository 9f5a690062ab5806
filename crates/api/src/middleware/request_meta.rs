//! Client metadata recorded on compliance audit entries.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

/// Longest user agent kept on an audit row.
const MAX_USER_AGENT_LEN: usize = 512;

/// Caller IP and user agent, taken from proxy headers.
///
/// The first `X-Forwarded-For` hop wins, then `X-Real-IP`. Missing headers
/// yield `None`; this extractor never rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| header("x-real-ip"))
            .map(str::to_string);

        let user_agent = header("user-agent").map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect());

        Self {
            ip_address,
            user_agent,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));

        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("198.51.100.4"));
        assert_eq!(meta.user_agent, None);
    }

    #[test]
    fn empty_headers() {
        assert_eq!(RequestMeta::from_headers(&HeaderMap::new()), RequestMeta::default());
    }
}
