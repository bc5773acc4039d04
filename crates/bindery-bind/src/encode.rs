//! JSON response encoding.
//!
//! Bodies are encoded into a buffer before the response is built, so a
//! serialization failure never leaves a half-written response.

use bindery_config::PresentationConfig;
use bindery_core::{ErrorBody, INTERNAL_ERROR_MESSAGE};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use http::{Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// Content type of every response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Body sent when a function produces no output.
pub const EMPTY_JSON: &[u8] = b"{}\n";

const INTERNAL_BODY: &[u8] = b"{\"error\":\"Internal Server Error\"}\n";

/// The response type produced by bound handlers.
pub type JsonResponse = Response<Full<Bytes>>;

/// How JSON bodies are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    /// No insignificant whitespace.
    #[default]
    Compact,
    /// Two-space indentation.
    Pretty,
}

/// Chooses a [`Presentation`] per request.
///
/// Output is pretty in development mode, or when the `User-Agent` starts
/// with one of the configured prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationPolicy {
    development: bool,
    pretty_user_agents: Vec<String>,
}

impl Default for PresentationPolicy {
    fn default() -> Self {
        Self::from_config(&PresentationConfig::default())
    }
}

impl PresentationPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(development: bool, pretty_user_agents: Vec<String>) -> Self {
        Self {
            development,
            pretty_user_agents,
        }
    }

    /// Creates a policy from configuration.
    #[must_use]
    pub fn from_config(config: &PresentationConfig) -> Self {
        Self::new(config.development, config.pretty_user_agents.clone())
    }

    /// Picks the presentation for a request with these headers.
    #[must_use]
    pub fn choose(&self, headers: &HeaderMap) -> Presentation {
        if self.development {
            return Presentation::Pretty;
        }
        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let pretty = self
            .pretty_user_agents
            .iter()
            .any(|prefix| user_agent.starts_with(prefix.as_str()));
        if pretty {
            Presentation::Pretty
        } else {
            Presentation::Compact
        }
    }
}

/// Encodes `value` followed by a newline.
///
/// # Errors
///
/// Returns the serializer's error if `value` cannot be represented as JSON.
pub fn to_json<T>(value: &T, presentation: Presentation) -> Result<Bytes, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::with_capacity(128);
    match presentation {
        Presentation::Compact => serde_json::to_writer(&mut buf, value)?,
        Presentation::Pretty => serde_json::to_writer_pretty(&mut buf, value)?,
    }
    buf.push(b'\n');
    Ok(Bytes::from(buf))
}

/// Builds a JSON response from an encoded body.
#[must_use]
pub fn json_response(status: StatusCode, body: Bytes) -> JsonResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

/// The `{}` response for functions without output.
#[must_use]
pub fn empty_response() -> JsonResponse {
    json_response(StatusCode::OK, Bytes::from_static(EMPTY_JSON))
}

/// An `{"error": message}` response.
#[must_use]
pub fn error_response(status: StatusCode, message: &str, presentation: Presentation) -> JsonResponse {
    let body = to_json(&ErrorBody { error: message }, presentation)
        .unwrap_or_else(|_| Bytes::from_static(INTERNAL_BODY));
    json_response(status, body)
}

/// The generic 500 response.
#[must_use]
pub fn internal_error_response(presentation: Presentation) -> JsonResponse {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_ERROR_MESSAGE,
        presentation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::collections::BTreeMap;

    async fn body_string(response: JsonResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn headers_with_agent(agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(agent).unwrap());
        headers
    }

    #[test]
    fn test_compact_json() {
        let value = BTreeMap::from([("a", 1)]);
        let bytes = to_json(&value, Presentation::Compact).unwrap();
        assert_eq!(&bytes[..], b"{\"a\":1}\n");
    }

    #[test]
    fn test_pretty_json() {
        let value = BTreeMap::from([("a", 1)]);
        let bytes = to_json(&value, Presentation::Pretty).unwrap();
        assert_eq!(&bytes[..], b"{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_unencodable_value() {
        let value = BTreeMap::from([(vec![1_u8], 1)]);
        assert!(to_json(&value, Presentation::Compact).is_err());
    }

    #[tokio::test]
    async fn test_empty_response() {
        let response = empty_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(body_string(response).await, "{}\n");
    }

    #[tokio::test]
    async fn test_error_response() {
        let response = error_response(StatusCode::FORBIDDEN, "forbidden", Presentation::Compact);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(body_string(response).await, "{\"error\":\"forbidden\"}\n");
    }

    #[tokio::test]
    async fn test_internal_error_response() {
        let response = internal_error_response(Presentation::Compact);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await.as_bytes(),
            INTERNAL_BODY
        );
    }

    #[test]
    fn test_policy_user_agent_prefix() {
        let policy = PresentationPolicy::default();
        assert_eq!(
            policy.choose(&headers_with_agent("curl/8.4.0")),
            Presentation::Pretty
        );
        assert_eq!(
            policy.choose(&headers_with_agent("Mozilla/5.0 curl/8.4.0")),
            Presentation::Compact
        );
        assert_eq!(policy.choose(&HeaderMap::new()), Presentation::Compact);
    }

    #[test]
    fn test_policy_development() {
        let policy = PresentationPolicy::new(true, Vec::new());
        assert_eq!(policy.choose(&HeaderMap::new()), Presentation::Pretty);
    }

    #[test]
    fn test_policy_custom_agents() {
        let policy = PresentationPolicy::from_config(&PresentationConfig {
            development: false,
            pretty_user_agents: vec!["HTTPie/".to_string()],
        });
        assert_eq!(
            policy.choose(&headers_with_agent("HTTPie/3.2")),
            Presentation::Pretty
        );
        assert_eq!(
            policy.choose(&headers_with_agent("curl/8.4.0")),
            Presentation::Compact
        );
    }
}
