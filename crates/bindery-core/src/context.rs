//! The per-request context.
//!
//! The [`RequestContext`] is the mandatory first argument of every bound
//! handler. It carries the per-request metadata and the typed extensions that
//! upstream middleware attached to the request (sessions, token claims).

use http::request::Parts;
use http::{Extensions, Method};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// Header consulted for an inbound request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Time-ordered (UUID v7) request identifier, logged as `request_id`.
///
/// ```
/// use bindery_core::RequestId;
///
/// let a = RequestId::new();
/// let b = RequestId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an ID received from upstream.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The wrapped UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request context handed to every bound handler.
///
/// `RequestContext` carries:
/// - Unique request ID for log correlation
/// - HTTP method and path of the request
/// - Typed extensions inserted by upstream middleware
/// - Request timing information
///
/// Identity is not stored here directly. An
/// [`IdentityResolver`](crate::IdentityResolver) derives it from the
/// extensions when a handler asks for one.
///
/// # Example
///
/// ```
/// use bindery_core::RequestContext;
///
/// let ctx = RequestContext::new();
/// println!("Processing request: {}", ctx.request_id());
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    extensions: Extensions,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a `GET /` request with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            method: Method::GET,
            path: "/".to_string(),
            extensions: Extensions::new(),
            started_at: Instant::now(),
        }
    }

    /// Builds the context for an inbound request head.
    ///
    /// The request ID is taken from the `x-request-id` header when it holds a
    /// valid UUID; otherwise a new one is generated. Extensions are cloned so
    /// the head itself can still be handed to the handler.
    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .map_or_else(RequestId::new, RequestId::from_uuid);

        Self {
            request_id,
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            extensions: parts.extensions.clone(),
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a typed extension attached to the request, if present.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Returns all extensions attached to the request.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns a new context with the given extension inserted.
    #[must_use]
    pub fn with_extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Returns a new context with the given method and path.
    #[must_use]
    pub fn with_route(mut self, method: Method, path: impl Into<String>) -> Self {
        self.method = method;
        self.path = path.into();
        self
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
