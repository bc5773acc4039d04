//! Exact-match routing from `(method, path)` to bound handlers.
//!
//! Registration never panics. Every failure is collected and returned from
//! [`RouteTableBuilder::build`], so an application sees all of its broken
//! routes at once.

use std::collections::HashMap;
use std::fmt;

use bindery_bind::decode::BoxError;
use bindery_bind::encode::{error_response, JsonResponse};
use bindery_bind::{BindError, Binder, BoundHandler, Endpoint, Presentation};
use bytes::Bytes;
use http::header::{HeaderValue, ALLOW};
use http::{Method, Request, StatusCode};
use hyper::body::Body;
use thiserror::Error;

/// Message for unknown paths.
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// Message for known paths requested with another method.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";

/// A single route that could not be registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The function's signature is not bindable.
    #[error("{method} {path}: {source}")]
    Bind {
        /// Route method.
        method: Method,
        /// Route path.
        path: String,
        /// Why binding failed.
        #[source]
        source: BindError,
    },

    /// The same method and path were registered before.
    #[error("{method} {path}: route registered twice")]
    Duplicate {
        /// Route method.
        method: Method,
        /// Route path.
        path: String,
    },

    /// The path does not start with `/`.
    #[error("{method} {path}: path must start with '/'")]
    InvalidPath {
        /// Route method.
        method: Method,
        /// Route path.
        path: String,
    },
}

/// Every registration failure of a route table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to register {} route(s): {}", .errors.len(), DisplayList(.errors))]
pub struct RegistrationErrors {
    errors: Vec<RegistrationError>,
}

impl RegistrationErrors {
    /// The individual failures, in registration order.
    #[must_use]
    pub fn errors(&self) -> &[RegistrationError] {
        &self.errors
    }
}

struct DisplayList<'a>(&'a [RegistrationError]);

impl fmt::Display for DisplayList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

/// Collects routes for a [`RouteTable`].
///
/// # Example
///
/// ```
/// use bindery_bind::Binder;
/// use bindery_core::RequestContext;
/// use bindery_server::RouteTable;
///
/// async fn ping(_ctx: RequestContext) {}
///
/// let table = RouteTable::builder(Binder::new())
///     .get("/ping", ping)
///     .build()
///     .unwrap();
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Debug)]
pub struct RouteTableBuilder {
    binder: Binder,
    routes: HashMap<String, HashMap<Method, BoundHandler>>,
    errors: Vec<RegistrationError>,
}

impl RouteTableBuilder {
    /// Registers `f` for `method` and `path`.
    #[must_use]
    pub fn route<F, M>(mut self, method: Method, path: &str, f: F) -> Self
    where
        F: Endpoint<M>,
        M: 'static,
    {
        let path = path.to_string();
        if !path.starts_with('/') {
            self.errors
                .push(RegistrationError::InvalidPath { method, path });
            return self;
        }

        let handler = match self.binder.bind(f) {
            Ok(handler) => handler,
            Err(source) => {
                self.errors.push(RegistrationError::Bind {
                    method,
                    path,
                    source,
                });
                return self;
            }
        };

        let methods = self.routes.entry(path.clone()).or_default();
        if methods.contains_key(&method) {
            self.errors
                .push(RegistrationError::Duplicate { method, path });
            return self;
        }

        tracing::debug!(
            http.method = %method,
            http.path = %path,
            function = handler.function(),
            "Route registered"
        );
        methods.insert(method, handler);
        self
    }

    /// Registers a `GET` route.
    #[must_use]
    pub fn get<F, M>(self, path: &str, f: F) -> Self
    where
        F: Endpoint<M>,
        M: 'static,
    {
        self.route(Method::GET, path, f)
    }

    /// Registers a `POST` route.
    #[must_use]
    pub fn post<F, M>(self, path: &str, f: F) -> Self
    where
        F: Endpoint<M>,
        M: 'static,
    {
        self.route(Method::POST, path, f)
    }

    /// Registers a `PUT` route.
    #[must_use]
    pub fn put<F, M>(self, path: &str, f: F) -> Self
    where
        F: Endpoint<M>,
        M: 'static,
    {
        self.route(Method::PUT, path, f)
    }

    /// Registers a `DELETE` route.
    #[must_use]
    pub fn delete<F, M>(self, path: &str, f: F) -> Self
    where
        F: Endpoint<M>,
        M: 'static,
    {
        self.route(Method::DELETE, path, f)
    }

    /// Finishes registration.
    ///
    /// # Errors
    ///
    /// Returns every registration failure if there was at least one.
    pub fn build(self) -> Result<RouteTable, RegistrationErrors> {
        if !self.errors.is_empty() {
            return Err(RegistrationErrors {
                errors: self.errors,
            });
        }
        Ok(RouteTable {
            routes: self.routes,
        })
    }
}

/// Immutable routing table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, HashMap<Method, BoundHandler>>,
}

impl RouteTable {
    /// Starts a table whose functions are bound with `binder`.
    #[must_use]
    pub fn builder(binder: Binder) -> RouteTableBuilder {
        RouteTableBuilder {
            binder,
            routes: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up the handler for a method and path.
    #[must_use]
    pub fn get(&self, method: &Method, path: &str) -> Option<&BoundHandler> {
        self.routes.get(path).and_then(|methods| methods.get(method))
    }

    /// Routes one request.
    pub async fn handle<B>(&self, request: Request<B>) -> JsonResponse
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let Some(methods) = self.routes.get(request.uri().path()) else {
            return error_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE, Presentation::Compact);
        };

        match methods.get(request.method()) {
            Some(handler) => handler.call(request).await,
            None => method_not_allowed(methods),
        }
    }
}

fn method_not_allowed(methods: &HashMap<Method, BoundHandler>) -> JsonResponse {
    let mut allowed: Vec<&str> = methods.keys().map(Method::as_str).collect();
    allowed.sort_unstable();

    let mut response = error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        METHOD_NOT_ALLOWED_MESSAGE,
        Presentation::Compact,
    );
    if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{ApiError, RequestContext};
    use http_body_util::{BodyExt, Full};

    async fn ping(_ctx: RequestContext) {}

    async fn add(_ctx: RequestContext, pair: (i64, i64)) -> Result<i64, ApiError> {
        Ok(pair.0 + pair.1)
    }

    async fn bad(_n: u32) {}

    fn table() -> RouteTable {
        RouteTable::builder(Binder::new())
            .get("/ping", ping)
            .post("/add", add)
            .put("/add", add)
            .build()
            .unwrap()
    }

    async fn body_of(response: JsonResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_table_len() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        assert!(table.get(&Method::GET, "/ping").is_some());
        assert!(table.get(&Method::POST, "/ping").is_none());
    }

    #[tokio::test]
    async fn test_dispatch() {
        let request = Request::post("/add?debug=1")
            .body(Full::new(Bytes::from_static(b"[2, 3]")))
            .unwrap();
        let response = table().handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "5\n");
    }

    #[tokio::test]
    async fn test_not_found() {
        let request = Request::get("/nope").body(Full::new(Bytes::new())).unwrap();
        let response = table().handle(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await, "{\"error\":\"Not Found\"}\n");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let request = Request::delete("/add").body(Full::new(Bytes::new())).unwrap();
        let response = table().handle(request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST, PUT");
        assert_eq!(body_of(response).await, "{\"error\":\"Method Not Allowed\"}\n");
    }

    #[test]
    fn test_errors_are_collected() {
        let err = RouteTable::builder(Binder::new())
            .get("/ping", ping)
            .get("/ping", ping)
            .post("/bad", bad)
            .get("relative", ping)
            .build()
            .unwrap_err();

        assert_eq!(err.errors().len(), 3);
        assert!(matches!(err.errors()[0], RegistrationError::Duplicate { .. }));
        assert!(matches!(err.errors()[1], RegistrationError::Bind { .. }));
        assert!(matches!(err.errors()[2], RegistrationError::InvalidPath { .. }));

        let message = err.to_string();
        assert!(message.starts_with("failed to register 3 route(s)"));
        assert!(message.contains("first argument must be RequestContext"));
    }
}
