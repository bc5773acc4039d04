//! Binding functions to handlers and serving calls.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bindery_config::{BinderyConfig, DEFAULT_MAX_BODY_BYTES};
use bindery_core::{ApiError, IdentityError, IdentityResolver, IdentityScheme, RequestContext};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::Request;
use hyper::body::Body;

use crate::classify::failure_response;
use crate::decode::{ensure_empty, read_body, BoxError};
use crate::encode::{self, JsonResponse, Presentation, PresentationPolicy};
use crate::endpoint::{Endpoint, Outcome};
use crate::slot::CallArgs;
use crate::{validate, BindError, Descriptor};

struct Shared {
    resolver: Arc<dyn IdentityResolver>,
    presentation: PresentationPolicy,
    max_body_bytes: usize,
}

/// Turns functions into [`BoundHandler`]s.
///
/// A binder holds what every handler shares: the identity resolver, the
/// presentation policy and the request body limit. Cloning is cheap.
///
/// # Example
///
/// ```
/// use bindery_bind::Binder;
/// use bindery_core::{ApiError, RequestContext};
///
/// #[derive(serde::Deserialize)]
/// struct Greet { name: String }
///
/// async fn greet(_ctx: RequestContext, input: Greet) -> Result<String, ApiError> {
///     Ok(format!("hello, {}", input.name))
/// }
///
/// let binder = Binder::new();
/// let handler = binder.bind(greet).unwrap();
/// assert_eq!(handler.descriptor().input_shape().map(|s| s.ends_with("Greet")), Some(true));
/// ```
#[derive(Clone)]
pub struct Binder {
    shared: Arc<Shared>,
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("presentation", &self.shared.presentation)
            .field("max_body_bytes", &self.shared.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// Creates a binder with session identity, compact output except for
    /// `curl/` clients, and a 1 MiB body limit.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a binder builder.
    #[must_use]
    pub fn builder() -> BinderBuilder {
        BinderBuilder::default()
    }

    /// Creates a binder from loaded configuration.
    #[must_use]
    pub fn from_config(config: &BinderyConfig) -> Self {
        Self::builder()
            .identity_scheme(config.identity.scheme)
            .presentation(PresentationPolicy::from_config(&config.presentation))
            .max_body_bytes(config.server.max_body_bytes)
            .build()
    }

    /// Validates `f` and returns a handler for it.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] naming the function and the rule its signature
    /// breaks.
    pub fn bind<F, M>(&self, f: F) -> Result<BoundHandler, BindError>
    where
        F: Endpoint<M>,
        M: 'static,
    {
        let function = type_name::<F>();
        let descriptor =
            validate(&F::signature()).map_err(|source| BindError::new(function, source))?;

        tracing::debug!(
            function,
            accepts_request = descriptor.accepts_request(),
            accepts_identity = descriptor.accepts_identity(),
            input = descriptor.input_shape().unwrap_or("-"),
            produces_output = descriptor.produces_output(),
            "Bound API function"
        );

        Ok(BoundHandler {
            function,
            descriptor,
            endpoint: Arc::new(Erased {
                f,
                _marker: PhantomData,
            }),
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Builder for [`Binder`].
pub struct BinderBuilder {
    resolver: Option<Arc<dyn IdentityResolver>>,
    scheme: IdentityScheme,
    presentation: PresentationPolicy,
    max_body_bytes: usize,
}

impl Default for BinderBuilder {
    fn default() -> Self {
        Self {
            resolver: None,
            scheme: IdentityScheme::default(),
            presentation: PresentationPolicy::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl fmt::Debug for BinderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderBuilder")
            .field("custom_resolver", &self.resolver.is_some())
            .field("scheme", &self.scheme)
            .field("presentation", &self.presentation)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl BinderBuilder {
    /// Uses the resolver for a built-in identity scheme.
    #[must_use]
    pub fn identity_scheme(mut self, scheme: IdentityScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Uses a custom identity resolver. Takes precedence over the scheme.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the presentation policy.
    #[must_use]
    pub fn presentation(mut self, presentation: PresentationPolicy) -> Self {
        self.presentation = presentation;
        self
    }

    /// Sets the request body limit in bytes.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Builds the binder.
    #[must_use]
    pub fn build(self) -> Binder {
        let resolver = self.resolver.unwrap_or_else(|| self.scheme.resolver());
        Binder {
            shared: Arc::new(Shared {
                resolver,
                presentation: self.presentation,
                max_body_bytes: self.max_body_bytes,
            }),
        }
    }
}

trait ErasedEndpoint: Send + Sync {
    fn invoke(&self, args: CallArgs, presentation: Presentation) -> BoxFuture<'static, Outcome>;
}

struct Erased<F, M> {
    f: F,
    _marker: PhantomData<fn() -> M>,
}

impl<F, M> ErasedEndpoint for Erased<F, M>
where
    F: Endpoint<M>,
    M: 'static,
{
    fn invoke(&self, args: CallArgs, presentation: Presentation) -> BoxFuture<'static, Outcome> {
        self.f.invoke(args, presentation)
    }
}

/// An HTTP handler for one bound function.
///
/// Cheap to clone; all clones share the same function and settings.
#[derive(Clone)]
pub struct BoundHandler {
    function: &'static str,
    descriptor: Descriptor,
    endpoint: Arc<dyn ErasedEndpoint>,
    shared: Arc<Shared>,
}

impl fmt::Debug for BoundHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHandler")
            .field("function", &self.function)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl BoundHandler {
    /// Type name of the bound function.
    #[must_use]
    pub const fn function(&self) -> &'static str {
        self.function
    }

    /// The calling convention derived at bind time.
    #[must_use]
    pub const fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Handles one request.
    ///
    /// Never fails: every error becomes a JSON error response.
    pub async fn call<B>(&self, request: Request<B>) -> JsonResponse
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let ctx = RequestContext::from_parts(&parts);
        let presentation = self.shared.presentation.choose(&parts.headers);

        let mut args = CallArgs::new(ctx.clone());
        if self.descriptor.accepts_request() {
            args = args.with_request(parts);
        }

        if self.descriptor.accepts_identity() {
            match self.shared.resolver.resolve(&ctx).await {
                Ok(identity) => args = args.with_identity(identity),
                Err(err) => return self.fail(&ctx, &identity_failure(err), presentation),
            }
        }

        let body = if self.descriptor.accepts_input() {
            read_body(body, self.shared.max_body_bytes).await.map(Some)
        } else {
            ensure_empty(body).await.map(|()| None)
        };
        match body {
            Ok(Some(bytes)) => args = args.with_body(bytes),
            Ok(None) => {}
            Err(err) => return self.fail(&ctx, &err.into(), presentation),
        }

        match self.endpoint.invoke(args, presentation).await {
            Outcome::Empty => encode::empty_response(),
            Outcome::Value(bytes) => encode::json_response(http::StatusCode::OK, bytes),
            Outcome::Failed(err) => self.fail(&ctx, &err, presentation),
            Outcome::Unencodable(err) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    http.method = %ctx.method(),
                    http.path = ctx.path(),
                    function = self.function,
                    error = %err,
                    "Failed to encode response"
                );
                encode::internal_error_response(presentation)
            }
        }
    }

    fn fail(
        &self,
        ctx: &RequestContext,
        err: &anyhow::Error,
        presentation: Presentation,
    ) -> JsonResponse {
        failure_response(ctx, self.function, err, presentation)
    }
}

fn identity_failure(err: IdentityError) -> anyhow::Error {
    match err {
        IdentityError::Missing(message) => ApiError::unauthorized(message).into(),
        other => other.into(),
    }
}
