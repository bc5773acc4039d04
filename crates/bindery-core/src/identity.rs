//! Caller identity and its resolution from request context.
//!
//! Authentication itself happens upstream: session middleware attaches a
//! [`Session`], token middleware attaches verified [`TokenClaims`]. An
//! [`IdentityResolver`] turns one of those into the [`Identity`] a handler
//! asked for. Which resolver runs is chosen once per deployment through
//! [`IdentityScheme`].
//!
//! [`Identity`] deliberately has no `Deserialize` impl: it can only come from
//! a resolver, never from a request body.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::RequestContext;

/// Opaque identifier of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from any identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates an identity from a UUID account ID.
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id.to_string())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure to resolve an identity.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The context carries no identity at all. Callers see a 401.
    #[error("{0}")]
    Missing(String),

    /// Identity material was present but unusable.
    #[error("invalid identity: {0}")]
    Invalid(String),

    /// The resolver itself failed.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IdentityError {
    /// Creates a missing-identity error with the message shown to callers.
    #[must_use]
    pub fn missing(message: impl Into<String>) -> Self {
        Self::Missing(message.into())
    }

    /// Returns `true` if no identity was present in the context.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}

/// Resolves the caller's [`Identity`] from a request context.
///
/// Implementations must be cheap to share: a single resolver serves every
/// request concurrently.
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    /// Resolves the identity for this request.
    async fn resolve(&self, ctx: &RequestContext) -> Result<Identity, IdentityError>;
}

/// An authenticated session attached by session middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The account the session belongs to.
    pub account_id: Uuid,
}

/// Verified bearer token claims attached by token middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// The `sub` claim.
    pub subject: String,
    /// The `iss` claim.
    pub issuer: String,
}

/// Resolves identity from a [`Session`] extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionResolver;

#[async_trait]
impl IdentityResolver for SessionResolver {
    async fn resolve(&self, ctx: &RequestContext) -> Result<Identity, IdentityError> {
        let session = ctx
            .extension::<Session>()
            .ok_or_else(|| IdentityError::missing("no session in request context"))?;
        if session.account_id.is_nil() {
            return Err(IdentityError::Invalid("session has a nil account id".to_string()));
        }
        Ok(Identity::from_uuid(session.account_id))
    }
}

/// Resolves identity from [`TokenClaims`], using the subject as the identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsResolver;

#[async_trait]
impl IdentityResolver for ClaimsResolver {
    async fn resolve(&self, ctx: &RequestContext) -> Result<Identity, IdentityError> {
        let claims = ctx
            .extension::<TokenClaims>()
            .ok_or_else(|| IdentityError::missing("no token claims in request context"))?;
        if claims.subject.trim().is_empty() {
            return Err(IdentityError::Invalid(format!(
                "token from '{}' has an empty subject",
                claims.issuer
            )));
        }
        Ok(Identity::new(claims.subject.clone()))
    }
}

/// Which identity resolution strategy a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScheme {
    /// Resolve from session middleware.
    #[default]
    Session,
    /// Resolve from verified token claims.
    Claims,
}

impl IdentityScheme {
    /// Returns the resolver implementing this scheme.
    #[must_use]
    pub fn resolver(self) -> Arc<dyn IdentityResolver> {
        match self {
            Self::Session => Arc::new(SessionResolver),
            Self::Claims => Arc::new(ClaimsResolver),
        }
    }
}

impl std::str::FromStr for IdentityScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "claims" => Ok(Self::Claims),
            other => Err(format!("unknown identity scheme '{other}'")),
        }
    }
}
