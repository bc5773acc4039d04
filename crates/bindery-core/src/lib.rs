//! # Bindery Core
//!
//! Core types shared by the Bindery crates.
//!
//! This crate provides the values that flow into bound handler functions and
//! the error type handlers use to talk to callers:
//!
//! - [`RequestContext`] - Per-request context, always the first handler argument
//! - [`RequestId`] - UUID v7 request identifier
//! - [`Identity`] - Opaque identity of the authenticated caller
//! - [`IdentityResolver`] - Collaborator that resolves an [`Identity`] from context
//! - [`ApiError`] - Caller-facing error carrying a status and a message

#![doc(html_root_url = "https://docs.rs/bindery-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
pub mod identity;

pub use context::{RequestContext, RequestId, REQUEST_ID_HEADER};
pub use error::{ApiError, ErrorBody, INTERNAL_ERROR_MESSAGE};
pub use identity::{
    ClaimsResolver, Identity, IdentityError, IdentityResolver, IdentityScheme, Session,
    SessionResolver, TokenClaims,
};
