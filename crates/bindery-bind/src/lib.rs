//! # Bindery Bind
//!
//! Turns ordinary async functions into HTTP JSON handlers.
//!
//! A function is inspected once, when it is bound. Its parameter and return
//! types decide how each request is handled:
//!
//! - the first parameter is always the [`RequestContext`](bindery_core::RequestContext)
//! - an optional [`http::request::Parts`] gives access to the raw request head
//! - an optional [`Identity`](bindery_core::Identity) asks for the caller's
//!   resolved identity; a missing identity is answered with 401
//! - an optional last parameter of any `Deserialize` type is decoded from the
//!   JSON body, rejecting unknown fields
//! - the return type is `()`, `Result<(), E>` or `Result<T, E>`
//!
//! Errors whose innermost cause is an [`ApiError`](bindery_core::ApiError)
//! are sent to the caller as `{"error": message}` with their status. Every
//! other error is logged and answered with a generic 500.
//!
//! # Example
//!
//! ```
//! use bindery_bind::Binder;
//! use bindery_core::{ApiError, Identity, RequestContext};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct CreateNote {
//!     title: String,
//! }
//!
//! #[derive(Serialize)]
//! struct Note {
//!     owner: Identity,
//!     title: String,
//! }
//!
//! async fn create_note(
//!     _ctx: RequestContext,
//!     owner: Identity,
//!     input: CreateNote,
//! ) -> Result<Note, ApiError> {
//!     if input.title.is_empty() {
//!         return Err(ApiError::bad_request("title must not be empty"));
//!     }
//!     Ok(Note { owner, title: input.title })
//! }
//!
//! let handler = Binder::new().bind(create_note).expect("valid signature");
//! assert!(handler.descriptor().accepts_identity());
//! assert!(handler.descriptor().produces_output());
//! ```

#![doc(html_root_url = "https://docs.rs/bindery-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
pub mod classify;
pub mod decode;
pub mod encode;
mod endpoint;
mod signature;
pub mod slot;

pub use binder::{Binder, BinderBuilder, BoundHandler};
pub use encode::{JsonResponse, Presentation, PresentationPolicy};
pub use endpoint::{Endpoint, Outcome, Reply};
pub use signature::{
    validate, BindError, Descriptor, ParamType, ReturnType, Returns, Signature, SignatureError,
    SlotKind,
};
pub use slot::{CallArgs, Slot};
