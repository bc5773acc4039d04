//! Error classification.
//!
//! A failed call is answered from the innermost error of its cause chain.
//! If that error is an [`ApiError`] its status and message go to the caller
//! unchanged. Anything else is an internal failure: it is logged once with
//! the whole chain and the caller only sees a generic 500.

use std::error::Error as StdError;

use bindery_core::{ApiError, RequestContext};

use crate::encode::{self, JsonResponse, Presentation};

/// Longest cause chain that is followed. Longer chains are internal errors.
pub const MAX_CAUSE_DEPTH: usize = 32;

/// How a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Safe to show the caller.
    Exposed(&'a ApiError),
    /// Must not reach the caller.
    Internal,
}

/// Follows `source()` links to the innermost error.
///
/// Returns `None` if the chain has more than [`MAX_CAUSE_DEPTH`] links.
#[must_use]
pub fn terminal_cause<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    let mut current = err;
    for _ in 0..MAX_CAUSE_DEPTH {
        match current.source() {
            Some(next) => current = next,
            None => return Some(current),
        }
    }
    current.source().is_none().then_some(current)
}

/// Classifies a failure by its innermost cause.
///
/// ```
/// use anyhow::Context;
/// use bindery_bind::classify::{classify, Classification};
/// use bindery_core::ApiError;
///
/// let err = Err::<(), _>(ApiError::forbidden("forbidden"))
///     .context("loading note")
///     .unwrap_err();
/// assert!(matches!(classify(&err), Classification::Exposed(_)));
///
/// let err = anyhow::anyhow!("connection refused");
/// assert_eq!(classify(&err), Classification::Internal);
/// ```
#[must_use]
pub fn classify(err: &anyhow::Error) -> Classification<'_> {
    let root: &(dyn StdError + 'static) = err.as_ref();
    terminal_cause(root)
        .and_then(|cause| cause.downcast_ref::<ApiError>())
        .map_or(Classification::Internal, Classification::Exposed)
}

/// Builds the response for a failed call, logging internal failures.
pub(crate) fn failure_response(
    ctx: &RequestContext,
    function: &'static str,
    err: &anyhow::Error,
    presentation: Presentation,
) -> JsonResponse {
    match classify(err) {
        Classification::Exposed(api) => {
            encode::error_response(api.status(), api.message(), presentation)
        }
        Classification::Internal => {
            tracing::error!(
                request_id = %ctx.request_id(),
                http.method = %ctx.method(),
                http.path = ctx.path(),
                function,
                error = %format_args!("{err:#}"),
                "API function failed"
            );
            encode::internal_error_response(presentation)
        }
    }
}
