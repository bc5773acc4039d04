//! Parameter slots and the arguments assembled for one call.
//!
//! Every parameter type of a bindable function implements [`Slot`] for
//! exactly one marker. The marker tells the compiler (and the validator)
//! where the argument comes from:
//!
//! | Parameter type                 | Marker          | Source                    |
//! |--------------------------------|-----------------|---------------------------|
//! | [`RequestContext`]             | [`ViaContext`]  | built from the request    |
//! | [`http::request::Parts`]       | [`ViaRequest`]  | the request head          |
//! | [`Identity`]                   | [`ViaIdentity`] | the identity resolver     |
//! | any `T: DeserializeOwned`      | [`ViaBody`]     | the JSON request body     |
//!
//! None of the first three types implement `Deserialize`, so no parameter
//! can match two markers.

use bindery_core::{Identity, RequestContext};
use bytes::Bytes;
use http::request::Parts;
use serde::de::DeserializeOwned;

use crate::decode::decode_strict;
use crate::SlotKind;

/// Marker for the request context slot.
#[derive(Debug, Clone, Copy)]
pub enum ViaContext {}

/// Marker for the request head slot.
#[derive(Debug, Clone, Copy)]
pub enum ViaRequest {}

/// Marker for the identity slot.
#[derive(Debug, Clone, Copy)]
pub enum ViaIdentity {}

/// Marker for body-decoded slots.
#[derive(Debug, Clone, Copy)]
pub enum ViaBody {}

/// Arguments gathered for one call, before they are handed to the function.
#[derive(Debug)]
pub struct CallArgs {
    context: Option<RequestContext>,
    request: Option<Parts>,
    identity: Option<Identity>,
    body: Option<Bytes>,
}

impl CallArgs {
    /// Starts an argument list with the request context.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        Self {
            context: Some(context),
            request: None,
            identity: None,
            body: None,
        }
    }

    /// Adds the request head.
    #[must_use]
    pub fn with_request(mut self, request: Parts) -> Self {
        self.request = Some(request);
        self
    }

    /// Adds the resolved identity.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Adds the raw request body.
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Takes the request context.
    pub fn take_context(&mut self) -> Option<RequestContext> {
        self.context.take()
    }

    /// Takes the request head.
    pub fn take_request(&mut self) -> Option<Parts> {
        self.request.take()
    }

    /// Takes the identity.
    pub fn take_identity(&mut self) -> Option<Identity> {
        self.identity.take()
    }

    /// Takes the raw body.
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }
}

/// A type that can fill one parameter of a bound function.
///
/// `M` is one of the marker types in this module.
pub trait Slot<M>: Sized + Send + 'static {
    /// Where the argument comes from.
    const KIND: SlotKind;

    /// Takes this argument out of `args`.
    ///
    /// # Errors
    ///
    /// Fails if the argument is absent or, for body slots, if the body does
    /// not decode. Decode failures carry a 400 `ApiError`.
    fn extract(args: &mut CallArgs) -> anyhow::Result<Self>;
}

fn missing(kind: SlotKind) -> anyhow::Error {
    anyhow::anyhow!("{kind} argument was not prepared for this call")
}

impl Slot<ViaContext> for RequestContext {
    const KIND: SlotKind = SlotKind::Context;

    fn extract(args: &mut CallArgs) -> anyhow::Result<Self> {
        args.take_context().ok_or_else(|| missing(Self::KIND))
    }
}

impl Slot<ViaRequest> for Parts {
    const KIND: SlotKind = SlotKind::Request;

    fn extract(args: &mut CallArgs) -> anyhow::Result<Self> {
        args.take_request().ok_or_else(|| missing(Self::KIND))
    }
}

impl Slot<ViaIdentity> for Identity {
    const KIND: SlotKind = SlotKind::Identity;

    fn extract(args: &mut CallArgs) -> anyhow::Result<Self> {
        args.take_identity().ok_or_else(|| missing(Self::KIND))
    }
}

impl<T> Slot<ViaBody> for T
where
    T: DeserializeOwned + Send + 'static,
{
    const KIND: SlotKind = SlotKind::Value;

    fn extract(args: &mut CallArgs) -> anyhow::Result<Self> {
        let body = args.take_body().ok_or_else(|| missing(SlotKind::Value))?;
        Ok(decode_strict(&body)?)
    }
}
