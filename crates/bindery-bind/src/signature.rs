//! Function signatures and the rules a bindable function must follow.
//!
//! A [`Signature`] lists a function's parameter slots and return values.
//! [`validate`] checks it once at registration time and produces the
//! [`Descriptor`] the bound handler follows on every call.
//!
//! Legal shapes, where `[..]` is optional:
//!
//! ```text
//! fn(RequestContext, [Parts], [Identity], [Input]) -> ()
//! fn(RequestContext, [Parts], [Identity], [Input]) -> Result<(), E>
//! fn(RequestContext, [Parts], [Identity], [Input]) -> Result<T, E>
//! ```

use std::any::type_name;
use std::fmt;

use bindery_core::{Identity, RequestContext};
use http::request::Parts;
use thiserror::Error;

/// How a parameter is filled on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// The per-request [`RequestContext`].
    Context,
    /// The raw request head.
    Request,
    /// The caller's resolved [`Identity`].
    Identity,
    /// A value decoded from the JSON request body.
    Value,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Context => "context",
            Self::Request => "request",
            Self::Identity => "identity",
            Self::Value => "value",
        };
        f.write_str(name)
    }
}

/// One parameter of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamType {
    /// How the slot is filled.
    pub kind: SlotKind,
    /// Rust type name of the parameter.
    pub type_name: &'static str,
}

impl ParamType {
    /// Creates a parameter description.
    #[must_use]
    pub const fn new(kind: SlotKind, type_name: &'static str) -> Self {
        Self { kind, type_name }
    }
}

/// One return value of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    /// A success value that is encoded as the response body.
    Value(&'static str),
    /// An error.
    Error(&'static str),
}

impl ReturnType {
    const fn is_error(self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// The shape of a function as seen by the validator.
///
/// Endpoint adapters derive this from the function type. It can also be
/// built by hand:
///
/// ```
/// use bindery_bind::{validate, Signature};
///
/// let signature = Signature::new()
///     .context()
///     .identity()
///     .value("CreateNote")
///     .returns_value("Note")
///     .returns_error();
///
/// let descriptor = validate(&signature).unwrap();
/// assert!(descriptor.accepts_identity());
/// assert_eq!(descriptor.input_shape(), Some("CreateNote"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// Parameters in declaration order.
    pub params: Vec<ParamType>,
    /// Return values in order.
    pub returns: Vec<ReturnType>,
    /// Whether the last parameter collects a variable number of arguments.
    pub variadic: bool,
}

impl Signature {
    /// Creates an empty signature: no parameters, no returns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, kind: SlotKind, type_name: &'static str) -> Self {
        self.params.push(ParamType::new(kind, type_name));
        self
    }

    /// Appends a [`RequestContext`] parameter.
    #[must_use]
    pub fn context(self) -> Self {
        self.param(SlotKind::Context, type_name::<RequestContext>())
    }

    /// Appends a request head parameter.
    #[must_use]
    pub fn request(self) -> Self {
        self.param(SlotKind::Request, type_name::<Parts>())
    }

    /// Appends an [`Identity`] parameter.
    #[must_use]
    pub fn identity(self) -> Self {
        self.param(SlotKind::Identity, type_name::<Identity>())
    }

    /// Appends a body-decoded parameter of the named type.
    #[must_use]
    pub fn value(self, type_name: &'static str) -> Self {
        self.param(SlotKind::Value, type_name)
    }

    /// Appends a success return value of the named type.
    #[must_use]
    pub fn returns_value(mut self, type_name: &'static str) -> Self {
        self.returns.push(ReturnType::Value(type_name));
        self
    }

    /// Appends an error return value.
    #[must_use]
    pub fn returns_error(mut self) -> Self {
        self.returns.push(ReturnType::Error("anyhow::Error"));
        self
    }

    /// Marks the signature as variadic.
    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Optional arguments after the context and request head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arguments {
    None,
    Identity,
    Input(&'static str),
    IdentityAndInput(&'static str),
}

/// What a function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    /// No return value.
    Nothing,
    /// Only an error.
    Error,
    /// A value and an error.
    ValueAndError,
}

/// The calling convention of a validated function.
///
/// Built once by [`validate`] and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    accepts_request: bool,
    arguments: Arguments,
    returns: Returns,
}

impl Descriptor {
    /// The function takes the request head after the context.
    #[must_use]
    pub const fn accepts_request(&self) -> bool {
        self.accepts_request
    }

    /// The function takes the caller's identity.
    #[must_use]
    pub const fn accepts_identity(&self) -> bool {
        matches!(
            self.arguments,
            Arguments::Identity | Arguments::IdentityAndInput(_)
        )
    }

    /// The function takes a value decoded from the request body.
    #[must_use]
    pub const fn accepts_input(&self) -> bool {
        self.input_shape().is_some()
    }

    /// Type name the request body is decoded into, if any.
    #[must_use]
    pub const fn input_shape(&self) -> Option<&'static str> {
        match self.arguments {
            Arguments::Input(shape) | Arguments::IdentityAndInput(shape) => Some(shape),
            Arguments::None | Arguments::Identity => None,
        }
    }

    /// The function returns a value to encode on success.
    #[must_use]
    pub const fn produces_output(&self) -> bool {
        matches!(self.returns, Returns::ValueAndError)
    }

    /// The function can fail.
    #[must_use]
    pub const fn produces_error(&self) -> bool {
        !matches!(self.returns, Returns::Nothing)
    }

    /// The return shape.
    #[must_use]
    pub const fn returns(&self) -> Returns {
        self.returns
    }
}

/// A rule a function signature broke.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The function is variadic.
    #[error("must not be variadic")]
    Variadic,

    /// Wrong number of parameters after the optional request head.
    #[error("must accept 1, 2 or 3 arguments")]
    ArgumentCount,

    /// Two optional arguments, but the first is not the identity.
    #[error("second argument must be Identity")]
    SecondArgumentNotIdentity,

    /// The first parameter is not the request context.
    #[error("first argument must be RequestContext")]
    FirstArgumentNotContext,

    /// The input position holds a type that is not read from the body.
    #[error("input argument {0} cannot be decoded from a request body")]
    InputNotDecodable(&'static str),

    /// More than two return values.
    #[error("must return 0, 1 or 2 values")]
    ReturnCount,

    /// A single return value that is not an error.
    #[error("single return value must be an error")]
    SingleReturnNotError,

    /// Two return values where the second is not an error.
    #[error("second return value must be an error")]
    SecondReturnNotError,
}

/// Registration failure for a specific function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error binding API function {function}: {source}")]
pub struct BindError {
    function: &'static str,
    #[source]
    source: SignatureError,
}

impl BindError {
    /// Creates a bind error for the named function.
    #[must_use]
    pub const fn new(function: &'static str, source: SignatureError) -> Self {
        Self { function, source }
    }

    /// Name of the function that failed to bind.
    #[must_use]
    pub const fn function(&self) -> &'static str {
        self.function
    }

    /// The violated rule.
    #[must_use]
    pub const fn rule(&self) -> &SignatureError {
        &self.source
    }
}

/// Checks a signature and derives its [`Descriptor`].
///
/// Rules are checked in a fixed order and the first violation is returned.
///
/// # Errors
///
/// Returns the [`SignatureError`] naming the first rule the signature breaks.
pub fn validate(signature: &Signature) -> Result<Descriptor, SignatureError> {
    let (accepts_request, arguments) = validate_params(signature)?;
    let returns = validate_returns(&signature.returns)?;
    Ok(Descriptor {
        accepts_request,
        arguments,
        returns,
    })
}

fn validate_params(signature: &Signature) -> Result<(bool, Arguments), SignatureError> {
    if signature.variadic {
        return Err(SignatureError::Variadic);
    }

    let params = &signature.params;
    let kind_at = |index: usize| params.get(index).map(|p| p.kind);

    let accepts_request = params.len() > 1 && kind_at(1) == Some(SlotKind::Request);
    let offset = usize::from(accepts_request);

    let arguments = match params.len() - offset {
        1 => Arguments::None,
        2 => {
            let param = &params[offset + 1];
            if param.kind == SlotKind::Identity {
                Arguments::Identity
            } else {
                Arguments::Input(input_shape(param)?)
            }
        }
        3 => {
            if kind_at(offset + 1) != Some(SlotKind::Identity) {
                return Err(SignatureError::SecondArgumentNotIdentity);
            }
            Arguments::IdentityAndInput(input_shape(&params[offset + 2])?)
        }
        _ => return Err(SignatureError::ArgumentCount),
    };

    if kind_at(0) != Some(SlotKind::Context) {
        return Err(SignatureError::FirstArgumentNotContext);
    }

    Ok((accepts_request, arguments))
}

fn input_shape(param: &ParamType) -> Result<&'static str, SignatureError> {
    match param.kind {
        SlotKind::Value => Ok(param.type_name),
        SlotKind::Context | SlotKind::Request | SlotKind::Identity => {
            Err(SignatureError::InputNotDecodable(param.type_name))
        }
    }
}

fn validate_returns(returns: &[ReturnType]) -> Result<Returns, SignatureError> {
    match returns {
        [] => Ok(Returns::Nothing),
        [only] if only.is_error() => Ok(Returns::Error),
        [_] => Err(SignatureError::SingleReturnNotError),
        [_, second] if second.is_error() => Ok(Returns::ValueAndError),
        [_, _] => Err(SignatureError::SecondReturnNotError),
        _ => Err(SignatureError::ReturnCount),
    }
}
