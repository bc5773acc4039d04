//! Adapters from async functions to bindable endpoints.
//!
//! [`Endpoint`] is implemented for every `Fn` of up to five parameters whose
//! parameters implement [`Slot`] and whose output implements [`Reply`]. The
//! adapter reports the function's [`Signature`] for validation and invokes
//! it with arguments taken from a [`CallArgs`].

use std::any::{type_name, TypeId};
use std::future::Future;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::encode::{to_json, Presentation};
use crate::slot::{CallArgs, Slot};
use crate::{ParamType, ReturnType, Signature};

/// What a call produced.
#[derive(Debug)]
pub enum Outcome {
    /// Finished without output.
    Empty,
    /// Finished with an encoded value.
    Value(Bytes),
    /// The call failed, either in the function or while preparing arguments.
    Failed(anyhow::Error),
    /// The function succeeded but its value could not be encoded.
    Unencodable(serde_json::Error),
}

/// The return type of a bindable function.
pub trait Reply: Send + 'static {
    /// Describes the return values.
    fn returns() -> Vec<ReturnType>;

    /// Converts the returned value into an [`Outcome`].
    fn into_outcome(self, presentation: Presentation) -> Outcome;
}

impl Reply for () {
    fn returns() -> Vec<ReturnType> {
        Vec::new()
    }

    fn into_outcome(self, _presentation: Presentation) -> Outcome {
        Outcome::Empty
    }
}

/// `Result<(), E>` is an error-only return; any other `T` is a value.
impl<T, E> Reply for Result<T, E>
where
    T: Serialize + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
{
    fn returns() -> Vec<ReturnType> {
        let error = ReturnType::Error(type_name::<E>());
        if is_unit::<T>() {
            vec![error]
        } else {
            vec![ReturnType::Value(type_name::<T>()), error]
        }
    }

    fn into_outcome(self, presentation: Presentation) -> Outcome {
        match self {
            Ok(_) if is_unit::<T>() => Outcome::Empty,
            Ok(value) => match to_json(&value, presentation) {
                Ok(bytes) => Outcome::Value(bytes),
                Err(err) => Outcome::Unencodable(err),
            },
            Err(err) => Outcome::Failed(err.into()),
        }
    }
}

fn is_unit<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<()>()
}

/// A function that can be bound to an HTTP handler.
///
/// `M` is a tuple of `(marker, parameter)` pairs, one per parameter. It is
/// inferred and never named by callers.
pub trait Endpoint<M>: Clone + Send + Sync + 'static {
    /// The function's parameter and return shape.
    fn signature() -> Signature;

    /// Calls the function with arguments taken from `args`.
    fn invoke(&self, args: CallArgs, presentation: Presentation) -> BoxFuture<'static, Outcome>;
}

macro_rules! impl_endpoint {
    ($($T:ident $M:ident),*) => {
        impl<F, Fut, R, $($T, $M,)*> Endpoint<($(($M, $T),)*)> for F
        where
            F: Fn($($T),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: Reply,
            $($T: Slot<$M>,)*
        {
            fn signature() -> Signature {
                Signature {
                    params: vec![$(ParamType::new(<$T as Slot<$M>>::KIND, type_name::<$T>()),)*],
                    returns: R::returns(),
                    variadic: false,
                }
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(
                &self,
                mut args: CallArgs,
                presentation: Presentation,
            ) -> BoxFuture<'static, Outcome> {
                let f = self.clone();
                Box::pin(async move {
                    $(
                        let $T = match <$T as Slot<$M>>::extract(&mut args) {
                            Ok(value) => value,
                            Err(err) => return Outcome::Failed(err),
                        };
                    )*
                    f($($T),*).await.into_outcome(presentation)
                })
            }
        }
    };
}

impl_endpoint!();
impl_endpoint!(T1 M1);
impl_endpoint!(T1 M1, T2 M2);
impl_endpoint!(T1 M1, T2 M2, T3 M3);
impl_endpoint!(T1 M1, T2 M2, T3 M3, T4 M4);
impl_endpoint!(T1 M1, T2 M2, T3 M3, T4 M4, T5 M5);
