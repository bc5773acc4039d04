//! Routing and HTTP serving for Bindery.
//!
//! [`RouteTable`] maps exact `(method, path)` pairs to functions bound by a
//! [`bindery_bind::Binder`]; [`Server`] serves a table over HTTP/1.1 with
//! graceful shutdown.
//!
//! Unknown paths get `404 {"error":"Not Found"}`. A known path requested
//! with another method gets `405 {"error":"Method Not Allowed"}` and an
//! `Allow` header.

mod routes;
mod server;
mod shutdown;

pub use routes::{
    RegistrationError, RegistrationErrors, RouteTable, RouteTableBuilder,
    METHOD_NOT_ALLOWED_MESSAGE, NOT_FOUND_MESSAGE,
};
pub use server::{Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
