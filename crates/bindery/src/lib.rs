//! # Bindery
//!
//! Write business functions with ordinary Rust types and let Bindery turn
//! them into JSON HTTP handlers.
//!
//! A bindable function takes a [`RequestContext`](prelude::RequestContext)
//! first, then optionally the request head, the caller's
//! [`Identity`](prelude::Identity) and one input decoded from the JSON body.
//! It returns `()`, `Result<(), E>` or `Result<T, E>`. The signature is
//! checked once when the function is bound, never per request.
//!
//! ```rust,ignore
//! use bindery::prelude::*;
//!
//! #[derive(serde::Deserialize)]
//! struct Rename {
//!     title: String,
//! }
//!
//! async fn rename(ctx: RequestContext, caller: Identity, input: Rename) -> Result<(), ApiError> {
//!     // ...
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new()
//!         .with_defaults()
//!         .with_optional_file("bindery.toml")?
//!         .with_dotenv()?
//!         .load()?;
//!     init_logging(&config.logging.to_log_config())?;
//!
//!     let routes = RouteTable::builder(Binder::from_config(&config))
//!         .post("/notes/rename", rename)
//!         .build()?;
//!     Server::from_config(&config, routes).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request -> RouteTable -> BoundHandler: context -> [head] -> [identity] -> [body]
//!                                            |
//! Response <- encoder <- classifier <- function
//! ```

#![doc(html_root_url = "https://docs.rs/bindery/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use bindery_bind as bind;
pub use bindery_config as config;
pub use bindery_core as core;
pub use bindery_server as server;
pub use bindery_telemetry as telemetry;

/// Everything an application needs to bind and serve functions.
pub mod prelude {
    pub use bindery_core::{
        ApiError, Identity, IdentityError, IdentityResolver, IdentityScheme, RequestContext,
        RequestId, Session, TokenClaims,
    };

    pub use bindery_bind::{
        BindError, Binder, BoundHandler, Presentation, PresentationPolicy, SignatureError,
    };

    pub use bindery_server::{RegistrationErrors, RouteTable, Server, ShutdownSignal};

    pub use bindery_config::{BinderyConfig, ConfigLoader};

    pub use bindery_telemetry::{init_logging, LogConfig};
}
