//! # Injector Module
//!
//! Type-directed parameter resolution. The [`Injector`] owns a table from a
//! declared parameter type ([`TypeKey`]) to a resolver function
//! `(&Request) -> value`. For each dispatch it walks the handler's manifest in
//! declaration order and builds the [`Arguments`] the handler receives.
//!
//! ## Resolution Table
//!
//! - `Request` always resolves to the live request of the dispatch (identity
//!   entry). It cannot be replaced.
//! - Any other `'static + Send` type is resolved by the function registered
//!   for it: JSON body decoding, header extraction, or anything else
//!   computable from the request.
//!
//! ```rust
//! use pyre_router::injector::{FromRequest, Injector};
//! use pyre_router::request::Request;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Body {
//!     a: i64,
//! }
//!
//! struct UserAgent(String);
//!
//! impl FromRequest for UserAgent {
//!     fn from_request(request: &Request) -> anyhow::Result<Self> {
//!         Ok(UserAgent(request.header("user-agent").unwrap_or("unknown").to_string()))
//!     }
//! }
//!
//! let mut injector = Injector::new();
//! injector
//!     .register_json::<Body>()
//!     .register_from_request::<UserAgent>()
//!     .register::<u64, _>(|req| Ok(req.body().len() as u64));
//! ```
//!
//! ## Failure Modes
//!
//! | Situation | Error | HTTP |
//! |---|---|---|
//! | Declared type has no entry | `UnresolvedDependency` | 400 |
//! | Resolver returned `Err` | `Resolution` | 400 |
//!
//! The table is filled during setup and only read while serving.

mod arguments;
mod core;
#[cfg(test)]
mod tests;

pub use self::arguments::{Arguments, MAX_INLINE_ARGS};
pub use self::core::{DependencyResolver, FromRequest, Injector, TypeKey};
