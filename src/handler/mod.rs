//! # Handler Module
//!
//! A [`Handler`] is a named function plus an explicit, ordered manifest of the
//! parameters it needs: `(name, type)` pairs fixed when the handler is built.
//! The manifest is what the [injector](crate::injector) walks to produce
//! arguments, so no reflection over the function signature happens at
//! dispatch time.
//!
//! ## Building Handlers
//!
//! By hand, with [`Handler::builder`]:
//!
//! ```rust
//! use pyre_router::handler::Handler;
//! use pyre_router::request::Request;
//! use pyre_router::serializer::TextSerializer;
//! use serde_json::json;
//!
//! let text = Handler::builder("text")
//!     .param::<Request>("r")
//!     .build(|mut args| {
//!         let r = args.request("r")?;
//!         r.response.set_serializer(TextSerializer);
//!         Ok(json!({ "result": "switched" }))
//!     });
//!
//! assert_eq!(text.name(), "text");
//! assert_eq!(text.params()[0].name(), "r");
//! ```
//!
//! Or from a plain function with the `#[handler]` attribute,
//! which writes the same manifest from the signature:
//!
//! ```rust,ignore
//! #[pyre_router::handler]
//! fn echo_body(body: Body) -> anyhow::Result<serde_json::Value> {
//!     Ok(serde_json::json!({ "body": body }))
//! }
//!
//! router.post("/body", echo_body());
//! ```
//!
//! ## Return Values
//!
//! The function returns `anyhow::Result<T>` for any `T: Serialize`. An `Err`
//! becomes a handler failure (HTTP 500); an `Ok` value is encoded by whichever
//! serializer the request's response holds once the function returns.

mod core;
mod lowering;

pub use self::core::{Handler, HandlerBuilder, Param};
pub(crate) use self::core::InvokeError;
