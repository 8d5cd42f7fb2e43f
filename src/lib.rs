//! # pyre-router
//!
//! **pyre-router** dispatches `(method, path, body)` requests to handlers whose
//! parameters are filled in by type from a resolution table, then encodes each
//! handler's return value with a serializer the handler may swap per request.
//!
//! ## Overview
//!
//! - Routes match on the exact `(method, path)` pair; no patterns, no
//!   normalization.
//! - Handlers declare an ordered list of `(name, type)` parameters. The
//!   injector produces one argument per parameter from the live request; the
//!   [`Request`](request::Request) type always resolves to the live request
//!   itself.
//! - Every response starts with the router's default serializer. A handler
//!   that takes the request can replace `request.response.serializer` to
//!   change its own reply's encoding and content type.
//! - Every failure is a [`DispatchError`](error::DispatchError) scoped to a
//!   single dispatch.
//!
//! ## Architecture
//!
//! - **[`router`]** - Route table and the dispatch pipeline
//! - **[`injector`]** - Type-keyed resolution table and resolved arguments
//! - **[`handler`]** - Handler manifests and the `#[handler]` attribute target
//! - **[`serializer`]** - JSON, text and YAML encoders
//! - **[`request`]** - Per-dispatch request, response-in-progress and final `RouteResponse`
//! - **[`error`]** - Error taxonomy and HTTP status mapping
//! - **[`server`]** - HTTP adapter on `may_minihttp`
//! - **[`logging`]** / **[`runtime_config`]** - Tracing setup and configuration
//! - **[`demo`]** / **[`cli`]** - Echo service and the `pyre-router` binary
//!
//! ### Request Handling Flow
//!
//! ```text
//! HTTP client
//!   -> server::AppService (parse, body limit)
//!   -> Router::handle_inbound
//!        lookup -> Request::new -> Injector::resolve -> handler -> serializer.encode
//!   -> RouteResponse { status, {"content-type": ...}, body }
//!   -> status line + headers + body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use pyre_router::handler;
//! use pyre_router::injector::Injector;
//! use pyre_router::request::Request;
//! use pyre_router::router::Router;
//! use pyre_router::serializer::{JsonSerializer, TextSerializer};
//! use http::Method;
//! use serde::{Deserialize, Serialize};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! #[derive(Deserialize, Serialize)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! #[handler]
//! fn hello(greeting: Greeting, request: &mut Request) -> anyhow::Result<Value> {
//!     request.response.set_serializer(TextSerializer);
//!     Ok(Value::String(format!("hello {}", greeting.name)))
//! }
//!
//! #[handler]
//! fn root() -> anyhow::Result<Value> {
//!     Ok(json!({ "result": "test" }))
//! }
//!
//! let mut injector = Injector::new();
//! injector.register_json::<Greeting>();
//!
//! let mut router = Router::new(Arc::new(JsonSerializer::default()), injector);
//! router.get("/", root()).post("/hello", hello());
//! router.validate().unwrap();
//!
//! let res = router.dispatch(Method::GET, "/", Vec::new()).unwrap();
//! assert_eq!(res.body_str(), Some(r#"{"result": "test"}"#));
//!
//! let res = router
//!     .dispatch(Method::POST, "/hello", br#"{"name":"pyre"}"#.to_vec())
//!     .unwrap();
//! assert_eq!(res.content_type(), Some("text"));
//! assert_eq!(res.body_str(), Some("hello pyre"));
//! ```
//!
//! ## Runtime Considerations
//!
//! The HTTP adapter uses the `may` coroutine runtime, not tokio. Stack size and
//! worker count come from `PYRE_STACK_SIZE` and `PYRE_WORKERS`; see
//! [`runtime_config`]. Dispatch itself is synchronous and runtime-agnostic.

extern crate self as pyre_router;

pub mod cli;
pub mod demo;
pub mod error;
pub mod handler;
pub mod ids;
pub mod injector;
pub mod logging;
pub mod request;
pub mod router;
pub mod runtime_config;
pub mod serializer;
pub mod server;

pub use error::{DispatchError, EncodingError, ValidationError};
pub use injector::{FromRequest, Injector};
pub use pyre_router_macros::handler;
pub use request::{Inbound, Request, RouteResponse};
pub use router::Router;
