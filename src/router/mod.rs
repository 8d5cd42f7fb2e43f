//! # Router Module
//!
//! The router owns the `(method, path) → handler` table and the single
//! dispatch entry point that runs one request end to end.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Storing handlers under an exact `(method, path)` key (last write wins)
//! - Building the per-dispatch [`Request`](crate::request::Request)
//! - Asking the injector for the handler's arguments
//! - Invoking the handler and encoding its value with the request's
//!   current serializer
//! - Reporting every failure as a [`DispatchError`](crate::error::DispatchError)
//!   or, through [`Router::handle`], as a well-formed error response
//!
//! ## Dispatch Pipeline
//!
//! ```text
//! dispatch(method, path, body)
//!   1. lookup (method, path)          -> RouteNotFound (404)
//!   2. Request(body, Response(default serializer))
//!   3. injector.resolve(handler, req) -> UnresolvedDependency / Resolution (400)
//!   4. handler(args)                  -> Handler (500), panics included
//!   5. req.response.serializer.encode -> Encoding (500)
//!   6. RouteResponse { body, status, {"content-type": ...} }
//! ```
//!
//! Matching is exact: `/text` and `/text/` are different routes, and there are
//! no path parameters or wildcards.
//!
//! ## Example
//!
//! ```rust
//! use pyre_router::handler::Handler;
//! use pyre_router::router::Router;
//! use http::Method;
//! use serde_json::json;
//!
//! let mut router = Router::with_defaults();
//! router.get("/", Handler::from_fn("root", || Ok(json!({ "result": "test" }))));
//!
//! let res = router.dispatch(Method::GET, "/", Vec::new()).unwrap();
//! assert_eq!(res.status, 200);
//! assert_eq!(res.content_type(), Some("application/json"));
//! assert_eq!(res.body_str(), Some(r#"{"result": "test"}"#));
//! ```
//!
//! ## Concurrency
//!
//! Registration takes `&mut self` and dispatch takes `&self`: once the router
//! is shared behind an `Arc` for serving, the tables are read-only and any
//! number of dispatches may run at once.

mod core;

pub use self::core::Router;
