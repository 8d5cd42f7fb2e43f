//! # Server Module
//!
//! HTTP transport adapter built on `may_minihttp`. It sits outside the
//! dispatch core: it turns raw HTTP into an [`Inbound`](crate::request::Inbound),
//! hands it to [`Router::handle_inbound`](crate::router::Router::handle_inbound)
//! and writes the resulting [`RouteResponse`](crate::request::RouteResponse)
//! back to the socket.
//!
//! ## Request Flow
//!
//! ```text
//! TCP -> may_minihttp -> AppService::call
//!   parse_request: method, path (split at '?'), query, lower-cased headers, body
//!     rejected (bad method, body over limit) -> 400 / 413 problem response
//!   Router::handle_inbound -> RouteResponse
//!   write_route_response: status line, headers, body
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use pyre_router::router::Router;
//! use pyre_router::runtime_config::ServiceConfig;
//! use pyre_router::server::HttpServer;
//! use std::sync::Arc;
//!
//! let config = ServiceConfig::default();
//! let handle = HttpServer::start_with(Arc::new(Router::with_defaults()), &config).unwrap();
//! handle.wait_ready().unwrap();
//! handle.join().unwrap();
//! ```

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_query_params, split_path, Rejection};
pub use response::{header_line, status_reason, write_route_response};
pub use service::AppService;
