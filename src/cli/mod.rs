//! # CLI Module
//!
//! Command-line front end for the echo service in [`crate::demo`].
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! pyre-router serve --addr 0.0.0.0:8080 --config service.yaml --serializer json
//! ```
//!
//! Flags override values from the YAML file. Runtime tuning comes from
//! `PYRE_STACK_SIZE` and `PYRE_WORKERS`; SIGINT or SIGTERM stops the server.
//!
//! ### `routes`
//!
//! Print every route with its handler manifest.
//!
//! ### `check`
//!
//! Run the startup validation and fail if any handler parameter has no
//! resolver.
//!
//! ### `dispatch`
//!
//! Run one request through the router in-process:
//!
//! ```bash
//! pyre-router dispatch POST /body --body '{"a":1,"b":"x","c":{}}'
//! HTTP/1.1 200 OK
//! content-type: application/json
//!
//! {"body": {"a": 1, "b": "x", "c": {}}}
//! ```
//!
//! ## Usage from Code
//!
//! ```rust
//! use clap::Parser;
//! use pyre_router::cli::{run, Cli};
//!
//! let cli = Cli::try_parse_from(["pyre-router", "dispatch", "GET", "/"]).unwrap();
//! let mut out = Vec::new();
//! run(cli, &mut out).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("HTTP/1.1 200 OK"));
//! ```

mod commands;


pub use commands::{build_inbound, run, run_cli, Cli, Commands};
