use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use tracing::info;

use crate::demo;
use crate::logging::{init_logging, LogConfig};
use crate::request::{Inbound, RouteResponse};
use crate::router::Router;
use crate::runtime_config::{RuntimeConfig, ServiceConfig, ServiceOverrides};
use crate::serializer::SerializerKind;
use crate::server::{parse_query_params, split_path, status_reason, HttpServer};

/// Command-line interface for pyre-router
#[derive(Parser, Debug)]
#[command(name = "pyre-router")]
#[command(about = "Exact-match router with typed dependency injection", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the echo service over HTTP
    Serve {
        /// Address and port to bind (overrides the config file)
        #[arg(long)]
        addr: Option<String>,

        /// YAML service config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Default serializer (overrides the config file)
        #[arg(long, value_enum)]
        serializer: Option<SerializerKind>,

        /// Maximum request body size in bytes (overrides the config file)
        #[arg(long)]
        max_body_bytes: Option<usize>,
    },
    /// List registered routes
    Routes,
    /// Check that every handler parameter has a resolver
    Check,
    /// Run one request through the router without a network and print the response
    Dispatch {
        /// HTTP method, e.g. GET
        method: String,

        /// Request path, optionally with a query string
        path: String,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,

        /// Extra header as `name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Default serializer
        #[arg(long, value_enum)]
        serializer: Option<SerializerKind>,
    },
}

/// Parse arguments, set up logging and run the selected command.
///
/// # Errors
///
/// Returns an error if the command fails; see [`run`].
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    // keep offline output readable unless a level was asked for
    if !matches!(cli.command, Commands::Serve { .. }) && std::env::var("PYRE_LOG_LEVEL").is_err() {
        log_config.log_level = "warn".to_string();
    }
    let _guard = init_logging(&log_config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

/// Run a parsed command, writing human-readable output to `out`.
///
/// # Errors
///
/// - the config file cannot be loaded
/// - the route table fails validation
/// - the server cannot bind
/// - the dispatch arguments are malformed
pub fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve {
            addr,
            config,
            serializer,
            max_body_bytes,
        } => {
            let config = ServiceConfig::load_or_default(config.as_deref())?.with_overrides(
                &ServiceOverrides {
                    addr,
                    default_serializer: serializer,
                    max_body_bytes,
                },
            );
            serve(&config, out)
        }
        Commands::Routes => print_routes(&demo::router(), out),
        Commands::Check => {
            let router = demo::router();
            router.validate()?;
            writeln!(out, "ok: {} routes, all parameters resolvable", router.len())?;
            Ok(())
        }
        Commands::Dispatch {
            method,
            path,
            body,
            headers,
            serializer,
        } => {
            let router = demo::router_with(serializer.unwrap_or_default().build());
            let inbound = build_inbound(&method, &path, body, &headers)?;
            let response = router.handle_inbound(inbound);
            print_response(&response, out)
        }
    }
}

fn serve(config: &ServiceConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    RuntimeConfig::from_env().apply();

    let router = demo::router_with(config.default_serializer.build());
    router.validate()?;

    let handle = HttpServer::start_with(Arc::new(router), config)
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    writeln!(out, "listening on http://{}", handle.addr())?;
    out.flush()?;

    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: crate::server::ServerHandle) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal = signal, "Shutdown signal received");
    }
    handle.shutdown();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: crate::server::ServerHandle) -> anyhow::Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))
}

fn print_routes(router: &Router, out: &mut dyn Write) -> anyhow::Result<()> {
    for (method, path, handler) in router.routes() {
        let params: Vec<String> = handler
            .params()
            .iter()
            .map(|p| format!("{}: {}", p.name(), p.ty().name()))
            .collect();
        writeln!(
            out,
            "{:<7} {:<12} {}({})",
            method.as_str(),
            path,
            handler.name(),
            params.join(", ")
        )?;
    }
    Ok(())
}

/// Build router input from `dispatch` arguments.
///
/// # Errors
///
/// Fails on an invalid method or a header without `:`.
pub fn build_inbound(
    method: &str,
    target: &str,
    body: Option<String>,
    headers: &[String],
) -> anyhow::Result<Inbound> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{method}'"))?;
    let (path, query) = split_path(target);

    let mut inbound = Inbound::new(method, path, body.unwrap_or_default().into_bytes());
    inbound.query_params = query.map(parse_query_params).unwrap_or_default();
    for raw in headers {
        let (name, value) = raw
            .split_once(':')
            .with_context(|| format!("Header '{raw}' is not `name: value`"))?;
        inbound = inbound.with_header(name.trim(), value.trim());
    }
    Ok(inbound)
}

fn print_response(response: &RouteResponse, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(
        out,
        "HTTP/1.1 {} {}",
        response.status,
        status_reason(response.status)
    )?;
    let mut headers: Vec<_> = response.headers.iter().collect();
    headers.sort();
    for (name, value) in headers {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;
    if let Some(body) = &response.body {
        out.write_all(body)?;
        writeln!(out)?;
    }
    Ok(())
}
