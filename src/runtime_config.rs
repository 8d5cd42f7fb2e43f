//! # Runtime Configuration Module
//!
//! Two layers of configuration:
//!
//! - [`RuntimeConfig`] tunes the `may` coroutine runtime from environment
//!   variables and must be applied before the server starts.
//! - [`ServiceConfig`] describes the service itself (listen address, default
//!   serializer, body limit) and is loaded from an optional YAML file. CLI
//!   flags override file values.
//!
//! ## Environment Variables
//!
//! ### `PYRE_STACK_SIZE`
//!
//! Coroutine stack size in bytes, decimal (`32768`) or hex (`0x8000`).
//! Default: `0x8000` (32 KB).
//!
//! ### `PYRE_WORKERS`
//!
//! Number of scheduler worker threads. Default: available parallelism.
//!
//! ## Config File
//!
//! ```yaml
//! addr: 0.0.0.0:8080
//! default_serializer: json   # json | text | yaml
//! http:
//!   max_body_bytes: 1048576
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use pyre_router::runtime_config::{RuntimeConfig, ServiceConfig};
//!
//! let runtime = RuntimeConfig::from_env();
//! assert!(runtime.stack_size > 0);
//!
//! let service: ServiceConfig = serde_yaml::from_str("addr: 0.0.0.0:9000").unwrap();
//! assert_eq!(service.addr, "0.0.0.0:9000");
//! assert_eq!(service.http.max_body_bytes, 1024 * 1024);
//! ```

use std::env;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::serializer::SerializerKind;

const DEFAULT_STACK_SIZE: usize = 0x8000;

/// Default listen address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";

/// Default request body limit (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Coroutine runtime settings loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 32 KB / 0x8000)
    pub stack_size: usize,
    /// Scheduler worker threads
    pub workers: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            workers: default_workers(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] with a custom variable source.
    /// Unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stack_size = lookup("PYRE_STACK_SIZE")
            .and_then(|val| parse_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let workers = lookup("PYRE_WORKERS")
            .and_then(|val| val.trim().parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or_else(default_workers);
        RuntimeConfig {
            stack_size,
            workers,
        }
    }

    /// Push the settings into the global `may` configuration.
    pub fn apply(&self) {
        may::config()
            .set_stack_size(self.stack_size)
            .set_workers(self.workers);
        info!(
            stack_size = self.stack_size,
            workers = self.workers,
            "Coroutine runtime configured"
        );
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// HTTP transport limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Bodies larger than this are rejected with 413
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Service settings, loaded from YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub addr: String,
    pub default_serializer: SerializerKind,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            default_serializer: SerializerKind::default(),
            http: HttpConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from a YAML file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not match the schema.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service config: {}", path.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse service config: {}", path.display()))?;
        info!(
            path = %path.display(),
            addr = %config.addr,
            default_serializer = ?config.default_serializer,
            max_body_bytes = config.http.max_body_bytes,
            "Service config loaded"
        );
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise.
    ///
    /// # Errors
    ///
    /// See [`ServiceConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Replace file values with every override that is set.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &ServiceOverrides) -> Self {
        if let Some(addr) = &overrides.addr {
            self.addr.clone_from(addr);
        }
        if let Some(kind) = overrides.default_serializer {
            self.default_serializer = kind;
        }
        if let Some(limit) = overrides.max_body_bytes {
            self.http.max_body_bytes = limit;
        }
        self
    }
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceOverrides {
    pub addr: Option<String>,
    pub default_serializer: Option<SerializerKind>,
    pub max_body_bytes: Option<usize>,
}
