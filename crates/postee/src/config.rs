//! Server Configuration
//!
//! Built once from command-line flags, `AQUAALERT_*` environment variables
//! and built-in defaults. A non-empty environment value replaces the flag.

use clap::Parser;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Default plaintext bind address
pub const DEFAULT_URL: &str = "0.0.0.0:8082";
/// Default TLS bind address
pub const DEFAULT_TLS: &str = "0.0.0.0:8445";
/// Default configuration folder flag value
pub const DEFAULT_CFG_FOLDER: &str = "/config/";

const ENV_PREFIX: &str = "AQUAALERT";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Source(#[from] config::ConfigError),
    #[error("AQUAALERT_SHUTDOWN_TIMEOUT must be a number of seconds, got {0:?}")]
    InvalidShutdownTimeout(String),
}

/// Command-line flags
#[derive(Debug, Clone, Parser)]
#[command(
    name = "webhooksrv",
    version,
    about = "Aqua Container Security Webhook server"
)]
pub struct Cli {
    /// The socket to bind to, specified using host:port.
    #[arg(long, default_value = DEFAULT_URL)]
    pub url: String,

    /// The TLS socket to bind to, specified using host:port.
    #[arg(long, default_value = DEFAULT_TLS)]
    pub tls: String,

    /// The folder which contains alert configuration files.
    #[arg(long = "cfgFolder", default_value = DEFAULT_CFG_FOLDER)]
    pub cfg_folder: String,

    /// Give up on a service that takes longer than this to terminate.
    #[arg(long = "shutdown-timeout", value_name = "SECS")]
    pub shutdown_timeout: Option<u64>,
}

/// `AQUAALERT_*` environment overrides; empty values count as unset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    pub url: Option<String>,
    pub tls: Option<String>,
    pub cfg_folder: Option<String>,
    pub shutdown_timeout: Option<String>,
    pub debug: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Read overrides from an explicit variable map
    pub fn from_map(vars: config::Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<config::Map<String, String>>) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .ignore_empty(true)
                    .source(vars),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Resolved configuration passed to the coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Plaintext bind address
    pub url: String,
    /// TLS bind address
    pub tls: String,
    /// Tenant configuration folder; only the environment can set it
    pub cfg_folder: Option<String>,
    /// Per-service terminate bound, `None` waits indefinitely
    pub shutdown_timeout: Option<Duration>,
    /// Debug logging
    pub debug: bool,
}

impl ServerConfig {
    /// Apply environment overrides on top of the parsed flags.
    ///
    /// The `--cfgFolder` flag is replaced by `AQUAALERT_CFG_FOLDER`
    /// unconditionally, so an unset variable leaves the folder absent.
    pub fn resolve(cli: Cli, env: EnvOverrides) -> Result<Self, ConfigError> {
        let url = non_empty(env.url).unwrap_or(cli.url);
        let tls = non_empty(env.tls).unwrap_or(cli.tls);

        let shutdown_timeout = match non_empty(env.shutdown_timeout) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidShutdownTimeout(raw.clone()))?,
            ),
            None => cli.shutdown_timeout,
        }
        .map(Duration::from_secs);

        Ok(Self {
            url,
            tls,
            cfg_folder: non_empty(env.cfg_folder),
            shutdown_timeout,
            debug: non_empty(env.debug).is_some(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
