//! UI Server Configuration
//!
//! Everything comes from `POSTEE_UI_*` environment variables. Only the
//! configuration file path is required; the rest fall back to defaults with a
//! warning.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

pub const ENV_FILELOG: &str = "POSTEE_UI_LOGFILE";
pub const ENV_CFG: &str = "POSTEE_UI_CFG";
pub const ENV_WEB: &str = "POSTEE_UI_WEB";
pub const ENV_UPDATE_URL: &str = "POSTEE_UI_UPDATE_URL";
pub const ENV_UPDATE_KEY: &str = "POSTEE_UI_KEY";
pub const ENV_PORT: &str = "POSTEE_UI_PORT";

/// Web assets directory used when `POSTEE_UI_WEB` is empty
pub const DEFAULT_WEB_PATH: &str = "/uiserver/www";
/// Port used when `POSTEE_UI_PORT` is empty
pub const DEFAULT_PORT: u16 = 8090;

const ENV_PREFIX: &str = "POSTEE_UI";

/// UI configuration errors
#[derive(Debug, Error)]
pub enum UiConfigError {
    #[error("failed to read environment: {0}")]
    Source(#[from] config::ConfigError),
    #[error("cfg file name is empty. You have to set a filename via \"POSTEE_UI_CFG\" environment variable.")]
    MissingConfigFile,
    #[error("invalid port {0:?} in \"POSTEE_UI_PORT\"")]
    InvalidPort(String),
}

/// Raw `POSTEE_UI_*` variables; empty values count as unset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiEnv {
    pub logfile: Option<String>,
    pub cfg: Option<String>,
    pub web: Option<String>,
    pub update_url: Option<String>,
    pub key: Option<String>,
    pub port: Option<String>,
}

impl UiEnv {
    /// Read the process environment
    pub fn from_env() -> Result<Self, UiConfigError> {
        Self::load(None)
    }

    /// Read an explicit variable map
    pub fn from_map(vars: config::Map<String, String>) -> Result<Self, UiConfigError> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<config::Map<String, String>>) -> Result<Self, UiConfigError> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .ignore_empty(true)
                    .source(vars),
            )
            .build()?;

        let env: UiEnv = settings.try_deserialize()?;
        Ok(env.without_empty())
    }

    /// Log file path, if one is configured
    pub fn log_file(&self) -> Option<PathBuf> {
        self.logfile.as_ref().map(PathBuf::from)
    }

    fn without_empty(self) -> Self {
        let non_empty = |v: Option<String>| v.filter(|v| !v.is_empty());
        Self {
            logfile: non_empty(self.logfile),
            cfg: non_empty(self.cfg),
            web: non_empty(self.web),
            update_url: non_empty(self.update_url),
            key: non_empty(self.key),
            port: non_empty(self.port),
        }
    }
}

/// Resolved UI server parameters
#[derive(Debug, Clone, PartialEq)]
pub struct UiConfig {
    /// Postee configuration file edited through the UI
    pub cfg_path: PathBuf,
    /// Static web assets
    pub web_path: PathBuf,
    /// Listen port
    pub port: u16,
    /// Endpoint asked to restart Postee after a config change
    pub update_url: Option<String>,
    /// Key presented to the update endpoint
    pub update_key: Option<String>,
}

impl UiConfig {
    /// Apply defaults, logging a warning for each optional value left unset
    pub fn resolve(env: UiEnv) -> Result<Self, UiConfigError> {
        let env = env.without_empty();

        let cfg_path = env
            .cfg
            .map(PathBuf::from)
            .ok_or(UiConfigError::MissingConfigFile)?;

        let web_path = match env.web {
            Some(web) => PathBuf::from(web),
            None => {
                warn!("The default path to web ({:?}) is using now.", DEFAULT_WEB_PATH);
                PathBuf::from(DEFAULT_WEB_PATH)
            }
        };

        if env.update_url.is_none() {
            warn!(
                "WARNING! Using an empty update url, UI won't restart your Postee instance with a saved configuration. You can change it via {:?} environment variable.",
                ENV_UPDATE_URL
            );
        }
        if env.key.is_none() {
            warn!(
                "WARNING! Using an empty update key. You can change it via {:?} environment variable.",
                ENV_UPDATE_KEY
            );
        }

        let port = match env.port {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| UiConfigError::InvalidPort(raw.clone()))?,
            None => {
                warn!(
                    "WARNING! Using a default port: {}. You can change it via {:?} environment variable.",
                    DEFAULT_PORT, ENV_PORT
                );
                DEFAULT_PORT
            }
        };

        Ok(Self {
            cfg_path,
            web_path,
            port,
            update_url: env.update_url,
            update_key: env.key,
        })
    }

    /// Whether saving a configuration can trigger a remote restart; needs
    /// both the update URL and its key
    pub fn remote_restart_enabled(&self) -> bool {
        self.update_url.is_some() && self.update_key.is_some()
    }

    /// Listen address
    pub fn bind(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
