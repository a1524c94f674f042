//! Postee Webhook Server
//!
//! Process bootstrap for the multi-tenant alert dispatch service: resolves
//! configuration, discovers tenant files, runs the alert manager and the web
//! server, and shuts both down in order on SIGINT/SIGTERM.

pub mod config;
pub mod coordinator;

pub use self::config::{Cli, ConfigError, EnvOverrides, ServerConfig};
pub use coordinator::{Coordinator, CoordinatorError};
