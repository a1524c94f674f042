//! Postee Webhook Server - Main Entry Point

use alerting::AlertManager;
use anyhow::Context;
use clap::Parser;
use lifecycle::{init_logging, wait_for_signal, LoggingConfig};
use postee::{Cli, Coordinator, EnvOverrides, ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use webserver::WebServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env = EnvOverrides::from_env().context("Failed to read environment")?;
    let config = ServerConfig::resolve(cli, env).context("Invalid configuration")?;

    let _logging = init_logging(&LoggingConfig {
        debug: config.debug,
        ..Default::default()
    })
    .context("Failed to initialize logging")?;

    info!("=== Postee webhook server v{} ===", env!("CARGO_PKG_VERSION"));
    info!(url = %config.url, tls = %config.tls, "configuration loaded");

    let alert_manager = Arc::new(AlertManager::new());
    let web_server = Arc::new(WebServer::new());
    let coordinator = Coordinator::new(alert_manager, web_server);

    // Misconfiguration is reported but, like a normal shutdown, exits with 0.
    if let Err(e) = coordinator.run(&config, wait_for_signal()).await {
        error!(error = %e, "startup aborted");
    }

    Ok(())
}
