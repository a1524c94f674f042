//! Postee UI Backend - Main Entry Point

use anyhow::Context;
use lifecycle::{init_logging, LoggingConfig};
use tracing::{error, info};
use uiserver::{UiConfig, UiEnv, UiServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = UiEnv::from_env().context("Failed to read environment")?;

    let _logging = init_logging(&LoggingConfig {
        file: env.log_file(),
        ..Default::default()
    })
    .context("Failed to initialize logging")?;

    let config = match UiConfig::resolve(env) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    info!("=== Postee UI v{} ===", env!("CARGO_PKG_VERSION"));

    let server = UiServer::new(config);
    let result = server.start().await;
    server.stop().await;

    result.context("UI server failed")
}
