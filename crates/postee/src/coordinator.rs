//! Service Lifecycle Coordinator
//!
//! Starts the alert manager and the web server as independent tasks, parks
//! on the shutdown trigger, then terminates them in reverse start order.

use crate::config::ServerConfig;
use alerting::{discover_config_files, DiscoveryError};
use lifecycle::{AlertService, ShutdownSignal, TeardownStack, WebService};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Fatal startup errors; no service has been started when one is returned
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("AQUAALERT_CFG_FOLDER environment variable is empty")]
    MissingConfigFolder,
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// Owns the startup and ordered teardown of both services
pub struct Coordinator<A, W> {
    alert_manager: Arc<A>,
    web_server: Arc<W>,
}

impl<A, W> Coordinator<A, W>
where
    A: AlertService + 'static,
    W: WebService + 'static,
{
    pub fn new(alert_manager: Arc<A>, web_server: Arc<W>) -> Self {
        Self {
            alert_manager,
            web_server,
        }
    }

    /// Run both services until `shutdown` resolves.
    ///
    /// Returns the signal that ended the run. Services are terminated web
    /// server first, then alert manager, each exactly once.
    ///
    /// If this future is dropped or panics after the services were started,
    /// both are still asked to terminate in the same order, but nothing waits
    /// for them to finish.
    pub async fn run<F>(
        &self,
        config: &ServerConfig,
        shutdown: F,
    ) -> Result<ShutdownSignal, CoordinatorError>
    where
        F: Future<Output = ShutdownSignal>,
    {
        let folder = config
            .cfg_folder
            .as_deref()
            .filter(|folder| !folder.is_empty())
            .ok_or(CoordinatorError::MissingConfigFolder)?;
        let files = discover_config_files(folder)?;

        info!(folder, files = files.len(), "starting services");

        let mut teardown = TeardownStack::new().with_timeout(config.shutdown_timeout);

        let alert_manager = self.alert_manager.clone();
        tokio::spawn(async move { alert_manager.start(files).await });
        teardown.push(self.alert_manager.clone());

        let web_server = self.web_server.clone();
        let (url, tls) = (config.url.clone(), config.tls.clone());
        tokio::spawn(async move { web_server.start(url, tls).await });
        teardown.push(self.web_server.clone());

        let signal = shutdown.await;
        info!(signal = %signal, "shutting down");

        teardown.unwind().await;
        info!("shutdown complete");

        Ok(signal)
    }
}
