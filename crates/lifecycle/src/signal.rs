//! Signal-Driven Shutdown Gate

use std::fmt;
use tracing::info;

/// OS signal that ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "interrupt"),
            ShutdownSignal::Terminate => write!(f, "terminated"),
        }
    }
}

/// Block until SIGINT or SIGTERM arrives, log it and return which one.
#[cfg(unix)]
pub async fn wait_for_signal() -> ShutdownSignal {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint =
        signal(SignalKind::interrupt()).expect("Failed to install SIGINT signal handler");
    let mut sigterm =
        signal(SignalKind::terminate()).expect("Failed to install SIGTERM signal handler");

    let received = tokio::select! {
        _ = sigint.recv() => ShutdownSignal::Interrupt,
        _ = sigterm.recv() => ShutdownSignal::Terminate,
    };

    info!(signal = %received, "shutdown signal received");
    received
}

/// Block until Ctrl-C arrives (non-unix platforms only know SIGINT).
#[cfg(not(unix))]
pub async fn wait_for_signal() -> ShutdownSignal {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");

    let received = ShutdownSignal::Interrupt;
    info!(signal = %received, "shutdown signal received");
    received
}
