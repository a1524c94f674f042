//! Service Lifecycle Core
//!
//! Shared plumbing for the long-running Postee services:
//! - `ServiceLifecycle` state machine (uninitialized, running, terminated)
//! - service traits the coordinator drives
//! - LIFO teardown stack
//! - one-shot OS signal gate
//! - tracing subscriber setup

pub mod logging;
mod service;
mod signal;
mod state;
mod teardown;

pub use logging::{init_logging, LoggingConfig, LoggingError, LoggingGuard};
pub use service::{AlertService, Service, WebService};
pub use signal::{wait_for_signal, ShutdownSignal};
pub use state::{RunGuard, ServiceLifecycle, ServiceState};
pub use teardown::TeardownStack;
