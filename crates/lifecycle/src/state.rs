//! Service State Machine

use serde::Serialize;
use std::future::Future;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Lifecycle state of a long-running service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Constructed, `start` not called yet
    Uninitialized,
    /// `start` accepted, service task is running
    Running,
    /// `terminate` was requested
    Terminated,
}

/// Tracks one service's state and the completion of its running task.
///
/// The state only moves forward. Terminating a service that never started
/// skips straight to `Terminated`, and a later `begin` is refused.
pub struct ServiceLifecycle {
    name: &'static str,
    state: watch::Sender<ServiceState>,
    finished: watch::Sender<bool>,
}

impl ServiceLifecycle {
    /// Create a lifecycle in the `Uninitialized` state
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(ServiceState::Uninitialized);
        let (finished, _) = watch::channel(false);
        Self {
            name,
            state,
            finished,
        }
    }

    /// Service name used in log fields
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state
    pub fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    /// Watch state changes, e.g. for health reporting
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    /// Move `Uninitialized -> Running`.
    ///
    /// Returns a guard that marks the running task finished when dropped, or
    /// `None` if the service was already started or terminated.
    pub fn begin(&self) -> Option<RunGuard<'_>> {
        let mut started = false;
        self.state.send_if_modified(|state| {
            if *state == ServiceState::Uninitialized {
                *state = ServiceState::Running;
                started = true;
                true
            } else {
                false
            }
        });

        if started {
            info!(service = self.name, "service started");
            Some(RunGuard { lifecycle: self })
        } else {
            warn!(service = self.name, state = ?self.state(), "start ignored");
            None
        }
    }

    /// Resolve once `terminate` has been requested.
    ///
    /// The returned future owns its receiver, so it can be handed to a server
    /// as its graceful-shutdown trigger.
    pub fn terminated(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.state.subscribe();
        async move {
            // Errors only if the lifecycle is dropped, which also means stop.
            let _ = rx.wait_for(|state| *state == ServiceState::Terminated).await;
        }
    }

    /// Request termination and wait for a running task to finish.
    pub async fn terminate(&self) {
        let previous = self.state.send_replace(ServiceState::Terminated);
        match previous {
            ServiceState::Running => {
                info!(service = self.name, "terminating service");
                let mut rx = self.finished.subscribe();
                let _ = rx.wait_for(|finished| *finished).await;
                info!(service = self.name, "service terminated");
            }
            ServiceState::Uninitialized => {
                debug!(service = self.name, "terminated before start");
            }
            ServiceState::Terminated => {
                debug!(service = self.name, "already terminated");
            }
        }
    }

    /// Move to `Terminated` without waiting for the running task.
    ///
    /// Returns `false` if termination was already requested.
    pub fn request_terminate(&self) -> bool {
        let previous = self.state.send_replace(ServiceState::Terminated);
        if previous == ServiceState::Terminated {
            false
        } else {
            info!(service = self.name, state = ?previous, "termination requested");
            true
        }
    }

    fn finish(&self) {
        self.finished.send_replace(true);
        debug!(service = self.name, "service task finished");
    }
}

/// Held by a service's running task; marks the task finished on drop,
/// including when the task unwinds from a panic.
pub struct RunGuard<'a> {
    lifecycle: &'a ServiceLifecycle,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.lifecycle.finish();
    }
}
