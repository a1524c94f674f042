//! Ordered Teardown

use crate::Service;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// LIFO list of started services.
///
/// Each service is pushed right after it is started; `unwind` terminates them
/// last-started-first, each exactly once. A stack dropped before `unwind`
/// (cancelled or panicking caller) still requests termination of what it
/// holds in the same order, but cannot wait for the services to finish.
pub struct TeardownStack {
    services: Vec<Arc<dyn Service>>,
    timeout: Option<Duration>,
}

impl TeardownStack {
    /// Create an empty stack that waits indefinitely on each service
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            timeout: None,
        }
    }

    /// Bound how long a single `terminate` may take before it is abandoned
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a started service
    pub fn push(&mut self, service: Arc<dyn Service>) {
        self.services.push(service);
    }

    /// Number of services still to be terminated
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Terminate every registered service in reverse registration order
    pub async fn unwind(mut self) {
        info!(services = self.services.len(), "unwinding services");

        while let Some(service) = self.services.pop() {
            let name = service.name();
            match self.timeout {
                Some(timeout) => {
                    if tokio::time::timeout(timeout, service.terminate()).await.is_err() {
                        warn!(
                            service = name,
                            timeout_secs = timeout.as_secs(),
                            "service did not terminate in time, abandoning it"
                        );
                    }
                }
                None => service.terminate().await,
            }
        }
    }
}

impl Default for TeardownStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TeardownStack {
    fn drop(&mut self) {
        if self.services.is_empty() {
            return;
        }

        warn!(
            pending = self.services.len(),
            "teardown stack dropped without unwinding, requesting termination"
        );
        while let Some(service) = self.services.pop() {
            service.request_terminate();
        }
    }
}
