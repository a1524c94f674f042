//! Service Traits
//!
//! The coordinator only ever talks to services through these traits, which
//! keeps the real services swappable for recording doubles in tests.

use async_trait::async_trait;
use std::path::PathBuf;

/// A long-running service that can be terminated
#[async_trait]
pub trait Service: Send + Sync {
    /// Name used in log fields
    fn name(&self) -> &'static str;

    /// Stop the service and wait until its running task has finished
    async fn terminate(&self);

    /// Ask the service to stop without waiting for it.
    ///
    /// Used where awaiting is impossible, such as a teardown stack dropped
    /// before it was unwound.
    fn request_terminate(&self) {}
}

/// The alert-routing manager
#[async_trait]
pub trait AlertService: Service {
    /// Load tenant configuration files and run until terminated
    async fn start(&self, files: Vec<PathBuf>);
}

/// The HTTP/TLS front end
#[async_trait]
pub trait WebService: Service {
    /// Serve on the plaintext and TLS addresses until terminated
    async fn start(&self, url: String, tls: String);
}
