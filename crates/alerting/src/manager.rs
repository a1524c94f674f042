//! Alert Manager Service

use crate::settings::TenantSettings;
use async_trait::async_trait;
use lifecycle::{AlertService, Service, ServiceLifecycle, ServiceState};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};

/// Tenant settings together with the file they were loaded from
#[derive(Debug, Clone)]
pub struct Tenant {
    pub source: PathBuf,
    pub settings: Arc<TenantSettings>,
}

/// Owns the loaded tenants for the routing engine.
///
/// One instance per process; the binary constructs it and hands an `Arc` to
/// the coordinator, which is the only caller of `start` and `terminate`.
pub struct AlertManager {
    lifecycle: ServiceLifecycle,
    tenants: RwLock<Vec<Tenant>>,
}

impl AlertManager {
    /// Create an alert manager in the uninitialized state
    pub fn new() -> Self {
        Self {
            lifecycle: ServiceLifecycle::new("alertmgr"),
            tenants: RwLock::new(Vec::new()),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        self.lifecycle.state()
    }

    /// Snapshot of the loaded tenants
    pub fn tenants(&self) -> Vec<Tenant> {
        self.tenants.read().map(|t| t.clone()).unwrap_or_default()
    }

    /// Number of loaded tenants
    pub fn tenant_count(&self) -> usize {
        self.tenants.read().map(|t| t.len()).unwrap_or(0)
    }

    fn load_tenants(files: &[PathBuf]) -> Vec<Tenant> {
        files
            .iter()
            .filter_map(|path| match TenantSettings::from_file(path) {
                Ok(settings) => {
                    info!(
                        file = %path.display(),
                        aqua_server = %settings.aqua_server,
                        outputs = settings.outputs.len(),
                        routes = settings.input_routes.len(),
                        "tenant loaded"
                    );
                    Some(Tenant {
                        source: path.clone(),
                        settings: Arc::new(settings),
                    })
                }
                Err(e) => {
                    error!(file = %path.display(), error = %e, "skipping tenant config");
                    None
                }
            })
            .collect()
    }

    fn replace_tenants(&self, tenants: Vec<Tenant>) {
        match self.tenants.write() {
            Ok(mut guard) => *guard = tenants,
            Err(e) => warn!("tenant list lock poisoned: {}", e),
        }
    }

    /// Path of every loaded tenant, in load order
    pub fn sources(&self) -> Vec<PathBuf> {
        self.tenants().into_iter().map(|t| t.source).collect()
    }

    /// Tenant loaded from `path`, if any
    pub fn tenant(&self, path: &Path) -> Option<Arc<TenantSettings>> {
        self.tenants
            .read()
            .ok()?
            .iter()
            .find(|t| t.source == path)
            .map(|t| t.settings.clone())
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Service for AlertManager {
    fn name(&self) -> &'static str {
        self.lifecycle.name()
    }

    async fn terminate(&self) {
        self.lifecycle.terminate().await;
    }

    fn request_terminate(&self) {
        self.lifecycle.request_terminate();
    }
}

#[async_trait]
impl AlertService for AlertManager {
    async fn start(&self, files: Vec<PathBuf>) {
        let Some(_running) = self.lifecycle.begin() else {
            return;
        };

        let tenants = Self::load_tenants(&files);
        info!(
            files = files.len(),
            tenants = tenants.len(),
            "alert manager ready"
        );
        self.replace_tenants(tenants);

        self.lifecycle.terminated().await;

        self.replace_tenants(Vec::new());
        info!("alert manager stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_tenant(dir: &Path, name: &str, server: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(
            &path,
            format!(r#"{{"AquaServer":"{server}","outputs":[],"routes":[],"templates":[]}}"#),
        )
        .unwrap();
        path
    }

    async fn wait_for_tenants(manager: &AlertManager, count: usize) {
        while manager.tenant_count() != count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_loads_tenants_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_tenant(dir.path(), "a.json", "https://a.example.com");
        let bad = dir.path().join("b.json");
        fs::write(&bad, "not json").unwrap();

        let manager = Arc::new(AlertManager::new());
        let task_manager = manager.clone();
        let task = tokio::spawn(async move {
            task_manager.start(vec![good, bad]).await;
        });

        wait_for_tenants(&manager, 1).await;
        assert_eq!(manager.state(), ServiceState::Running);
        assert_eq!(
            manager.tenants()[0].settings.aqua_server,
            "https://a.example.com"
        );
        assert!(manager.tenant(&dir.path().join("a.json")).is_some());

        manager.terminate().await;
        task.await.unwrap();

        assert_eq!(manager.state(), ServiceState::Terminated);
        assert_eq!(manager.tenant_count(), 0);
    }

    #[tokio::test]
    async fn test_start_after_terminate_returns() {
        let manager = AlertManager::new();
        manager.terminate().await;

        // Must not park forever
        manager.start(Vec::new()).await;
        assert_eq!(manager.state(), ServiceState::Terminated);
        assert!(manager.sources().is_empty());
    }

    #[tokio::test]
    async fn test_second_start_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tenant(dir.path(), "a.json", "a");

        let manager = Arc::new(AlertManager::new());
        let task_manager = manager.clone();
        let first = tokio::spawn(async move {
            task_manager.start(vec![path]).await;
        });
        wait_for_tenants(&manager, 1).await;

        // Returns immediately without touching the loaded tenants
        manager.start(Vec::new()).await;
        assert_eq!(manager.tenant_count(), 1);

        manager.terminate().await;
        first.await.unwrap();
    }
}
