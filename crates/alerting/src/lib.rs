//! Alerting System
//!
//! Tenant configuration model, discovery of tenant config files and the
//! alert manager service that holds the loaded tenants.

mod discovery;
mod manager;
mod settings;

pub use discovery::{discover_config_files, DiscoveryError};
pub use manager::{AlertManager, Tenant};
pub use settings::{InputRoute, PluginSettings, SettingsError, Template, TenantSettings};
