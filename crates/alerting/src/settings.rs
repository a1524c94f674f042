//! Tenant Settings Model
//!
//! One `TenantSettings` per tenant configuration file. Only the fields the
//! routing engine keys on are typed; everything else in an output, route or
//! template object is preserved in `extra` and handed over untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading tenant settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read tenant config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid tenant config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Alerting configuration of one tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Upstream server the tenant's alerts originate from
    #[serde(rename = "AquaServer", default)]
    pub aqua_server: String,

    /// Dedup store capacity
    #[serde(rename = "Max_DB_Size", default)]
    pub db_max_size: i64,

    /// Dedup store retention
    #[serde(rename = "Delete_Old_Data", default)]
    pub db_remove_old_data: i64,

    /// Dedup store verification interval
    #[serde(rename = "DbVerifyInterval", default)]
    pub db_test_interval: i64,

    /// Outputs in dispatch order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub outputs: Vec<PluginSettings>,

    /// Routing rules
    #[serde(rename = "routes", default, deserialize_with = "null_as_empty")]
    pub input_routes: Vec<InputRoute>,

    /// Named rendering templates
    #[serde(default, deserialize_with = "null_as_empty")]
    pub templates: Vec<Template>,
}

/// One plugin output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub output_type: String,
    #[serde(default)]
    pub enable: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One routing rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRoute {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub input: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub template: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named rendering template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(rename = "rego-package", default, skip_serializing_if = "String::is_empty")]
    pub rego_package: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(
        rename = "legacy-scan-renderer",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub legacy_scan_renderer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TenantSettings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse one tenant configuration file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Find an output by name
    pub fn output(&self, name: &str) -> Option<&PluginSettings> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Enabled outputs, in dispatch order
    pub fn enabled_outputs(&self) -> impl Iterator<Item = &PluginSettings> {
        self.outputs.iter().filter(|o| o.enable)
    }

    /// Find a template by name
    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }
}

// `null` and a missing key both mean "no entries".
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
