//! Postee UI Backend
//!
//! Single administrative server configured from `POSTEE_UI_*` variables.

pub mod config;
mod server;

pub use self::config::{UiConfig, UiConfigError, UiEnv};
pub use server::{create_router, ApiError, StatusResponse, UiServer, UiServerError, UiState};
