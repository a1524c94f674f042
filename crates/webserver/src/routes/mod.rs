//! HTTP Routes

pub mod health;
