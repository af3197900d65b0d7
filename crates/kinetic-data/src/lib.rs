//! Data-file configuration for the kinetic engine.
//!
//! Reads `kinetic.ron`, `kinetic.toml` or `kinetic.json` (exactly one) and
//! resolves it into a [`KineticConfig`](kinetic_core::config::KineticConfig).

pub mod config;
pub mod loader;
pub mod schema;

pub use config::{load_config, load_config_file};
pub use loader::DataLoadError;
