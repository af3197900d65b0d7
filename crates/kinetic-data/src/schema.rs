//! Serde data file structs for kinetic engine configuration.
//!
//! These structs define the on-disk format of `kinetic.{ron,toml,json}`.
//! Values are plain `f64` and node types are referenced by their
//! `snake_case` name; [`crate::config`] validates and resolves them into a
//! [`KineticConfig`](kinetic_core::config::KineticConfig).

use serde::Deserialize;

// ===========================================================================
// Engine tuning
// ===========================================================================

/// Top-level kinetic data file. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct KineticData {
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold: f64,
    #[serde(default = "default_item_speed_per_rpm")]
    pub item_speed_per_rpm: f64,
    #[serde(default)]
    pub stress: Vec<StressData>,
}

impl Default for KineticData {
    fn default() -> Self {
        Self {
            efficiency: default_efficiency(),
            decay_rate: default_decay_rate(),
            stall_threshold: default_stall_threshold(),
            item_speed_per_rpm: default_item_speed_per_rpm(),
            stress: Vec::new(),
        }
    }
}

fn default_efficiency() -> f64 {
    0.98
}

fn default_decay_rate() -> f64 {
    0.1
}

fn default_stall_threshold() -> f64 {
    0.1
}

fn default_item_speed_per_rpm() -> f64 {
    1.0 / 32.0
}

// ===========================================================================
// Stress table
// ===========================================================================

/// Replacement stress profile for one node type. Omitted values are 0.
#[derive(Debug, Clone, Deserialize)]
pub struct StressData {
    /// Node type name, e.g. `"water_wheel"`.
    pub node: String,
    #[serde(default)]
    pub impact: f64,
    #[serde(default)]
    pub capacity: f64,
}
