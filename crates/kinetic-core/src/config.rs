//! Tuning constants for a [`NetworkIndex`](crate::index::NetworkIndex).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fixed::Fixed64;
use crate::node::{NodeType, StressProfile};

/// Engine-wide tuning. Loaded from data files by `kinetic-data`, or built
/// in code starting from [`KineticConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticConfig {
    /// Fraction of speed kept across each connection during propagation.
    pub efficiency: Fixed64,
    /// Fraction of network speed lost per tick while overstressed.
    pub decay_rate: Fixed64,
    /// Speeds below this magnitude snap to zero while decaying.
    pub stall_threshold: Fixed64,
    /// Item speed per RPM for the logistics layer.
    pub item_speed_per_rpm: Fixed64,
    /// Per-type replacements for [`NodeType::default_profile`].
    #[serde(default)]
    pub stress_overrides: BTreeMap<NodeType, StressProfile>,
}

impl Default for KineticConfig {
    fn default() -> Self {
        Self {
            efficiency: Fixed64::from_num(0.98),
            decay_rate: Fixed64::from_num(0.1),
            stall_threshold: Fixed64::from_num(0.1),
            item_speed_per_rpm: Fixed64::ONE / 32,
            stress_overrides: BTreeMap::new(),
        }
    }
}

impl KineticConfig {
    /// The stress profile new nodes of `kind` are built with.
    pub fn profile_for(&self, kind: NodeType) -> StressProfile {
        self.stress_overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_profile())
    }

    /// Replace the stress profile for one node type.
    pub fn with_override(mut self, kind: NodeType, profile: StressProfile) -> Self {
        self.stress_overrides
            .insert(kind, StressProfile::new(profile.impact, profile.capacity));
        self
    }
}
