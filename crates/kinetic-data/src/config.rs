//! Resolution of kinetic data files into a [`KineticConfig`].
//!
//! Values are range-checked here so the engine never sees an efficiency
//! above 1, a decay rate that would reverse a network, or a negative stress
//! value.

use std::collections::BTreeMap;
use std::path::Path;

use kinetic_core::config::KineticConfig;
use kinetic_core::fixed::{Fixed64, f64_to_fixed64};
use kinetic_core::node::{NodeType, StressProfile};
use tracing::debug;

use crate::loader::{DataLoadError, deserialize_file, find_data_file};
use crate::schema::KineticData;

/// Base name of the configuration file, without extension.
pub const CONFIG_BASE_NAME: &str = "kinetic";

// ===========================================================================
// Loading
// ===========================================================================

/// Load `kinetic.{ron,toml,json}` from `dir`.
///
/// A directory without a kinetic file yields the default configuration.
pub fn load_config(dir: &Path) -> Result<KineticConfig, DataLoadError> {
    match find_data_file(dir, CONFIG_BASE_NAME)? {
        Some(path) => load_config_file(&path),
        None => {
            debug!(dir = %dir.display(), "no kinetic data file, using defaults");
            Ok(KineticConfig::default())
        }
    }
}

/// Load and resolve a single kinetic data file.
pub fn load_config_file(path: &Path) -> Result<KineticConfig, DataLoadError> {
    let data: KineticData = deserialize_file(path)?;
    let config = resolve_config(&data, path)?;
    debug!(
        file = %path.display(),
        overrides = config.stress_overrides.len(),
        "loaded kinetic config"
    );
    Ok(config)
}

// ===========================================================================
// Resolution
// ===========================================================================

/// Validate `data` and convert it into engine types. `file` is only used
/// for error messages.
pub fn resolve_config(data: &KineticData, file: &Path) -> Result<KineticConfig, DataLoadError> {
    let out_of_range = |field: &str, value: f64, expected: &'static str| {
        DataLoadError::OutOfRange {
            file: file.to_path_buf(),
            field: field.to_string(),
            value,
            expected,
        }
    };

    if !(data.efficiency > 0.0 && data.efficiency <= 1.0) {
        return Err(out_of_range("efficiency", data.efficiency, "0 < x <= 1"));
    }
    if !(0.0..1.0).contains(&data.decay_rate) {
        return Err(out_of_range("decay_rate", data.decay_rate, "0 <= x < 1"));
    }
    let stall_threshold = check_non_negative(data.stall_threshold)
        .ok_or_else(|| out_of_range("stall_threshold", data.stall_threshold, "x >= 0"))?;
    let item_speed_per_rpm = check_non_negative(data.item_speed_per_rpm)
        .ok_or_else(|| out_of_range("item_speed_per_rpm", data.item_speed_per_rpm, "x >= 0"))?;

    let mut stress_overrides = BTreeMap::new();
    for entry in &data.stress {
        let kind = NodeType::from_name(&entry.node).ok_or_else(|| DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: entry.node.clone(),
            expected_kind: "node type",
        })?;
        let impact = check_non_negative(entry.impact).ok_or_else(|| {
            out_of_range(&format!("stress.{}.impact", entry.node), entry.impact, "x >= 0")
        })?;
        let capacity = check_non_negative(entry.capacity).ok_or_else(|| {
            out_of_range(&format!("stress.{}.capacity", entry.node), entry.capacity, "x >= 0")
        })?;
        if stress_overrides
            .insert(kind, StressProfile::new(impact, capacity))
            .is_some()
        {
            return Err(DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name: entry.node.clone(),
            });
        }
    }

    Ok(KineticConfig {
        efficiency: f64_to_fixed64(data.efficiency),
        decay_rate: f64_to_fixed64(data.decay_rate),
        stall_threshold,
        item_speed_per_rpm,
        stress_overrides,
    })
}

/// `value` as fixed point, if it is finite, non-negative and representable.
fn check_non_negative(value: f64) -> Option<Fixed64> {
    if value.is_finite() && value >= 0.0 {
        Fixed64::checked_from_num(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StressData;
    use kinetic_core::test_utils::fixed;
    use std::fs;
    use std::path::PathBuf;

    fn file() -> PathBuf {
        PathBuf::from("kinetic.ron")
    }

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "kinetic_config_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn defaults_resolve_to_engine_defaults() {
        let config = resolve_config(&KineticData::default(), &file()).unwrap();
        assert_eq!(config, KineticConfig::default());
    }

    #[test]
    fn stress_entries_become_overrides() {
        let data = KineticData {
            stress: vec![
                StressData { node: "shaft".into(), impact: 2.0, capacity: 0.0 },
                StressData { node: "hand_crank".into(), impact: 0.0, capacity: 64.0 },
            ],
            ..KineticData::default()
        };
        let config = resolve_config(&data, &file()).unwrap();
        assert_eq!(config.profile_for(NodeType::Shaft).impact, fixed(2.0));
        assert_eq!(config.profile_for(NodeType::HandCrank).capacity, fixed(64.0));
        assert_eq!(
            config.profile_for(NodeType::WaterWheel),
            NodeType::WaterWheel.default_profile()
        );
    }

    #[test]
    fn unknown_node_type_is_unresolved() {
        let data = KineticData {
            stress: vec![StressData { node: "flux_capacitor".into(), impact: 1.0, capacity: 0.0 }],
            ..KineticData::default()
        };
        let err = resolve_config(&data, &file()).unwrap_err();
        assert!(matches!(err, DataLoadError::UnresolvedRef { ref name, .. } if name == "flux_capacitor"));
    }

    #[test]
    fn duplicate_stress_entries_are_rejected() {
        let entry = StressData { node: "belt".into(), impact: 1.0, capacity: 0.0 };
        let data = KineticData {
            stress: vec![entry.clone(), entry],
            ..KineticData::default()
        };
        assert!(matches!(
            resolve_config(&data, &file()),
            Err(DataLoadError::DuplicateName { .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            KineticData { efficiency: 0.0, ..KineticData::default() },
            KineticData { efficiency: 1.5, ..KineticData::default() },
            KineticData { efficiency: f64::NAN, ..KineticData::default() },
            KineticData { decay_rate: 1.0, ..KineticData::default() },
            KineticData { decay_rate: -0.1, ..KineticData::default() },
            KineticData { stall_threshold: -1.0, ..KineticData::default() },
            KineticData { item_speed_per_rpm: f64::INFINITY, ..KineticData::default() },
            KineticData { stall_threshold: 1e12, ..KineticData::default() },
            KineticData {
                stress: vec![StressData { node: "motor".into(), impact: 0.0, capacity: -8.0 }],
                ..KineticData::default()
            },
        ];
        for data in cases {
            assert!(
                matches!(resolve_config(&data, &file()), Err(DataLoadError::OutOfRange { .. })),
                "accepted {data:?}"
            );
        }
    }

    #[test]
    fn full_efficiency_and_zero_decay_are_allowed() {
        let data = KineticData {
            efficiency: 1.0,
            decay_rate: 0.0,
            ..KineticData::default()
        };
        let config = resolve_config(&data, &file()).unwrap();
        assert_eq!(config.efficiency, Fixed64::ONE);
        assert_eq!(config.decay_rate, Fixed64::ZERO);
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        let dir = make_test_dir("no_file");
        assert_eq!(load_config(&dir).unwrap(), KineticConfig::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_config_reads_toml() {
        let dir = make_test_dir("toml");
        fs::write(
            dir.join("kinetic.toml"),
            "efficiency = 1.0\n\n[[stress]]\nnode = \"mechanical_press\"\nimpact = 16.0\n",
        )
        .unwrap();

        let config = load_config(&dir).unwrap();
        assert_eq!(config.efficiency, Fixed64::ONE);
        assert_eq!(config.profile_for(NodeType::MechanicalPress).impact, fixed(16.0));
        let _ = fs::remove_dir_all(&dir);
    }
}
