//! Saving and loading network layouts.
//!
//! A save records which node type sits at each position, grouped by network,
//! along with axes and generator speeds. Network ids, node speeds, and stress
//! are not stored: loading rebuilds every network from scratch through
//! [`NetworkIndex::create_node_with_axis`], so the connectivity that comes
//! back is the connectivity the layout implies.
//!
//! Loading never touches the live index until the whole save has been
//! rebuilt successfully.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::KineticConfig;
use crate::error::{KineticError, PersistError};
use crate::fixed::{Fixed64, fixed64_to_f64};
use crate::index::NetworkIndex;
use crate::node::{Axis, NodeType};
use crate::pos::BlockPos;

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Top-level save document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticSave {
    pub version: u32,
    pub networks: Vec<NetworkRecord>,
}

/// One network's members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub network_index: usize,
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default)]
    pub axis: Axis,
    /// Generated speed, for generators that have one set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl NodeRecord {
    pub fn pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }
}

impl NetworkIndex {
    /// Capture the current layout.
    pub fn snapshot(&self) -> KineticSave {
        let networks = self
            .networks()
            .enumerate()
            .map(|(network_index, network)| NetworkRecord {
                network_index,
                nodes: network
                    .nodes()
                    .map(|node| {
                        let pos = node.pos();
                        NodeRecord {
                            x: pos.x,
                            y: pos.y,
                            z: pos.z,
                            kind: node.kind(),
                            axis: node.axis(),
                            speed: (node.is_generator() && node.generated_rpm() != 0)
                                .then(|| fixed64_to_f64(node.generated_rpm())),
                        }
                    })
                    .collect(),
            })
            .collect();
        KineticSave {
            version: SAVE_VERSION,
            networks,
        }
    }

    /// Build a fresh index from a save.
    pub fn from_save(save: &KineticSave, config: KineticConfig) -> Result<Self, PersistError> {
        if save.version > SAVE_VERSION {
            return Err(PersistError::UnsupportedVersion(save.version));
        }

        let mut seen = HashSet::new();
        for record in save.networks.iter().flat_map(|n| &n.nodes) {
            if !seen.insert(record.pos()) {
                return Err(PersistError::DuplicatePosition(record.pos()));
            }
        }

        let mut index = NetworkIndex::with_config(config);
        for record in save.networks.iter().flat_map(|n| &n.nodes) {
            index
                .create_node_with_axis(record.pos(), record.kind, record.axis)
                .map_err(|_| PersistError::DuplicatePosition(record.pos()))?;
        }
        for record in save.networks.iter().flat_map(|n| &n.nodes) {
            let Some(speed) = record.speed else {
                continue;
            };
            let Some(rpm) = Fixed64::checked_from_num(speed) else {
                warn!(pos = ?record.pos(), speed, "ignoring unrepresentable generator speed");
                continue;
            };
            match index.set_generator_speed(record.pos(), rpm) {
                Ok(()) => {}
                Err(KineticError::NotAGenerator(pos)) => {
                    warn!(?pos, kind = record.kind.name(), "dropping speed saved on a non-generator");
                }
                Err(e) => return Err(PersistError::Rebuild(e)),
            }
        }
        Ok(index)
    }

    /// Replace the current layout with the one in `save`, keeping this
    /// index's configuration. On error the index is unchanged.
    pub fn restore(&mut self, save: &KineticSave) -> Result<(), PersistError> {
        let rebuilt = Self::from_save(save, self.config().clone()).inspect_err(|e| {
            error!(error = %e, "failed to restore kinetic networks");
        })?;
        *self = rebuilt;
        Ok(())
    }

    /// Write the current layout to `path` as JSON.
    pub fn save_all(&self, path: &Path) -> Result<(), PersistError> {
        let result = serde_json::to_string_pretty(&self.snapshot())
            .map_err(PersistError::from)
            .and_then(|json| std::fs::write(path, json).map_err(PersistError::from));
        match &result {
            Ok(()) => debug!(path = %path.display(), "saved kinetic networks"),
            Err(e) => error!(path = %path.display(), error = %e, "failed to save kinetic networks"),
        }
        result
    }

    /// Replace the current layout with the one stored at `path`. On error
    /// the index is unchanged.
    pub fn load_all(&mut self, path: &Path) -> Result<(), PersistError> {
        let save = std::fs::read_to_string(path)
            .map_err(PersistError::from)
            .and_then(|text| serde_json::from_str::<KineticSave>(&text).map_err(PersistError::from))
            .inspect_err(|e| {
                error!(path = %path.display(), error = %e, "failed to load kinetic networks");
            })?;
        self.restore(&save)?;
        debug!(
            path = %path.display(),
            networks = self.network_count(),
            nodes = self.node_count(),
            "loaded kinetic networks"
        );
        Ok(())
    }
}
