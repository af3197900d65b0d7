//! The network index: which network, if any, occupies each grid cell.
//!
//! [`NetworkIndex`] is the top-level API of the engine. It owns every live
//! [`KineticNetwork`] and the reverse `position -> network` map, and keeps
//! the two in agreement as nodes are created and removed:
//!
//! - creating a node next to one network joins it,
//! - creating a node next to several networks merges them into the first,
//! - removing a node splits its network into the components that remain.
//!
//! The host calls [`NetworkIndex::tick`] once per simulation step.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, error, warn};

use crate::config::KineticConfig;
use crate::error::KineticError;
use crate::event::KineticEvent;
use crate::fixed::{Fixed64, Ticks};
use crate::id::NetworkId;
use crate::network::KineticNetwork;
use crate::node::{Axis, KineticNode, NodeType};
use crate::pos::BlockPos;
use crate::propagation;

/// Read-only summary of the index for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub network_count: usize,
    pub node_count: usize,
    /// Mean members per network; 0 when there are no networks.
    pub average_network_size: f64,
    pub largest_network_size: usize,
    pub overstressed_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkIndex {
    config: KineticConfig,
    networks: SlotMap<NetworkId, KineticNetwork>,
    positions: HashMap<BlockPos, NetworkId>,
}

impl NetworkIndex {
    /// Create an empty index with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with the given configuration.
    pub fn with_config(config: KineticConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &KineticConfig {
        &self.config
    }

    // -- Lookups --

    /// The node at `pos`, if any.
    pub fn node(&self, pos: BlockPos) -> Option<&KineticNode> {
        self.network_at(pos).and_then(|net| net.node(pos))
    }

    /// The network occupying `pos`, if any.
    pub fn network_at(&self, pos: BlockPos) -> Option<&KineticNetwork> {
        self.network_id_at(pos).and_then(|id| self.network(id))
    }

    pub fn network_id_at(&self, pos: BlockPos) -> Option<NetworkId> {
        self.positions.get(&pos).copied()
    }

    /// A network by id. Ids of merged, split, or emptied networks resolve to
    /// `None`.
    pub fn network(&self, id: NetworkId) -> Option<&KineticNetwork> {
        self.networks.get(id).filter(|net| net.is_valid())
    }

    /// All live networks.
    pub fn networks(&self) -> impl Iterator<Item = &KineticNetwork> {
        self.networks.values().filter(|net| net.is_valid())
    }

    pub fn network_count(&self) -> usize {
        self.networks().count()
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_occupied(&self, pos: BlockPos) -> bool {
        self.positions.contains_key(&pos)
    }

    /// Item speed for belts and other logistics at `pos`:
    /// `max(0, rpm * item_speed_per_rpm)`, or 0 when nothing is there.
    pub fn item_speed_at(&self, pos: BlockPos) -> Fixed64 {
        self.network_at(pos)
            .map(|net| {
                net.rpm()
                    .saturating_mul(self.config.item_speed_per_rpm)
                    .max(Fixed64::ZERO)
            })
            .unwrap_or(Fixed64::ZERO)
    }

    // -- Structural changes --

    /// Place a node on the default axis. See [`NetworkIndex::create_node_with_axis`].
    pub fn create_node(&mut self, pos: BlockPos, kind: NodeType) -> Result<NetworkId, KineticError> {
        self.create_node_with_axis(pos, kind, Axis::default())
    }

    /// Place a node and connect it to every compatible neighboring network.
    ///
    /// Returns the id of the network that now holds the node. Fails without
    /// changing anything when `pos` is occupied.
    pub fn create_node_with_axis(
        &mut self,
        pos: BlockPos,
        kind: NodeType,
        axis: Axis,
    ) -> Result<NetworkId, KineticError> {
        if self.positions.contains_key(&pos) {
            warn!(?pos, ?kind, "create_node: position already occupied");
            return Err(KineticError::Occupied(pos));
        }
        let node = KineticNode::with_profile(pos, kind, axis, self.config.profile_for(kind));
        let adjacent = self.adjacent_networks(&node);

        let Some((&survivor, others)) = adjacent.split_first() else {
            let mut network = KineticNetwork::new();
            network.add_component(node);
            let id = self.networks.insert_with_key(|id| network.with_id(id));
            self.positions.insert(pos, id);
            debug!(?pos, ?kind, network = ?id, "created isolated network");
            return Ok(id);
        };

        if let Some(network) = self.networks.get_mut(survivor) {
            network.add_component(node);
        }
        self.positions.insert(pos, survivor);

        for &other_id in others {
            let Some(mut other) = self.networks.remove(other_id) else {
                continue;
            };
            let Some(network) = self.networks.get_mut(survivor) else {
                continue;
            };
            let moved = network.merge(&mut other);
            for moved_pos in &moved {
                self.positions.insert(*moved_pos, survivor);
            }
            debug!(from = ?other_id, into = ?survivor, nodes = moved.len(), "merged networks");
        }
        debug!(?pos, ?kind, network = ?survivor, "joined network");
        Ok(survivor)
    }

    /// Remove the node at `pos`, splitting its network if it falls apart.
    ///
    /// The old network id is always retired; the pieces that remain get new
    /// ids. Fails without changing anything when `pos` is empty.
    pub fn remove_node(&mut self, pos: BlockPos) -> Result<KineticNode, KineticError> {
        let Some(id) = self.network_id_at(pos) else {
            warn!(?pos, "remove_node: nothing at position");
            return Err(KineticError::NotFound(pos));
        };
        let Some(node) = self
            .networks
            .get_mut(id)
            .and_then(|net| net.remove_component(pos))
        else {
            error!(?pos, network = ?id, "position mapped to a network that does not claim it");
            return Err(KineticError::NotFound(pos));
        };
        self.positions.remove(&pos);
        let Some(mut old) = self.networks.remove(id) else {
            return Ok(node);
        };

        if old.is_empty() {
            debug!(?pos, network = ?id, "removed last node of network");
            return Ok(node);
        }

        let parts = old.split(pos);
        debug!(?pos, network = ?id, parts = parts.len(), "split network");
        for part in parts {
            let connected = propagation::validate_network(&part);
            if !connected {
                error!(?pos, size = part.len(), "split produced a disconnected network");
            }
            debug_assert!(connected, "split produced a disconnected network");
            let members: Vec<BlockPos> = part.positions().collect();
            let new_id = self.networks.insert_with_key(|new_id| part.with_id(new_id));
            for member in members {
                self.positions.insert(member, new_id);
            }
        }
        Ok(node)
    }

    /// Set the speed the generator at `pos` drives its network at.
    pub fn set_generator_speed(&mut self, pos: BlockPos, rpm: Fixed64) -> Result<(), KineticError> {
        let Some(network) = self
            .positions
            .get(&pos)
            .and_then(|id| self.networks.get_mut(*id))
        else {
            warn!(?pos, "set_generator_speed: nothing at position");
            return Err(KineticError::NotFound(pos));
        };
        if network.set_generated_rpm(pos, rpm) {
            Ok(())
        } else {
            warn!(?pos, "set_generator_speed: node is not a generator");
            Err(KineticError::NotAGenerator(pos))
        }
    }

    /// Remove every node and network. The configuration is kept.
    pub fn clear(&mut self) {
        self.networks.clear();
        self.positions.clear();
    }

    // -- Simulation --

    /// Advance every live network by one tick and return the transition
    /// events they emitted.
    pub fn tick(&mut self, current_tick: Ticks) -> Vec<KineticEvent> {
        let positions = &mut self.positions;
        self.networks.retain(|id, net| {
            if !net.is_valid() {
                positions.retain(|_, owner| *owner != id);
            }
            net.is_valid()
        });

        let mut events = Vec::new();
        for network in self.networks.values_mut() {
            events.extend(network.tick(&self.config, current_tick));
        }
        events
    }

    // -- Diagnostics --

    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            network_count: 0,
            node_count: 0,
            average_network_size: 0.0,
            largest_network_size: 0,
            overstressed_count: 0,
        };
        for network in self.networks() {
            stats.network_count += 1;
            stats.node_count += network.len();
            stats.largest_network_size = stats.largest_network_size.max(network.len());
            if network.is_overstressed() {
                stats.overstressed_count += 1;
            }
        }
        if stats.network_count > 0 {
            stats.average_network_size = stats.node_count as f64 / stats.network_count as f64;
        }
        stats
    }

    /// Check that every network is internally connected. Returns the ids of
    /// networks that are not; each one is logged as an error.
    pub fn validate_all(&self) -> Vec<NetworkId> {
        let mut broken = Vec::new();
        for (id, network) in self.networks.iter().filter(|(_, n)| n.is_valid()) {
            if !propagation::validate_network(network) {
                error!(network = ?id, size = network.len(), "network is not connected");
                broken.push(id);
            }
        }
        broken
    }

    /// Distinct valid networks holding a neighbor that can connect to `node`,
    /// in [`Direction::ALL`](crate::pos::Direction::ALL) order.
    fn adjacent_networks(&self, node: &KineticNode) -> Vec<NetworkId> {
        let mut found = Vec::new();
        for neighbor_pos in node.pos().neighbors() {
            let Some(&id) = self.positions.get(&neighbor_pos) else {
                continue;
            };
            if found.contains(&id) {
                continue;
            }
            let connects = self
                .networks
                .get(id)
                .filter(|net| net.is_valid())
                .and_then(|net| net.node(neighbor_pos))
                .is_some_and(|neighbor| neighbor.can_connect_to(node));
            if connects {
                found.push(id);
            }
        }
        found
    }
}
