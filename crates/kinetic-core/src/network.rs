//! Kinetic networks: maximal connected sets of nodes sharing one rotation.
//!
//! A network owns its member nodes and keeps three aggregates current after
//! every structural change:
//!
//! - **stress**: sum of member consumers' impact,
//! - **stress capacity**: sum of member generators' capacity,
//! - **rpm**: the generated speed of the strongest generator (the *source*),
//!   scaled by the network's speed factor.
//!
//! The speed factor is 1 while the network can carry its load. Each tick a
//! network spends overstressed multiplies it by `1 - decay_rate` until the
//! speed drops under the stall threshold and snaps to 0. Relieving the stress
//! restores full speed.

use std::collections::{BTreeMap, VecDeque};

use crate::config::KineticConfig;
use crate::event::KineticEvent;
use crate::fixed::{Fixed64, Ticks, checked_div_64, fixed64_to_f64};
use crate::id::NetworkId;
use crate::node::KineticNode;
use crate::pos::BlockPos;
use crate::propagation;

#[derive(Debug, Clone)]
pub struct KineticNetwork {
    id: NetworkId,
    /// Members keyed by position. Ordered so that scans and tie-breaks are
    /// deterministic.
    members: BTreeMap<BlockPos, KineticNode>,
    stress: Fixed64,
    capacity: Fixed64,
    /// Position of the generator the network speed is taken from.
    source: Option<BlockPos>,
    speed_factor: Fixed64,
    rpm: Fixed64,
    valid: bool,
    /// Whether the network was overstressed on its previous tick.
    was_overstressed: bool,
}

impl Default for KineticNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl KineticNetwork {
    /// Create an empty network. Its id is assigned when the
    /// [`NetworkIndex`](crate::index::NetworkIndex) takes ownership.
    pub fn new() -> Self {
        Self {
            id: NetworkId::default(),
            members: BTreeMap::new(),
            stress: Fixed64::ZERO,
            capacity: Fixed64::ZERO,
            source: None,
            speed_factor: Fixed64::ONE,
            rpm: Fixed64::ZERO,
            valid: true,
            was_overstressed: false,
        }
    }

    pub(crate) fn with_id(mut self, id: NetworkId) -> Self {
        self.id = id;
        self
    }

    // -- Accessors --

    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.members.contains_key(&pos)
    }

    pub fn node(&self, pos: BlockPos) -> Option<&KineticNode> {
        self.members.get(&pos)
    }

    pub(crate) fn node_mut(&mut self, pos: BlockPos) -> Option<&mut KineticNode> {
        self.members.get_mut(&pos)
    }

    /// Members in position order.
    pub fn nodes(&self) -> impl Iterator<Item = &KineticNode> {
        self.members.values()
    }

    /// Member positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.members.keys().copied()
    }

    /// Members that `pos` can pass rotation to, in direction order.
    pub fn connected_neighbors(&self, pos: BlockPos) -> Vec<BlockPos> {
        let Some(node) = self.members.get(&pos) else {
            return Vec::new();
        };
        pos.neighbors()
            .into_iter()
            .filter(|n| self.members.get(n).is_some_and(|other| node.can_connect_to(other)))
            .collect()
    }

    pub fn stress(&self) -> Fixed64 {
        self.stress
    }

    pub fn stress_capacity(&self) -> Fixed64 {
        self.capacity
    }

    /// Current network speed.
    pub fn rpm(&self) -> Fixed64 {
        self.rpm
    }

    /// Current network speed as `f64`, for the logistics layer and displays.
    pub fn rpm_f64(&self) -> f64 {
        fixed64_to_f64(self.rpm)
    }

    /// The generator the network speed comes from, if any.
    pub fn rpm_source(&self) -> Option<BlockPos> {
        self.source
    }

    /// False once the network has been emptied, merged away, or split.
    /// Invalid networks must not be consulted.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_overstressed(&self) -> bool {
        self.stress > self.capacity
    }

    /// Stress as a percentage of capacity; 0 when there is no capacity.
    pub fn stress_percentage(&self) -> Fixed64 {
        checked_div_64(self.stress, self.capacity)
            .map(|ratio| ratio.saturating_mul_int(100))
            .unwrap_or(Fixed64::ZERO)
    }

    // -- Structural changes --

    /// Insert a node and update the aggregates.
    ///
    /// A node already at the same position is replaced.
    pub fn add_component(&mut self, node: KineticNode) {
        if self.insert_member(node) {
            self.recompute_aggregates();
        } else {
            self.refresh_rpm();
        }
    }

    /// Remove the node at `pos`. An emptied network becomes invalid.
    pub fn remove_component(&mut self, pos: BlockPos) -> Option<KineticNode> {
        let node = self.members.remove(&pos)?;
        if self.members.is_empty() {
            self.invalidate();
            return Some(node);
        }
        if node.is_consumer() {
            self.stress -= node.impact();
        }
        if node.is_generator() {
            self.capacity -= node.capacity();
        }
        if self.source == Some(pos) {
            self.source = propagation::find_optimal_power_source(self);
        }
        self.refresh_rpm();
        Some(node)
    }

    /// Set the speed a member generator drives the network at.
    ///
    /// Returns false when `pos` is not a member generator.
    pub fn set_generated_rpm(&mut self, pos: BlockPos, rpm: Fixed64) -> bool {
        match self.members.get_mut(&pos) {
            Some(node) if node.is_generator() => {
                node.set_generated_rpm(rpm);
                self.refresh_rpm();
                true
            }
            _ => false,
        }
    }

    /// Move every member of `other` into `self`.
    ///
    /// `other` is left empty and invalid. Returns the transferred positions
    /// so the caller can remap them.
    pub fn merge(&mut self, other: &mut KineticNetwork) -> Vec<BlockPos> {
        self.speed_factor = self.speed_factor.min(other.speed_factor);
        let taken = std::mem::take(&mut other.members);
        let mut transferred = Vec::with_capacity(taken.len());
        let mut replaced = false;
        for (pos, node) in taken {
            transferred.push(pos);
            replaced |= self.insert_member(node);
        }
        if replaced {
            self.recompute_aggregates();
        } else {
            self.refresh_rpm();
        }
        other.invalidate();
        transferred
    }

    /// Break the network into its connected components after `split_pos`
    /// has gone.
    ///
    /// Components are found by breadth-first search over connectable
    /// neighbors restricted to the remaining members, starting from the
    /// lowest unvisited position. `self` is left empty and invalid.
    pub fn split(&mut self, split_pos: BlockPos) -> Vec<KineticNetwork> {
        let mut remaining = std::mem::take(&mut self.members);
        remaining.remove(&split_pos);
        let speed_factor = self.speed_factor;
        let was_overstressed = self.was_overstressed;
        self.invalidate();

        let mut parts = Vec::new();
        while let Some((start, node)) = remaining.pop_first() {
            let mut part = KineticNetwork::new();
            part.speed_factor = speed_factor;
            part.was_overstressed = was_overstressed;
            part.insert_member(node);

            let mut queue = VecDeque::from([start]);
            while let Some(pos) = queue.pop_front() {
                let Some(current) = part.members.get(&pos).cloned() else {
                    continue;
                };
                for next in pos.neighbors() {
                    let joins = remaining
                        .get(&next)
                        .is_some_and(|candidate| current.can_connect_to(candidate));
                    if !joins {
                        continue;
                    }
                    if let Some(neighbor) = remaining.remove(&next) {
                        part.insert_member(neighbor);
                        queue.push_back(next);
                    }
                }
            }
            part.refresh_rpm();
            parts.push(part);
        }
        parts
    }

    // -- Simulation --

    /// Advance one tick: apply overstress decay, then spin every member from
    /// the rpm source. Returns transition events.
    pub fn tick(&mut self, config: &KineticConfig, current_tick: Ticks) -> Vec<KineticEvent> {
        let mut events = Vec::new();
        if !self.valid {
            return events;
        }

        let overstressed = self.is_overstressed();
        if overstressed && !self.was_overstressed {
            events.push(KineticEvent::Overstressed {
                network_id: self.id,
                stress: self.stress,
                capacity: self.capacity,
                tick: current_tick,
            });
        } else if !overstressed && self.was_overstressed {
            events.push(KineticEvent::StressRelieved {
                network_id: self.id,
                tick: current_tick,
            });
        }
        self.was_overstressed = overstressed;

        if overstressed && self.speed_factor > Fixed64::ZERO {
            let before = self.rpm;
            self.speed_factor *= Fixed64::ONE - config.decay_rate;
            self.rpm = self.target_rpm().saturating_mul(self.speed_factor);
            if self.rpm.abs() < config.stall_threshold {
                self.speed_factor = Fixed64::ZERO;
                self.rpm = Fixed64::ZERO;
                if before != Fixed64::ZERO {
                    events.push(KineticEvent::Stalled {
                        network_id: self.id,
                        tick: current_tick,
                    });
                }
            }
        }

        self.apply_rotation(config.efficiency);
        events
    }

    /// Zero every member, then propagate the network speed outward from the
    /// rpm source.
    fn apply_rotation(&mut self, efficiency: Fixed64) {
        for node in self.members.values_mut() {
            node.set_rpm(Fixed64::ZERO);
        }
        if let Some(source) = self.source {
            let rpm = self.rpm;
            propagation::propagate_rotation(self, source, rpm, efficiency);
        }
    }

    // -- Aggregates --

    /// Insert a member and fold it into stress, capacity, and the source
    /// choice without touching the speed. Returns true when a node at the
    /// same position was replaced, in which case the incremental totals are
    /// stale and must be recomputed.
    fn insert_member(&mut self, node: KineticNode) -> bool {
        let pos = node.pos();
        let capacity = node.capacity();
        if node.is_consumer() {
            self.stress += node.impact();
        }
        if node.is_generator() {
            self.capacity += capacity;
        }
        if self.members.insert(pos, node).is_some() {
            return true;
        }
        if capacity > Fixed64::ZERO {
            let wins = match self.source.and_then(|s| self.members.get(&s)) {
                Some(current) => {
                    capacity > current.capacity()
                        || (capacity == current.capacity() && pos < current.pos())
                }
                None => true,
            };
            if wins {
                self.source = Some(pos);
            }
        }
        false
    }

    fn target_rpm(&self) -> Fixed64 {
        self.source
            .and_then(|s| self.members.get(&s))
            .map(|n| n.generated_rpm())
            .unwrap_or(Fixed64::ZERO)
    }

    fn refresh_rpm(&mut self) {
        if !self.is_overstressed() {
            self.speed_factor = Fixed64::ONE;
        }
        self.rpm = self.target_rpm().saturating_mul(self.speed_factor);
    }

    fn recompute_aggregates(&mut self) {
        self.stress = self
            .members
            .values()
            .filter(|n| n.is_consumer())
            .fold(Fixed64::ZERO, |acc, n| acc + n.impact());
        self.capacity = self
            .members
            .values()
            .filter(|n| n.is_generator())
            .fold(Fixed64::ZERO, |acc, n| acc + n.capacity());
        self.source = propagation::find_optimal_power_source(self);
        self.refresh_rpm();
    }

    fn invalidate(&mut self) {
        self.members.clear();
        self.valid = false;
        self.stress = Fixed64::ZERO;
        self.capacity = Fixed64::ZERO;
        self.source = None;
        self.rpm = Fixed64::ZERO;
    }
}
