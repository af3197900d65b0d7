//! Graph walks over a single network's members.
//!
//! Rotation propagation is the authoritative way member speeds are assigned:
//! [`KineticNetwork::tick`] zeroes every member and then calls
//! [`propagate_rotation`] from the network's rpm source. The remaining
//! functions are read-only queries used by the network itself, the index,
//! and diagnostics.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet, VecDeque};

use crate::fixed::Fixed64;
use crate::network::KineticNetwork;
use crate::pos::BlockPos;

/// Spin the network outward from `source`, starting at `rpm`.
///
/// Breadth-first: every member is written at most once, by the first
/// predecessor that reaches it. Each step applies the gear ratio,
/// `efficiency`, and any reversal of the connection. Members that cannot be
/// reached from `source` are left untouched.
pub fn propagate_rotation(
    network: &mut KineticNetwork,
    source: BlockPos,
    rpm: Fixed64,
    efficiency: Fixed64,
) {
    let Some(node) = network.node_mut(source) else {
        return;
    };
    node.set_rpm(rpm);

    let mut visited = HashSet::from([source]);
    let mut queue = VecDeque::from([source]);
    while let Some(pos) = queue.pop_front() {
        let Some(current) = network.node(pos).cloned() else {
            continue;
        };
        for next in network.connected_neighbors(pos) {
            if !visited.insert(next) {
                continue;
            }
            let Some(neighbor) = network.node(next) else {
                continue;
            };
            let mut incoming = current.output_rpm_to(neighbor, efficiency);
            if current.is_reversed() {
                incoming = -incoming;
            }
            if let Some(neighbor) = network.node_mut(next) {
                neighbor.set_rpm(incoming);
            }
            queue.push_back(next);
        }
    }
}

/// Each member's own stress impact, keyed by position.
pub fn calculate_stress_distribution(network: &KineticNetwork) -> BTreeMap<BlockPos, Fixed64> {
    network.nodes().map(|n| (n.pos(), n.impact())).collect()
}

/// The generator with the largest individual capacity. Lowest position wins
/// ties.
pub fn find_optimal_power_source(network: &KineticNetwork) -> Option<BlockPos> {
    let mut best: Option<(BlockPos, Fixed64)> = None;
    for node in network.nodes().filter(|n| n.is_generator()) {
        match best {
            Some((_, capacity)) if node.capacity() <= capacity => {}
            _ => best = Some((node.pos(), node.capacity())),
        }
    }
    best.map(|(pos, _)| pos)
}

/// Whether every member is reachable from every other through connectable
/// members. An empty network is trivially connected.
pub fn validate_network(network: &KineticNetwork) -> bool {
    let Some(start) = network.positions().next() else {
        return true;
    };
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(pos) = queue.pop_front() {
        for next in network.connected_neighbors(pos) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited.len() == network.len()
}

/// The path from `from` to `to` (both inclusive) whose weakest member has the
/// largest stress capacity.
///
/// Returns an empty path when either end is not a member or `to` cannot be
/// reached. Ties between equally wide routes go to lower positions.
pub fn find_max_capacity_path(
    network: &KineticNetwork,
    from: BlockPos,
    to: BlockPos,
) -> Vec<BlockPos> {
    if !network.contains(from) || !network.contains(to) {
        return Vec::new();
    }
    if from == to {
        return vec![from];
    }

    let capacity_at = |pos: BlockPos| {
        network
            .node(pos)
            .map(|n| n.capacity())
            .unwrap_or(Fixed64::ZERO)
    };

    let mut width: HashMap<BlockPos, Fixed64> = HashMap::from([(from, capacity_at(from))]);
    let mut previous: HashMap<BlockPos, BlockPos> = HashMap::new();
    let mut settled: HashSet<BlockPos> = HashSet::new();
    let mut heap = BinaryHeap::from([(capacity_at(from), Reverse(from))]);

    while let Some((current_width, Reverse(pos))) = heap.pop() {
        if !settled.insert(pos) {
            continue;
        }
        if pos == to {
            break;
        }
        for next in network.connected_neighbors(pos) {
            if settled.contains(&next) {
                continue;
            }
            let candidate = current_width.min(capacity_at(next));
            if width.get(&next).is_none_or(|w| candidate > *w) {
                width.insert(next, candidate);
                previous.insert(next, pos);
                heap.push((candidate, Reverse(next)));
            }
        }
    }

    if !previous.contains_key(&to) {
        return Vec::new();
    }
    let mut path = vec![to];
    let mut cursor = to;
    while cursor != from {
        match previous.get(&cursor) {
            Some(&p) => {
                path.push(p);
                cursor = p;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}
