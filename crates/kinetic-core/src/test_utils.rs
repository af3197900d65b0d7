//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::fixed::Fixed64;
use crate::index::NetworkIndex;
use crate::node::{Axis, NodeType};
use crate::pos::BlockPos;
use crate::propagation::validate_network;

// ===========================================================================
// Value helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn pos(x: i32, y: i32, z: i32) -> BlockPos {
    BlockPos::new(x, y, z)
}

/// Absolute difference between a fixed-point value and an expected float.
pub fn approx(actual: Fixed64, expected: f64, tolerance: f64) -> bool {
    (actual.to_num::<f64>() - expected).abs() <= tolerance
}

// ===========================================================================
// Layout builders
// ===========================================================================

/// Place `len` nodes of `kind` along +x starting at `start`, all on `axis`.
pub fn line_of(
    index: &mut NetworkIndex,
    start: BlockPos,
    len: i32,
    kind: NodeType,
    axis: Axis,
) -> Vec<BlockPos> {
    (0..len)
        .map(|i| {
            let p = pos(start.x + i, start.y, start.z);
            index
                .create_node_with_axis(p, kind, axis)
                .unwrap_or_else(|e| panic!("line_of: {e}"));
            p
        })
        .collect()
}

/// A water wheel at the origin driving `shafts` shafts and one press at the
/// far end, all on the default axis.
pub fn water_wheel_line(index: &mut NetworkIndex, shafts: i32, rpm: f64) -> Vec<BlockPos> {
    let mut placed = vec![pos(0, 0, 0)];
    index
        .create_node(pos(0, 0, 0), NodeType::WaterWheel)
        .unwrap_or_else(|e| panic!("water_wheel_line: {e}"));
    placed.extend(line_of(index, pos(1, 0, 0), shafts, NodeType::Shaft, Axis::Y));
    let press = pos(shafts + 1, 0, 0);
    index
        .create_node(press, NodeType::MechanicalPress)
        .unwrap_or_else(|e| panic!("water_wheel_line: {e}"));
    placed.push(press);
    index
        .set_generator_speed(pos(0, 0, 0), fixed(rpm))
        .unwrap_or_else(|e| panic!("water_wheel_line: {e}"));
    placed
}

// ===========================================================================
// Consistency checks
// ===========================================================================

/// Panic unless every structural invariant of the index holds:
///
/// - each member of each network maps back to that network,
/// - the node count equals the sum of network sizes,
/// - stress and capacity equal the sums over members,
/// - every network is internally connected.
pub fn assert_index_consistent(index: &NetworkIndex) {
    let mut total = 0;
    for network in index.networks() {
        assert!(network.is_valid(), "live network {:?} is invalid", network.id());
        assert!(!network.is_empty(), "live network {:?} is empty", network.id());
        total += network.len();

        let mut stress = Fixed64::ZERO;
        let mut capacity = Fixed64::ZERO;
        for node in network.nodes() {
            assert_eq!(
                index.network_id_at(node.pos()),
                Some(network.id()),
                "position {:?} does not map back to its network",
                node.pos()
            );
            stress += node.impact();
            capacity += node.capacity();
        }
        assert_eq!(network.stress(), stress, "stress drifted in {:?}", network.id());
        assert_eq!(
            network.stress_capacity(),
            capacity,
            "capacity drifted in {:?}",
            network.id()
        );
        assert!(
            validate_network(network),
            "network {:?} is not connected",
            network.id()
        );
    }
    assert_eq!(index.node_count(), total, "position map size differs from member total");
}
