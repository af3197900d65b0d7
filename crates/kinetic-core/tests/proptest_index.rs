//! Property-based tests for the network index.
//!
//! Uses proptest to generate random place/break/tick sequences on a small
//! grid, then verifies the structural invariants hold after every step.

use std::collections::{BTreeSet, HashSet, VecDeque};

use kinetic_core::fixed::Fixed64;
use kinetic_core::index::NetworkIndex;
use kinetic_core::node::{Axis, NodeType};
use kinetic_core::pos::BlockPos;
use kinetic_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// World edits on a 4x2x4 grid, small enough that placements collide and
/// touch often.
#[derive(Debug, Clone)]
enum Op {
    Place(BlockPos, NodeType, Axis),
    Break(BlockPos),
    SetSpeed(BlockPos, i32),
    Tick,
}

fn arb_pos() -> impl Strategy<Value = BlockPos> {
    (0..4i32, 0..2i32, 0..4i32).prop_map(|(x, y, z)| BlockPos::new(x, y, z))
}

fn arb_kind() -> impl Strategy<Value = NodeType> {
    proptest::sample::select(NodeType::ALL.to_vec())
}

fn arb_axis() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::X), Just(Axis::Y), Just(Axis::Z)]
}

fn arb_ops(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            4 => (arb_pos(), arb_kind(), arb_axis()).prop_map(|(p, k, a)| Op::Place(p, k, a)),
            2 => arb_pos().prop_map(Op::Break),
            1 => (arb_pos(), -64..=64i32).prop_map(|(p, rpm)| Op::SetSpeed(p, rpm)),
            1 => Just(Op::Tick),
        ],
        1..=max_ops,
    )
}

fn apply(index: &mut NetworkIndex, op: &Op, tick: &mut u64) {
    match *op {
        Op::Place(p, kind, axis) => {
            let _ = index.create_node_with_axis(p, kind, axis);
        }
        Op::Break(p) => {
            let _ = index.remove_node(p);
        }
        Op::SetSpeed(p, rpm) => {
            let _ = index.set_generator_speed(p, Fixed64::from_num(rpm));
        }
        Op::Tick => {
            *tick += 1;
            index.tick(*tick);
        }
    }
}

/// Connected components of the occupied cells, computed from scratch with
/// the same connection rule the index uses.
fn components_from_scratch(index: &NetworkIndex) -> BTreeSet<BTreeSet<BlockPos>> {
    let occupied: BTreeSet<BlockPos> = index.networks().flat_map(|n| n.positions()).collect();
    let mut seen = HashSet::new();
    let mut components = BTreeSet::new();
    for &start in &occupied {
        if !seen.insert(start) {
            continue;
        }
        let mut component = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(p) = queue.pop_front() {
            let Some(node) = index.node(p) else { continue };
            for next in p.neighbors() {
                let joins = index.node(next).is_some_and(|other| node.can_connect_to(other));
                if joins && seen.insert(next) {
                    component.insert(next);
                    queue.push_back(next);
                }
            }
        }
        components.insert(component);
    }
    components
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every step leaves the index internally consistent.
    #[test]
    fn index_stays_consistent(ops in arb_ops(60)) {
        let mut index = NetworkIndex::new();
        let mut tick = 0;
        for op in &ops {
            apply(&mut index, op, &mut tick);
            assert_index_consistent(&index);
        }
        prop_assert!(index.validate_all().is_empty());
    }

    /// Networks are exactly the connected components of the layout, no
    /// matter what order it was built and broken in.
    #[test]
    fn networks_match_connected_components(ops in arb_ops(60)) {
        let mut index = NetworkIndex::new();
        let mut tick = 0;
        for op in &ops {
            apply(&mut index, op, &mut tick);
        }
        let actual: BTreeSet<BTreeSet<BlockPos>> =
            index.networks().map(|n| n.positions().collect()).collect();
        prop_assert_eq!(actual, components_from_scratch(&index));
    }

    /// Rejected edits change nothing.
    #[test]
    fn rejected_edits_are_no_ops(ops in arb_ops(40), probe in arb_pos()) {
        let mut index = NetworkIndex::new();
        let mut tick = 0;
        for op in &ops {
            apply(&mut index, op, &mut tick);
        }
        let before: BTreeSet<BTreeSet<BlockPos>> =
            index.networks().map(|n| n.positions().collect()).collect();
        if index.is_occupied(probe) {
            prop_assert!(index.create_node(probe, NodeType::Shaft).is_err());
        } else {
            prop_assert!(index.remove_node(probe).is_err());
        }
        let after: BTreeSet<BTreeSet<BlockPos>> =
            index.networks().map(|n| n.positions().collect()).collect();
        prop_assert_eq!(before, after);
    }

    /// A snapshot restores to the same groups and node types.
    #[test]
    fn snapshot_restore_preserves_layout(ops in arb_ops(40)) {
        let mut index = NetworkIndex::new();
        let mut tick = 0;
        for op in &ops {
            apply(&mut index, op, &mut tick);
        }
        let mut restored = NetworkIndex::new();
        restored.restore(&index.snapshot()).unwrap();

        let groups = |i: &NetworkIndex| -> BTreeSet<BTreeSet<BlockPos>> {
            i.networks().map(|n| n.positions().collect()).collect()
        };
        prop_assert_eq!(groups(&restored), groups(&index));
        for network in index.networks() {
            for node in network.nodes() {
                let copy = restored.node(node.pos());
                prop_assert_eq!(copy.map(|n| n.kind()), Some(node.kind()));
            }
        }
        assert_index_consistent(&restored);
    }

    /// Decay never speeds a network up and never flips its direction.
    #[test]
    fn decay_is_monotone(presses in 1..12i32, rpm in 1..256i32, ticks in 1..80u64) {
        let mut index = NetworkIndex::new();
        index.create_node(pos(0, 0, 0), NodeType::HandCrank).unwrap();
        line_of(&mut index, pos(1, 0, 0), presses, NodeType::MechanicalPress, Axis::Y);
        index.set_generator_speed(pos(0, 0, 0), Fixed64::from_num(rpm)).unwrap();

        let mut last = index.network_at(pos(0, 0, 0)).unwrap().rpm();
        for tick in 1..=ticks {
            index.tick(tick);
            let now = index.network_at(pos(0, 0, 0)).unwrap().rpm();
            prop_assert!(now <= last);
            prop_assert!(now >= Fixed64::ZERO);
            last = now;
        }
    }
}
