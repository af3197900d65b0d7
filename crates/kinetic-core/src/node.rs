//! Mechanical components and their connection rules.
//!
//! A [`KineticNode`] is one block on the grid: a shaft, a cogwheel, a
//! generator, or a machine that draws stress. Behavior differences between
//! node types are a small fixed set of special cases (the cogwheel family and
//! the gearbox), so they are expressed as `match`es over [`NodeType`] rather
//! than as trait objects.

use serde::{Deserialize, Serialize};

use crate::fixed::Fixed64;
use crate::pos::BlockPos;

// ---------------------------------------------------------------------------
// Node types
// ---------------------------------------------------------------------------

/// Every kind of block that can take part in a kinetic network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Shaft,
    SmallCogwheel,
    LargeCogwheel,
    Gearbox,
    HandCrank,
    WaterWheel,
    Windmill,
    Motor,
    MechanicalPress,
    MechanicalMixer,
    Millstone,
    Deployer,
    MechanicalSaw,
    MechanicalDrill,
    Belt,
    Funnel,
    Pump,
    Pipe,
    FluidTank,
}

impl NodeType {
    pub const ALL: [NodeType; 19] = [
        NodeType::Shaft,
        NodeType::SmallCogwheel,
        NodeType::LargeCogwheel,
        NodeType::Gearbox,
        NodeType::HandCrank,
        NodeType::WaterWheel,
        NodeType::Windmill,
        NodeType::Motor,
        NodeType::MechanicalPress,
        NodeType::MechanicalMixer,
        NodeType::Millstone,
        NodeType::Deployer,
        NodeType::MechanicalSaw,
        NodeType::MechanicalDrill,
        NodeType::Belt,
        NodeType::Funnel,
        NodeType::Pump,
        NodeType::Pipe,
        NodeType::FluidTank,
    ];

    /// Built-in stress impact and capacity for this type.
    pub fn default_profile(self) -> StressProfile {
        let (impact, capacity): (i32, i32) = match self {
            NodeType::Shaft => (1, 0),
            NodeType::SmallCogwheel | NodeType::LargeCogwheel | NodeType::Gearbox => (0, 0),
            NodeType::HandCrank => (0, 32),
            NodeType::WaterWheel => (0, 512),
            NodeType::Windmill => (0, 256),
            NodeType::Motor => (0, 2048),
            NodeType::MechanicalPress => (8, 0),
            NodeType::MechanicalMixer
            | NodeType::Millstone
            | NodeType::Deployer
            | NodeType::MechanicalSaw
            | NodeType::MechanicalDrill
            | NodeType::Pump => (4, 0),
            NodeType::Belt => (1, 0),
            NodeType::Funnel | NodeType::Pipe | NodeType::FluidTank => (0, 0),
        };
        StressProfile::new(Fixed64::from_num(impact), Fixed64::from_num(capacity))
    }

    /// Small and large cogwheels.
    pub fn is_cogwheel(self) -> bool {
        matches!(self, NodeType::SmallCogwheel | NodeType::LargeCogwheel)
    }

    /// Types that can pass rotation to a neighbor on a different axis.
    pub fn bridges_axes(self) -> bool {
        self.is_cogwheel()
    }

    /// The `snake_case` name used in data and save files.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Shaft => "shaft",
            NodeType::SmallCogwheel => "small_cogwheel",
            NodeType::LargeCogwheel => "large_cogwheel",
            NodeType::Gearbox => "gearbox",
            NodeType::HandCrank => "hand_crank",
            NodeType::WaterWheel => "water_wheel",
            NodeType::Windmill => "windmill",
            NodeType::Motor => "motor",
            NodeType::MechanicalPress => "mechanical_press",
            NodeType::MechanicalMixer => "mechanical_mixer",
            NodeType::Millstone => "millstone",
            NodeType::Deployer => "deployer",
            NodeType::MechanicalSaw => "mechanical_saw",
            NodeType::MechanicalDrill => "mechanical_drill",
            NodeType::Belt => "belt",
            NodeType::Funnel => "funnel",
            NodeType::Pump => "pump",
            NodeType::Pipe => "pipe",
            NodeType::FluidTank => "fluid_tank",
        }
    }

    /// Inverse of [`NodeType::name`].
    pub fn from_name(name: &str) -> Option<NodeType> {
        NodeType::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// Principal rotation axis of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

// ---------------------------------------------------------------------------
// Stress profile
// ---------------------------------------------------------------------------

/// Load a node imposes on its network and power it can supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StressProfile {
    /// Stress this node consumes. Never negative.
    pub impact: Fixed64,
    /// Stress capacity this node supplies. Never negative.
    pub capacity: Fixed64,
}

impl StressProfile {
    /// Build a profile, clamping negative values to zero.
    pub fn new(impact: Fixed64, capacity: Fixed64) -> Self {
        Self {
            impact: impact.max(Fixed64::ZERO),
            capacity: capacity.max(Fixed64::ZERO),
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One mechanical component at a grid position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticNode {
    pos: BlockPos,
    kind: NodeType,
    profile: StressProfile,
    axis: Axis,
    /// Current signed speed. Written by rotation propagation.
    rpm: Fixed64,
    /// Whether the node currently spins in the negative direction.
    reversed: bool,
    /// Speed a generator drives its network at. Zero for non-generators.
    generated_rpm: Fixed64,
}

impl KineticNode {
    /// Create a node with the type's default stress profile.
    pub fn new(pos: BlockPos, kind: NodeType, axis: Axis) -> Self {
        Self::with_profile(pos, kind, axis, kind.default_profile())
    }

    /// Create a node with an explicit stress profile.
    pub fn with_profile(pos: BlockPos, kind: NodeType, axis: Axis, profile: StressProfile) -> Self {
        Self {
            pos,
            kind,
            profile: StressProfile::new(profile.impact, profile.capacity),
            axis,
            rpm: Fixed64::ZERO,
            reversed: false,
            generated_rpm: Fixed64::ZERO,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn kind(&self) -> NodeType {
        self.kind
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn profile(&self) -> StressProfile {
        self.profile
    }

    pub fn impact(&self) -> Fixed64 {
        self.profile.impact
    }

    pub fn capacity(&self) -> Fixed64 {
        self.profile.capacity
    }

    pub fn rpm(&self) -> Fixed64 {
        self.rpm
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn generated_rpm(&self) -> Fixed64 {
        self.generated_rpm
    }

    pub fn is_generator(&self) -> bool {
        self.profile.capacity > Fixed64::ZERO
    }

    pub fn is_consumer(&self) -> bool {
        self.profile.impact > Fixed64::ZERO
    }

    pub fn is_transmission(&self) -> bool {
        !self.is_generator() && !self.is_consumer()
    }

    /// Set the current speed. The reversed flag follows the sign.
    pub fn set_rpm(&mut self, rpm: Fixed64) {
        self.rpm = rpm;
        self.reversed = rpm < Fixed64::ZERO;
    }

    /// Set the speed this node drives its network at. Ignored for
    /// non-generators.
    pub fn set_generated_rpm(&mut self, rpm: Fixed64) {
        if self.is_generator() {
            self.generated_rpm = rpm;
        }
    }

    /// Whether rotation can pass between `self` and `other`.
    ///
    /// The nodes must share a face and either rotate on the same axis or
    /// include a cogwheel.
    pub fn can_connect_to(&self, other: &KineticNode) -> bool {
        if self.pos.manhattan_distance(&other.pos) != 1 {
            return false;
        }
        self.axis == other.axis || self.kind.bridges_axes() || other.kind.bridges_axes()
    }

    /// Speed multiplier for rotation passing from `self` into `other`.
    pub fn gear_ratio_to(&self, other: &KineticNode) -> Fixed64 {
        match (self.kind, other.kind) {
            (NodeType::LargeCogwheel, NodeType::SmallCogwheel) => Fixed64::from_num(2),
            (NodeType::SmallCogwheel, NodeType::LargeCogwheel) => Fixed64::from_num(0.5),
            _ => Fixed64::ONE,
        }
    }

    /// Whether rotation passing from `self` into `other` flips direction.
    ///
    /// Meshed cogwheels always reverse. A gearbox reverses only when the
    /// rotation turns a corner, which means its neighbor is a cogwheel on
    /// another axis.
    pub fn should_reverse(&self, other: &KineticNode) -> bool {
        match self.kind {
            NodeType::SmallCogwheel | NodeType::LargeCogwheel => true,
            NodeType::Gearbox => self.axis != other.axis,
            _ => false,
        }
    }

    /// Speed delivered to `other`: `|rpm| * ratio * efficiency`, negated when
    /// the connection reverses direction.
    ///
    /// Saturates at the fixed-point range instead of overflowing.
    pub fn output_rpm_to(&self, other: &KineticNode, efficiency: Fixed64) -> Fixed64 {
        let out = self
            .rpm
            .saturating_abs()
            .saturating_mul(self.gear_ratio_to(other))
            .saturating_mul(efficiency);
        if self.should_reverse(other) { -out } else { out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn node(x: i32, kind: NodeType, axis: Axis) -> KineticNode {
        KineticNode::new(BlockPos::new(x, 0, 0), kind, axis)
    }

    #[test]
    fn every_type_is_exactly_one_role_or_transmission() {
        for kind in NodeType::ALL {
            let p = kind.default_profile();
            assert!(p.impact >= Fixed64::ZERO && p.capacity >= Fixed64::ZERO);
            assert!(
                p.impact == Fixed64::ZERO || p.capacity == Fixed64::ZERO,
                "{kind:?} is both a consumer and a generator"
            );
        }
    }

    #[test]
    fn type_names_round_trip() {
        for kind in NodeType::ALL {
            assert_eq!(NodeType::from_name(kind.name()), Some(kind));
        }
        assert_eq!(NodeType::from_name("flux_capacitor"), None);
    }

    #[test]
    fn negative_profile_values_are_clamped() {
        let p = StressProfile::new(fixed(-3.0), fixed(-1.0));
        assert_eq!(p.impact, Fixed64::ZERO);
        assert_eq!(p.capacity, Fixed64::ZERO);
    }

    #[test]
    fn roles_follow_profile() {
        let wheel = node(0, NodeType::WaterWheel, Axis::X);
        let press = node(1, NodeType::MechanicalPress, Axis::X);
        let cog = node(2, NodeType::SmallCogwheel, Axis::X);
        assert!(wheel.is_generator() && !wheel.is_consumer());
        assert!(press.is_consumer() && !press.is_generator());
        assert!(cog.is_transmission());
    }

    #[test]
    fn same_axis_neighbors_connect() {
        let a = node(0, NodeType::Shaft, Axis::X);
        let b = node(1, NodeType::Shaft, Axis::X);
        assert!(a.can_connect_to(&b));
        assert!(b.can_connect_to(&a));
    }

    #[test]
    fn perpendicular_shafts_do_not_connect() {
        let a = node(0, NodeType::Shaft, Axis::X);
        let b = node(1, NodeType::Shaft, Axis::Z);
        assert!(!a.can_connect_to(&b));
    }

    #[test]
    fn cogwheel_bridges_perpendicular_axes() {
        let a = node(0, NodeType::Shaft, Axis::X);
        let b = node(1, NodeType::SmallCogwheel, Axis::Z);
        assert!(a.can_connect_to(&b));
        assert!(b.can_connect_to(&a));
    }

    #[test]
    fn gearbox_does_not_bridge_to_perpendicular_shafts() {
        let gearbox = node(0, NodeType::Gearbox, Axis::X);
        let shaft = node(1, NodeType::Shaft, Axis::Z);
        let inline = node(1, NodeType::Shaft, Axis::X);
        let cog = node(1, NodeType::LargeCogwheel, Axis::Z);
        assert!(!gearbox.can_connect_to(&shaft));
        assert!(!shaft.can_connect_to(&gearbox));
        assert!(gearbox.can_connect_to(&inline));
        assert!(gearbox.can_connect_to(&cog));
    }

    #[test]
    fn distant_nodes_never_connect() {
        let a = node(0, NodeType::Shaft, Axis::X);
        let b = node(2, NodeType::Shaft, Axis::X);
        let diagonal = KineticNode::new(BlockPos::new(1, 1, 0), NodeType::Shaft, Axis::X);
        assert!(!a.can_connect_to(&b));
        assert!(!a.can_connect_to(&diagonal));
    }

    #[test]
    fn gear_ratios() {
        let large = node(0, NodeType::LargeCogwheel, Axis::Y);
        let small = node(1, NodeType::SmallCogwheel, Axis::Y);
        let shaft = node(2, NodeType::Shaft, Axis::Y);
        assert_eq!(large.gear_ratio_to(&small), fixed(2.0));
        assert_eq!(small.gear_ratio_to(&large), fixed(0.5));
        assert_eq!(small.gear_ratio_to(&shaft), Fixed64::ONE);
        assert_eq!(large.gear_ratio_to(&large), Fixed64::ONE);
    }

    #[test]
    fn cogwheels_reverse_and_shafts_do_not() {
        let cog = node(0, NodeType::SmallCogwheel, Axis::Y);
        let shaft = node(1, NodeType::Shaft, Axis::Y);
        assert!(cog.should_reverse(&shaft));
        assert!(!shaft.should_reverse(&cog));
    }

    #[test]
    fn gearbox_reverses_only_around_corners() {
        let gearbox = node(0, NodeType::Gearbox, Axis::X);
        let inline = node(1, NodeType::Shaft, Axis::X);
        let corner = KineticNode::new(BlockPos::new(0, 0, 1), NodeType::SmallCogwheel, Axis::Z);
        assert!(gearbox.can_connect_to(&corner));
        assert!(!gearbox.should_reverse(&inline));
        assert!(gearbox.should_reverse(&corner));
    }

    #[test]
    fn output_rpm_applies_ratio_efficiency_and_direction() {
        let mut large = node(0, NodeType::LargeCogwheel, Axis::Y);
        let small = node(1, NodeType::SmallCogwheel, Axis::Y);
        large.set_rpm(fixed(-64.0));
        let out = large.output_rpm_to(&small, fixed(0.5));
        // |-64| * 2 * 0.5, reversed by the mesh.
        assert_eq!(out, fixed(-64.0));

        let mut shaft = node(2, NodeType::Shaft, Axis::Y);
        shaft.set_rpm(fixed(32.0));
        assert_eq!(shaft.output_rpm_to(&small, Fixed64::ONE), fixed(32.0));
    }

    #[test]
    fn output_rpm_saturates_instead_of_overflowing() {
        let mut large = node(0, NodeType::LargeCogwheel, Axis::Y);
        let small = node(1, NodeType::SmallCogwheel, Axis::Y);
        large.set_rpm(fixed(1_500_000_000.0));
        assert_eq!(large.output_rpm_to(&small, Fixed64::ONE), -Fixed64::MAX);

        large.set_rpm(Fixed64::MIN);
        assert!(large.output_rpm_to(&small, fixed(0.5)) < Fixed64::ZERO);
    }

    #[test]
    fn reversed_flag_tracks_sign() {
        let mut shaft = node(0, NodeType::Shaft, Axis::Y);
        shaft.set_rpm(fixed(-1.0));
        assert!(shaft.is_reversed());
        shaft.set_rpm(fixed(1.0));
        assert!(!shaft.is_reversed());
    }

    #[test]
    fn generated_rpm_only_sticks_on_generators() {
        let mut wheel = node(0, NodeType::WaterWheel, Axis::Y);
        let mut shaft = node(1, NodeType::Shaft, Axis::Y);
        wheel.set_generated_rpm(fixed(16.0));
        shaft.set_generated_rpm(fixed(16.0));
        assert_eq!(wheel.generated_rpm(), fixed(16.0));
        assert_eq!(shaft.generated_rpm(), Fixed64::ZERO);
    }
}
