//! Kinetic Core -- rotational power networks on a 3D block grid.
//!
//! Mechanical components (shafts, cogwheels, gearboxes, generators and
//! machines) placed next to each other on compatible axes form a network.
//! Each network shares one speed, tracks how much stress its consumers
//! impose against the capacity its generators provide, and slows down when
//! overloaded.
//!
//! # Tick Pipeline
//!
//! Each call to [`index::NetworkIndex::tick`] advances every network by one
//! step:
//!
//! 1. **Purge** -- Networks invalidated since the last tick are dropped.
//! 2. **Transition** -- Overstress entered or left emits a [`event::KineticEvent`].
//! 3. **Decay** -- Overstressed networks lose speed and stall below a threshold.
//! 4. **Propagate** -- Speeds are pushed outward from the strongest generator
//!    through shafts, gear ratios and gearboxes.
//!
//! # Structural Changes
//!
//! Placement and removal are immediate:
//!
//! ```rust,ignore
//! let mut index = NetworkIndex::new();
//! index.create_node(BlockPos::new(0, 0, 0), NodeType::WaterWheel)?;
//! index.create_node(BlockPos::new(1, 0, 0), NodeType::Shaft)?;
//! index.set_generator_speed(BlockPos::new(0, 0, 0), Fixed64::from_num(16))?;
//! let events = index.tick(1);
//! ```
//!
//! # Key Types
//!
//! - [`index::NetworkIndex`] -- Owns all networks and the position lookup.
//! - [`network::KineticNetwork`] -- One connected group and its aggregates.
//! - [`node::KineticNode`] -- A single component with its stress profile.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`persist`] -- Versioned JSON save and load of network layouts.

pub mod config;
pub mod error;
pub mod event;
pub mod fixed;
pub mod id;
pub mod index;
pub mod network;
pub mod node;
pub mod persist;
pub mod pos;
pub mod propagation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
