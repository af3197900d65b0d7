//! Water wheel example: a gear train, an overload, and a repair.
//!
//! Builds a water wheel driving a shaft, a large/small cogwheel pair and a
//! row of presses. Prints speeds along the train, then overloads the wheel
//! until the network stalls, breaks presses until it recovers, and finally
//! saves and reloads the layout.
//!
//! Loads `kinetic.{ron,toml,json}` from the directory given as the first
//! argument, if any. Set `RUST_LOG=debug` to see structural changes.
//!
//! Run with: `cargo run -p kinetic-examples --example water_wheel`

use std::path::PathBuf;

use kinetic_core::config::KineticConfig;
use kinetic_core::event::KineticEvent;
use kinetic_core::fixed::Fixed64;
use kinetic_core::index::NetworkIndex;
use kinetic_core::node::NodeType;
use kinetic_core::pos::BlockPos;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(dir) => kinetic_data::load_config(&PathBuf::from(dir))?,
        None => KineticConfig::default(),
    };
    let mut world = NetworkIndex::with_config(config);

    // --- Gear train ---

    let wheel = BlockPos::new(0, 0, 0);
    world.create_node(wheel, NodeType::WaterWheel)?;
    world.create_node(BlockPos::new(1, 0, 0), NodeType::Shaft)?;
    world.create_node(BlockPos::new(2, 0, 0), NodeType::LargeCogwheel)?;
    world.create_node(BlockPos::new(3, 0, 0), NodeType::SmallCogwheel)?;
    world.create_node(BlockPos::new(4, 0, 0), NodeType::MechanicalPress)?;
    world.set_generator_speed(wheel, Fixed64::from_num(16))?;

    let mut tick = 1;
    world.tick(tick);
    print_train(&world, 5);

    // --- Overload ---

    // 512 capacity against 8 per press: 64 more presses tip it over.
    for z in 1..=64 {
        world.create_node(BlockPos::new(4, 0, z), NodeType::MechanicalPress)?;
    }
    let stats = world.stats();
    info!(
        nodes = stats.node_count,
        overstressed = stats.overstressed_count,
        "press row built"
    );

    for _ in 0..1_000 {
        tick += 1;
        let events = world.tick(tick);
        report(&events);
        if events.iter().any(|e| matches!(e, KineticEvent::Stalled { .. })) {
            break;
        }
    }

    // --- Repair ---

    for z in (60..=64).rev() {
        world.remove_node(BlockPos::new(4, 0, z))?;
    }
    tick += 1;
    report(&world.tick(tick));
    print_train(&world, 5);

    // --- Save and reload ---

    let path = std::env::temp_dir().join("kinetic-water-wheel.json");
    world.save_all(&path)?;
    let mut reloaded = NetworkIndex::with_config(world.config().clone());
    reloaded.load_all(&path)?;
    info!(
        path = %path.display(),
        networks = reloaded.network_count(),
        nodes = reloaded.node_count(),
        "reloaded world"
    );
    Ok(())
}

fn print_train(world: &NetworkIndex, len: i32) {
    for x in 0..len {
        let pos = BlockPos::new(x, 0, 0);
        if let Some(node) = world.node(pos) {
            info!(
                x,
                kind = node.kind().name(),
                rpm = node.rpm().to_num::<f64>(),
                reversed = node.is_reversed(),
                "train"
            );
        }
    }
    if let Some(net) = world.network_at(BlockPos::new(0, 0, 0)) {
        info!(
            stress = net.stress().to_num::<f64>(),
            capacity = net.stress_capacity().to_num::<f64>(),
            percent = net.stress_percentage().to_num::<f64>(),
            "network load"
        );
    }
}

fn report(events: &[KineticEvent]) {
    for event in events {
        match event {
            KineticEvent::Overstressed { stress, capacity, tick, .. } => warn!(
                tick,
                stress = stress.to_num::<f64>(),
                capacity = capacity.to_num::<f64>(),
                "network overstressed"
            ),
            KineticEvent::StressRelieved { tick, .. } => info!(tick, "stress relieved"),
            KineticEvent::Stalled { tick, .. } => warn!(tick, "network stalled"),
        }
    }
}
