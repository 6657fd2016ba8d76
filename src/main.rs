//! Live World - headless runner
//!
//! Drives a `SimulationWorld` with a simple scripted player: walk to the
//! nearest gatherable node, fight whatever comes close, craft whenever the
//! materials allow, and feed matched progress to the quest tracker. Prints a
//! summary at the end.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use live_world::core::config::WorldConfig;
use live_world::core::error::Result;
use live_world::core::types::{ground_direction, ground_distance};
use live_world::inventory::{Inventory, ItemStore};
use live_world::persistence::{JsonFileStore, PersistenceAdapter};
use live_world::quests::Progress;
use live_world::simulation::{RewardSource, SimulationEvent, SimulationWorld};

/// Player walking speed (units per second)
const WALK_SPEED: f32 = 5.0;

/// Seconds between two player swings
const SWING_INTERVAL: f32 = 1.0;

/// Seconds between two attempts to win the herbalist over
const GIFT_INTERVAL: f32 = 30.0;

/// Headless Live World runner
#[derive(Parser, Debug)]
#[command(name = "live-world")]
#[command(about = "Run the live world simulation headless and print a summary")]
struct Args {
    /// Random seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 900.0)]
    seconds: f32,

    /// Frame delta in seconds
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// World config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for saved progress. Without it nothing touches disk.
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    seed: u64,
    simulated_seconds: f64,
    time_of_day: String,
    rewards: u32,
    kills: u32,
    crafted: Vec<String>,
    world_events: Vec<String>,
    quests_completed: Vec<String>,
    defeats: u32,
    level: u32,
    inventory: live_world::core::types::ItemCounts,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("live_world=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let persistence = match &args.save_dir {
        Some(dir) => PersistenceAdapter::new(Box::new(JsonFileStore::open(dir)?)),
        None => PersistenceAdapter::in_memory(),
    };

    let mut world = SimulationWorld::new(config, persistence)?;
    world.set_notification_handler(|message| tracing::info!("{}", message));
    world.init();

    let mut inventory = world.load_inventory().unwrap_or_default();
    let mut summary = RunSummary {
        seed: world.config().seed,
        ..RunSummary::default()
    };

    let dt = if args.dt.is_finite() && args.dt > 0.0 { args.dt } else { 0.1 };
    let frames = (args.seconds.max(0.0) / dt).ceil() as u64;
    let mut swing_timer = 0.0;
    let mut gift_timer = 0.0;

    for _ in 0..frames {
        swing_timer += dt;
        gift_timer += dt;

        let position = world.player().position;
        if world.combat().nearest_target(position).is_some() {
            if swing_timer >= SWING_INTERVAL {
                swing_timer = 0.0;
                world.player_attack();
            }
        } else {
            walk_to_nearest_node(&mut world, &inventory, dt);
        }

        try_craft(&mut world, &inventory);

        if gift_timer >= GIFT_INTERVAL {
            gift_timer = 0.0;
            try_gift(&mut world, &mut inventory);
        }

        for event in world.tick(dt, &mut inventory) {
            record(&mut world, &event, &mut summary);
        }
    }

    world.save_inventory(&inventory);
    world.flush();

    summary.simulated_seconds = world.clock().now();
    summary.time_of_day = format!("{:?}", world.clock().time_of_day());
    summary.level = world.player().level;
    summary.inventory = inventory.snapshot();
    print_summary(&summary, &args.format)?;
    Ok(())
}

fn walk_to_nearest_node(world: &mut SimulationWorld, inventory: &ItemStore, dt: f32) {
    let position = world.player().position;
    let tools = world.crafting().tool_tags(inventory);
    let Some(target) = world
        .gathering()
        .nearest_gatherable(position, &tools)
        .map(|node| node.position)
    else {
        return;
    };

    let distance = ground_distance(position, target);
    if distance > 1.0 {
        let step = (WALK_SPEED * dt).min(distance - 1.0);
        world.move_player(position + ground_direction(position, target) * step);
    }
}

/// Start the first recipe the inventory covers, skipping tools already held
fn try_craft(world: &mut SimulationWorld, inventory: &ItemStore) {
    if world.crafting().active_job().is_some() {
        return;
    }
    let candidate = world
        .crafting()
        .catalog()
        .all()
        .iter()
        .filter(|r| r.result.tool_tag.is_none() || inventory.has_quantity(&r.result.name) == 0)
        .find(|r| world.crafting().can_craft(&r.id, inventory))
        .map(|r| r.id.clone());

    if let Some(recipe_id) = candidate {
        if let Err(e) = world.start_craft(&recipe_id, inventory) {
            tracing::debug!("Could not start {}: {}", recipe_id, e);
        }
    }
}

fn try_gift(world: &mut SimulationWorld, inventory: &mut ItemStore) {
    if inventory.has_quantity("Flower") == 0 || world.quests().is_locked("herbalist_favour") {
        return;
    }
    if world.interact("lina").is_err() {
        return;
    }
    match world.give_gift("lina", "Flower", inventory) {
        Ok(relationship) => {
            progress(world, "herbalist_favour", 0, Progress::Complete);
            progress(world, "herbalist_favour", 1, Progress::Count(relationship as u32));
        }
        Err(e) => tracing::debug!("Gift refused: {}", e),
    }
    world.end_interaction("lina");
}

/// Match one simulation event against the quest objectives and tally it
fn record(world: &mut SimulationWorld, event: &SimulationEvent, summary: &mut RunSummary) {
    match event {
        SimulationEvent::Reward(reward) => {
            summary.rewards += 1;
            if let RewardSource::Gathering { .. } = reward.source {
                if let Some(&wood) = reward.items.get("Wood") {
                    progress(world, "first_harvest", 0, Progress::Add(wood));
                }
            }
        }
        SimulationEvent::HostileKilled(_) => {
            summary.kills += 1;
            progress(world, "monster_hunter", 0, Progress::Add(1));
        }
        SimulationEvent::ItemProduced(item) => {
            summary.crafted.push(format!("{} ({})", item.item, item.quality));
            if item.recipe_id == "pickaxe" {
                progress(world, "toolmaker", 0, Progress::Complete);
            }
        }
        SimulationEvent::WorldEventStarted { event_id } => {
            summary.world_events.push(event_id.clone());
        }
        SimulationEvent::QuestCompleted { quest_id } => {
            summary.quests_completed.push(quest_id.clone());
        }
        SimulationEvent::PlayerDefeated => summary.defeats += 1,
        _ => {}
    }
}

fn progress(world: &mut SimulationWorld, quest_id: &str, objective: usize, progress: Progress) {
    if let Err(e) = world.record_quest_progress(quest_id, objective, progress) {
        tracing::debug!("Progress not recorded: {}", e);
    }
}

fn print_summary(summary: &RunSummary, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("=== LIVE WORLD (seed {}) ===", summary.seed);
    println!("Simulated:   {:.1}s ({})", summary.simulated_seconds, summary.time_of_day);
    println!("Rewards:     {}", summary.rewards);
    println!("Kills:       {}", summary.kills);
    println!("Defeats:     {}", summary.defeats);
    println!("Level:       {}", summary.level);
    println!("Crafted:     {}", summary.crafted.join(", "));
    println!("Events:      {}", summary.world_events.join(", "));
    println!("Quests:      {}", summary.quests_completed.join(", "));
    println!("Inventory:");
    for (item, count) in &summary.inventory {
        println!("  {:<16} {}", item, count);
    }
    Ok(())
}
