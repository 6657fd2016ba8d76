//! Default world layout: resource nodes around the spawn point and the
//! village roster

use crate::core::config::WorldConfig;
use crate::core::rng::SimRng;
use crate::core::types::{ring_point, Position};
use crate::ecs::EntityRegistry;
use crate::gathering::{GatheringSystem, NodeType};
use crate::npc::{default_roster, ActiveHours, NpcSystem};

/// Where the player starts and respawns
pub const PLAYER_SPAWN: Position = Position::ZERO;

/// Scattered nodes per type
const SCATTERED: [(NodeType, usize); 5] = [
    (NodeType::Tree, 8),
    (NodeType::Rock, 6),
    (NodeType::Herb, 5),
    (NodeType::Crystal, 3),
    (NodeType::Flower, 6),
];

/// A few nodes right next to the spawn so there is something to do at once
const STARTER_NODES: [(NodeType, Position); 4] = [
    (NodeType::Tree, Position::new(4.0, 0.0, 3.0)),
    (NodeType::Rock, Position::new(-4.0, 0.0, 3.0)),
    (NodeType::Herb, Position::new(3.0, 0.0, -4.0)),
    (NodeType::Flower, Position::new(-3.0, 0.0, -4.0)),
];

/// Keep scattered nodes out of the spawn clearing
const CLEARING_RADIUS: f32 = 8.0;

/// Spawn the starter nodes, scatter the rest and place the villagers
pub fn populate(
    config: &WorldConfig,
    registry: &mut EntityRegistry,
    gathering: &mut GatheringSystem,
    npcs: &mut NpcSystem,
    rng: &mut SimRng,
) {
    for (node_type, position) in STARTER_NODES {
        gathering.spawn_node(registry, node_type, position);
    }

    let radius = config.gathering.scatter_radius.max(CLEARING_RADIUS);
    for (node_type, count) in SCATTERED {
        for _ in 0..count {
            let angle = rng.angle();
            let distance = rng.range_f32(CLEARING_RADIUS, radius);
            gathering.spawn_node(registry, node_type, ring_point(PLAYER_SPAWN, angle, distance));
        }
    }

    let hours = ActiveHours {
        from: config.npc.active_from,
        until: config.npc.active_until,
    };
    for npc in default_roster(hours) {
        npcs.spawn(registry, npc);
    }

    tracing::debug!(
        "World populated: {} nodes, {} npcs",
        gathering.nodes().len(),
        npcs.npcs().len()
    );
}
