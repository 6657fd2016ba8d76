//! Events emitted by the simulation each frame
//!
//! `SimulationWorld::tick` returns these for the rendering/UI layer. Reward
//! events are additionally routed to the registered reward handler, which is
//! the inventory layer's only way of learning about new items.

use serde::{Deserialize, Serialize};

use crate::combat::HostileArchetype;
use crate::core::types::{EntityId, ItemCounts, Position};
use crate::crafting::QualityTier;

/// Where a reward came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardSource {
    Gathering { nodes: Vec<EntityId> },
    Combat { hostile: EntityId },
    WorldEvent { event_id: String },
    Quest { quest_id: String },
}

/// Items granted to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEvent {
    pub source: RewardSource,
    pub items: ItemCounts,
}

/// Payout for a hostile that died. Produced exactly once per hostile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostileDeath {
    pub id: EntityId,
    pub archetype: HostileArchetype,
    pub position: Position,
    pub xp: u32,
    /// One item drawn uniformly from the loot table (None if the table is empty)
    pub drop: Option<String>,
}

/// A finished craft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProduced {
    pub recipe_id: String,
    pub item: String,
    pub quality: QualityTier,
}

/// Events generated during a simulation tick
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// Items for the inventory layer
    Reward(RewardEvent),
    /// A hostile spawned
    HostileSpawned {
        id: EntityId,
        archetype: HostileArchetype,
    },
    /// A hostile died and paid out
    HostileKilled(HostileDeath),
    /// Hostiles damaged the player this frame
    PlayerDamaged { amount: f32, remaining: f32 },
    /// Player health hit zero and was restored at the spawn point
    PlayerDefeated,
    /// Player reached a new level
    LevelUp { level: u32 },
    /// A craft finished
    ItemProduced(ItemProduced),
    /// A craft reached completion but the materials were gone
    CraftAborted { recipe_id: String },
    /// A world event activated
    WorldEventStarted { event_id: String },
    /// A duration-bound world event ran out
    WorldEventEnded { event_id: String },
    /// A quest's objectives are all complete
    QuestCompleted { quest_id: String },
    /// Human-readable toast text; not part of simulation correctness
    Notification(String),
}

impl SimulationEvent {
    pub fn notify(message: impl Into<String>) -> Self {
        SimulationEvent::Notification(message.into())
    }
}
