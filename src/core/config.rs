//! World configuration with documented constants
//!
//! All tuning numbers live here so that gameplay pacing can be changed from a
//! TOML file without touching subsystem code. Every field has a default, so a
//! config file only needs to name what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WorldError};

/// Configuration for the whole simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for the shared random source
    pub seed: u64,

    /// Real seconds in one full day cycle
    pub day_length_seconds: f32,

    /// Day-cycle scalar the world starts at (0.3 = early morning)
    pub start_day_time: f32,

    pub gathering: GatheringConfig,
    pub combat: CombatConfig,
    pub crafting: CraftingConfig,
    pub npc: NpcConfig,
    pub world_events: WorldEventConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            day_length_seconds: 600.0,
            start_day_time: 0.3,
            gathering: GatheringConfig::default(),
            combat: CombatConfig::default(),
            crafting: CraftingConfig::default(),
            npc: NpcConfig::default(),
            world_events: WorldEventConfig::default(),
        }
    }
}

/// Resource gathering tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatheringConfig {
    /// The actor must stand closer than this to a node to gather it
    pub proximity_radius: f32,

    /// Radius around the origin in which the default layout scatters nodes
    pub scatter_radius: f32,
}

impl Default for GatheringConfig {
    fn default() -> Self {
        Self {
            proximity_radius: 2.0,
            scatter_radius: 40.0,
        }
    }
}

/// Hostile spawning and damage exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Seconds between spawn attempts
    pub spawn_interval_seconds: f32,

    /// Spawning pauses while this many hostiles are alive
    pub max_hostiles: usize,

    /// Spawn ring around the player (world units)
    pub spawn_min_distance: f32,
    pub spawn_max_distance: f32,

    /// Hostiles stop and attack inside this range
    pub attack_range: f32,

    /// Seconds between two damage ticks from the same hostile.
    ///
    /// Damage is applied once per cooldown rather than per frame, so the
    /// damage rate does not depend on the frame rate.
    pub attack_cooldown_seconds: f32,

    /// Damage range of a player attack
    pub player_damage_min: u32,
    pub player_damage_max: u32,

    /// Player attacks only reach hostiles inside this radius
    pub engagement_radius: f32,

    /// Hostiles further than this from the player are dropped without payout
    pub despawn_distance: f32,

    pub player_max_health: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            spawn_interval_seconds: 10.0,
            max_hostiles: 5,
            spawn_min_distance: 15.0,
            spawn_max_distance: 25.0,
            attack_range: 2.0,
            attack_cooldown_seconds: 2.0,
            player_damage_min: 25,
            player_damage_max: 40,
            engagement_radius: 10.0,
            despawn_distance: 60.0,
            player_max_health: 100.0,
        }
    }
}

/// Quality roll thresholds for finished crafts
///
/// A uniform roll above `legendary_threshold` is legendary, above
/// `epic_threshold` epic, above `rare_threshold` rare, otherwise common.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingConfig {
    pub legendary_threshold: f32,
    pub epic_threshold: f32,
    pub rare_threshold: f32,
}

impl Default for CraftingConfig {
    fn default() -> Self {
        Self {
            legendary_threshold: 0.95,
            epic_threshold: 0.85,
            rare_threshold: 0.70,
        }
    }
}

/// NPC relationship tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Relationship gained from a favourite gift
    pub favorite_gift_bonus: u8,

    /// Relationship gained from any other gift
    pub regular_gift_bonus: u8,

    /// Romance dialogue only surfaces above this relationship
    pub romance_threshold: u8,

    /// Walking speed while patrolling (units per second)
    pub patrol_speed: f32,

    /// Day-cycle window in which villagers will talk. Outside it they rest.
    pub active_from: f32,
    pub active_until: f32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            favorite_gift_bonus: 20,
            regular_gift_bonus: 5,
            romance_threshold: 50,
            patrol_speed: 1.5,
            active_from: 0.25,
            active_until: 0.75,
        }
    }
}

/// World event scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldEventConfig {
    /// Simulated seconds between scheduling checks while no event is active
    pub check_interval_seconds: f32,
}

impl Default for WorldEventConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 300.0,
        }
    }
}

impl WorldConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from a TOML string and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: WorldConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(self.day_length_seconds > 0.0) {
            return Err(invalid(format!(
                "day_length_seconds ({}) must be positive",
                self.day_length_seconds
            )));
        }

        if !(0.0..1.0).contains(&self.start_day_time) {
            return Err(invalid(format!(
                "start_day_time ({}) must be in [0, 1)",
                self.start_day_time
            )));
        }

        if !(self.gathering.proximity_radius > 0.0) {
            return Err(invalid("gathering.proximity_radius must be positive".into()));
        }

        let c = &self.combat;
        if !(c.spawn_interval_seconds > 0.0) || !(c.attack_cooldown_seconds > 0.0) {
            return Err(invalid("combat intervals must be positive".into()));
        }
        if c.spawn_min_distance > c.spawn_max_distance {
            return Err(invalid(format!(
                "spawn_min_distance ({}) should be <= spawn_max_distance ({})",
                c.spawn_min_distance, c.spawn_max_distance
            )));
        }
        if c.player_damage_min > c.player_damage_max {
            return Err(invalid(format!(
                "player_damage_min ({}) should be <= player_damage_max ({})",
                c.player_damage_min, c.player_damage_max
            )));
        }
        if c.despawn_distance <= c.spawn_max_distance {
            return Err(invalid(format!(
                "despawn_distance ({}) should be > spawn_max_distance ({})",
                c.despawn_distance, c.spawn_max_distance
            )));
        }

        let q = &self.crafting;
        if !(q.rare_threshold < q.epic_threshold && q.epic_threshold < q.legendary_threshold) {
            return Err(invalid(format!(
                "quality thresholds must increase: rare ({}) < epic ({}) < legendary ({})",
                q.rare_threshold, q.epic_threshold, q.legendary_threshold
            )));
        }
        if q.legendary_threshold >= 1.0 || q.rare_threshold < 0.0 {
            return Err(invalid("quality thresholds must lie in [0, 1)".into()));
        }

        if self.npc.romance_threshold > 100 {
            return Err(invalid("npc.romance_threshold must be <= 100".into()));
        }
        let n = &self.npc;
        if !(0.0..=1.0).contains(&n.active_from) || !(0.0..=1.0).contains(&n.active_until) {
            return Err(invalid(format!(
                "npc active window ({}..{}) must lie in [0, 1]",
                n.active_from, n.active_until
            )));
        }

        if !(self.world_events.check_interval_seconds > 0.0) {
            return Err(invalid("world_events.check_interval_seconds must be positive".into()));
        }

        Ok(())
    }
}

fn invalid(message: String) -> WorldError {
    WorldError::InvalidConfig(message)
}
