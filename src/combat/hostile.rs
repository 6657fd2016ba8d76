//! Hostile creatures - archetypes, stats and per-entity combat state

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Position};

/// Hostile creature archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostileArchetype {
    Slime,
    Wolf,
    Skeleton,
    Golem,
}

/// Base stats for an archetype
#[derive(Debug, Clone, Copy)]
pub struct HostileStats {
    pub max_health: f32,
    pub damage: f32,
    /// Units per second
    pub speed: f32,
    pub xp_value: u32,
    pub loot: &'static [&'static str],
}

impl HostileArchetype {
    pub const ALL: [HostileArchetype; 4] = [
        HostileArchetype::Slime,
        HostileArchetype::Wolf,
        HostileArchetype::Skeleton,
        HostileArchetype::Golem,
    ];

    pub fn stats(&self) -> HostileStats {
        match self {
            HostileArchetype::Slime => HostileStats {
                max_health: 30.0,
                damage: 5.0,
                speed: 2.0,
                xp_value: 10,
                loot: &["Slime Gel", "Coin"],
            },
            HostileArchetype::Wolf => HostileStats {
                max_health: 50.0,
                damage: 10.0,
                speed: 4.0,
                xp_value: 25,
                loot: &["Wolf Pelt", "Bone", "Coin"],
            },
            HostileArchetype::Skeleton => HostileStats {
                max_health: 60.0,
                damage: 12.0,
                speed: 3.0,
                xp_value: 35,
                loot: &["Bone", "Iron Ore", "Coin"],
            },
            HostileArchetype::Golem => HostileStats {
                max_health: 120.0,
                damage: 20.0,
                speed: 1.5,
                xp_value: 80,
                loot: &["Stone", "Crystal"],
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HostileArchetype::Slime => "slime",
            HostileArchetype::Wolf => "wolf",
            HostileArchetype::Skeleton => "skeleton",
            HostileArchetype::Golem => "golem",
        }
    }
}

/// Behaviour state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostileState {
    /// Walking towards the player
    Seeking,
    /// In range, hitting on cooldown
    Attacking,
}

/// A live hostile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hostile {
    pub id: EntityId,
    pub archetype: HostileArchetype,
    pub position: Position,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    pub speed: f32,
    pub xp_value: u32,
    pub loot_table: Vec<String>,
    pub state: HostileState,
    /// Yaw in radians
    pub facing: f32,
    /// Seconds until the next hit may land
    pub(crate) attack_cooldown: f32,
}

impl Hostile {
    pub fn new(id: EntityId, archetype: HostileArchetype, position: Position) -> Self {
        let stats = archetype.stats();
        Self {
            id,
            archetype,
            position,
            health: stats.max_health,
            max_health: stats.max_health,
            damage: stats.damage,
            speed: stats.speed,
            xp_value: stats.xp_value,
            loot_table: stats.loot.iter().map(|s| s.to_string()).collect(),
            state: HostileState::Seeking,
            facing: 0.0,
            attack_cooldown: 0.0,
        }
    }

    /// Override health and max health
    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self.max_health = health;
        self
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Apply damage. Health never goes up: non-finite or non-positive
    /// amounts are ignored.
    ///
    /// Returns true only for the hit that takes health from above zero to
    /// zero or below.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        let was_alive = !self.is_dead();
        self.health -= amount;
        was_alive && self.is_dead()
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_stats() {
        for archetype in HostileArchetype::ALL {
            let stats = archetype.stats();
            assert!(stats.max_health > 0.0, "{}", archetype.label());
            assert!(stats.speed > 0.0);
            assert!(!stats.loot.is_empty());
        }
        assert!(HostileArchetype::Golem.stats().max_health > HostileArchetype::Slime.stats().max_health);
    }

    #[test]
    fn test_take_damage_crosses_once() {
        let mut h = Hostile::new(EntityId(1), HostileArchetype::Wolf, Position::ZERO).with_health(50.0);
        assert!(!h.take_damage(30.0));
        assert_eq!(h.health, 20.0);
        assert!(h.take_damage(30.0));
        assert!(h.is_dead());
        // Further damage never reports another crossing
        assert!(!h.take_damage(30.0));
    }

    #[test]
    fn test_health_never_increases() {
        let mut h = Hostile::new(EntityId(1), HostileArchetype::Slime, Position::ZERO);
        let before = h.health;
        assert!(!h.take_damage(-10.0));
        assert!(!h.take_damage(f32::NAN));
        assert_eq!(h.health, before);
        assert_eq!(h.health_fraction(), 1.0);
    }
}
