//! Player combat state: health, XP and level

use serde::{Deserialize, Serialize};

use crate::core::types::Position;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Position,
    /// Where the player is restored after being defeated
    pub spawn_point: Position,
    pub health: f32,
    pub max_health: f32,
    /// XP collected towards the next level
    pub xp: u32,
    pub total_xp: u32,
    pub level: u32,
}

impl PlayerState {
    pub fn new(spawn_point: Position, max_health: f32) -> Self {
        Self {
            position: spawn_point,
            spawn_point,
            health: max_health,
            max_health,
            xp: 0,
            total_xp: 0,
            level: 1,
        }
    }

    /// XP needed to go from the current level to the next
    pub fn xp_to_next_level(&self) -> u32 {
        self.level * 100
    }

    /// Subtract damage. Returns true if this knocked the player down.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !amount.is_finite() || amount <= 0.0 || self.health <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.health <= 0.0
    }

    /// Back to the spawn point at full health
    pub fn restore(&mut self) {
        self.health = self.max_health;
        self.position = self.spawn_point;
    }

    pub fn heal(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.health = (self.health + amount).min(self.max_health);
        }
    }

    /// Add XP. Returns every level reached along the way.
    pub fn grant_xp(&mut self, amount: u32) -> Vec<u32> {
        self.xp += amount;
        self.total_xp += amount;
        let mut reached = Vec::new();
        while self.xp >= self.xp_to_next_level() {
            self.xp -= self.xp_to_next_level();
            self.level += 1;
            reached.push(self.level);
        }
        reached
    }
}
