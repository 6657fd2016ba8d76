//! Combat system - hostile spawning, pursuit, damage exchange and death payout
//!
//! Hostiles live in an arena (`Vec<Hostile>`) with an id -> slot index, so
//! damage can be routed to a specific entity without any shared callback
//! table. Every death goes through `remove_dead`, which queues exactly one
//! `HostileDeath` per hostile; the next `tick` hands the queue to the caller.

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;

use crate::combat::hostile::{Hostile, HostileArchetype, HostileState};
use crate::core::clock::{FrameTime, TIME_EPSILON};
use crate::core::config::CombatConfig;
use crate::core::error::invariant_violation;
use crate::core::rng::SimRng;
use crate::core::types::{
    ground_direction, ground_distance, ring_point, yaw_towards, EntityId, EntityKind, Position,
};
use crate::ecs::EntityRegistry;
use crate::simulation::events::HostileDeath;

/// Result of one combat frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatTick {
    /// Total damage hostiles dealt to the player this frame
    pub damage_to_player: f32,
    /// Deaths since the previous frame, each reported once
    pub deaths: Vec<HostileDeath>,
    pub spawned: Vec<(EntityId, HostileArchetype)>,
    /// Hostiles dropped for wandering too far (no payout)
    pub despawned: Vec<EntityId>,
}

/// Outcome of damage aimed at a hostile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Nothing to hit
    NoTarget,
    Hit {
        target: EntityId,
        damage: f32,
        remaining: f32,
    },
    Killed {
        target: EntityId,
        damage: f32,
    },
}

impl DamageOutcome {
    pub fn target(&self) -> Option<EntityId> {
        match self {
            DamageOutcome::NoTarget => None,
            DamageOutcome::Hit { target, .. } | DamageOutcome::Killed { target, .. } => {
                Some(*target)
            }
        }
    }

    pub fn killed(&self) -> bool {
        matches!(self, DamageOutcome::Killed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CombatSystem {
    config: CombatConfig,
    hostiles: Vec<Hostile>,
    index: AHashMap<EntityId, usize>,
    spawn_timer: f32,
    pending_deaths: Vec<HostileDeath>,
    /// Every hostile that has already paid out
    paid_out: AHashSet<EntityId>,
}

impl CombatSystem {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            hostiles: Vec::new(),
            index: AHashMap::new(),
            spawn_timer: 0.0,
            pending_deaths: Vec::new(),
            paid_out: AHashSet::new(),
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn hostiles(&self) -> &[Hostile] {
        &self.hostiles
    }

    pub fn hostile(&self, id: EntityId) -> Option<&Hostile> {
        self.index.get(&id).map(|&slot| &self.hostiles[slot])
    }

    pub fn count(&self) -> usize {
        self.hostiles.len()
    }

    /// Seconds accumulated towards the next spawn
    pub fn spawn_timer(&self) -> f32 {
        self.spawn_timer
    }

    /// Place a hostile of the given archetype
    pub fn spawn(
        &mut self,
        registry: &mut EntityRegistry,
        archetype: HostileArchetype,
        position: Position,
    ) -> EntityId {
        let id = registry.spawn(EntityKind::Hostile, position);
        self.insert(Hostile::new(id, archetype, position));
        id
    }

    /// Place a pre-built hostile. Its id must come from `registry`.
    ///
    /// A hostile that is already dead could never cross zero health again and
    /// would never be removed, so it is refused. Returns whether it was placed;
    /// on refusal the registry entry stays with the caller.
    pub fn insert(&mut self, hostile: Hostile) -> bool {
        if self.index.contains_key(&hostile.id) {
            invariant_violation(&format!("hostile {} inserted twice", hostile.id));
            return false;
        }
        if hostile.is_dead() {
            tracing::warn!(
                "Hostile {} ({}) refused: inserted with {} health",
                hostile.id,
                hostile.archetype.label(),
                hostile.health
            );
            return false;
        }
        tracing::debug!(
            "Hostile {} ({}) spawned at ({:.1}, {:.1})",
            hostile.id,
            hostile.archetype.label(),
            hostile.position.x,
            hostile.position.z
        );
        self.index.insert(hostile.id, self.hostiles.len());
        self.hostiles.push(hostile);
        true
    }

    /// Spawn a random archetype on the ring around the player, if under the cap
    pub fn spawn_near(
        &mut self,
        player_position: Position,
        registry: &mut EntityRegistry,
        rng: &mut SimRng,
    ) -> Option<(EntityId, HostileArchetype)> {
        if self.hostiles.len() >= self.config.max_hostiles {
            return None;
        }
        let angle = rng.angle();
        let distance = rng.range_f32(self.config.spawn_min_distance, self.config.spawn_max_distance);
        let archetype = *rng.pick(&HostileArchetype::ALL)?;
        let position = ring_point(player_position, angle, distance);
        Some((self.spawn(registry, archetype, position), archetype))
    }

    /// Advance spawning and every hostile by one frame
    pub fn tick(
        &mut self,
        frame: FrameTime,
        player_position: Position,
        registry: &mut EntityRegistry,
        rng: &mut SimRng,
    ) -> CombatTick {
        let mut report = CombatTick::default();
        let dt = frame.delta;

        self.spawn_timer += dt;
        if self.spawn_timer + TIME_EPSILON >= self.config.spawn_interval_seconds {
            self.spawn_timer = 0.0;
            if let Some(spawned) = self.spawn_near(player_position, registry, rng) {
                report.spawned.push(spawned);
            }
        }

        let mut strays = Vec::new();
        for hostile in &mut self.hostiles {
            hostile.attack_cooldown = (hostile.attack_cooldown - dt).max(0.0);

            let distance = ground_distance(hostile.position, player_position);
            if distance > self.config.despawn_distance {
                strays.push(hostile.id);
                continue;
            }

            let direction = ground_direction(hostile.position, player_position);
            if direction != Position::ZERO {
                hostile.facing = yaw_towards(direction);
            }

            if distance > self.config.attack_range {
                hostile.state = HostileState::Seeking;
                let step = (hostile.speed * dt).min(distance);
                hostile.position += direction * step;
                registry.set_position(hostile.id, hostile.position);
            } else {
                hostile.state = HostileState::Attacking;
                if hostile.attack_cooldown <= TIME_EPSILON {
                    report.damage_to_player += hostile.damage;
                    hostile.attack_cooldown = self.config.attack_cooldown_seconds;
                }
            }
        }

        for id in strays {
            tracing::debug!("Hostile {} wandered off", id);
            if let Some(slot) = self.index.get(&id).copied() {
                self.remove_slot(slot, registry);
                report.despawned.push(id);
            }
        }

        report.deaths = std::mem::take(&mut self.pending_deaths);
        report
    }

    /// Damage a specific hostile. A kill queues the death payout.
    pub fn apply_damage(
        &mut self,
        id: EntityId,
        amount: f32,
        registry: &mut EntityRegistry,
        rng: &mut SimRng,
    ) -> DamageOutcome {
        let Some(slot) = self.index.get(&id).copied() else {
            return DamageOutcome::NoTarget;
        };

        let crossed = self.hostiles[slot].take_damage(amount);
        if crossed {
            self.remove_dead(slot, registry, rng);
            DamageOutcome::Killed { target: id, damage: amount }
        } else {
            DamageOutcome::Hit {
                target: id,
                damage: amount,
                remaining: self.hostiles[slot].health,
            }
        }
    }

    /// Nearest hostile within the engagement radius
    pub fn nearest_target(&self, player_position: Position) -> Option<EntityId> {
        self.hostiles
            .iter()
            .map(|h| (h.id, ground_distance(h.position, player_position)))
            .filter(|(_, d)| *d <= self.config.engagement_radius)
            .min_by_key(|(_, d)| OrderedFloat(*d))
            .map(|(id, _)| id)
    }

    /// Hit the nearest hostile in reach with a fixed amount
    pub fn strike(
        &mut self,
        player_position: Position,
        damage: f32,
        registry: &mut EntityRegistry,
        rng: &mut SimRng,
    ) -> DamageOutcome {
        match self.nearest_target(player_position) {
            Some(target) => self.apply_damage(target, damage, registry, rng),
            None => DamageOutcome::NoTarget,
        }
    }

    /// Player attack: rolls damage in the configured range against the
    /// nearest hostile in reach. No roll is made when nothing is in reach.
    pub fn attack(
        &mut self,
        player_position: Position,
        registry: &mut EntityRegistry,
        rng: &mut SimRng,
    ) -> DamageOutcome {
        let Some(target) = self.nearest_target(player_position) else {
            return DamageOutcome::NoTarget;
        };
        let damage =
            rng.range_inclusive(self.config.player_damage_min, self.config.player_damage_max) as f32;
        self.apply_damage(target, damage, registry, rng)
    }

    /// Damage every hostile within `radius` of `center`
    pub fn damage_area(
        &mut self,
        center: Position,
        radius: f32,
        amount: f32,
        registry: &mut EntityRegistry,
        rng: &mut SimRng,
    ) -> Vec<DamageOutcome> {
        let targets: Vec<EntityId> = self
            .hostiles
            .iter()
            .filter(|h| ground_distance(h.position, center) <= radius)
            .map(|h| h.id)
            .collect();

        targets
            .into_iter()
            .map(|id| self.apply_damage(id, amount, registry, rng))
            .collect()
    }

    /// Deaths queued since the last tick
    pub fn pending_deaths(&self) -> &[HostileDeath] {
        &self.pending_deaths
    }

    /// Remove every hostile without payout and reset timers
    pub fn clear(&mut self, registry: &mut EntityRegistry) {
        for hostile in self.hostiles.drain(..) {
            registry.despawn(hostile.id);
        }
        self.index.clear();
        self.pending_deaths.clear();
        self.paid_out.clear();
        self.spawn_timer = 0.0;
    }

    /// The only path by which a killed hostile leaves the world
    fn remove_dead(&mut self, slot: usize, registry: &mut EntityRegistry, rng: &mut SimRng) {
        let hostile = self.remove_slot(slot, registry);

        if !self.paid_out.insert(hostile.id) {
            invariant_violation(&format!("death payout for {} fired twice", hostile.id));
            return;
        }

        let drop = rng.pick(&hostile.loot_table).cloned();
        tracing::debug!(
            "Hostile {} ({}) died, {} xp, drop {:?}",
            hostile.id,
            hostile.archetype.label(),
            hostile.xp_value,
            drop
        );
        self.pending_deaths.push(HostileDeath {
            id: hostile.id,
            archetype: hostile.archetype,
            position: hostile.position,
            xp: hostile.xp_value,
            drop,
        });
    }

    fn remove_slot(&mut self, slot: usize, registry: &mut EntityRegistry) -> Hostile {
        let hostile = self.hostiles.swap_remove(slot);
        self.index.remove(&hostile.id);
        if let Some(moved) = self.hostiles.get(slot) {
            self.index.insert(moved.id, slot);
        }
        registry.despawn(hostile.id);
        hostile
    }
}
