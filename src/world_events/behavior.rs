//! Per-event behaviours
//!
//! Every event runs the same activate -> tick -> expire lifecycle. Behaviours
//! own their transient actors in the registry and describe their effect on
//! the rest of the world as `EventEffect` commands, which the simulation
//! world applies to the subsystems that own the affected state.

use std::fmt;

use crate::core::clock::FrameTime;
use crate::core::rng::SimRng;
use crate::core::types::{ground_distance, item_counts, ring_point, EntityId, EntityKind, ItemCounts, Position};
use crate::ecs::EntityRegistry;
use crate::npc::Shop;

/// A change an event asks the world to make
#[derive(Debug, Clone, PartialEq)]
pub enum EventEffect {
    /// Items for the player
    Reward(ItemCounts),
    /// Bring back every depleted resource node now
    RespawnAllNodes,
    /// Damage hostiles around a point
    DamageArea {
        center: Position,
        radius: f32,
        amount: f32,
    },
}

/// What a behaviour can see and touch during one call
pub struct EventContext<'a> {
    pub frame: FrameTime,
    pub player_position: Position,
    pub registry: &'a mut EntityRegistry,
    pub rng: &'a mut SimRng,
}

pub trait WorldEventBehavior: fmt::Debug {
    fn activate(&mut self, ctx: &mut EventContext<'_>) -> Vec<EventEffect>;

    fn tick(&mut self, _ctx: &mut EventContext<'_>) -> Vec<EventEffect> {
        Vec::new()
    }

    /// Tear down any actors. Called once when the session ends.
    fn expire(&mut self, _registry: &mut EntityRegistry) -> Vec<EventEffect> {
        Vec::new()
    }

    /// Registry ids of the actors this event currently owns
    fn actors(&self) -> Vec<EntityId> {
        Vec::new()
    }

    /// Goods on offer while the event runs
    fn shop(&self) -> Option<&Shop> {
        None
    }
}

const METEOR_INTERVAL_SECONDS: f32 = 3.0;
const METEOR_START_HEIGHT: f32 = 30.0;
const METEOR_FALL_SPEED: f32 = 15.0;
const METEOR_SCATTER: (f32, f32) = (3.0, 20.0);
const IMPACT_RADIUS: f32 = 4.0;
const IMPACT_DAMAGE: f32 = 40.0;
const PICKUP_RADIUS: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct Meteor {
    pub id: EntityId,
    pub position: Position,
}

/// Meteors fall around the player, hurt hostiles where they land and leave a
/// star fragment to pick up
#[derive(Debug, Default)]
pub struct MeteorShower {
    meteors: Vec<Meteor>,
    fragments: Vec<(EntityId, Position)>,
    spawn_timer: f32,
}

impl MeteorShower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meteors(&self) -> &[Meteor] {
        &self.meteors
    }

    pub fn fragments(&self) -> &[(EntityId, Position)] {
        &self.fragments
    }

    fn launch(&mut self, ctx: &mut EventContext<'_>) {
        let angle = ctx.rng.angle();
        let distance = ctx.rng.range_f32(METEOR_SCATTER.0, METEOR_SCATTER.1);
        let mut position = ring_point(ctx.player_position, angle, distance);
        position.y = METEOR_START_HEIGHT;
        let id = ctx.registry.spawn(EntityKind::EventActor, position);
        self.meteors.push(Meteor { id, position });
    }
}

impl WorldEventBehavior for MeteorShower {
    fn activate(&mut self, ctx: &mut EventContext<'_>) -> Vec<EventEffect> {
        self.launch(ctx);
        Vec::new()
    }

    fn tick(&mut self, ctx: &mut EventContext<'_>) -> Vec<EventEffect> {
        let mut effects = Vec::new();
        let dt = ctx.frame.delta;

        self.spawn_timer += dt;
        while self.spawn_timer >= METEOR_INTERVAL_SECONDS {
            self.spawn_timer -= METEOR_INTERVAL_SECONDS;
            self.launch(ctx);
        }

        let mut landed = Vec::new();
        for meteor in &mut self.meteors {
            meteor.position.y -= METEOR_FALL_SPEED * dt;
            if meteor.position.y <= 0.0 {
                meteor.position.y = 0.0;
                landed.push(*meteor);
            } else {
                ctx.registry.set_position(meteor.id, meteor.position);
            }
        }

        for meteor in landed {
            self.meteors.retain(|m| m.id != meteor.id);
            ctx.registry.despawn(meteor.id);
            tracing::debug!("Meteor {} landed at ({:.1}, {:.1})", meteor.id, meteor.position.x, meteor.position.z);
            effects.push(EventEffect::DamageArea {
                center: meteor.position,
                radius: IMPACT_RADIUS,
                amount: IMPACT_DAMAGE,
            });
            let fragment = ctx.registry.spawn(EntityKind::EventActor, meteor.position);
            self.fragments.push((fragment, meteor.position));
        }

        let player = ctx.player_position;
        let (collected, remaining): (Vec<_>, Vec<_>) = self
            .fragments
            .drain(..)
            .partition(|(_, pos)| ground_distance(*pos, player) < PICKUP_RADIUS);
        self.fragments = remaining;
        if !collected.is_empty() {
            for (id, _) in &collected {
                ctx.registry.despawn(*id);
            }
            effects.push(EventEffect::Reward(item_counts([(
                "Star Fragment",
                collected.len() as u32,
            )])));
        }

        effects
    }

    fn expire(&mut self, registry: &mut EntityRegistry) -> Vec<EventEffect> {
        for id in self.actors() {
            registry.despawn(id);
        }
        self.meteors.clear();
        self.fragments.clear();
        Vec::new()
    }

    fn actors(&self) -> Vec<EntityId> {
        self.meteors
            .iter()
            .map(|m| m.id)
            .chain(self.fragments.iter().map(|(id, _)| *id))
            .collect()
    }
}

const MERCHANT_DISTANCE: f32 = 6.0;

/// A stall appears near the player for the duration of the event
#[derive(Debug)]
pub struct TravelingMerchant {
    actor: Option<EntityId>,
    shop: Shop,
}

impl TravelingMerchant {
    pub fn new() -> Self {
        Self {
            actor: None,
            shop: Shop::new(
                "Coin",
                &[("Crystal", 25), ("Iron Ore", 6), ("Star Fragment", 30), ("Pickaxe", 30)],
            ),
        }
    }
}

impl Default for TravelingMerchant {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldEventBehavior for TravelingMerchant {
    fn activate(&mut self, ctx: &mut EventContext<'_>) -> Vec<EventEffect> {
        let angle = ctx.rng.angle();
        let position = ring_point(ctx.player_position, angle, MERCHANT_DISTANCE);
        self.actor = Some(ctx.registry.spawn(EntityKind::EventActor, position));
        Vec::new()
    }

    fn expire(&mut self, registry: &mut EntityRegistry) -> Vec<EventEffect> {
        if let Some(id) = self.actor.take() {
            registry.despawn(id);
        }
        Vec::new()
    }

    fn actors(&self) -> Vec<EntityId> {
        self.actor.into_iter().collect()
    }

    fn shop(&self) -> Option<&Shop> {
        self.actor.as_ref().map(|_| &self.shop)
    }
}

#[derive(Debug, Default)]
pub struct BountifulBloom;

impl WorldEventBehavior for BountifulBloom {
    fn activate(&mut self, _ctx: &mut EventContext<'_>) -> Vec<EventEffect> {
        vec![EventEffect::RespawnAllNodes]
    }
}

/// A pouch of coins
#[derive(Debug, Default)]
pub struct LuckyFind;

impl WorldEventBehavior for LuckyFind {
    fn activate(&mut self, ctx: &mut EventContext<'_>) -> Vec<EventEffect> {
        let coins = ctx.rng.range_inclusive(5, 15);
        vec![EventEffect::Reward(item_counts([("Coin", coins)]))]
    }
}
