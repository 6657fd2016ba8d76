//! Simulation world - the context object every subsystem runs inside
//!
//! One `SimulationWorld` owns the clock, the random source, the entity
//! registry and every subsystem. There is no module-level state, so any
//! number of worlds can run side by side.
//!
//! Each `tick` runs the subsystems in a fixed order:
//! Gathering -> Combat -> Crafting -> NPC patrol -> World Events -> Quests.
//! The player's position and tool tags are read once at the start of the
//! frame and every subsystem sees that same snapshot.

use serde_json::Value;

use crate::combat::{CombatSystem, DamageOutcome, PlayerState};
use crate::core::clock::{Clock, FrameTime};
use crate::core::config::WorldConfig;
use crate::core::error::{
    CraftRejection, GiftRefusal, InteractionRefusal, QuestRejection, Result, TradeRefusal,
};
use crate::core::rng::SimRng;
use crate::core::types::{item_counts, ItemCounts, Position};
use crate::crafting::{CraftJob, CraftOutcome, CraftingSystem, RecipeCatalog};
use crate::ecs::EntityRegistry;
use crate::gathering::GatheringSystem;
use crate::inventory::{Inventory, ItemStore};
use crate::npc::system::purchase;
use crate::npc::{DialogueSession, NpcSystem};
use crate::persistence::{keys, PersistenceAdapter};
use crate::quests::{default_quests, Progress, QuestStatus, QuestTracker};
use crate::simulation::events::{RewardEvent, RewardSource, SimulationEvent};
use crate::simulation::layout::{self, PLAYER_SPAWN};
use crate::world_events::{EventContext, EventEffect, EventScheduler, SchedulerTick};

/// Observer for items granted to the player
pub type RewardHandler = Box<dyn FnMut(&RewardEvent)>;

/// Observer for human-readable toasts
pub type NotificationHandler = Box<dyn FnMut(&str)>;

pub struct SimulationWorld {
    config: WorldConfig,
    clock: Clock,
    rng: SimRng,
    registry: EntityRegistry,
    player: PlayerState,
    gathering: GatheringSystem,
    combat: CombatSystem,
    crafting: CraftingSystem,
    npcs: NpcSystem,
    events: EventScheduler,
    quests: QuestTracker,
    persistence: PersistenceAdapter,
    reward_handler: Option<RewardHandler>,
    notification_handler: Option<NotificationHandler>,
    initialized: bool,
}

impl SimulationWorld {
    /// Build an empty world. Call `init` to populate it.
    pub fn new(config: WorldConfig, persistence: PersistenceAdapter) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            clock: Clock::new(config.day_length_seconds, config.start_day_time),
            rng: SimRng::from_seed(config.seed),
            registry: EntityRegistry::new(),
            player: PlayerState::new(PLAYER_SPAWN, config.combat.player_max_health),
            gathering: GatheringSystem::new(config.gathering.proximity_radius),
            combat: CombatSystem::new(config.combat.clone()),
            crafting: CraftingSystem::new(RecipeCatalog::with_defaults(), config.crafting.clone()),
            npcs: NpcSystem::new(config.npc.clone()),
            events: EventScheduler::with_defaults(config.world_events.check_interval_seconds),
            quests: QuestTracker::new(default_quests()),
            persistence,
            reward_handler: None,
            notification_handler: None,
            initialized: false,
            config,
        })
    }

    /// Replace the recipe catalog. Resets crafting state.
    pub fn with_recipes(mut self, catalog: RecipeCatalog) -> Self {
        self.crafting = CraftingSystem::new(catalog, self.config.crafting.clone());
        self
    }

    /// Populate the world and load persisted progress. Calling it twice is a no-op.
    pub fn init(&mut self) {
        if self.initialized {
            tracing::warn!("SimulationWorld::init called twice");
            return;
        }
        layout::populate(
            &self.config,
            &mut self.registry,
            &mut self.gathering,
            &mut self.npcs,
            &mut self.rng,
        );
        let relationships = self.npcs.load_relationships(&self.persistence);
        let quests = self.quests.load_progress(&self.persistence);
        self.restore_quest_unlocks();
        self.initialized = true;
        tracing::info!(
            "World initialised (seed {}): {} entities, {} saved relationships, {} saved objectives",
            self.rng.seed(),
            self.registry.len(),
            relationships,
            quests
        );
    }

    /// Re-apply recipe unlocks of quests that loaded as complete.
    /// Their rewards were paid in an earlier session and are not paid again.
    fn restore_quest_unlocks(&mut self) {
        let recipes: Vec<String> = self
            .quests
            .definitions()
            .iter()
            .filter(|q| self.quests.is_complete(&q.id))
            .filter_map(|q| q.unlocks_recipe.clone())
            .collect();
        for recipe_id in recipes {
            self.crafting.unlock(&recipe_id);
        }
    }

    /// Tear everything down and start over from the seed.
    ///
    /// Persisted progress (relationships, quests) survives and is reloaded.
    pub fn reset(&mut self) {
        self.gathering.clear(&mut self.registry);
        self.combat.clear(&mut self.registry);
        self.npcs.clear(&mut self.registry);
        self.events.reset(&mut self.registry);
        self.registry.clear();
        self.crafting.reset();
        self.quests = QuestTracker::new(default_quests());
        self.clock.reset();
        self.rng.reseed();
        self.player = PlayerState::new(PLAYER_SPAWN, self.config.combat.player_max_health);
        self.initialized = false;
        tracing::info!("World reset");
        self.init();
    }

    pub fn set_reward_handler(&mut self, handler: impl FnMut(&RewardEvent) + 'static) {
        self.reward_handler = Some(Box::new(handler));
    }

    pub fn set_notification_handler(&mut self, handler: impl FnMut(&str) + 'static) {
        self.notification_handler = Some(Box::new(handler));
    }

    /// Advance the world by one frame.
    ///
    /// Rewards are deposited into `inventory` and passed to the reward
    /// handler. Never fails: bad deltas count as zero.
    pub fn tick(&mut self, delta: f32, inventory: &mut dyn Inventory) -> Vec<SimulationEvent> {
        let mut out = Vec::new();
        let frame = self.clock.advance(delta);
        let player_position = self.player.position;
        let tools = self.crafting.tool_tags(inventory);

        // Gathering
        if let Some(reward) = self
            .gathering
            .tick(frame, player_position, &tools, &mut self.rng)
        {
            self.grant(reward, inventory, &mut out);
        }

        // Combat
        self.tick_combat(frame, player_position, inventory, &mut out);

        // Crafting
        match self.crafting.tick(frame, inventory, &mut self.rng) {
            Some(CraftOutcome::Produced(item)) => {
                self.notify(format!("Crafted {} ({})", item.item, item.quality), &mut out);
                out.push(SimulationEvent::ItemProduced(item));
            }
            Some(CraftOutcome::Aborted { recipe_id }) => {
                self.notify(format!("Crafting {} failed: materials missing", recipe_id), &mut out);
                out.push(SimulationEvent::CraftAborted { recipe_id });
            }
            None => {}
        }

        // NPC patrol
        self.npcs.tick(frame, &mut self.registry);

        // World events
        let report = {
            let mut ctx = EventContext {
                frame,
                player_position,
                registry: &mut self.registry,
                rng: &mut self.rng,
            };
            self.events.tick(&mut ctx)
        };
        self.apply_event_report(report, inventory, &mut out);

        // Quests
        self.collect_quest_completions(inventory, &mut out);

        out
    }

    fn tick_combat(
        &mut self,
        frame: FrameTime,
        player_position: Position,
        inventory: &mut dyn Inventory,
        out: &mut Vec<SimulationEvent>,
    ) {
        let report = self
            .combat
            .tick(frame, player_position, &mut self.registry, &mut self.rng);

        for (id, archetype) in report.spawned {
            out.push(SimulationEvent::HostileSpawned { id, archetype });
        }

        for death in report.deaths {
            if let Some(item) = &death.drop {
                let reward = RewardEvent {
                    source: RewardSource::Combat { hostile: death.id },
                    items: item_counts([(item.as_str(), 1)]),
                };
                self.grant(reward, inventory, out);
            }
            let levels = self.player.grant_xp(death.xp);
            out.push(SimulationEvent::HostileKilled(death));
            for level in levels {
                self.notify(format!("Level up! Now level {}", level), out);
                out.push(SimulationEvent::LevelUp { level });
            }
        }

        if report.damage_to_player > 0.0 {
            let defeated = self.player.take_damage(report.damage_to_player);
            out.push(SimulationEvent::PlayerDamaged {
                amount: report.damage_to_player,
                remaining: self.player.health,
            });
            if defeated {
                self.player.restore();
                self.notify("You were defeated and woke up at the camp", out);
                out.push(SimulationEvent::PlayerDefeated);
            }
        }
    }

    fn apply_event_report(
        &mut self,
        report: SchedulerTick,
        inventory: &mut dyn Inventory,
        out: &mut Vec<SimulationEvent>,
    ) {
        if let Some(event_id) = &report.started {
            let name = self
                .events
                .definition(event_id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| event_id.clone());
            self.notify(format!("{} has begun!", name), out);
            out.push(SimulationEvent::WorldEventStarted {
                event_id: event_id.clone(),
            });
        }

        let source = report.event_id.clone().unwrap_or_default();
        self.apply_effects(&source, report.effects, inventory, out);

        if let Some(event_id) = report.ended {
            out.push(SimulationEvent::WorldEventEnded { event_id });
        }
    }

    fn apply_effects(
        &mut self,
        event_id: &str,
        effects: Vec<EventEffect>,
        inventory: &mut dyn Inventory,
        out: &mut Vec<SimulationEvent>,
    ) {
        for effect in effects {
            match effect {
                EventEffect::Reward(items) => {
                    let reward = RewardEvent {
                        source: RewardSource::WorldEvent {
                            event_id: event_id.to_string(),
                        },
                        items,
                    };
                    self.grant(reward, inventory, out);
                }
                EventEffect::RespawnAllNodes => {
                    let count = self.gathering.respawn_all();
                    tracing::debug!("{} nodes respawned by {}", count, event_id);
                }
                EventEffect::DamageArea {
                    center,
                    radius,
                    amount,
                } => {
                    // Kills pay out through the combat tick like any other death
                    self.combat
                        .damage_area(center, radius, amount, &mut self.registry, &mut self.rng);
                }
            }
        }
    }

    fn collect_quest_completions(
        &mut self,
        inventory: &mut dyn Inventory,
        out: &mut Vec<SimulationEvent>,
    ) {
        let completed: Vec<_> = self.quests.take_completions().into_iter().cloned().collect();
        for quest in completed {
            tracing::info!("Quest completed: {}", quest.id);
            self.notify(format!("Quest complete: {}", quest.title), out);
            out.push(SimulationEvent::QuestCompleted {
                quest_id: quest.id.clone(),
            });
            if !quest.reward.is_empty() {
                let reward = RewardEvent {
                    source: RewardSource::Quest {
                        quest_id: quest.id.clone(),
                    },
                    items: quest.reward.clone(),
                };
                self.grant(reward, inventory, out);
            }
            if let Some(recipe_id) = &quest.unlocks_recipe {
                if self.crafting.unlock(recipe_id) {
                    self.notify(format!("New recipe: {}", recipe_id), out);
                }
            }
        }
    }

    /// Deposit a reward and tell the observers
    fn grant(&mut self, reward: RewardEvent, inventory: &mut dyn Inventory, out: &mut Vec<SimulationEvent>) {
        inventory.add_items(&reward.items);
        if let Some(handler) = self.reward_handler.as_mut() {
            handler(&reward);
        }
        out.push(SimulationEvent::Reward(reward));
    }

    fn notify(&mut self, message: impl Into<String>, out: &mut Vec<SimulationEvent>) {
        let message = message.into();
        if let Some(handler) = self.notification_handler.as_mut() {
            handler(&message);
        }
        out.push(SimulationEvent::Notification(message));
    }

    // ---- player actions ----

    /// Place the player. Positions are taken as-is.
    pub fn move_player(&mut self, position: Position) {
        self.player.position = position;
    }

    /// Attack the nearest hostile in reach. Kills pay out on the next tick.
    pub fn player_attack(&mut self) -> DamageOutcome {
        self.combat
            .attack(self.player.position, &mut self.registry, &mut self.rng)
    }

    pub fn start_craft(
        &mut self,
        recipe_id: &str,
        inventory: &dyn Inventory,
    ) -> std::result::Result<CraftJob, CraftRejection> {
        self.crafting.start_craft(recipe_id, inventory, self.clock.now())
    }

    pub fn cancel_craft(&mut self) -> Option<CraftJob> {
        self.crafting.cancel()
    }

    /// Talk to an NPC at the current time of day
    pub fn interact(&mut self, npc_id: &str) -> std::result::Result<DialogueSession, InteractionRefusal> {
        let day_time = self.clock.day_time();
        self.npcs.interact(npc_id, day_time)
    }

    pub fn end_interaction(&mut self, npc_id: &str) -> bool {
        self.npcs.end_interaction(npc_id)
    }

    pub fn give_gift(
        &mut self,
        npc_id: &str,
        item: &str,
        inventory: &mut dyn Inventory,
    ) -> std::result::Result<u8, GiftRefusal> {
        self.npcs
            .give_gift(npc_id, item, inventory, &mut self.persistence)
    }

    pub fn buy(
        &mut self,
        npc_id: &str,
        item: &str,
        inventory: &mut dyn Inventory,
    ) -> std::result::Result<ItemCounts, TradeRefusal> {
        self.npcs.buy(npc_id, item, inventory)
    }

    /// Buy from the traveling merchant while it is in town
    pub fn buy_from_merchant(
        &mut self,
        item: &str,
        inventory: &mut dyn Inventory,
    ) -> std::result::Result<ItemCounts, TradeRefusal> {
        let shop = self.events.active_shop().ok_or(TradeRefusal::NoMerchant)?;
        purchase(shop, item, inventory)
    }

    /// Feed matched progress into the quest tracker. Changes are saved at once.
    pub fn record_quest_progress(
        &mut self,
        quest_id: &str,
        objective_index: usize,
        progress: Progress,
    ) -> std::result::Result<bool, QuestRejection> {
        let changed = self
            .quests
            .record_progress(quest_id, objective_index, progress)?;
        if changed {
            self.quests.save_progress(&mut self.persistence);
        }
        Ok(changed)
    }

    pub fn quest_statuses(&self) -> Vec<QuestStatus> {
        self.quests.statuses()
    }

    /// Start a world event now, bypassing the scheduler's roll.
    ///
    /// Returns `None` if the id is unknown or another event is running.
    pub fn force_world_event(
        &mut self,
        event_id: &str,
        inventory: &mut dyn Inventory,
    ) -> Option<Vec<SimulationEvent>> {
        let frame = FrameTime {
            delta: 0.0,
            now: self.clock.now(),
        };
        let effects = {
            let mut ctx = EventContext {
                frame,
                player_position: self.player.position,
                registry: &mut self.registry,
                rng: &mut self.rng,
            };
            self.events.force_activate(event_id, &mut ctx)?
        };
        let report = SchedulerTick {
            started: Some(event_id.to_string()),
            ended: None,
            event_id: Some(event_id.to_string()),
            effects,
        };
        let mut out = Vec::new();
        self.apply_event_report(report, inventory, &mut out);
        Some(out)
    }

    /// Save an inventory snapshot as a flat `{item: count}` object
    pub fn save_inventory(&mut self, inventory: &ItemStore) -> bool {
        match serde_json::to_value(inventory.snapshot()) {
            Ok(value) => self.persistence.save(keys::INVENTORY_SNAPSHOT, value),
            Err(e) => {
                tracing::warn!("Could not encode inventory: {}", e);
                false
            }
        }
    }

    /// Load the saved inventory snapshot, if any
    pub fn load_inventory(&self) -> Option<ItemStore> {
        let value = self.persistence.load(keys::INVENTORY_SNAPSHOT)?;
        let Value::Object(_) = &value else {
            tracing::warn!("Ignoring malformed inventory snapshot");
            return None;
        };
        match serde_json::from_value::<ItemCounts>(value) {
            Ok(items) => Some(ItemStore::with_items(&items)),
            Err(e) => {
                tracing::warn!("Ignoring malformed inventory snapshot: {}", e);
                None
            }
        }
    }

    /// Retry any writes the store refused earlier
    pub fn flush(&mut self) -> bool {
        self.persistence.flush()
    }

    // ---- read access ----

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn gathering(&self) -> &GatheringSystem {
        &self.gathering
    }

    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    #[cfg(test)]
    pub(crate) fn combat_parts(&mut self) -> (&mut CombatSystem, &mut EntityRegistry) {
        (&mut self.combat, &mut self.registry)
    }

    #[cfg(test)]
    pub(crate) fn gathering_parts(&mut self) -> (&mut GatheringSystem, &mut EntityRegistry) {
        (&mut self.gathering, &mut self.registry)
    }

    pub fn crafting(&self) -> &CraftingSystem {
        &self.crafting
    }

    pub fn npcs(&self) -> &NpcSystem {
        &self.npcs
    }

    pub fn events(&self) -> &EventScheduler {
        &self.events
    }

    pub fn quests(&self) -> &QuestTracker {
        &self.quests
    }

    pub fn persistence(&self) -> &PersistenceAdapter {
        &self.persistence
    }
}

impl std::fmt::Debug for SimulationWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationWorld")
            .field("seed", &self.rng.seed())
            .field("now", &self.clock.now())
            .field("entities", &self.registry.len())
            .field("hostiles", &self.combat.count())
            .field("active_event", &self.events.active().map(|s| s.event_id.as_str()))
            .field("initialized", &self.initialized)
            .finish()
    }
}
