//! NPC system - dialogue sessions, gifts, shops, patrols
//!
//! Each NPC is either Idle (walking its waypoint loop) or Interacting
//! (standing still while the player talks to it). Relationship scores are
//! durable progress, so every change is written through the persistence
//! adapter straight away.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::clock::FrameTime;
use crate::core::config::NpcConfig;
use crate::core::error::{GiftRefusal, InteractionRefusal, TradeRefusal};
use crate::core::types::{ground_direction, ground_distance, item_counts, EntityId, EntityKind, ItemCounts};
use crate::ecs::EntityRegistry;
use crate::inventory::Inventory;
use crate::npc::model::{Npc, NpcState, Shop, MAX_RELATIONSHIP};
use crate::persistence::{keys, PersistenceAdapter};

/// How close a patrolling NPC must get before moving to the next waypoint
const WAYPOINT_REACHED: f32 = 0.1;

/// What the player sees while talking to an NPC
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueSession {
    pub npc_id: String,
    pub npc_name: String,
    pub relationship: u8,
    /// Lines in order, already filtered by relationship
    pub lines: Vec<String>,
    pub can_gift: bool,
    pub shop: Option<Shop>,
}

#[derive(Debug, Clone)]
pub struct NpcSystem {
    npcs: Vec<Npc>,
    config: NpcConfig,
}

impl NpcSystem {
    pub fn new(config: NpcConfig) -> Self {
        Self {
            npcs: Vec::new(),
            config,
        }
    }

    /// Register an NPC and give it a registry id
    pub fn spawn(&mut self, registry: &mut EntityRegistry, mut npc: Npc) -> EntityId {
        npc.id = registry.spawn(EntityKind::Npc, npc.position);
        let id = npc.id;
        self.npcs.push(npc);
        id
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn npc(&self, npc_id: &str) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.npc_id == npc_id)
    }

    fn npc_mut(&mut self, npc_id: &str) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.npc_id == npc_id)
    }

    /// Start talking to an NPC. Refused while it is resting.
    pub fn interact(
        &mut self,
        npc_id: &str,
        day_time: f32,
    ) -> Result<DialogueSession, InteractionRefusal> {
        let romance_threshold = self.config.romance_threshold;
        let npc = self
            .npc_mut(npc_id)
            .ok_or_else(|| InteractionRefusal::UnknownNpc(npc_id.to_string()))?;

        if !npc.active_hours.is_active(day_time) {
            tracing::debug!("{} is resting (day time {:.2})", npc.name, day_time);
            return Err(InteractionRefusal::Resting(npc.name.clone()));
        }

        npc.state = NpcState::Interacting;
        Ok(DialogueSession {
            npc_id: npc.npc_id.clone(),
            npc_name: npc.name.clone(),
            relationship: npc.relationship,
            lines: npc.visible_lines(romance_threshold),
            can_gift: npc.accepts_gifts,
            shop: npc.shop.clone(),
        })
    }

    /// Close a dialogue session. Returns false if the NPC wasn't talking.
    pub fn end_interaction(&mut self, npc_id: &str) -> bool {
        match self.npc_mut(npc_id) {
            Some(npc) if npc.state == NpcState::Interacting => {
                npc.state = NpcState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Hand one `item` to an NPC. Favourites are worth more.
    ///
    /// Returns the new relationship, which is saved immediately.
    pub fn give_gift(
        &mut self,
        npc_id: &str,
        item: &str,
        inventory: &mut dyn Inventory,
        persistence: &mut PersistenceAdapter,
    ) -> Result<u8, GiftRefusal> {
        let favorite_bonus = self.config.favorite_gift_bonus;
        let regular_bonus = self.config.regular_gift_bonus;
        let npc = self
            .npc_mut(npc_id)
            .ok_or_else(|| GiftRefusal::UnknownNpc(npc_id.to_string()))?;

        if !npc.accepts_gifts {
            return Err(GiftRefusal::NotAccepted(npc.name.clone()));
        }
        if inventory.has_quantity(item) == 0 {
            return Err(GiftRefusal::MissingItem(item.to_string()));
        }

        inventory.remove_items(&item_counts([(item, 1)]));
        let bonus = if npc.favorite_gifts.contains(item) {
            favorite_bonus
        } else {
            regular_bonus
        };
        let relationship = npc.raise_relationship(bonus);
        tracing::debug!("{} received {} (+{}) -> {}", npc.name, item, bonus, relationship);

        self.save_relationships(persistence);
        Ok(relationship)
    }

    /// Buy one `item` from an NPC's shop
    pub fn buy(
        &self,
        npc_id: &str,
        item: &str,
        inventory: &mut dyn Inventory,
    ) -> Result<ItemCounts, TradeRefusal> {
        let npc = self
            .npc(npc_id)
            .ok_or_else(|| TradeRefusal::UnknownNpc(npc_id.to_string()))?;
        let shop = npc
            .shop
            .as_ref()
            .ok_or_else(|| TradeRefusal::NoShop(npc.name.clone()))?;
        purchase(shop, item, inventory)
    }

    /// Walk idle NPCs along their waypoint loops
    pub fn tick(&mut self, frame: FrameTime, registry: &mut EntityRegistry) {
        let step = self.config.patrol_speed * frame.delta;
        if step <= 0.0 {
            return;
        }

        for npc in &mut self.npcs {
            if npc.state != NpcState::Idle || npc.waypoints.is_empty() {
                continue;
            }

            let index = npc.waypoint_index % npc.waypoints.len();
            let target = npc.waypoints[index];
            let distance = ground_distance(npc.position, target);
            if distance <= WAYPOINT_REACHED {
                npc.waypoint_index = (index + 1) % npc.waypoints.len();
                continue;
            }

            npc.position += ground_direction(npc.position, target) * step.min(distance);
            registry.set_position(npc.id, npc.position);
        }
    }

    /// Current scores as `npc_id -> relationship`
    pub fn relationships(&self) -> BTreeMap<String, u8> {
        self.npcs
            .iter()
            .map(|n| (n.npc_id.clone(), n.relationship))
            .collect()
    }

    /// Write every score. Failures are retried by the adapter on the next write.
    pub fn save_relationships(&self, persistence: &mut PersistenceAdapter) -> bool {
        let value = match serde_json::to_value(self.relationships()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not encode relationships: {}", e);
                return false;
            }
        };
        persistence.save(keys::NPC_RELATIONSHIPS, value)
    }

    /// Apply saved scores. Unknown NPCs and malformed entries are ignored.
    ///
    /// Returns how many NPCs were updated.
    pub fn load_relationships(&mut self, persistence: &PersistenceAdapter) -> usize {
        let Some(Value::Object(saved)) = persistence.load(keys::NPC_RELATIONSHIPS) else {
            return 0;
        };

        let mut applied = 0;
        for (npc_id, value) in saved {
            let Some(score) = value.as_u64() else {
                tracing::warn!("Ignoring malformed relationship for {}", npc_id);
                continue;
            };
            if let Some(npc) = self.npc_mut(&npc_id) {
                npc.relationship = score.min(MAX_RELATIONSHIP as u64) as u8;
                applied += 1;
            }
        }
        applied
    }

    /// Remove every NPC from this system and the registry
    pub fn clear(&mut self, registry: &mut EntityRegistry) {
        for npc in self.npcs.drain(..) {
            registry.despawn(npc.id);
        }
    }
}

/// Charge the shop's currency for one `item` and hand it over
pub(crate) fn purchase(
    shop: &Shop,
    item: &str,
    inventory: &mut dyn Inventory,
) -> Result<ItemCounts, TradeRefusal> {
    let price = shop
        .price(item)
        .ok_or_else(|| TradeRefusal::NotStocked(item.to_string()))?;
    let available = inventory.has_quantity(&shop.currency);
    if available < price {
        return Err(TradeRefusal::InsufficientFunds {
            currency: shop.currency.clone(),
            price,
            available,
        });
    }

    inventory.remove_items(&item_counts([(shop.currency.as_str(), price)]));
    let bought = item_counts([(item, 1)]);
    inventory.add_items(&bought);
    Ok(bought)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Position;
    use crate::inventory::ItemStore;
    use crate::npc::model::{ActiveHours, DialogueLine};
    use crate::persistence::test_support::FlakyStore;
    use serde_json::json;

    fn setup() -> (NpcSystem, EntityRegistry) {
        let mut system = NpcSystem::new(NpcConfig::default());
        let mut registry = EntityRegistry::new();
        system.spawn(
            &mut registry,
            Npc::new("lina", "Lina", Position::ZERO)
                .with_gifts(&["Flower"])
                .with_dialogue(vec![
                    DialogueLine::always("Hi!"),
                    DialogueLine::romance("I saved you a flower."),
                ]),
        );
        system.spawn(
            &mut registry,
            Npc::new("mara", "Mara", Position::new(5.0, 0.0, 0.0))
                .with_shop(Shop::new("Coin", &[("Healing Potion", 10)]))
                .with_active_hours(ActiveHours::always()),
        );
        (system, registry)
    }

    #[test]
    fn test_resting_refuses_without_session() {
        let (mut npcs, _) = setup();
        for t in [0.0, 0.1, 0.24, 0.76, 0.99] {
            assert_eq!(
                npcs.interact("lina", t),
                Err(InteractionRefusal::Resting("Lina".into()))
            );
            assert_eq!(npcs.npc("lina").unwrap().state, NpcState::Idle);
        }
        assert!(npcs.interact("mara", 0.0).is_ok(), "Always-open shop");
        assert_eq!(
            npcs.interact("ghost", 0.5),
            Err(InteractionRefusal::UnknownNpc("ghost".into()))
        );
    }

    #[test]
    fn test_session_lines_follow_relationship() {
        let (mut npcs, _) = setup();
        let session = npcs.interact("lina", 0.5).unwrap();
        assert_eq!(session.lines, vec!["Hi!"]);
        assert!(session.can_gift);
        assert!(session.shop.is_none());
        assert_eq!(npcs.npc("lina").unwrap().state, NpcState::Interacting);

        assert!(npcs.end_interaction("lina"));
        assert!(!npcs.end_interaction("lina"));

        npcs.npc_mut("lina").unwrap().relationship = 51;
        let session = npcs.interact("lina", 0.5).unwrap();
        assert_eq!(session.lines.len(), 2);
    }

    #[test]
    fn test_gifts_raise_and_persist() {
        let (mut npcs, _) = setup();
        let mut persistence = PersistenceAdapter::in_memory();
        let mut inventory = ItemStore::with_items(&item_counts([("Flower", 10), ("Stone", 1)]));

        assert_eq!(npcs.give_gift("lina", "Flower", &mut inventory, &mut persistence), Ok(20));
        assert_eq!(npcs.give_gift("lina", "Stone", &mut inventory, &mut persistence), Ok(25));
        assert_eq!(inventory.has_quantity("Flower"), 9);
        assert_eq!(inventory.has_quantity("Stone"), 0);
        assert_eq!(
            persistence.load(keys::NPC_RELATIONSHIPS),
            Some(json!({"lina": 25, "mara": 0}))
        );

        for _ in 0..9 {
            npcs.give_gift("lina", "Flower", &mut inventory, &mut persistence).unwrap();
        }
        assert_eq!(npcs.npc("lina").unwrap().relationship, 100, "Clamped");
    }

    #[test]
    fn test_gift_refusals() {
        let (mut npcs, _) = setup();
        let mut persistence = PersistenceAdapter::in_memory();
        let mut inventory = ItemStore::with_items(&item_counts([("Flower", 1)]));

        assert_eq!(
            npcs.give_gift("mara", "Flower", &mut inventory, &mut persistence),
            Err(GiftRefusal::NotAccepted("Mara".into()))
        );
        assert_eq!(
            npcs.give_gift("lina", "Crystal", &mut inventory, &mut persistence),
            Err(GiftRefusal::MissingItem("Crystal".into()))
        );
        assert_eq!(inventory.has_quantity("Flower"), 1);
        assert!(persistence.load(keys::NPC_RELATIONSHIPS).is_none());
    }

    #[test]
    fn test_gift_survives_failed_write() {
        let (mut npcs, _) = setup();
        let (store, failing) = FlakyStore::new();
        let mut persistence = PersistenceAdapter::new(Box::new(store));
        let mut inventory = ItemStore::with_items(&item_counts([("Flower", 2)]));

        failing.set(true);
        assert_eq!(npcs.give_gift("lina", "Flower", &mut inventory, &mut persistence), Ok(20));
        assert_eq!(persistence.pending_writes(), 1);

        failing.set(false);
        npcs.give_gift("lina", "Flower", &mut inventory, &mut persistence).unwrap();
        assert_eq!(persistence.pending_writes(), 0);
        assert_eq!(
            persistence.load(keys::NPC_RELATIONSHIPS),
            Some(json!({"lina": 40, "mara": 0}))
        );
    }

    #[test]
    fn test_load_relationships() {
        let (mut npcs, _) = setup();
        let mut persistence = PersistenceAdapter::in_memory();
        persistence.save(
            keys::NPC_RELATIONSHIPS,
            json!({"lina": 70, "mara": 400, "ghost": 10, "bad": "x"}),
        );
        assert_eq!(npcs.load_relationships(&persistence), 2);
        assert_eq!(npcs.npc("lina").unwrap().relationship, 70);
        assert_eq!(npcs.npc("mara").unwrap().relationship, 100);
    }

    #[test]
    fn test_shop_purchase() {
        let (npcs, _) = setup();
        let mut inventory = ItemStore::with_items(&item_counts([("Coin", 15)]));

        let bought = npcs.buy("mara", "Healing Potion", &mut inventory).unwrap();
        assert_eq!(bought, item_counts([("Healing Potion", 1)]));
        assert_eq!(inventory.has_quantity("Coin"), 5);

        assert_eq!(
            npcs.buy("mara", "Healing Potion", &mut inventory),
            Err(TradeRefusal::InsufficientFunds {
                currency: "Coin".into(),
                price: 10,
                available: 5
            })
        );
        assert_eq!(
            npcs.buy("mara", "Dragon", &mut inventory),
            Err(TradeRefusal::NotStocked("Dragon".into()))
        );
        assert_eq!(
            npcs.buy("lina", "Flower", &mut inventory),
            Err(TradeRefusal::NoShop("Lina".into()))
        );
    }

    #[test]
    fn test_patrol_loops_and_pauses_while_talking() {
        let mut npcs = NpcSystem::new(NpcConfig::default());
        let mut registry = EntityRegistry::new();
        let id = npcs.spawn(
            &mut registry,
            Npc::new("guard", "Guard", Position::ZERO)
                .with_active_hours(ActiveHours::always())
                .with_waypoints(vec![Position::new(3.0, 0.0, 0.0), Position::ZERO]),
        );
        let frame = FrameTime { delta: 1.0, now: 0.0 };

        // 1.5 units per second
        npcs.tick(frame, &mut registry);
        assert!((npcs.npc("guard").unwrap().position.x - 1.5).abs() < 1e-4);
        assert_eq!(registry.position(id), Some(npcs.npc("guard").unwrap().position));

        npcs.interact("guard", 0.5).unwrap();
        npcs.tick(frame, &mut registry);
        assert!((npcs.npc("guard").unwrap().position.x - 1.5).abs() < 1e-4, "Stands still");

        npcs.end_interaction("guard");
        npcs.tick(frame, &mut registry); // reaches 3.0
        npcs.tick(frame, &mut registry); // switches waypoint
        npcs.tick(frame, &mut registry); // heads back
        assert!((npcs.npc("guard").unwrap().position.x - 1.5).abs() < 1e-4);
    }
}
