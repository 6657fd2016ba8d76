//! Property tests for the simulation invariants

use std::collections::BTreeSet;

use live_world::combat::{CombatSystem, Hostile, HostileArchetype};
use live_world::core::clock::FrameTime;
use live_world::core::config::{CombatConfig, CraftingConfig, NpcConfig};
use live_world::core::error::{CraftRejection, InteractionRefusal};
use live_world::core::rng::SimRng;
use live_world::core::types::{item_counts, EntityKind, Position};
use live_world::crafting::{CraftOutcome, CraftRecipe, CraftingSystem, RecipeCatalog};
use live_world::ecs::EntityRegistry;
use live_world::gathering::{GatheringSystem, NodeType, ToolTags, FULL_HEALTH};
use live_world::inventory::{Inventory, ItemStore};
use live_world::npc::{default_roster, ActiveHours, NpcState, NpcSystem};
use live_world::quests::{ObjectiveDefinition, Progress, QuestDefinition, QuestTracker};
use live_world::world_events::{EventContext, EventKind, EventScheduler, WorldEventDefinition};
use proptest::prelude::*;

fn frame(delta: f32) -> FrameTime {
    FrameTime { delta, now: 0.0 }
}

fn progress_strategy() -> impl Strategy<Value = Progress> {
    prop_oneof![
        Just(Progress::Complete),
        (0_u32..15).prop_map(Progress::Count),
        (0_u32..4).prop_map(Progress::Add),
    ]
}

proptest! {
    /// A depleted node gives nothing until its respawn time has passed,
    /// then comes back exactly once at full health.
    #[test]
    fn property_respawn_waits_full_duration(half_seconds in 2_u32..60, seed in 0_u64..1000) {
        let respawn = half_seconds as f32 * 0.5;
        let mut registry = EntityRegistry::new();
        let mut gathering = GatheringSystem::new(2.0);
        let mut rng = SimRng::from_seed(seed);
        let id = gathering.spawn_custom(&mut registry, NodeType::Tree, Position::ZERO, |node| {
            node.with_gather_duration(0.5).with_respawn_duration(respawn)
        });
        let tools = ToolTags::default();

        gathering.tick(frame(0.5), Position::ZERO, &tools, &mut rng);
        prop_assert!(gathering.node(id).unwrap().is_depleted());

        // The actor stays on the node the whole time
        for _ in 0..half_seconds - 1 {
            prop_assert!(gathering.tick(frame(0.5), Position::ZERO, &tools, &mut rng).is_none());
            prop_assert!(gathering.node(id).unwrap().is_depleted());
        }
        gathering.tick(frame(0.5), Position::new(50.0, 0.0, 0.0), &tools, &mut rng);
        let node = gathering.node(id).unwrap();
        prop_assert!(!node.is_depleted());
        prop_assert_eq!(node.health, FULL_HEALTH);
    }

    /// Each hostile whose health crosses zero pays out exactly once, however
    /// the damage is spread.
    #[test]
    fn property_death_payout_is_idempotent(
        count in 1_usize..5,
        hits in prop::collection::vec((0_usize..5, 1.0_f32..90.0, any::<bool>()), 1..30),
    ) {
        let mut registry = EntityRegistry::new();
        let mut rng = SimRng::from_seed(5);
        let mut combat = CombatSystem::new(CombatConfig::default());
        let mut ids = Vec::new();
        for i in 0..count {
            let position = Position::new(5.0 + i as f32 * 0.1, 0.0, 0.0);
            let id = registry.spawn(EntityKind::Hostile, position);
            combat.insert(Hostile::new(id, HostileArchetype::Skeleton, position));
            ids.push(id);
        }

        let mut paid = Vec::new();
        for (target, amount, area) in hits {
            if area {
                combat.damage_area(Position::new(5.0, 0.0, 0.0), 1.0, amount, &mut registry, &mut rng);
            } else {
                combat.apply_damage(ids[target % count], amount, &mut registry, &mut rng);
            }
            // Far from the player so nothing moves or attacks
            let report = combat.tick(frame(0.0), Position::new(5.0, 0.0, 50.0), &mut registry, &mut rng);
            paid.extend(report.deaths.into_iter().map(|d| d.id));
        }

        let dead: BTreeSet<_> = ids.iter().copied().filter(|id| combat.hostile(*id).is_none()).collect();
        let unique: BTreeSet<_> = paid.iter().copied().collect();
        prop_assert_eq!(paid.len(), unique.len());
        prop_assert_eq!(unique, dead);
    }

    /// A second start while a job runs is always rejected, and materials are
    /// untouched until the job completes.
    #[test]
    fn property_single_job_and_deferred_deduction(wood in 2_u32..10, steps in 1_u32..8) {
        let mut catalog = RecipeCatalog::new();
        catalog.add(CraftRecipe::new("plank", "Plank", &[("Wood", 2)], 4.0));
        let mut crafting = CraftingSystem::new(catalog, CraftingConfig::default());
        let mut inventory = ItemStore::with_items(&item_counts([("Wood", wood)]));
        let mut rng = SimRng::from_seed(wood as u64);

        crafting.start_craft("plank", &inventory, 0.0).unwrap();
        for _ in 0..steps {
            prop_assert_eq!(
                crafting.start_craft("plank", &inventory, 0.0),
                Err(CraftRejection::JobAlreadyActive)
            );
            prop_assert!(crafting.tick(frame(0.5), &mut inventory, &mut rng).is_none());
            prop_assert_eq!(inventory.has_quantity("Wood"), wood);
        }
        let mut outcome = None;
        for _ in steps..8 {
            outcome = outcome.or(crafting.tick(frame(0.5), &mut inventory, &mut rng));
        }
        prop_assert!(matches!(outcome, Some(CraftOutcome::Produced(_))));
        prop_assert_eq!(inventory.has_quantity("Wood"), wood - 2);
    }

    /// Night always refuses and never opens a session
    #[test]
    fn property_resting_refuses(day_time in prop_oneof![0.0_f32..0.2499, 0.7501_f32..1.0]) {
        let mut registry = EntityRegistry::new();
        let mut npcs = NpcSystem::new(NpcConfig::default());
        for npc in default_roster(ActiveHours::daytime()) {
            npcs.spawn(&mut registry, npc);
        }
        for npc_id in ["mara", "bram", "lina"] {
            prop_assert!(
                matches!(npcs.interact(npc_id, day_time), Err(InteractionRefusal::Resting(_))),
                "{} should be resting",
                npc_id
            );
            prop_assert_eq!(npcs.npc(npc_id).unwrap().state, NpcState::Idle);
        }
    }

    /// Never more than one session; no id fired twice in one round
    #[test]
    fn property_scheduler_exclusive(
        probabilities in prop::collection::vec(0.0_f32..1.0, 4),
        durations in prop::collection::vec(prop_oneof![Just(0.0_f32), 1.0_f32..20.0], 4),
        deltas in prop::collection::vec(0.0_f32..3.0, 1..200),
        seed in 0_u64..1000,
    ) {
        let kinds = [
            EventKind::LuckyFind,
            EventKind::TravelingMerchant,
            EventKind::BountifulBloom,
            EventKind::MeteorShower,
        ];
        let definitions = (0..4)
            .map(|i| {
                let id = format!("event_{}", i);
                WorldEventDefinition::new(&id, &id, kinds[i], durations[i], probabilities[i])
            })
            .collect();
        let mut scheduler = EventScheduler::new(definitions, 2.0);
        let mut registry = EntityRegistry::new();
        let mut rng = SimRng::from_seed(seed);

        let mut running = false;
        for delta in deltas {
            let mut ctx = EventContext {
                frame: frame(delta),
                player_position: Position::ZERO,
                registry: &mut registry,
                rng: &mut rng,
            };
            let report = scheduler.tick(&mut ctx);
            if report.started.is_some() {
                prop_assert!(!running, "started while another event was running");
            }
            if report.ended.is_some() {
                running = false;
            }
            if report.started.is_some() && scheduler.is_active() {
                running = true;
            }
            prop_assert_eq!(scheduler.is_active(), running);

            let fired = scheduler.fired();
            let unique: BTreeSet<_> = fired.iter().collect();
            prop_assert_eq!(unique.len(), fired.len());
        }
    }

    /// Completion never reverts and counters never go down
    #[test]
    fn property_quest_progress_monotonic(ops in prop::collection::vec((0_usize..3, progress_strategy()), 1..60)) {
        let mut tracker = QuestTracker::new(vec![QuestDefinition::new(
            "q",
            "Quest",
            vec![
                ObjectiveDefinition::counter("Count to ten", 10),
                ObjectiveDefinition::flag("Flip"),
                ObjectiveDefinition::counter("Count to three", 3),
            ],
        )]);

        let mut previous = tracker.status("q").unwrap();
        for (index, progress) in ops {
            tracker.record_progress("q", index, progress).unwrap();
            let status = tracker.status("q").unwrap();
            for (before, after) in previous.objectives.iter().zip(&status.objectives) {
                prop_assert!(!before.completed || after.completed);
                if let (Some((was, _)), Some((now, target))) = (before.progress, after.progress) {
                    prop_assert!(now >= was);
                    prop_assert!(now <= target);
                }
            }
            prop_assert!(!previous.completed || status.completed);
            previous = status;
        }
    }
}
