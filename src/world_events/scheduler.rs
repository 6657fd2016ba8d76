//! World event scheduler
//!
//! A check is due every `check_interval_seconds` of simulated time, whether
//! or not an event is running. Checks that fall inside a running event are
//! skipped, so the cadence never drifts.
//! A check walks the event table in declaration order and draws one uniform
//! value per event not yet fired this session; the first event whose draw is
//! below its probability wins. Table order is the tie-break, there is no
//! weighting and never more than one activation per check.
//!
//! Instant events apply their effect and leave the scheduler idle.
//! Duration-bound events block further activations until they run out.

use crate::core::clock::duration_reached;
use crate::core::error::invariant_violation;
use crate::core::types::EntityId;
use crate::ecs::EntityRegistry;
use crate::npc::Shop;
use crate::world_events::behavior::{EventContext, EventEffect, WorldEventBehavior};
use crate::world_events::definition::{default_events, WorldEventDefinition};

/// Runtime instance of an activated, duration-bound event
#[derive(Debug)]
pub struct EventSession {
    pub event_id: String,
    pub elapsed_seconds: f32,
    pub duration_seconds: f32,
    behavior: Box<dyn WorldEventBehavior>,
}

impl EventSession {
    pub fn actors(&self) -> Vec<EntityId> {
        self.behavior.actors()
    }

    pub fn behavior(&self) -> &dyn WorldEventBehavior {
        self.behavior.as_ref()
    }
}

/// What the scheduler did this frame
#[derive(Debug, Default, PartialEq)]
pub struct SchedulerTick {
    pub started: Option<String>,
    pub ended: Option<String>,
    /// Event the effects came from
    pub event_id: Option<String>,
    pub effects: Vec<EventEffect>,
}

#[derive(Debug)]
pub struct EventScheduler {
    definitions: Vec<WorldEventDefinition>,
    check_interval_seconds: f32,
    check_timer: f32,
    active: Option<EventSession>,
    /// Ids fired since the set was last cleared, in firing order
    fired: Vec<String>,
}

impl EventScheduler {
    pub fn new(definitions: Vec<WorldEventDefinition>, check_interval_seconds: f32) -> Self {
        Self {
            definitions,
            check_interval_seconds,
            check_timer: 0.0,
            active: None,
            fired: Vec::new(),
        }
    }

    pub fn with_defaults(check_interval_seconds: f32) -> Self {
        Self::new(default_events(), check_interval_seconds)
    }

    pub fn definitions(&self) -> &[WorldEventDefinition] {
        &self.definitions
    }

    pub fn definition(&self, event_id: &str) -> Option<&WorldEventDefinition> {
        self.definitions.iter().find(|d| d.id == event_id)
    }

    pub fn active(&self) -> Option<&EventSession> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn fired(&self) -> &[String] {
        &self.fired
    }

    /// Seconds accumulated towards the next check
    pub fn check_timer(&self) -> f32 {
        self.check_timer
    }

    /// Shop of the running event, if it has one
    pub fn active_shop(&self) -> Option<&Shop> {
        self.active.as_ref().and_then(|s| s.behavior.shop())
    }

    pub fn tick(&mut self, ctx: &mut EventContext<'_>) -> SchedulerTick {
        let mut report = SchedulerTick::default();

        // The cadence runs on wall time, sessions included
        self.check_timer += ctx.frame.delta;
        let check_due = duration_reached(self.check_timer, self.check_interval_seconds);
        if check_due {
            self.check_timer = 0.0;
        }

        if let Some(session) = self.active.as_mut() {
            report.event_id = Some(session.event_id.clone());
            session.elapsed_seconds += ctx.frame.delta;
            report.effects.extend(session.behavior.tick(ctx));
            if duration_reached(session.elapsed_seconds, session.duration_seconds) {
                if let Some(mut session) = self.active.take() {
                    report.effects.extend(session.behavior.expire(ctx.registry));
                    tracing::info!("World event ended: {}", session.event_id);
                    report.ended = Some(session.event_id);
                }
            }
            if check_due {
                tracing::debug!("World event check skipped: an event is running");
            }
            return report;
        }

        if check_due {
            if let Some(index) = self.roll(ctx) {
                let (event_id, effects) = self.start(index, ctx);
                report.started = Some(event_id.clone());
                report.event_id = Some(event_id);
                report.effects = effects;
            }
        }

        report
    }

    /// One scheduling check. Returns the index of the winning event.
    fn roll(&mut self, ctx: &mut EventContext<'_>) -> Option<usize> {
        if !self.definitions.is_empty()
            && self.definitions.iter().all(|d| self.fired.contains(&d.id))
        {
            tracing::debug!("Every world event has fired, starting a new round");
            self.fired.clear();
        }

        for (index, definition) in self.definitions.iter().enumerate() {
            if self.fired.contains(&definition.id) {
                continue;
            }
            let draw = ctx.rng.unit();
            if draw < definition.roll_probability {
                return Some(index);
            }
        }
        None
    }

    fn start(&mut self, index: usize, ctx: &mut EventContext<'_>) -> (String, Vec<EventEffect>) {
        let definition = self.definitions[index].clone();
        if self.fired.contains(&definition.id) {
            invariant_violation(&format!("world event {} fired twice in one round", definition.id));
        } else {
            self.fired.push(definition.id.clone());
        }

        let mut behavior = definition.kind.behavior();
        let mut effects = behavior.activate(ctx);
        tracing::info!("World event started: {}", definition.name);

        if definition.is_instant() {
            effects.extend(behavior.expire(ctx.registry));
        } else {
            self.active = Some(EventSession {
                event_id: definition.id.clone(),
                elapsed_seconds: 0.0,
                duration_seconds: definition.duration_seconds,
                behavior,
            });
        }
        (definition.id, effects)
    }

    /// Start an event right away, skipping the roll. The check cadence is
    /// left untouched.
    ///
    /// Returns `None` if the id is unknown or another event is running.
    pub fn force_activate(
        &mut self,
        event_id: &str,
        ctx: &mut EventContext<'_>,
    ) -> Option<Vec<EventEffect>> {
        if self.active.is_some() {
            return None;
        }
        let index = self.definitions.iter().position(|d| d.id == event_id)?;
        if self.fired.contains(&self.definitions[index].id) {
            // Forcing a repeat starts a new round rather than duplicating the id
            self.fired.clear();
        }
        let (_, effects) = self.start(index, ctx);
        Some(effects)
    }

    /// End any running event without effects and forget the fired set
    pub fn reset(&mut self, registry: &mut EntityRegistry) {
        if let Some(mut session) = self.active.take() {
            session.behavior.expire(registry);
        }
        self.fired.clear();
        self.check_timer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FrameTime;
    use crate::core::rng::SimRng;
    use crate::core::types::Position;
    use crate::world_events::definition::EventKind;

    struct Harness {
        registry: EntityRegistry,
        rng: SimRng,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                registry: EntityRegistry::new(),
                rng: SimRng::from_seed(21),
            }
        }

        fn tick(&mut self, scheduler: &mut EventScheduler, delta: f32) -> SchedulerTick {
            let mut ctx = EventContext {
                frame: FrameTime { delta, now: 0.0 },
                player_position: Position::ZERO,
                registry: &mut self.registry,
                rng: &mut self.rng,
            };
            scheduler.tick(&mut ctx)
        }

        fn force(&mut self, scheduler: &mut EventScheduler, id: &str) -> Option<Vec<EventEffect>> {
            let mut ctx = EventContext {
                frame: FrameTime { delta: 0.0, now: 0.0 },
                player_position: Position::ZERO,
                registry: &mut self.registry,
                rng: &mut self.rng,
            };
            scheduler.force_activate(id, &mut ctx)
        }
    }

    fn certain(id: &str, kind: EventKind, duration: f32) -> WorldEventDefinition {
        WorldEventDefinition::new(id, id, kind, duration, 1.0)
    }

    #[test]
    fn test_no_check_before_interval() {
        let mut scheduler = EventScheduler::new(vec![certain("find", EventKind::LuckyFind, 0.0)], 300.0);
        let mut h = Harness::new();
        for _ in 0..599 {
            assert!(h.tick(&mut scheduler, 0.5).started.is_none());
        }
        let report = h.tick(&mut scheduler, 0.5);
        assert_eq!(report.started.as_deref(), Some("find"));
        assert!(!scheduler.is_active(), "Instant events do not block");
    }

    #[test]
    fn test_first_match_in_table_order_wins() {
        let mut scheduler = EventScheduler::new(
            vec![
                certain("first", EventKind::LuckyFind, 0.0),
                certain("second", EventKind::LuckyFind, 0.0),
            ],
            1.0,
        );
        let mut h = Harness::new();
        assert_eq!(h.tick(&mut scheduler, 1.0).started.as_deref(), Some("first"));
        // First already fired this round, so the next check picks the second
        assert_eq!(h.tick(&mut scheduler, 1.0).started.as_deref(), Some("second"));
        // Everyone fired: the round resets
        assert_eq!(h.tick(&mut scheduler, 1.0).started.as_deref(), Some("first"));
        assert_eq!(scheduler.fired(), &["first".to_string()]);
    }

    #[test]
    fn test_zero_probability_never_fires() {
        let mut scheduler = EventScheduler::new(
            vec![WorldEventDefinition::new("never", "Never", EventKind::LuckyFind, 0.0, 0.0)],
            1.0,
        );
        let mut h = Harness::new();
        for _ in 0..100 {
            assert!(h.tick(&mut scheduler, 1.0).started.is_none());
        }
    }

    #[test]
    fn test_duration_event_blocks_then_ends() {
        let mut scheduler = EventScheduler::new(
            vec![
                certain("merchant", EventKind::TravelingMerchant, 10.0),
                certain("find", EventKind::LuckyFind, 0.0),
            ],
            2.0,
        );
        let mut h = Harness::new();

        assert!(h.tick(&mut scheduler, 1.0).started.is_none());
        assert_eq!(h.tick(&mut scheduler, 1.0).started.as_deref(), Some("merchant"));
        assert!(scheduler.active_shop().is_some());
        assert_eq!(h.registry.count(crate::core::types::EntityKind::EventActor), 1);

        // Blocked for the full 10 seconds
        for _ in 0..9 {
            let report = h.tick(&mut scheduler, 1.0);
            assert!(report.started.is_none());
            assert!(report.ended.is_none());
            assert!(scheduler.is_active());
        }
        let report = h.tick(&mut scheduler, 1.0);
        assert_eq!(report.ended.as_deref(), Some("merchant"));
        assert!(!scheduler.is_active());
        assert!(scheduler.active_shop().is_none());
        assert_eq!(h.registry.count(crate::core::types::EntityKind::EventActor), 0);

        // Checks at 4, 6, 8, 10 and 12 fell inside the session. The next is at 14.
        assert!(h.tick(&mut scheduler, 1.0).started.is_none());
        assert_eq!(h.tick(&mut scheduler, 1.0).started.as_deref(), Some("find"));
    }

    #[test]
    fn test_fixed_cadence_after_duration_event() {
        let mut scheduler = EventScheduler::new(
            vec![
                certain("merchant", EventKind::TravelingMerchant, 120.0),
                certain("find", EventKind::LuckyFind, 0.0),
            ],
            300.0,
        );
        let mut h = Harness::new();

        let mut starts = Vec::new();
        let mut ends = Vec::new();
        for second in 1..=900 {
            let report = h.tick(&mut scheduler, 1.0);
            if let Some(id) = report.started {
                starts.push((second, id));
            }
            if let Some(id) = report.ended {
                ends.push((second, id));
            }
        }
        assert_eq!(
            starts,
            vec![
                (300, "merchant".to_string()),
                (600, "find".to_string()),
                (900, "merchant".to_string()),
            ]
        );
        assert_eq!(ends, vec![(420, "merchant".to_string())]);
    }

    #[test]
    fn test_check_due_during_session_is_skipped() {
        let mut scheduler = EventScheduler::new(
            vec![
                certain("merchant", EventKind::TravelingMerchant, 5.0),
                certain("find", EventKind::LuckyFind, 0.0),
            ],
            3.0,
        );
        let mut h = Harness::new();
        for _ in 0..3 {
            h.tick(&mut scheduler, 1.0);
        }
        assert!(scheduler.is_active());

        // Due at 6 while the merchant runs: no roll, timer restarts
        for _ in 0..3 {
            assert!(h.tick(&mut scheduler, 1.0).started.is_none());
        }
        assert!(scheduler.check_timer() < 1e-4);
        assert_eq!(scheduler.fired(), &["merchant".to_string()]);

        // Merchant ends at 8, the next check at 9 picks the find
        assert_eq!(h.tick(&mut scheduler, 1.0).started, None);
        assert_eq!(h.tick(&mut scheduler, 1.0).ended.as_deref(), Some("merchant"));
        assert_eq!(h.tick(&mut scheduler, 1.0).started.as_deref(), Some("find"));
    }

    #[test]
    fn test_force_activate() {
        let mut scheduler = EventScheduler::with_defaults(300.0);
        let mut h = Harness::new();

        assert!(h.force(&mut scheduler, "nonexistent").is_none());
        let effects = h.force(&mut scheduler, "bountiful_bloom").unwrap();
        assert_eq!(effects, vec![EventEffect::RespawnAllNodes]);
        assert!(!scheduler.is_active());

        assert!(h.force(&mut scheduler, "meteor_shower").is_some());
        assert!(scheduler.is_active());
        assert!(h.force(&mut scheduler, "lucky_find").is_none(), "One session at a time");

        // Forcing a repeat does not duplicate the fired entry
        scheduler.reset(&mut h.registry);
        h.force(&mut scheduler, "lucky_find");
        h.force(&mut scheduler, "lucky_find");
        assert_eq!(scheduler.fired(), &["lucky_find".to_string()]);
    }

    #[test]
    fn test_reset_clears_session_and_actors() {
        let mut scheduler = EventScheduler::with_defaults(300.0);
        let mut h = Harness::new();
        h.force(&mut scheduler, "traveling_merchant");
        scheduler.reset(&mut h.registry);
        assert!(!scheduler.is_active());
        assert!(scheduler.fired().is_empty());
        assert!(h.registry.is_empty());
    }
}
