//! Static world event table

use serde::{Deserialize, Serialize};

use crate::world_events::behavior::{
    BountifulBloom, LuckyFind, MeteorShower, TravelingMerchant, WorldEventBehavior,
};

/// Which behaviour an event runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    MeteorShower,
    TravelingMerchant,
    BountifulBloom,
    LuckyFind,
}

impl EventKind {
    /// Fresh behaviour state for one session
    pub fn behavior(&self) -> Box<dyn WorldEventBehavior> {
        match self {
            EventKind::MeteorShower => Box::new(MeteorShower::new()),
            EventKind::TravelingMerchant => Box::new(TravelingMerchant::new()),
            EventKind::BountifulBloom => Box::new(BountifulBloom),
            EventKind::LuckyFind => Box::new(LuckyFind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEventDefinition {
    pub id: String,
    pub name: String,
    pub kind: EventKind,
    /// 0 = instantaneous
    pub duration_seconds: f32,
    /// Chance of activating on one scheduling check
    pub roll_probability: f32,
}

impl WorldEventDefinition {
    pub fn new(id: &str, name: &str, kind: EventKind, duration_seconds: f32, roll_probability: f32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            duration_seconds,
            roll_probability,
        }
    }

    pub fn is_instant(&self) -> bool {
        self.duration_seconds <= 0.0
    }
}

/// The built-in event table, in check order
pub fn default_events() -> Vec<WorldEventDefinition> {
    vec![
        WorldEventDefinition::new("meteor_shower", "Meteor Shower", EventKind::MeteorShower, 60.0, 0.15),
        WorldEventDefinition::new(
            "traveling_merchant",
            "Traveling Merchant",
            EventKind::TravelingMerchant,
            120.0,
            0.2,
        ),
        WorldEventDefinition::new("bountiful_bloom", "Bountiful Bloom", EventKind::BountifulBloom, 0.0, 0.25),
        WorldEventDefinition::new("lucky_find", "Lucky Find", EventKind::LuckyFind, 0.0, 0.3),
    ]
}
