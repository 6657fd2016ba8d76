//! World events - rare global happenings on a probabilistic schedule

pub mod behavior;
pub mod definition;
pub mod scheduler;

pub use behavior::{
    BountifulBloom, EventContext, EventEffect, LuckyFind, MeteorShower, TravelingMerchant,
    WorldEventBehavior,
};
pub use definition::{default_events, EventKind, WorldEventDefinition};
pub use scheduler::{EventScheduler, EventSession, SchedulerTick};
