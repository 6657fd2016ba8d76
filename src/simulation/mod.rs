//! Frame loop and the world context that owns every subsystem

pub mod events;
pub mod layout;
pub mod world;

pub use events::{HostileDeath, ItemProduced, RewardEvent, RewardSource, SimulationEvent};
pub use layout::PLAYER_SPAWN;
pub use world::{NotificationHandler, RewardHandler, SimulationWorld};
