pub mod clock;
pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use clock::{duration_reached, Clock, FrameTime, TimeOfDay};
pub use config::WorldConfig;
pub use error::{Result, WorldError};
pub use rng::SimRng;
pub use types::{EntityId, EntityKind, ItemCounts, Position};
