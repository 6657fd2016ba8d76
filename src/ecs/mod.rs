pub mod registry;

pub use registry::{EntityRecord, EntityRegistry};
