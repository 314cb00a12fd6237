//! Arena contents: resource nodes, obstacles and the layouts they come from

pub mod field;
pub mod layout;
pub mod node;

pub use field::{Obstacle, ResourceField};
pub use layout::{ArenaLayout, LayoutError, NodePlacement, ObstaclePlacement};
pub use node::{ResourceNode, UNIT_CAPACITY};
