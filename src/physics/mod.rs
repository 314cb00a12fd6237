//! Stand-ins for the physics and collision collaborators

pub mod body;
pub mod collision;

pub use body::Body;
pub use collision::{ColliderTag, CollisionWorld, ProximityEvent, StaticColliders, WithBodies};
