//! Nest Arena - two foraging agents competing for resource nodes
//!
//! The crate is the behavior core of the arena: resource nodes and the field
//! that owns them, the per-agent controller, the policy boundary and the
//! match session. Physics and collision are reduced to small stand-ins in
//! [`physics`] so whole matches can run headless.

pub mod agent;
pub mod arena;
pub mod core;
pub mod physics;
pub mod policy;
pub mod session;
pub mod simulation;
