pub mod config;
pub mod error;
pub mod math;
pub mod types;

pub use config::{AgentConfig, ArenaConfig, SessionConfig, SimulationConfig};
pub use error::{ArenaError, Result};
pub use types::{AgentSlot, MatchId, NodeId, ProximityKey};
