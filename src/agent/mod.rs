//! Agent layer - per-agent behavior, the policy vectors and spawn placement

pub mod action;
pub mod controller;
pub mod observation;
pub mod spawn;

pub use action::{AgentAction, ManualInput, ACTION_SIZE};
pub use controller::AgentController;
pub use observation::{Observation, OBSERVATION_SIZE};
pub use spawn::{find_safe_spawn, SpawnPose};
