//! Simulation layer - the fixed step and the headless match runner

pub mod runner;
pub mod tick;

pub use runner::{MatchRunner, MatchSummary};
pub use tick::{run_fixed_step, StepEvent, StepReport};
