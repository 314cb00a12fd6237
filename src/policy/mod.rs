//! Policy boundary
//!
//! A policy turns a 10-float observation into a 5-float action. Trained
//! models and human input sit behind the same trait; the built-in policies
//! here are enough to run matches headless.

use glam::Quat;

use crate::agent::action::{AgentAction, ManualInput};
use crate::agent::observation::Observation;

pub trait Policy {
    /// Static identifier of the policy implementation.
    fn kind(&self) -> &'static str;

    /// Produce an action for the provided observation.
    fn decide(&mut self, observation: &Observation) -> AgentAction;

    /// Reward earned since the previous decision (training only).
    fn observe_reward(&mut self, _reward: f32) {}
}

/// Never moves
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn kind(&self) -> &'static str {
        "idle"
    }

    fn decide(&mut self, _observation: &Observation) -> AgentAction {
        AgentAction::IDLE
    }
}

/// Flies straight at the target node and turns to face it
///
/// Uses nothing but the observation, so it behaves the same against any
/// arena the observation can describe.
#[derive(Debug, Clone)]
pub struct SeekerPolicy {
    /// Normalized distance below which the seeker starts to slow down
    pub slow_radius: f32,
    /// Normalized distance below which it holds its orientation
    pub settle_radius: f32,
    /// Lateral offset (in the agent frame) below which it stops steering
    pub dead_zone: f32,
    decisions: u64,
}

impl Default for SeekerPolicy {
    fn default() -> Self {
        Self {
            slow_radius: 0.05,
            settle_radius: 0.005,
            dead_zone: 0.05,
            decisions: 0,
        }
    }
}

impl SeekerPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    fn steer(&self, offset: f32) -> f32 {
        if offset > self.dead_zone {
            1.0
        } else if offset < -self.dead_zone {
            -1.0
        } else {
            0.0
        }
    }
}

impl Policy for SeekerPolicy {
    fn kind(&self) -> &'static str {
        "seeker"
    }

    fn decide(&mut self, observation: &Observation) -> AgentAction {
        self.decisions += 1;

        let Some(orientation) = observation.orientation() else {
            return AgentAction::IDLE;
        };
        let direction = observation.direction_to_node();
        let distance = observation.normalized_distance();
        let throttle = (distance / self.slow_radius).clamp(0.2, 1.0);
        if distance < self.settle_radius {
            return AgentAction::new(direction * throttle, 0.0, 0.0);
        }

        let local = orientation.inverse() * direction;
        // Target behind: turn toward it as hard as possible
        let turn = if local.z < 0.0 && local.x.abs() <= self.dead_zone {
            1.0
        } else {
            self.steer(local.x)
        };
        // Positive tilt lowers the nose
        let tilt = -self.steer(local.y);

        AgentAction::new(direction * throttle, tilt, turn)
    }
}

/// Human control through [`ManualInput`]
#[derive(Debug, Default, Clone)]
pub struct ManualPolicy {
    input: ManualInput,
}

impl ManualPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the control state read on the next decision
    pub fn set_input(&mut self, input: ManualInput) {
        self.input = input;
    }

    pub fn input(&self) -> &ManualInput {
        &self.input
    }
}

impl Policy for ManualPolicy {
    fn kind(&self) -> &'static str {
        "manual"
    }

    fn decide(&mut self, observation: &Observation) -> AgentAction {
        let orientation = observation.orientation().unwrap_or(Quat::IDENTITY);
        let action = self.input.translate(orientation);
        // Pointer deltas are consumed once
        self.input.pointer_dx = 0.0;
        self.input.pointer_dy = 0.0;
        action
    }
}

/// Build one of the built-in policies by name
pub fn policy_by_kind(kind: &str) -> Option<Box<dyn Policy>> {
    match kind {
        "idle" => Some(Box::new(IdlePolicy)),
        "seeker" => Some(Box::new(SeekerPolicy::new())),
        "manual" => Some(Box::new(ManualPolicy::new())),
        _ => None,
    }
}
