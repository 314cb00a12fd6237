//! Continuous action vector and the manual-input translator
//!
//! Layout (5 floats, nominally in [-1, 1], not enforced):
//! - `0..3` move direction in world space (x = right, y = up, z = forward)
//! - `3`    tilt rate (+1 = nose down, -1 = nose up)
//! - `4`    turn rate (+1 = right, -1 = left)

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

pub const ACTION_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentAction(pub [f32; ACTION_SIZE]);

impl AgentAction {
    pub const IDLE: AgentAction = AgentAction([0.0; ACTION_SIZE]);

    pub fn new(movement: Vec3, tilt: f32, turn: f32) -> Self {
        Self([movement.x, movement.y, movement.z, tilt, turn])
    }

    pub fn movement(&self) -> Vec3 {
        Vec3::new(self.0[0], self.0[1], self.0[2])
    }

    pub fn tilt(&self) -> f32 {
        self.0[3]
    }

    pub fn turn(&self) -> f32 {
        self.0[4]
    }
}

/// Raw control state from a human player
///
/// Opposing keys are resolved in favour of the first one (forward over back,
/// left over right, up over down). Pointer deltas only contribute their sign.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Horizontal pointer movement since the last frame
    pub pointer_dx: f32,
    /// Vertical pointer movement since the last frame
    pub pointer_dy: f32,
}

fn sign_of(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl ManualInput {
    /// Translate into an action relative to the agent's current orientation
    pub fn translate(&self, orientation: Quat) -> AgentAction {
        let forward_axis = orientation * Vec3::Z;
        let right_axis = orientation * Vec3::X;
        let up_axis = orientation * Vec3::Y;

        let forward = if self.forward {
            forward_axis
        } else if self.back {
            -forward_axis
        } else {
            Vec3::ZERO
        };
        let lateral = if self.left {
            -right_axis
        } else if self.right {
            right_axis
        } else {
            Vec3::ZERO
        };
        let vertical = if self.up {
            up_axis
        } else if self.down {
            -up_axis
        } else {
            Vec3::ZERO
        };

        let combined = (forward + lateral + vertical).normalize_or_zero();

        // Pointer moving down tilts the nose down
        let tilt = -sign_of(self.pointer_dy);
        let turn = sign_of(self.pointer_dx);

        AgentAction::new(combined, tilt, turn)
    }
}
