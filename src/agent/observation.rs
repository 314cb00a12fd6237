//! Fixed-size observation vector handed to policies
//!
//! Layout (10 floats):
//! - `0..4`  agent orientation quaternion (x, y, z, w)
//! - `4..7`  unit direction from the contact point to the target node's center
//! - `7`     how squarely the contact point sits in front of the node
//! - `8`     how squarely the agent faces into the node
//! - `9`     contact point to node distance over the arena diameter
//!
//! Without a target node the whole vector is zero.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::arena::node::ResourceNode;

pub const OBSERVATION_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f32; OBSERVATION_SIZE]);

impl Observation {
    /// The all-zero observation used when there is no target
    pub const SENTINEL: Observation = Observation([0.0; OBSERVATION_SIZE]);

    pub fn encode(
        orientation: Quat,
        forward: Vec3,
        contact_point: Vec3,
        target: Option<&ResourceNode>,
        diameter: f32,
    ) -> Self {
        let Some(node) = target else {
            return Self::SENTINEL;
        };

        let q = orientation.normalize();
        let to_node = node.center() - contact_point;
        let direction = to_node.normalize_or_zero();
        let into_node = -node.up_axis().normalize_or_zero();

        Self([
            q.x,
            q.y,
            q.z,
            q.w,
            direction.x,
            direction.y,
            direction.z,
            direction.dot(into_node),
            forward.normalize_or_zero().dot(into_node),
            to_node.length() / diameter,
        ])
    }

    pub fn is_sentinel(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Agent orientation, or `None` for the sentinel
    pub fn orientation(&self) -> Option<Quat> {
        let q = Quat::from_xyzw(self.0[0], self.0[1], self.0[2], self.0[3]);
        if q.length_squared() > f32::EPSILON {
            Some(q.normalize())
        } else {
            None
        }
    }

    pub fn direction_to_node(&self) -> Vec3 {
        Vec3::new(self.0[4], self.0[5], self.0[6])
    }

    pub fn front_alignment(&self) -> f32 {
        self.0[7]
    }

    pub fn facing_alignment(&self) -> f32 {
        self.0[8]
    }

    pub fn normalized_distance(&self) -> f32 {
        self.0[9]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}
