//! Safe spawn placement
//!
//! Candidates are drawn either in front of a random node (facing it) or at a
//! random spot in the open air around the field center. A candidate is kept
//! only if nothing occupies a small sphere around it.

use glam::{Quat, Vec3};
use rand::Rng;

use crate::arena::field::ResourceField;
use crate::core::config::AgentConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::math::look_angles;
use crate::physics::collision::CollisionWorld;

/// Distance range from the chosen node when spawning in front of it
const NODE_DISTANCE_RANGE: (f32, f32) = (0.7, 1.5);
/// Rotation about the node's up axis applied to the sideways vector (degrees)
const NODE_APPROACH_ANGLE_DEG: f32 = 70.0;
/// Height range above the field center for open-air spawns
const OPEN_HEIGHT_RANGE: (f32, f32) = (1.2, 2.5);
/// Radius range from the field center for open-air spawns
const OPEN_RADIUS_RANGE: (f32, f32) = (2.0, 7.0);
/// Random pitch/yaw jitter for open-air spawns (degrees)
const OPEN_ANGLE_JITTER_DEG: f32 = 7.0;

/// Where and how an agent starts an episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Candidates drawn before this one was accepted (including it)
    pub attempts: u32,
}

/// Horizontal vector perpendicular to `up`, falling back to +X when `up` is vertical
fn sideways(up: Vec3) -> Vec3 {
    up.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X)
}

fn candidate_near_node<R: Rng>(field: &ResourceField, rng: &mut R) -> Result<(Vec3, f32, f32)> {
    let id = field.random_node(rng).ok_or(ArenaError::EmptyField)?;
    let node = field.node(id);

    let distance = rng.gen_range(NODE_DISTANCE_RANGE.0..NODE_DISTANCE_RANGE.1);
    let up = node.up_axis();
    let approach =
        Quat::from_axis_angle(up, NODE_APPROACH_ANGLE_DEG.to_radians()) * sideways(up);
    let position = node.center() + approach * distance;

    let (yaw, pitch) = look_angles(node.center() - position).unwrap_or((0.0, 0.0));
    Ok((position, yaw, pitch))
}

fn candidate_in_open<R: Rng>(field: &ResourceField, rng: &mut R) -> (Vec3, f32, f32) {
    let height = rng.gen_range(OPEN_HEIGHT_RANGE.0..OPEN_HEIGHT_RANGE.1);
    let radius = rng.gen_range(OPEN_RADIUS_RANGE.0..OPEN_RADIUS_RANGE.1);
    let azimuth = rng.gen_range(-180.0f32..180.0).to_radians();

    let direction = Vec3::new(azimuth.sin(), 0.0, azimuth.cos());
    let position = field.center() + Vec3::Y * height + direction * radius;

    let pitch = rng.gen_range(-OPEN_ANGLE_JITTER_DEG..OPEN_ANGLE_JITTER_DEG);
    let yaw = rng.gen_range(-OPEN_ANGLE_JITTER_DEG..OPEN_ANGLE_JITTER_DEG);
    (position, yaw, pitch)
}

/// Draw candidates until one is free, up to `config.spawn_attempts`
///
/// Running out of attempts means the arena has no room for the agent, which
/// is reported as [`ArenaError::SpawnExhausted`].
pub fn find_safe_spawn<R: Rng, W: CollisionWorld + ?Sized>(
    field: &ResourceField,
    world: &W,
    rng: &mut R,
    config: &AgentConfig,
    prefer_node_proximity: bool,
) -> Result<SpawnPose> {
    for attempt in 1..=config.spawn_attempts {
        let (position, yaw, pitch) = if prefer_node_proximity {
            candidate_near_node(field, rng)?
        } else {
            candidate_in_open(field, rng)
        };

        if world.overlap_sphere(position, config.spawn_clearance, field) == 0 {
            return Ok(SpawnPose {
                position,
                yaw,
                pitch,
                attempts: attempt,
            });
        }
    }

    Err(ArenaError::SpawnExhausted {
        attempts: config.spawn_attempts,
    })
}
