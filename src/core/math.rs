//! Angle and orientation helpers
//!
//! Conventions: +Y is up, an unrotated body faces +Z and its right side is +X.
//! Orientation is stored as yaw (about +Y) and pitch (about the body's +X),
//! both in degrees. Positive pitch tilts the nose down, positive yaw turns right.

use glam::{EulerRot, Quat, Vec3};

const FULL_TURN_DEG: f32 = 360.0;
const HALF_TURN_DEG: f32 = 180.0;

/// Wrap an angle in degrees into (-180, 180]
pub fn wrap_signed_degrees(mut angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    angle %= FULL_TURN_DEG;
    if angle <= -HALF_TURN_DEG {
        angle += FULL_TURN_DEG;
    } else if angle > HALF_TURN_DEG {
        angle -= FULL_TURN_DEG;
    }
    angle
}

/// Move `current` toward `target` by at most `max_delta`
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Rotation for a yaw/pitch pair in degrees (roll is always zero)
pub fn orientation(yaw_deg: f32, pitch_deg: f32) -> Quat {
    Quat::from_euler(EulerRot::YXZ, yaw_deg.to_radians(), pitch_deg.to_radians(), 0.0)
}

/// Rotation for yaw/pitch/roll given in degrees, applied roll first, then pitch, then yaw
pub fn orientation_with_roll(yaw_deg: f32, pitch_deg: f32, roll_deg: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        yaw_deg.to_radians(),
        pitch_deg.to_radians(),
        roll_deg.to_radians(),
    )
}

/// Yaw and pitch (degrees) that make the forward axis point along `direction`
///
/// Returns `None` for a zero-length direction.
pub fn look_angles(direction: Vec3) -> Option<(f32, f32)> {
    let dir = direction.try_normalize()?;
    let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
    let yaw = dir.x.atan2(dir.z).to_degrees();
    let pitch = (-dir.y).atan2(horizontal).to_degrees();
    Some((yaw, pitch))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_wrap_signed_degrees() {
        assert!((wrap_signed_degrees(181.0) - -179.0).abs() < EPS);
        assert!((wrap_signed_degrees(-181.0) - 179.0).abs() < EPS);
        assert!((wrap_signed_degrees(180.0) - 180.0).abs() < EPS);
        assert!((wrap_signed_degrees(-180.0) - 180.0).abs() < EPS);
        assert!((wrap_signed_degrees(725.0) - 5.0).abs() < EPS);
        assert_eq!(wrap_signed_degrees(f32::NAN), 0.0);
    }

    #[test]
    fn test_move_towards_is_rate_limited() {
        assert!((move_towards(0.0, 1.0, 0.04) - 0.04).abs() < EPS);
        assert!((move_towards(0.0, -1.0, 0.04) - -0.04).abs() < EPS);
        assert_eq!(move_towards(0.98, 1.0, 0.04), 1.0);
    }

    #[test]
    fn test_positive_pitch_tilts_nose_down() {
        let forward = orientation(0.0, 30.0) * Vec3::Z;
        assert!(forward.y < 0.0);
        assert!(forward.z > 0.0);
    }

    #[test]
    fn test_positive_yaw_turns_right() {
        let forward = orientation(90.0, 0.0) * Vec3::Z;
        assert!((forward - Vec3::X).length() < EPS);
    }

    #[test]
    fn test_look_angles_round_trip() {
        let target = Vec3::new(1.0, -0.5, 2.0);
        let (yaw, pitch) = look_angles(target).unwrap();
        let forward = orientation(yaw, pitch) * Vec3::Z;
        assert!((forward - target.normalize()).length() < 1e-3);
        assert!(look_angles(Vec3::ZERO).is_none());
    }
}
