//! Point-mass body used in place of a rigid-body engine
//!
//! Forces accumulate between steps and are consumed by [`Body::integrate`].
//! Linear drag bounds the speed (terminal speed = force / (mass * drag)).
//! A sleeping body keeps its pose and ignores integration until woken.

use glam::Vec3;

#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    mass: f32,
    drag: f32,
    accumulated_force: Vec3,
    asleep: bool,
}

impl Body {
    pub fn new(mass: f32, drag: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass,
            drag,
            accumulated_force: Vec3::ZERO,
            asleep: false,
        }
    }

    /// Queue a force for the next integration step
    pub fn add_force(&mut self, force: Vec3) {
        self.accumulated_force += force;
    }

    /// Stop all motion and drop queued forces
    pub fn reset_velocity(&mut self) {
        self.velocity = Vec3::ZERO;
        self.accumulated_force = Vec3::ZERO;
    }

    pub fn sleep(&mut self) {
        self.asleep = true;
        self.reset_velocity();
    }

    pub fn wake_up(&mut self) {
        self.asleep = false;
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Advance one step with semi-implicit Euler
    pub fn integrate(&mut self, dt: f32) {
        if self.asleep {
            self.accumulated_force = Vec3::ZERO;
            return;
        }
        let acceleration = self.accumulated_force / self.mass;
        self.velocity += acceleration * dt;
        self.velocity *= (1.0 - self.drag * dt).max(0.0);
        self.position += self.velocity * dt;
        self.accumulated_force = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_moves_body() {
        let mut body = Body::new(1.0, 0.0);
        body.add_force(Vec3::X * 2.0);
        body.integrate(0.5);
        assert!((body.velocity.x - 1.0).abs() < 1e-6);
        assert!((body.position.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_force_is_consumed() {
        let mut body = Body::new(1.0, 0.0);
        body.add_force(Vec3::Y);
        body.integrate(1.0);
        body.integrate(1.0);
        assert!((body.velocity.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_drag_bounds_speed() {
        let mut body = Body::new(1.0, 2.0);
        for _ in 0..2000 {
            body.add_force(Vec3::Z * 2.0);
            body.integrate(0.02);
        }
        assert!(body.velocity.z < 1.0);
        assert!(body.velocity.z > 0.9);
    }

    #[test]
    fn test_sleeping_body_does_not_move() {
        let mut body = Body::new(1.0, 0.0);
        body.velocity = Vec3::X;
        body.sleep();
        body.add_force(Vec3::X);
        body.integrate(1.0);
        assert_eq!(body.position, Vec3::ZERO);

        body.wake_up();
        body.add_force(Vec3::X);
        body.integrate(1.0);
        assert!(body.position.x > 0.0);
    }
}
