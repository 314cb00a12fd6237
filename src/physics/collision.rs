//! Collision collaborator boundary
//!
//! The behavior core never inspects geometry itself. It asks a
//! [`CollisionWorld`] whether a spawn candidate is occupied, receives
//! [`ProximityEvent`]s for deposit zones, and learns about boundary contacts.
//! [`StaticColliders`] is a small implementation over the field's own
//! obstacles and nodes, enough to run matches headless.

use glam::Vec3;

use crate::arena::field::ResourceField;
use crate::core::types::ProximityKey;

/// What a body bumped into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderTag {
    /// Arena wall or ceiling
    Boundary,
    Ground,
    Obstacle,
}

/// A body is touching a deposit zone
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityEvent {
    pub key: ProximityKey,
    /// Point on the deposit zone closest to the agent's contact point
    pub closest_point: Vec3,
}

pub trait CollisionWorld {
    /// Number of colliders intersecting the sphere
    fn overlap_sphere(&self, center: Vec3, radius: f32, field: &ResourceField) -> usize;

    /// Deposit zones overlapped by a body, with closest points to its contact point
    fn triggers_for(
        &self,
        body_center: Vec3,
        body_radius: f32,
        contact_point: Vec3,
        field: &ResourceField,
    ) -> Vec<ProximityEvent>;

    /// Push a body back inside the arena, reporting what it hit
    fn contain(&self, position: &mut Vec3, velocity: &mut Vec3) -> Option<ColliderTag>;
}

/// Cylindrical arena with obstacle trunks and spherical node zones
#[derive(Debug, Clone)]
pub struct StaticColliders {
    pub center: Vec3,
    pub boundary_radius: f32,
    pub ground_height: f32,
    pub ceiling_height: f32,
}

/// Ceiling above the arena floor
const DEFAULT_CEILING: f32 = 8.0;

impl StaticColliders {
    /// Bounds matching the field's characteristic diameter
    pub fn for_field(field: &ResourceField) -> Self {
        Self {
            center: field.center(),
            boundary_radius: field.diameter() / 2.0,
            ground_height: field.center().y,
            ceiling_height: field.center().y + DEFAULT_CEILING,
        }
    }
}

/// Distance from a point to the segment `a..b`
fn distance_to_segment(point: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

impl CollisionWorld for StaticColliders {
    fn overlap_sphere(&self, center: Vec3, radius: f32, field: &ResourceField) -> usize {
        let trunks = field
            .obstacles()
            .iter()
            .filter(|o| {
                let top = o.position + o.rotation * (Vec3::Y * o.collider_height);
                distance_to_segment(center, o.position, top) <= o.collider_radius + radius
            })
            .count();

        let nodes = field
            .nodes()
            .iter()
            .filter(|n| n.center().distance(center) <= n.zone_radius() + radius)
            .count();

        let ground = usize::from(center.y - radius < self.ground_height);
        trunks + nodes + ground
    }

    fn triggers_for(
        &self,
        body_center: Vec3,
        body_radius: f32,
        contact_point: Vec3,
        field: &ResourceField,
    ) -> Vec<ProximityEvent> {
        field
            .nodes()
            .iter()
            .filter(|n| n.is_active())
            .filter(|n| n.center().distance(body_center) <= n.zone_radius() + body_radius)
            .map(|n| {
                let offset = contact_point - n.center();
                let closest_point = if offset.length() <= n.zone_radius() {
                    contact_point
                } else {
                    n.center() + offset.normalize() * n.zone_radius()
                };
                ProximityEvent {
                    key: n.key().clone(),
                    closest_point,
                }
            })
            .collect()
    }

    fn contain(&self, position: &mut Vec3, velocity: &mut Vec3) -> Option<ColliderTag> {
        let mut hit = None;

        let horizontal = Vec3::new(position.x - self.center.x, 0.0, position.z - self.center.z);
        let distance = horizontal.length();
        if distance > self.boundary_radius {
            let normal = horizontal / distance;
            *position -= normal * (distance - self.boundary_radius);
            let outward = velocity.dot(normal);
            if outward > 0.0 {
                *velocity -= normal * outward;
            }
            hit = Some(ColliderTag::Boundary);
        }

        if position.y > self.ceiling_height {
            position.y = self.ceiling_height;
            velocity.y = velocity.y.min(0.0);
            hit = Some(ColliderTag::Boundary);
        } else if position.y < self.ground_height {
            position.y = self.ground_height;
            velocity.y = velocity.y.max(0.0);
            hit = hit.or(Some(ColliderTag::Ground));
        }

        hit
    }
}

/// A world with extra occupied spheres, such as the other agents
pub struct WithBodies<'a, W: CollisionWorld + ?Sized> {
    inner: &'a W,
    bodies: Vec<(Vec3, f32)>,
}

impl<'a, W: CollisionWorld + ?Sized> WithBodies<'a, W> {
    pub fn new(inner: &'a W, bodies: Vec<(Vec3, f32)>) -> Self {
        Self { inner, bodies }
    }
}

impl<W: CollisionWorld + ?Sized> CollisionWorld for WithBodies<'_, W> {
    fn overlap_sphere(&self, center: Vec3, radius: f32, field: &ResourceField) -> usize {
        let bodies = self
            .bodies
            .iter()
            .filter(|(position, body_radius)| position.distance(center) <= body_radius + radius)
            .count();
        self.inner.overlap_sphere(center, radius, field) + bodies
    }

    fn triggers_for(
        &self,
        body_center: Vec3,
        body_radius: f32,
        contact_point: Vec3,
        field: &ResourceField,
    ) -> Vec<ProximityEvent> {
        self.inner
            .triggers_for(body_center, body_radius, contact_point, field)
    }

    fn contain(&self, position: &mut Vec3, velocity: &mut Vec3) -> Option<ColliderTag> {
        self.inner.contain(position, velocity)
    }
}
