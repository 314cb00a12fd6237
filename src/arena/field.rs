//! The resource field: nodes, decorative obstacles and the key lookup
//!
//! Built once from an [`ArenaLayout`]. Membership is fixed afterwards; only
//! obstacle orientations and node state change, through [`ResourceField::reset`].

use ahash::AHashMap;
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::arena::layout::{ArenaLayout, LayoutError};
use crate::arena::node::ResourceNode;
use crate::core::error::{ArenaError, Result};
use crate::core::math::orientation_with_roll;
use crate::core::types::{NodeId, ProximityKey};

/// Maximum tilt applied to obstacles on the horizontal axes (degrees)
const OBSTACLE_TILT_JITTER_DEG: f32 = 5.0;

/// A decorative obstacle (tree); its base never moves, only its orientation
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub collider_radius: f32,
    pub collider_height: f32,
}

/// Owns every node and obstacle of one arena
#[derive(Debug, Clone)]
pub struct ResourceField {
    diameter: f32,
    center: Vec3,
    obstacles: Vec<Obstacle>,
    nodes: Vec<ResourceNode>,
    by_key: AHashMap<ProximityKey, NodeId>,
    rng: ChaCha8Rng,
}

impl ResourceField {
    /// Build a field from a layout, validating it first
    pub fn from_layout(layout: &ArenaLayout, seed: u64) -> std::result::Result<Self, LayoutError> {
        layout.validate()?;

        let obstacles: Vec<Obstacle> = layout
            .obstacles
            .iter()
            .map(|o| Obstacle {
                id: o.id.clone(),
                position: Vec3::from_array(o.position),
                rotation: Quat::IDENTITY,
                collider_radius: o.collider_radius,
                collider_height: o.collider_height,
            })
            .collect();

        let obstacle_index: AHashMap<&str, usize> = obstacles
            .iter()
            .enumerate()
            .map(|(i, o)| (o.id.as_str(), i))
            .collect();

        let mut nodes = Vec::with_capacity(layout.nodes.len());
        let mut by_key = AHashMap::with_capacity(layout.nodes.len());

        for placement in &layout.nodes {
            let mut node = ResourceNode::new(
                placement.key.clone(),
                Vec3::from_array(placement.position),
                Vec3::from_array(placement.up),
                placement.zone_radius,
            );
            if let Some(ref parent) = placement.obstacle {
                let index = *obstacle_index.get(parent.as_str()).ok_or_else(|| {
                    LayoutError::UnknownObstacle {
                        key: placement.key.clone(),
                        obstacle: parent.clone(),
                    }
                })?;
                node = node.with_parent(index);
            }

            let id = NodeId(nodes.len());
            if by_key.insert(placement.key.clone(), id).is_some() {
                return Err(LayoutError::DuplicateKey(placement.key.clone()));
            }
            nodes.push(node);
        }

        let mut field = Self {
            diameter: layout.diameter,
            center: Vec3::from_array(layout.center),
            obstacles,
            nodes,
            by_key,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        field.place_nodes();
        Ok(field)
    }

    /// Re-orient every obstacle and refill every node
    ///
    /// Obstacles get a full random turn about the vertical axis and a small
    /// tilt on the other two; nodes attached to them follow.
    pub fn reset(&mut self) {
        for obstacle in &mut self.obstacles {
            let pitch = self
                .rng
                .gen_range(-OBSTACLE_TILT_JITTER_DEG..OBSTACLE_TILT_JITTER_DEG);
            let yaw = self.rng.gen_range(-180.0..180.0);
            let roll = self
                .rng
                .gen_range(-OBSTACLE_TILT_JITTER_DEG..OBSTACLE_TILT_JITTER_DEG);
            obstacle.rotation = orientation_with_roll(yaw, pitch, roll);
        }

        self.place_nodes();
        for node in &mut self.nodes {
            node.reset();
        }

        tracing::debug!(
            obstacles = self.obstacles.len(),
            nodes = self.nodes.len(),
            "field reset"
        );
    }

    fn place_nodes(&mut self) {
        for node in &mut self.nodes {
            match node.parent() {
                Some(index) => {
                    let parent = &self.obstacles[index];
                    node.place(parent.position, parent.rotation);
                }
                None => node.place(Vec3::ZERO, Quat::IDENTITY),
            }
        }
    }

    /// Resolve a proximity key to its node
    ///
    /// An unknown key means the collision collaborator and the layout disagree,
    /// which is a setup bug rather than a runtime condition.
    pub fn node_from_key(&self, key: &ProximityKey) -> Result<NodeId> {
        self.by_key
            .get(key)
            .copied()
            .ok_or_else(|| ArenaError::UnknownProximityKey(key.clone()))
    }

    pub fn node(&self, id: NodeId) -> &ResourceNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ResourceNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// Iterate nodes together with their ids, in layout order
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &ResourceNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Characteristic diameter used to normalize distances
    pub fn diameter(&self) -> f32 {
        self.diameter
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Number of nodes that still need hatch time
    pub fn active_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.needs_time()).count()
    }

    /// Pick a uniformly random node using the caller's random stream
    pub fn random_node<R: Rng>(&self, rng: &mut R) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(rng.gen_range(0..self.nodes.len())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_field() -> ResourceField {
        ResourceField::from_layout(&ArenaLayout::default_layout(), 7).unwrap()
    }

    #[test]
    fn test_every_layout_key_resolves() {
        let layout = ArenaLayout::default_layout();
        let field = make_field();
        for (i, placement) in layout.nodes.iter().enumerate() {
            assert_eq!(field.node_from_key(&placement.key).unwrap(), NodeId(i));
        }
    }

    #[test]
    fn test_unknown_key_is_error() {
        let field = make_field();
        let result = field.node_from_key(&ProximityKey::new("nowhere"));
        assert!(matches!(result, Err(ArenaError::UnknownProximityKey(_))));
    }

    #[test]
    fn test_reset_refills_nodes() {
        let mut field = make_field();
        field.node_mut(NodeId(0)).deposit(1.0);
        field.node_mut(NodeId(3)).deposit(0.5);
        assert_eq!(field.active_node_count(), field.nodes().len() - 1);

        field.reset();
        for node in field.nodes() {
            assert!(node.is_active());
            assert_eq!(node.deposited_count(), 0);
        }
    }

    #[test]
    fn test_reset_jitters_obstacles_within_tilt() {
        let mut field = make_field();
        field.reset();
        for obstacle in field.obstacles() {
            let up = obstacle.rotation * Vec3::Y;
            // 5 degrees on two axes tilts the trunk by well under 10 degrees
            assert!(up.y > 10f32.to_radians().cos());
        }
    }

    #[test]
    fn test_nodes_follow_obstacles() {
        let mut field = make_field();
        field.reset();
        for node in field.nodes() {
            let parent = &field.obstacles()[node.parent().unwrap()];
            let offset = node.center() - parent.position;
            let local = parent.rotation.inverse() * offset;
            assert!((local.x.abs() - 0.6).abs() < 1e-4);
            assert!((node.up_axis().length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_same_seed_same_reset() {
        let mut a = make_field();
        let mut b = make_field();
        a.reset();
        b.reset();
        for (x, y) in a.obstacles().iter().zip(b.obstacles()) {
            assert_eq!(x.rotation, y.rotation);
        }
    }
}
