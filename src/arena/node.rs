//! Resource nodes (nests) that agents deposit hatch time into
//!
//! A node starts with one unit of hatch time. Every deposit spends part of it;
//! when the remaining time reaches zero the node deactivates, reveals its
//! hatched artifact and counts one deposit. Nodes only come back through
//! [`ResourceNode::reset`], which happens between matches.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::ProximityKey;

/// Hatch time a freshly reset node holds
pub const UNIT_CAPACITY: f32 = 1.0;

/// A depletable deposit target with an orientation axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    key: ProximityKey,
    /// Index of the parent obstacle in the field, if attached to one
    parent: Option<usize>,
    local_position: Vec3,
    local_up: Vec3,
    zone_radius: f32,

    center: Vec3,
    up_axis: Vec3,

    remaining_hatch_time: f32,
    deposited_count: u32,
    active: bool,
    artifact_visible: bool,
}

impl ResourceNode {
    /// Create a full, active node posed at its local placement
    pub fn new(key: ProximityKey, local_position: Vec3, local_up: Vec3, zone_radius: f32) -> Self {
        let up = local_up.normalize_or_zero();
        Self {
            key,
            parent: None,
            local_position,
            local_up: up,
            zone_radius,
            center: local_position,
            up_axis: up,
            remaining_hatch_time: UNIT_CAPACITY,
            deposited_count: 0,
            active: true,
            artifact_visible: false,
        }
    }

    pub(crate) fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub(crate) fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Recompute the world pose from the parent's pose
    pub(crate) fn place(&mut self, parent_position: Vec3, parent_rotation: Quat) {
        self.center = parent_position + parent_rotation * self.local_position;
        self.up_axis = (parent_rotation * self.local_up).normalize_or_zero();
    }

    /// Spend hatch time on this node, returning the node's deposited count
    ///
    /// The subtraction uses the requested amount and the result is clamped
    /// into `[0, UNIT_CAPACITY]`; `spent` only records how much of the request
    /// the node could actually absorb. An inactive node ignores deposits.
    pub fn deposit(&mut self, amount: f32) -> u32 {
        if !self.active || amount.is_nan() {
            return self.deposited_count;
        }

        let spent = amount.clamp(0.0, self.remaining_hatch_time);
        self.remaining_hatch_time = (self.remaining_hatch_time - amount).clamp(0.0, UNIT_CAPACITY);
        tracing::trace!(key = %self.key, spent, remaining = self.remaining_hatch_time, "deposit");

        if self.remaining_hatch_time <= 0.0 {
            self.remaining_hatch_time = 0.0;
            self.active = false;
            self.artifact_visible = true;
            self.deposited_count += 1;
            tracing::debug!(key = %self.key, "node depleted");
        }

        self.deposited_count
    }

    /// Refill, reactivate and hide the artifact
    pub fn reset(&mut self) {
        self.remaining_hatch_time = UNIT_CAPACITY;
        self.active = true;
        self.artifact_visible = false;
        self.deposited_count = 0;
    }

    /// Whether there is hatch time left to spend
    pub fn needs_time(&self) -> bool {
        self.remaining_hatch_time > 0.0
    }

    pub fn key(&self) -> &ProximityKey {
        &self.key
    }

    pub fn remaining_hatch_time(&self) -> f32 {
        self.remaining_hatch_time
    }

    pub fn deposited_count(&self) -> u32 {
        self.deposited_count
    }

    /// Whether the deposit zone accepts collisions
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the hatched artifact should be shown
    pub fn artifact_visible(&self) -> bool {
        self.artifact_visible
    }

    /// World-space center of the deposit zone
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Unit vector pointing out of the node's opening
    pub fn up_axis(&self) -> Vec3 {
        self.up_axis
    }

    pub fn zone_radius(&self) -> f32 {
        self.zone_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_node() -> ResourceNode {
        ResourceNode::new(ProximityKey::new("nest"), Vec3::new(1.0, 2.0, 0.0), Vec3::Y, 0.1)
    }

    #[test]
    fn test_node_creation() {
        let node = make_node();
        assert!(node.is_active());
        assert!(node.needs_time());
        assert!(!node.artifact_visible());
        assert_eq!(node.remaining_hatch_time(), UNIT_CAPACITY);
        assert_eq!(node.deposited_count(), 0);
        assert_eq!(node.center(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_hundred_quanta_deplete_node() {
        let mut node = make_node();
        let mut events = 0;
        while node.is_active() {
            node.deposit(0.01);
            events += 1;
            assert!(events <= 101, "node should deplete after about 100 quanta");
        }
        assert!((100..=101).contains(&events));
        assert_eq!(node.deposited_count(), 1);
        assert!(node.artifact_visible());
        assert!(!node.needs_time());
    }

    #[test]
    fn test_oversized_deposit_clamps_to_zero() {
        let mut node = make_node();
        assert_eq!(node.deposit(0.4), 0);
        assert_eq!(node.deposit(5.0), 1);
        assert_eq!(node.remaining_hatch_time(), 0.0);
    }

    #[test]
    fn test_deposit_on_inactive_node_is_noop() {
        let mut node = make_node();
        node.deposit(1.0);
        assert!(!node.is_active());

        assert_eq!(node.deposit(0.5), 1);
        assert_eq!(node.deposited_count(), 1);
        assert_eq!(node.remaining_hatch_time(), 0.0);
    }

    #[test]
    fn test_negative_deposit_cannot_overfill() {
        let mut node = make_node();
        node.deposit(-3.0);
        assert_eq!(node.remaining_hatch_time(), UNIT_CAPACITY);
        assert!(node.is_active());
    }

    #[test]
    fn test_reset_restores_node() {
        let mut node = make_node();
        node.deposit(1.0);
        node.reset();
        assert_eq!(node.remaining_hatch_time(), UNIT_CAPACITY);
        assert!(node.is_active());
        assert!(!node.artifact_visible());
        assert_eq!(node.deposited_count(), 0);
    }

    #[test]
    fn test_place_follows_parent_rotation() {
        let mut node = ResourceNode::new(ProximityKey::new("n"), Vec3::X, Vec3::X, 0.1);
        node.place(Vec3::new(0.0, 0.0, 5.0), Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        assert!((node.center() - Vec3::new(0.0, 0.0, 4.0)).length() < 1e-5);
        assert!((node.up_axis() - Vec3::NEG_Z).length() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_remaining_time_stays_in_range(amounts in prop::collection::vec(-2.0f32..2.0, 0..64)) {
            let mut node = make_node();
            for amount in amounts {
                node.deposit(amount);
                prop_assert!(node.remaining_hatch_time() >= 0.0);
                prop_assert!(node.remaining_hatch_time() <= UNIT_CAPACITY);
                prop_assert_eq!(node.is_active(), node.needs_time());
            }
        }

        #[test]
        fn prop_one_count_per_depletion(amounts in prop::collection::vec(0.0f32..0.3, 1..200)) {
            let mut node = make_node();
            let mut crossings = 0;
            for amount in amounts {
                let was_active = node.is_active();
                node.deposit(amount);
                if was_active && !node.is_active() {
                    crossings += 1;
                }
            }
            prop_assert!(crossings <= 1);
            prop_assert_eq!(node.deposited_count(), crossings);
        }

        #[test]
        fn prop_inactive_node_is_frozen(amount in -5.0f32..5.0) {
            let mut node = make_node();
            node.deposit(UNIT_CAPACITY);
            let before = (node.deposited_count(), node.remaining_hatch_time());
            node.deposit(amount);
            prop_assert_eq!(before, (node.deposited_count(), node.remaining_hatch_time()));
        }
    }
}
