//! Integration tests for the agent layer
//!
//! These tests drive an AgentController through its public API against a
//! real field and the static collision world:
//! - Spawn placement and its failure mode in a fully occupied world
//! - Nearest-node selection over arbitrary depletion patterns
//! - Steering limits under arbitrary action sequences
//! - Deposit scoring, including the cumulative-count rule

use std::cell::Cell;

use glam::Vec3;
use nest_arena::agent::{AgentAction, AgentController, ManualInput};
use nest_arena::arena::{ArenaLayout, ResourceField};
use nest_arena::core::{AgentConfig, ArenaError, NodeId};
use nest_arena::physics::{ColliderTag, CollisionWorld, ProximityEvent, StaticColliders};
use proptest::prelude::*;

fn field(seed: u64) -> ResourceField {
    ResourceField::from_layout(&ArenaLayout::default_layout(), seed).unwrap()
}

fn agent(training: bool) -> AgentController {
    let config = AgentConfig {
        training_mode: training,
        ..AgentConfig::default()
    };
    AgentController::new("agent", config, 17)
}

/// Move the agent so its contact point sits on the node's center
fn touch(agent: &mut AgentController, field: &ResourceField, id: NodeId) -> ProximityEvent {
    let center = field.node(id).center();
    let offset = agent.contact_point() - agent.position();
    agent.set_pose(center - offset, agent.yaw(), agent.pitch());
    ProximityEvent {
        key: field.node(id).key().clone(),
        closest_point: center,
    }
}

/// Every overlap query reports an occupant
struct NoRoom {
    queries: Cell<u32>,
}

impl CollisionWorld for NoRoom {
    fn overlap_sphere(&self, _: Vec3, _: f32, _: &ResourceField) -> usize {
        self.queries.set(self.queries.get() + 1);
        2
    }

    fn triggers_for(&self, _: Vec3, _: f32, _: Vec3, _: &ResourceField) -> Vec<ProximityEvent> {
        Vec::new()
    }

    fn contain(&self, _: &mut Vec3, _: &mut Vec3) -> Option<ColliderTag> {
        None
    }
}

// ============================================================================
// Spawn placement
// ============================================================================

#[test]
fn test_spawn_fails_after_exactly_one_hundred_attempts() {
    let mut field = field(1);
    let world = NoRoom {
        queries: Cell::new(0),
    };
    let mut agent = agent(false);

    let result = agent.on_episode_begin(&mut field, &world);
    assert!(matches!(result, Err(ArenaError::SpawnExhausted { attempts: 100 })));
    assert_eq!(world.queries.get(), 100);
}

#[test]
fn test_episode_begin_outside_training_keeps_field() {
    let mut field = field(2);
    let world = StaticColliders::for_field(&field);
    field.node_mut(NodeId(3)).deposit(1.0);

    let mut agent = agent(false);
    agent.on_episode_begin(&mut field, &world).unwrap();

    assert!(!field.node(NodeId(3)).is_active());
    assert_ne!(agent.nearest_node(), Some(NodeId(3)));
}

#[test]
fn test_episode_begin_in_training_resets_field() {
    let mut field = field(2);
    let world = StaticColliders::for_field(&field);
    field.node_mut(NodeId(3)).deposit(1.0);

    let mut agent = agent(true);
    agent.add_reward(2.0);
    agent.on_episode_begin(&mut field, &world).unwrap();

    assert!(field.node(NodeId(3)).is_active());
    assert_eq!(agent.resource_obtained(), 0);
    assert_eq!(agent.episode_reward(), 0.0);
    assert_eq!(agent.take_reward(), 0.0);
    assert!(agent.nearest_node().is_some());
}

// ============================================================================
// Deposits and scoring
// ============================================================================

/// The score grows by the node's total deposited count on every accepted
/// deposit, not by one per depletion. Since a node stops accepting deposits
/// once it is depleted, the visible effect is +1 on the emptying event only.
#[test]
fn test_score_adds_node_total_count_per_event() {
    let mut field = field(4);
    let mut agent = agent(false);
    let id = NodeId(5);
    let event = touch(&mut agent, &field, id);

    let mut events = 0;
    while field.node(id).is_active() {
        let before = agent.resource_obtained();
        assert!(agent.on_proximity(&event, &mut field).unwrap());
        let gained = agent.resource_obtained() - before;
        assert_eq!(gained, field.node(id).deposited_count());
        events += 1;
    }
    assert!((100..=101).contains(&events), "took {events} events");
    assert_eq!(agent.resource_obtained(), 1);

    // Further events against the empty node change nothing
    agent.on_proximity(&event, &mut field).unwrap();
    assert_eq!(agent.resource_obtained(), 1);
    assert_eq!(field.node(id).deposited_count(), 1);
}

#[test]
fn test_contact_tolerance_is_strict() {
    let mut field = field(4);
    let mut agent = agent(false);
    let id = NodeId(0);
    let mut event = touch(&mut agent, &field, id);
    event.closest_point = agent.contact_point() + Vec3::X * 0.0085;

    assert!(!agent.on_proximity(&event, &mut field).unwrap());
    assert_eq!(field.node(id).remaining_hatch_time(), 1.0);
}

#[test]
fn test_training_reward_uses_target_orientation() {
    let mut field = field(6);
    let mut agent = agent(true);
    let id = NodeId(1);

    // Facing away from the opening: base reward only
    let out_of_node = field.node(id).up_axis();
    let (yaw, pitch) = nest_arena::core::math::look_angles(out_of_node).unwrap();
    agent.set_pose(Vec3::ZERO, yaw, pitch);
    let event = touch(&mut agent, &field, id);
    agent.update_nearest_node(&field);
    assert_eq!(agent.nearest_node(), Some(id));

    agent.on_proximity(&event, &mut field).unwrap();
    assert!((agent.take_reward() - 0.01).abs() < 1e-6);
}

// ============================================================================
// Manual control
// ============================================================================

#[test]
fn test_heuristic_matches_agent_frame() {
    let mut agent = agent(false);
    agent.set_pose(Vec3::ZERO, -90.0, 0.0);
    let action = agent.heuristic(&ManualInput {
        forward: true,
        pointer_dy: 1.0,
        ..Default::default()
    });

    assert!((action.movement() - Vec3::NEG_X).length() < 1e-5);
    assert_eq!(action.tilt(), -1.0);
    assert!((action.movement() - agent.forward()).length() < 1e-5);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_nearest_node_is_closest_eligible(
        depleted in proptest::collection::vec(any::<bool>(), 12),
        x in -8.0f32..8.0,
        y in 0.5f32..4.0,
        z in -8.0f32..8.0,
    ) {
        let mut field = field(12);
        for (i, gone) in depleted.iter().enumerate() {
            if *gone {
                field.node_mut(NodeId(i)).deposit(1.0);
            }
        }
        let mut agent = agent(false);
        agent.set_pose(Vec3::new(x, y, z), 0.0, 0.0);
        agent.update_nearest_node(&field);

        let contact = agent.contact_point();
        match agent.nearest_node() {
            None => prop_assert!(field.nodes().iter().all(|n| !n.needs_time())),
            Some(id) => {
                let chosen = field.node(id);
                prop_assert!(chosen.needs_time());
                let best = chosen.center().distance(contact);
                for node in field.nodes().iter().filter(|n| n.needs_time()) {
                    prop_assert!(best <= node.center().distance(contact));
                }
            }
        }
    }

    #[test]
    fn prop_steering_stays_within_limits(
        actions in proptest::collection::vec((-1.0f32..1.0, -1.0f32..1.0), 1..400),
        start_yaw in -180.0f32..180.0,
    ) {
        let mut agent = agent(false);
        agent.set_pose(Vec3::ZERO, start_yaw, 0.0);
        for (tilt, turn) in actions {
            agent.on_action_received(&AgentAction::new(Vec3::ZERO, tilt, turn), 0.02);
            prop_assert!(agent.pitch().abs() <= 30.0);
            prop_assert!(agent.yaw() > -180.0 && agent.yaw() <= 180.0);
            let (smoothed_tilt, smoothed_turn) = agent.smoothed_rates();
            prop_assert!(smoothed_tilt.abs() <= 1.0 && smoothed_turn.abs() <= 1.0);
        }
    }
}
