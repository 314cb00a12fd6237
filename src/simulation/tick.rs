//! Fixed step - advances every agent by one simulation step
//!
//! Phases run for all agents in registration order before the next phase
//! starts: target upkeep, decisions and actions, integration and containment,
//! deposits, episode bookkeeping.

use crate::agent::controller::AgentController;
use crate::arena::field::ResourceField;
use crate::core::error::Result;
use crate::core::types::ProximityKey;
use crate::physics::collision::{ColliderTag, CollisionWorld};
use crate::policy::Policy;

/// Events generated during one fixed step
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// An agent's deposit was accepted by a node
    Deposit {
        agent: usize,
        key: ProximityKey,
        /// Node's total deposited count after the deposit
        deposited_count: u32,
    },
    /// The deposit emptied the node
    NodeDepleted { agent: usize, key: ProximityKey },
    /// An agent was pushed back by the arena bounds
    Collision { agent: usize, tag: ColliderTag },
    /// A training episode ran out of steps and restarted
    EpisodeFinished { agent: usize, reward: f32 },
}

/// Summary of one fixed step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub events: Vec<StepEvent>,
    /// Policies queried this step
    pub decisions: usize,
}

impl StepReport {
    pub fn deposits(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, StepEvent::Deposit { .. }))
            .count()
    }
}

/// Run a single fixed step
///
/// `agents` and `policies` are paired by index. Frozen agents are skipped
/// entirely: they neither decide, move nor deposit.
pub fn run_fixed_step<W: CollisionWorld + ?Sized>(
    field: &mut ResourceField,
    agents: &mut [AgentController],
    world: &W,
    policies: &mut [Box<dyn Policy>],
    dt: f32,
) -> Result<StepReport> {
    let mut report = StepReport::default();

    for agent in agents.iter_mut() {
        agent.fixed_update(field);
    }

    act(field, agents, policies, dt, &mut report);
    integrate(agents, world, dt, &mut report);
    deliver_proximity(field, agents, world, &mut report)?;

    for (index, agent) in agents.iter_mut().enumerate() {
        if agent.is_frozen() {
            continue;
        }
        agent.record_step();
        if agent.episode_complete() {
            let reward = agent.end_episode(field, world)?;
            report.events.push(StepEvent::EpisodeFinished {
                agent: index,
                reward,
            });
        }
    }

    Ok(report)
}

/// Query policies on decision steps, otherwise repeat the last action
fn act(
    field: &ResourceField,
    agents: &mut [AgentController],
    policies: &mut [Box<dyn Policy>],
    dt: f32,
    report: &mut StepReport,
) {
    for (agent, policy) in agents.iter_mut().zip(policies.iter_mut()) {
        if agent.is_frozen() {
            continue;
        }

        let action = if agent.needs_decision() {
            if agent.is_training() {
                policy.observe_reward(agent.take_reward());
            }
            report.decisions += 1;
            policy.decide(&agent.collect_observations(field))
        } else {
            agent.last_action()
        };
        agent.on_action_received(&action, dt);
    }
}

fn integrate<W: CollisionWorld + ?Sized>(
    agents: &mut [AgentController],
    world: &W,
    dt: f32,
    report: &mut StepReport,
) {
    for (index, agent) in agents.iter_mut().enumerate() {
        if agent.is_frozen() {
            continue;
        }

        let body = agent.body_mut();
        body.integrate(dt);
        if let Some(tag) = world.contain(&mut body.position, &mut body.velocity) {
            agent.on_collision(tag);
            if tag == ColliderTag::Boundary {
                tracing::trace!(agent = index, "boundary contact");
            }
            report.events.push(StepEvent::Collision { agent: index, tag });
        }
    }
}

fn deliver_proximity<W: CollisionWorld + ?Sized>(
    field: &mut ResourceField,
    agents: &mut [AgentController],
    world: &W,
    report: &mut StepReport,
) -> Result<()> {
    for (index, agent) in agents.iter_mut().enumerate() {
        if agent.is_frozen() {
            continue;
        }

        let events = world.triggers_for(
            agent.position(),
            agent.config().body_radius,
            agent.contact_point(),
            field,
        );
        for event in events {
            if !agent.on_proximity(&event, field)? {
                continue;
            }
            let id = field.node_from_key(&event.key)?;
            let node = field.node(id);
            report.events.push(StepEvent::Deposit {
                agent: index,
                key: event.key.clone(),
                deposited_count: node.deposited_count(),
            });
            if !node.is_active() {
                report.events.push(StepEvent::NodeDepleted {
                    agent: index,
                    key: event.key,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::layout::ArenaLayout;
    use crate::core::config::AgentConfig;
    use crate::core::types::NodeId;
    use crate::physics::collision::StaticColliders;
    use crate::policy::{IdlePolicy, SeekerPolicy};
    use glam::Vec3;

    fn setup() -> (ResourceField, StaticColliders, Vec<AgentController>) {
        let field = ResourceField::from_layout(&ArenaLayout::default_layout(), 4).unwrap();
        let world = StaticColliders::for_field(&field);
        let agents = vec![
            AgentController::new("player", AgentConfig::default(), 1),
            AgentController::new("opponent", AgentConfig::default(), 2),
        ];
        (field, world, agents)
    }

    fn idle_policies() -> Vec<Box<dyn Policy>> {
        vec![Box::new(IdlePolicy), Box::new(IdlePolicy)]
    }

    /// Park an agent with its contact point on a node
    fn park_on(agent: &mut AgentController, field: &ResourceField, id: NodeId) {
        let offset = agent.contact_point() - agent.position();
        agent.set_pose(field.node(id).center() - offset, agent.yaw(), agent.pitch());
    }

    #[test]
    fn test_frozen_agents_do_nothing() {
        let (mut field, world, mut agents) = setup();
        park_on(&mut agents[0], &field, NodeId(0));
        for agent in agents.iter_mut() {
            agent.freeze().unwrap();
        }
        let mut policies = idle_policies();

        let report = run_fixed_step(&mut field, &mut agents, &world, &mut policies, 0.02).unwrap();
        assert_eq!(report.decisions, 0);
        assert!(report.events.is_empty());
        assert_eq!(field.node(NodeId(0)).remaining_hatch_time(), 1.0);
    }

    #[test]
    fn test_parked_agent_deposits_every_step() {
        let (mut field, world, mut agents) = setup();
        park_on(&mut agents[0], &field, NodeId(0));
        agents[1].set_pose(Vec3::new(0.0, 3.0, 0.0), 0.0, 0.0);
        let mut policies = idle_policies();

        let report = run_fixed_step(&mut field, &mut agents, &world, &mut policies, 0.02).unwrap();
        assert_eq!(report.deposits(), 1);
        assert_eq!(report.decisions, 2);
        assert!((field.node(NodeId(0)).remaining_hatch_time() - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_second_agent_on_depleted_node_is_noop() {
        let (mut field, world, mut agents) = setup();
        park_on(&mut agents[0], &field, NodeId(0));
        park_on(&mut agents[1], &field, NodeId(0));
        let mut policies = idle_policies();

        // Leave exactly one quantum so the player empties it
        field.node_mut(NodeId(0)).deposit(0.99);
        let report = run_fixed_step(&mut field, &mut agents, &world, &mut policies, 0.02).unwrap();

        let depleted: Vec<_> = report
            .events
            .iter()
            .filter_map(|e| match e {
                StepEvent::NodeDepleted { agent, .. } => Some(*agent),
                _ => None,
            })
            .collect();
        assert_eq!(depleted, vec![0]);
        assert_eq!(report.deposits(), 1);
        assert_eq!(field.node(NodeId(0)).deposited_count(), 1);
        assert_eq!(agents[0].resource_obtained(), 1);
        assert_eq!(agents[1].resource_obtained(), 0);
    }

    #[test]
    fn test_target_emptied_by_other_agent_is_replaced() {
        let (mut field, world, mut agents) = setup();
        agents[1].set_pose(Vec3::new(0.0, 3.0, 0.0), 0.0, 0.0);
        agents[1].update_nearest_node(&field);
        let target = agents[1].nearest_node().expect("a target");

        park_on(&mut agents[0], &field, target);
        field.node_mut(target).deposit(0.99);
        let mut policies = idle_policies();

        run_fixed_step(&mut field, &mut agents, &world, &mut policies, 0.02).unwrap();
        assert!(!field.node(target).is_active());
        assert_eq!(agents[0].resource_obtained(), 1);

        run_fixed_step(&mut field, &mut agents, &world, &mut policies, 0.02).unwrap();
        let replacement = agents[1].nearest_node().expect("a new target");
        assert_ne!(replacement, target);
        assert!(field.node(replacement).needs_time());
        assert_eq!(agents[1].resource_obtained(), 0);
    }

    #[test]
    fn test_policies_queried_on_decision_period() {
        let (mut field, world, mut agents) = setup();
        for agent in agents.iter_mut() {
            agent.set_pose(Vec3::new(0.0, 3.0, 0.0), 0.0, 0.0);
        }
        let mut policies: Vec<Box<dyn Policy>> =
            vec![Box::new(SeekerPolicy::new()), Box::new(IdlePolicy)];

        let mut decisions = 0;
        for _ in 0..10 {
            decisions +=
                run_fixed_step(&mut field, &mut agents, &world, &mut policies, 0.02).unwrap().decisions;
        }
        assert_eq!(decisions, 4);
        assert_eq!(agents[0].step_count(), 10);
    }

    #[test]
    fn test_training_episode_restarts_after_max_steps() {
        let (mut field, world, _) = setup();
        let config = AgentConfig {
            training_mode: true,
            max_steps: 3,
            ..AgentConfig::default()
        };
        let mut agents = vec![AgentController::new("trainee", config, 7)];
        agents[0].on_episode_begin(&mut field, &world).unwrap();
        let mut policies: Vec<Box<dyn Policy>> = vec![Box::new(IdlePolicy)];

        let mut finished = 0;
        for _ in 0..6 {
            let report = run_fixed_step(&mut field, &mut agents, &world, &mut policies, 0.02).unwrap();
            finished += report
                .events
                .iter()
                .filter(|e| matches!(e, StepEvent::EpisodeFinished { .. }))
                .count();
        }
        assert_eq!(finished, 2);
        assert_eq!(agents[0].step_count(), 0);
    }
}
