//! Per-agent behavior core
//!
//! The controller owns everything the agent decides for itself: its pose,
//! the smoothed steering state, the current target node and its score.
//! Motion is handed to a point-mass [`Body`]; the field is never owned, only
//! borrowed for the duration of each call.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::agent::action::{AgentAction, ManualInput};
use crate::agent::observation::Observation;
use crate::agent::spawn::{find_safe_spawn, SpawnPose};
use crate::arena::field::ResourceField;
use crate::core::config::AgentConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::math::{clamp01, move_towards, orientation, wrap_signed_degrees};
use crate::core::types::NodeId;
use crate::physics::body::Body;
use crate::physics::collision::{ColliderTag, CollisionWorld, ProximityEvent};

/// Reward for every accepted deposit event
const DEPOSIT_REWARD: f32 = 0.01;
/// Extra deposit reward at perfect alignment with the target's opening
const ALIGNMENT_BONUS: f32 = 0.02;
/// Reward for bumping into the arena boundary
const BOUNDARY_PENALTY: f32 = -0.5;

#[derive(Debug, Clone)]
pub struct AgentController {
    name: String,
    config: AgentConfig,
    body: Body,
    yaw: f32,
    pitch: f32,
    smoothed_tilt: f32,
    smoothed_turn: f32,
    resource_obtained: u32,
    frozen: bool,
    nearest_node: Option<NodeId>,
    pending_reward: f32,
    episode_reward: f32,
    step_count: u64,
    last_action: AgentAction,
    rng: ChaCha8Rng,
}

impl AgentController {
    pub fn new(name: impl Into<String>, config: AgentConfig, seed: u64) -> Self {
        let body = Body::new(config.mass, config.drag);
        Self {
            name: name.into(),
            config,
            body,
            yaw: 0.0,
            pitch: 0.0,
            smoothed_tilt: 0.0,
            smoothed_turn: 0.0,
            resource_obtained: 0,
            frozen: false,
            nearest_node: None,
            pending_reward: 0.0,
            episode_reward: 0.0,
            step_count: 0,
            last_action: AgentAction::IDLE,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Start a new episode: clear the score, stop, respawn and pick a target
    ///
    /// In training the agent also resets the field and spawns in front of a
    /// node only half of the time.
    pub fn on_episode_begin<W: CollisionWorld + ?Sized>(
        &mut self,
        field: &mut ResourceField,
        world: &W,
    ) -> Result<()> {
        if self.config.training_mode {
            field.reset();
        }

        self.resource_obtained = 0;
        self.body.reset_velocity();
        self.smoothed_tilt = 0.0;
        self.smoothed_turn = 0.0;
        self.nearest_node = None;
        self.pending_reward = 0.0;
        self.episode_reward = 0.0;
        self.step_count = 0;
        self.last_action = AgentAction::IDLE;

        let in_front_of_node = if self.config.training_mode {
            self.rng.gen::<f32>() > 0.5
        } else {
            true
        };

        self.place_safely(field, world, in_front_of_node)?;
        self.update_nearest_node(field);
        Ok(())
    }

    /// Move to a spawn candidate that nothing else occupies
    pub fn place_safely<W: CollisionWorld + ?Sized>(
        &mut self,
        field: &ResourceField,
        world: &W,
        prefer_node_proximity: bool,
    ) -> Result<SpawnPose> {
        let pose = find_safe_spawn(field, world, &mut self.rng, &self.config, prefer_node_proximity)?;
        self.body.position = pose.position;
        self.yaw = pose.yaw;
        self.pitch = pose.pitch;
        tracing::debug!(
            agent = %self.name,
            attempts = pose.attempts,
            near_node = prefer_node_proximity,
            "spawned"
        );
        Ok(pose)
    }

    /// Re-evaluate the target node
    ///
    /// Keeps the current target unless it no longer needs time or a strictly
    /// closer eligible node turns up. Ends with no target if nothing is eligible.
    pub fn update_nearest_node(&mut self, field: &ResourceField) {
        let contact = self.contact_point();
        let previous = self.nearest_node;

        for (id, node) in field.iter_nodes() {
            if !node.needs_time() {
                continue;
            }
            match self.nearest_node {
                None => self.nearest_node = Some(id),
                Some(current) => {
                    let current_node = field.node(current);
                    if !current_node.needs_time()
                        || node.center().distance(contact) < current_node.center().distance(contact)
                    {
                        self.nearest_node = Some(id);
                    }
                }
            }
        }

        if let Some(current) = self.nearest_node {
            if !field.node(current).needs_time() {
                self.nearest_node = None;
            }
        }

        if self.nearest_node != previous {
            tracing::trace!(agent = %self.name, target = ?self.nearest_node, "target changed");
        }
    }

    /// Encode the current state for the policy
    pub fn collect_observations(&self, field: &ResourceField) -> Observation {
        let target = self.nearest_node.map(|id| field.node(id));
        Observation::encode(
            self.orientation(),
            self.forward(),
            self.contact_point(),
            target,
            field.diameter(),
        )
    }

    /// Apply a policy action for one fixed step
    ///
    /// The move part becomes a force; tilt and turn go through a rate limiter
    /// so the orientation never snaps. Pitch is clamped, yaw turns freely.
    pub fn on_action_received(&mut self, action: &AgentAction, dt: f32) {
        if self.frozen {
            return;
        }
        self.last_action = *action;

        self.body.add_force(action.movement() * self.config.move_force);

        let max_step = self.config.smoothing_rate * dt;
        self.smoothed_tilt = move_towards(self.smoothed_tilt, action.tilt(), max_step);
        self.smoothed_turn = move_towards(self.smoothed_turn, action.turn(), max_step);

        let max_tilt = self.config.max_tilt_deg;
        let pitch = wrap_signed_degrees(self.pitch + self.smoothed_tilt * dt * self.config.tilt_speed);
        self.pitch = pitch.clamp(-max_tilt, max_tilt);
        self.yaw = wrap_signed_degrees(self.yaw + self.smoothed_turn * dt * self.config.turn_speed);
    }

    /// React to the contact point touching a deposit zone
    ///
    /// Returns whether the event counted: it must be close enough and the node
    /// must still accept deposits. The score grows by
    /// the node's total deposited count, not by one; this mirrors the scoring
    /// the trained policies were built against.
    pub fn on_proximity(&mut self, event: &ProximityEvent, field: &mut ResourceField) -> Result<bool> {
        if event.closest_point.distance(self.contact_point()) >= self.config.contact_radius {
            return Ok(false);
        }

        let id = field.node_from_key(&event.key)?;
        if !field.node(id).is_active() {
            return Ok(false);
        }
        let deposited = field.node_mut(id).deposit(self.config.deposit_quantum);
        self.resource_obtained += deposited;

        if self.config.training_mode {
            let target = self.nearest_node.unwrap_or(id);
            let into_node = -field.node(target).up_axis();
            let bonus = ALIGNMENT_BONUS * clamp01(self.forward().dot(into_node));
            self.add_reward(DEPOSIT_REWARD + bonus);
        }

        if !field.node(id).needs_time() {
            self.update_nearest_node(field);
        }
        Ok(true)
    }

    /// React to a solid collision
    pub fn on_collision(&mut self, tag: ColliderTag) {
        if self.config.training_mode && tag == ColliderTag::Boundary {
            self.add_reward(BOUNDARY_PENALTY);
        }
    }

    /// Per-step housekeeping: drop a target another agent has depleted
    pub fn fixed_update(&mut self, field: &ResourceField) {
        if let Some(current) = self.nearest_node {
            if !field.node(current).needs_time() {
                self.update_nearest_node(field);
            }
        }
    }

    /// Stop moving and ignore actions; not allowed while training
    pub fn freeze(&mut self) -> Result<()> {
        if self.config.training_mode {
            return Err(ArenaError::FreezeInTraining);
        }
        self.frozen = true;
        self.body.sleep();
        Ok(())
    }

    pub fn unfreeze(&mut self) -> Result<()> {
        if self.config.training_mode {
            return Err(ArenaError::FreezeInTraining);
        }
        self.frozen = false;
        self.body.wake_up();
        Ok(())
    }

    /// Manual control, translated against the agent's real orientation
    pub fn heuristic(&self, input: &ManualInput) -> AgentAction {
        input.translate(self.orientation())
    }

    pub fn add_reward(&mut self, reward: f32) {
        self.pending_reward += reward;
        self.episode_reward += reward;
    }

    /// Reward accumulated since the last call
    pub fn take_reward(&mut self) -> f32 {
        std::mem::take(&mut self.pending_reward)
    }

    /// Whether the policy should be asked for a fresh action this step
    pub fn needs_decision(&self) -> bool {
        self.step_count % u64::from(self.config.decision_period.max(1)) == 0
    }

    pub(crate) fn record_step(&mut self) {
        self.step_count += 1;
    }

    /// A training episode has used up its step budget
    pub fn episode_complete(&self) -> bool {
        self.config.training_mode
            && self.config.max_steps > 0
            && self.step_count >= self.config.max_steps
    }

    /// Close a training episode and immediately begin the next one
    pub fn end_episode<W: CollisionWorld + ?Sized>(
        &mut self,
        field: &mut ResourceField,
        world: &W,
    ) -> Result<f32> {
        let total = self.episode_reward;
        tracing::info!(
            agent = %self.name,
            reward = total,
            steps = self.step_count,
            resources = self.resource_obtained,
            "episode finished"
        );
        self.on_episode_begin(field, world)?;
        Ok(total)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn resource_obtained(&self) -> u32 {
        self.resource_obtained
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_training(&self) -> bool {
        self.config.training_mode
    }

    pub fn nearest_node(&self) -> Option<NodeId> {
        self.nearest_node
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn smoothed_rates(&self) -> (f32, f32) {
        (self.smoothed_tilt, self.smoothed_turn)
    }

    pub fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn last_action(&self) -> AgentAction {
        self.last_action
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Place the agent directly (used by collaborators and tests)
    pub fn set_pose(&mut self, position: Vec3, yaw: f32, pitch: f32) {
        self.body.position = position;
        self.yaw = yaw;
        self.pitch = pitch;
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn orientation(&self) -> Quat {
        orientation(self.yaw, self.pitch)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    /// World position of the point that must touch a deposit zone
    pub fn contact_point(&self) -> Vec3 {
        self.body.position + self.orientation() * Vec3::from_array(self.config.contact_offset)
    }
}
