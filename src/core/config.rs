//! Arena configuration with documented constants
//!
//! Every tuning value of the arena lives here. The whole structure can be
//! loaded from TOML; missing sections and keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{ArenaError, Result};

/// Match pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// A match ends as soon as either agent has obtained this many resources
    pub max_resource_count: u32,

    /// A match ends after this many seconds of play
    pub match_duration_secs: f64,

    /// How long each countdown label ("3", "2", "1", "Go!") stays up
    pub countdown_interval_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_resource_count: 10,
            match_duration_secs: 45.0,
            countdown_interval_secs: 1.0,
        }
    }
}

/// Per-agent motion, sensing and spawn tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Whether the agent is being trained (rewards on, freezing forbidden)
    pub training_mode: bool,

    /// Force applied along the commanded move direction
    pub move_force: f32,

    /// Pitch change in degrees per second at a full tilt command
    pub tilt_speed: f32,

    /// Yaw change in degrees per second at a full turn command
    pub turn_speed: f32,

    /// Maximum absolute pitch in degrees
    pub max_tilt_deg: f32,

    /// Maximum change of the smoothed tilt/turn rates per simulated second
    ///
    /// At 2.0 a rate needs half a second to swing from 0 to full.
    pub smoothing_rate: f32,

    /// Tolerance between the contact point and a deposit zone for a deposit to count
    pub contact_radius: f32,

    /// Hatch time spent per deposit event
    ///
    /// Half of the 0.02 fixed step: a node with one unit of hatch time
    /// is depleted after 100 events.
    pub deposit_quantum: f32,

    /// Offset of the contact point in the agent's local frame
    pub contact_offset: [f32; 3],

    /// Candidate positions tried before spawn placement gives up
    pub spawn_attempts: u32,

    /// Radius that must be free of other bodies around a spawn candidate
    pub spawn_clearance: f32,

    /// Radius the agent occupies for other agents' spawn checks
    pub body_radius: f32,

    /// Body mass used by the point-mass integrator
    pub mass: f32,

    /// Linear drag coefficient (per second) used by the point-mass integrator
    pub drag: f32,

    /// Fixed steps between policy decisions; the last action repeats in between
    pub decision_period: u32,

    /// Fixed steps per training episode (0 = unlimited, ignored outside training)
    pub max_steps: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            training_mode: false,
            move_force: 2.0,
            tilt_speed: 100.0,
            turn_speed: 100.0,
            max_tilt_deg: 30.0,
            smoothing_rate: 2.0,
            contact_radius: 0.008,
            deposit_quantum: 0.01,
            contact_offset: [0.0, -0.1, 0.1],
            spawn_attempts: 100,
            spawn_clearance: 0.05,
            body_radius: 0.15,
            mass: 1.0,
            drag: 2.0,
            decision_period: 5,
            max_steps: 5000,
        }
    }
}

/// Scheduling and determinism
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed step length in seconds (0.02 = 50 Hz)
    pub fixed_timestep: f32,

    /// Master seed; every random stream in the arena derives from it
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 0.02,
            seed: None,
        }
    }
}

/// Complete arena configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub session: SessionConfig,
    pub agent: AgentConfig,
    pub simulation: SimulationConfig,
}

impl ArenaConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ArenaConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ArenaError::InvalidConfig(msg));

        if self.simulation.fixed_timestep <= 0.0 {
            return fail(format!(
                "fixed_timestep must be positive, got {}",
                self.simulation.fixed_timestep
            ));
        }
        if self.session.match_duration_secs <= 0.0 {
            return fail("match_duration_secs must be positive".into());
        }
        if self.session.countdown_interval_secs < 0.0 {
            return fail("countdown_interval_secs must not be negative".into());
        }
        if self.session.max_resource_count == 0 {
            return fail("max_resource_count must be at least 1".into());
        }

        let agent = &self.agent;
        if agent.spawn_attempts == 0 {
            return fail("spawn_attempts must be at least 1".into());
        }
        if agent.decision_period == 0 {
            return fail("decision_period must be at least 1".into());
        }
        if agent.max_tilt_deg <= 0.0 || agent.max_tilt_deg >= 90.0 {
            return fail(format!(
                "max_tilt_deg must be in (0, 90), got {}",
                agent.max_tilt_deg
            ));
        }
        if agent.mass <= 0.0 {
            return fail("mass must be positive".into());
        }
        if agent.drag < 0.0 || agent.smoothing_rate < 0.0 {
            return fail("drag and smoothing_rate must not be negative".into());
        }
        if agent.deposit_quantum <= 0.0 {
            return fail("deposit_quantum must be positive".into());
        }

        Ok(())
    }
}
