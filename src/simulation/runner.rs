//! Headless match runner
//!
//! Drives a [`SessionController`] with a virtual clock: frames arrive at a
//! fixed frame rate, and each frame runs as many fixed steps as have
//! accumulated before the session's own update.

use serde::Serialize;

use crate::agent::controller::AgentController;
use crate::arena::field::ResourceField;
use crate::arena::layout::ArenaLayout;
use crate::core::config::ArenaConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{AgentSlot, MatchId};
use crate::physics::collision::StaticColliders;
use crate::policy::Policy;
use crate::session::controller::{SessionController, SessionState};
use crate::session::countdown::COUNTDOWN_LABELS;
use crate::session::observer::{SessionObserver, UiState};
use crate::simulation::tick::run_fixed_step;

/// Extra seconds allowed past the expected end of a match
const WALL_LIMIT_SLACK_SECS: f64 = 5.0;

/// Serializable result of one headless match
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    /// `None` when the wall limit stopped the match first
    pub winner: Option<AgentSlot>,
    pub player_score: u32,
    pub opponent_score: u32,
    /// Seconds spent in Playing
    pub duration_secs: f64,
    /// Fixed steps run while Playing
    pub steps: u64,
    pub seed: u64,
    pub player_policy: String,
    pub opponent_policy: String,
}

pub struct MatchRunner<O: SessionObserver = UiState> {
    session: SessionController<O>,
    world: StaticColliders,
    policies: Vec<Box<dyn Policy>>,
    fixed_timestep: f64,
    frame_interval: f64,
    clock: f64,
    accumulator: f64,
    playing_steps: u64,
    seed: u64,
}

impl MatchRunner<UiState> {
    /// Build the field, both agents and the session from configuration
    pub fn from_config(
        config: &ArenaConfig,
        layout: &ArenaLayout,
        seed: u64,
        player_policy: Box<dyn Policy>,
        opponent_policy: Box<dyn Policy>,
        frame_rate: f64,
    ) -> Result<Self> {
        Self::with_observer(
            config,
            layout,
            seed,
            player_policy,
            opponent_policy,
            frame_rate,
            UiState::new(),
        )
    }
}

impl<O: SessionObserver> MatchRunner<O> {
    /// Same as [`MatchRunner::from_config`], publishing to a custom observer
    pub fn with_observer(
        config: &ArenaConfig,
        layout: &ArenaLayout,
        seed: u64,
        player_policy: Box<dyn Policy>,
        opponent_policy: Box<dyn Policy>,
        frame_rate: f64,
        observer: O,
    ) -> Result<Self> {
        config.validate()?;
        if !(frame_rate > 0.0) {
            return Err(ArenaError::InvalidConfig(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }

        let field = ResourceField::from_layout(layout, seed)?;
        let world = StaticColliders::for_field(&field);
        let player = AgentController::new("player", config.agent.clone(), seed.wrapping_add(1));
        let opponent = AgentController::new("opponent", config.agent.clone(), seed.wrapping_add(2));
        let session =
            SessionController::new(config.session.clone(), field, player, opponent, observer)?;

        Ok(Self {
            session,
            world,
            policies: vec![player_policy, opponent_policy],
            fixed_timestep: f64::from(config.simulation.fixed_timestep),
            frame_interval: 1.0 / frame_rate,
            clock: 0.0,
            accumulator: 0.0,
            playing_steps: 0,
            seed,
        })
    }

    /// Advance the virtual clock by one frame
    pub fn advance_frame(&mut self) -> Result<()> {
        self.clock += self.frame_interval;
        self.accumulator += self.frame_interval;

        while self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            let playing = self.session.state() == SessionState::Playing;
            let (field, agents) = self.session.arena_mut();
            let report = run_fixed_step(
                field,
                &mut agents[..],
                &self.world,
                &mut self.policies,
                self.fixed_timestep as f32,
            )?;
            if playing {
                self.playing_steps += 1;
            }
            if report.deposits() > 0 {
                tracing::debug!(clock = self.clock, deposits = report.deposits(), "deposits");
            }
        }

        self.session.update(self.clock, &self.world)
    }

    /// Latest time a match can still be running
    pub fn wall_limit(&self) -> f64 {
        let config = self.session.config();
        let countdown = COUNTDOWN_LABELS.len() as f64 * config.countdown_interval_secs;
        self.clock + countdown + config.match_duration_secs + WALL_LIMIT_SLACK_SECS
    }

    /// Click start and run frames until the match is over or the wall limit passes
    pub fn run(&mut self) -> Result<MatchSummary> {
        let limit = self.wall_limit();
        self.session.button_clicked();
        self.session.update(self.clock, &self.world)?;

        while self.session.state() != SessionState::GameOver && self.clock < limit {
            self.advance_frame()?;
        }

        if self.session.state() != SessionState::GameOver {
            tracing::warn!(clock = self.clock, state = ?self.session.state(), "match hit the wall limit");
        }
        Ok(self.summary())
    }

    /// Summary of a match that reached GameOver
    pub fn finished_summary(&self) -> Result<MatchSummary> {
        if self.session.outcome().is_none() {
            return Err(ArenaError::MatchUnfinished { clock: self.clock });
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> MatchSummary {
        let outcome = self.session.outcome();
        let duration_secs = match (outcome, self.session.timer_start()) {
            (Some(outcome), _) => outcome.elapsed_secs,
            (None, Some(start)) => self.clock - start,
            (None, None) => 0.0,
        };
        MatchSummary {
            match_id: self.session.match_id(),
            winner: outcome.map(|o| o.winner),
            player_score: self.session.resource_obtained(AgentSlot::Player),
            opponent_score: self.session.resource_obtained(AgentSlot::Opponent),
            duration_secs,
            steps: self.playing_steps,
            seed: self.seed,
            player_policy: self.policies[AgentSlot::Player.index()].kind().to_string(),
            opponent_policy: self.policies[AgentSlot::Opponent.index()].kind().to_string(),
        }
    }

    pub fn session(&self) -> &SessionController<O> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionController<O> {
        &mut self.session
    }

    pub fn world(&self) -> &StaticColliders {
        &self.world
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::IdlePolicy;
    use crate::session::observer::NullObserver;

    fn runner(frame_rate: f64) -> MatchRunner {
        let mut config = ArenaConfig::default();
        config.session.match_duration_secs = 2.0;
        MatchRunner::from_config(
            &config,
            &ArenaLayout::default_layout(),
            42,
            Box::new(IdlePolicy),
            Box::new(IdlePolicy),
            frame_rate,
        )
        .unwrap()
    }

    #[test]
    fn test_idle_match_times_out_as_player_win() {
        let mut runner = runner(30.0);
        let summary = runner.run().unwrap();

        assert_eq!(runner.session().state(), SessionState::GameOver);
        assert_eq!(summary.winner, Some(AgentSlot::Player));
        assert_eq!((summary.player_score, summary.opponent_score), (0, 0));
        assert!(summary.duration_secs >= 2.0 && summary.duration_secs < 2.1);
        // 50 fixed steps per simulated second of play
        assert!((95..=105).contains(&summary.steps), "steps = {}", summary.steps);
        assert_eq!(summary.opponent_policy, "idle");
    }

    #[test]
    fn test_rejects_non_positive_frame_rate() {
        let result = MatchRunner::from_config(
            &ArenaConfig::default(),
            &ArenaLayout::default_layout(),
            1,
            Box::new(IdlePolicy),
            Box::new(IdlePolicy),
            0.0,
        );
        assert!(matches!(result, Err(ArenaError::InvalidConfig(_))));
    }

    #[test]
    fn test_unfinished_match_has_no_finished_summary() {
        let mut runner = runner(30.0);
        let result = runner.finished_summary();
        assert!(matches!(result, Err(ArenaError::MatchUnfinished { clock }) if clock == 0.0));

        runner.run().unwrap();
        let summary = runner.finished_summary().unwrap();
        assert_eq!(summary.winner, Some(AgentSlot::Player));
    }

    #[test]
    fn test_runs_with_null_observer() {
        let mut config = ArenaConfig::default();
        config.session.match_duration_secs = 1.0;
        let mut runner = MatchRunner::with_observer(
            &config,
            &ArenaLayout::default_layout(),
            5,
            Box::new(IdlePolicy),
            Box::new(IdlePolicy),
            20.0,
            NullObserver,
        )
        .unwrap();

        let summary = runner.run().unwrap();
        assert_eq!(runner.session().state(), SessionState::GameOver);
        assert_eq!(summary.winner, Some(AgentSlot::Player));
        assert_eq!(summary.match_id, runner.session().match_id());
    }

    #[test]
    fn test_summary_serializes() {
        let mut runner = runner(60.0);
        let summary = runner.run().unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["winner"], "player");
        assert_eq!(json["seed"], 42);
    }
}
