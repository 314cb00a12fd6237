//! Match lifecycle state machine
//!
//! MainMenu -> Preparing (countdown) -> Playing -> GameOver -> MainMenu.
//! The session owns the field and both agents for the whole application run
//! and is advanced by a variable-rate `update` with the caller's clock.

use serde::{Deserialize, Serialize};

use crate::agent::controller::AgentController;
use crate::arena::field::ResourceField;
use crate::core::config::SessionConfig;
use crate::core::error::Result;
use crate::core::types::{AgentSlot, MatchId};
use crate::physics::collision::{CollisionWorld, WithBodies};
use crate::session::command::{CommandQueue, SessionCommand};
use crate::session::countdown::{Countdown, CountdownStep};
use crate::session::observer::{CameraView, SessionObserver, UiState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    MainMenu,
    Preparing,
    Playing,
    GameOver,
}

/// Result of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: AgentSlot,
    pub player_score: u32,
    pub opponent_score: u32,
    /// Seconds spent in Playing
    pub elapsed_secs: f64,
}

impl MatchOutcome {
    /// Ties go to the player
    pub fn decide(player_score: u32, opponent_score: u32, elapsed_secs: f64) -> Self {
        let winner = if player_score >= opponent_score {
            AgentSlot::Player
        } else {
            AgentSlot::Opponent
        };
        Self {
            winner,
            player_score,
            opponent_score,
            elapsed_secs,
        }
    }

    pub fn banner(&self) -> &'static str {
        match self.winner {
            AgentSlot::Player => "Player wins!",
            AgentSlot::Opponent => "Opponent wins!",
        }
    }
}

pub struct SessionController<O: SessionObserver = UiState> {
    config: SessionConfig,
    state: SessionState,
    timer_start: f64,
    countdown: Option<Countdown>,
    field: ResourceField,
    agents: [AgentController; 2],
    commands: CommandQueue,
    observer: O,
    quit_requested: bool,
    outcome: Option<MatchOutcome>,
    match_id: MatchId,
}

impl<O: SessionObserver> SessionController<O> {
    /// Create a session sitting in the main menu with both agents frozen
    ///
    /// Fails with [`crate::core::ArenaError::FreezeInTraining`] if either
    /// agent is in training mode.
    pub fn new(
        config: SessionConfig,
        field: ResourceField,
        player: AgentController,
        opponent: AgentController,
        observer: O,
    ) -> Result<Self> {
        let mut session = Self {
            config,
            state: SessionState::MainMenu,
            timer_start: 0.0,
            countdown: None,
            field,
            agents: [player, opponent],
            commands: CommandQueue::new(),
            observer,
            quit_requested: false,
            outcome: None,
            match_id: MatchId::new(),
        };
        session.show_main_menu()?;
        session.publish_status(0.0);
        tracing::info!(match_id = %session.match_id.0, "session ready in main menu");
        Ok(session)
    }

    /// Queue a button click for the next update
    pub fn button_clicked(&self) {
        self.commands.push(SessionCommand::ButtonClicked);
    }

    /// Queue a quit request for the next update
    pub fn quit(&self) {
        self.commands.push(SessionCommand::Quit);
    }

    /// A handle the UI can keep to send commands
    pub fn command_sender(&self) -> std::sync::mpsc::Sender<SessionCommand> {
        self.commands.sender()
    }

    /// Variable-rate tick: apply queued commands, advance timed states and
    /// publish the timer and counters
    pub fn update<W: CollisionWorld + ?Sized>(&mut self, now: f64, world: &W) -> Result<()> {
        for command in self.commands.drain() {
            self.handle_command(command, now, world)?;
        }

        match self.state {
            SessionState::Preparing => self.advance_countdown(now)?,
            SessionState::Playing => {
                let max = self.config.max_resource_count;
                if self.time_remaining(now) <= 0.0
                    || self.agents.iter().any(|a| a.resource_obtained() >= max)
                {
                    self.end_game(now)?;
                }
            }
            SessionState::MainMenu | SessionState::GameOver => {}
        }

        self.publish_status(now);
        Ok(())
    }

    /// Apply one command immediately
    pub fn handle_command<W: CollisionWorld + ?Sized>(
        &mut self,
        command: SessionCommand,
        now: f64,
        world: &W,
    ) -> Result<()> {
        match (command, self.state) {
            (SessionCommand::ButtonClicked, SessionState::MainMenu) => self.start_game(now, world),
            (SessionCommand::ButtonClicked, SessionState::GameOver) => {
                self.transition(SessionState::MainMenu);
                self.show_main_menu()
            }
            (SessionCommand::Quit, SessionState::Preparing)
            | (SessionCommand::Quit, SessionState::Playing)
            | (SessionCommand::Quit, SessionState::GameOver) => {
                tracing::info!(state = ?self.state, "quit requested");
                self.quit_requested = true;
                Ok(())
            }
            (command, state) => {
                tracing::warn!(?state, %command, "command received in unexpected state");
                Ok(())
            }
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        self.state = to;
        tracing::info!(?from, ?to, "session state changed");
        self.observer.state_changed(from, to);
    }

    fn show_main_menu(&mut self) -> Result<()> {
        self.countdown = None;
        self.observer.show_banner("");
        self.observer.show_control_hint(true);
        self.observer.show_button("Start");
        self.observer.select_camera(CameraView::Overview);
        self.freeze_all()
    }

    fn start_game<W: CollisionWorld + ?Sized>(&mut self, now: f64, world: &W) -> Result<()> {
        self.transition(SessionState::Preparing);
        self.match_id = MatchId::new();
        self.outcome = None;

        self.observer.show_banner("");
        self.observer.hide_button();
        self.observer.show_control_hint(false);
        self.observer.select_camera(CameraView::Player);
        self.observer.match_audio(true);

        self.field.reset();
        let [player, opponent] = &mut self.agents;
        player.on_episode_begin(&mut self.field, world)?;
        let occupied = WithBodies::new(world, vec![(player.position(), player.config().body_radius)]);
        opponent.on_episode_begin(&mut self.field, &occupied)?;
        self.freeze_all()?;

        tracing::info!(match_id = %self.match_id.0, "match preparing");
        self.countdown = Some(Countdown::start(now, self.config.countdown_interval_secs));
        self.advance_countdown(now)
    }

    fn advance_countdown(&mut self, now: f64) -> Result<()> {
        while let Some(step) = self.countdown.as_mut().and_then(|c| c.poll(now)) {
            match step {
                CountdownStep::Show(label) => self.observer.show_banner(label),
                CountdownStep::Finished => return self.begin_play(now),
            }
        }
        Ok(())
    }

    fn begin_play(&mut self, now: f64) -> Result<()> {
        self.countdown = None;
        self.observer.show_banner("");
        self.transition(SessionState::Playing);
        self.timer_start = now;
        for agent in &mut self.agents {
            agent.unfreeze()?;
        }
        Ok(())
    }

    fn end_game(&mut self, now: f64) -> Result<()> {
        self.transition(SessionState::GameOver);
        self.freeze_all()?;

        let outcome = MatchOutcome::decide(
            self.agents[AgentSlot::Player.index()].resource_obtained(),
            self.agents[AgentSlot::Opponent.index()].resource_obtained(),
            now - self.timer_start,
        );
        tracing::info!(
            match_id = %self.match_id.0,
            winner = outcome.winner.label(),
            player = outcome.player_score,
            opponent = outcome.opponent_score,
            elapsed = outcome.elapsed_secs,
            "match finished"
        );

        self.observer.show_banner(outcome.banner());
        self.observer.match_audio(false);
        self.observer.show_button("Main Menu");
        self.outcome = Some(outcome);
        Ok(())
    }

    fn freeze_all(&mut self) -> Result<()> {
        for agent in &mut self.agents {
            agent.freeze()?;
        }
        Ok(())
    }

    fn publish_status(&mut self, now: f64) {
        match self.state {
            SessionState::Playing => {
                self.observer.set_timer(self.time_remaining(now));
                for slot in AgentSlot::ALL {
                    let amount = self.agents[slot.index()].resource_obtained();
                    self.observer.set_counter(slot, amount);
                }
            }
            SessionState::Preparing | SessionState::GameOver => {
                self.observer.set_timer(self.time_remaining(now));
            }
            SessionState::MainMenu => {
                self.observer.set_timer(-1.0);
                for slot in AgentSlot::ALL {
                    self.observer.set_counter(slot, 0);
                }
            }
        }
    }

    /// Seconds left in the match; zero outside Playing
    pub fn time_remaining(&self, now: f64) -> f64 {
        if self.state == SessionState::Playing {
            (self.config.match_duration_secs - (now - self.timer_start)).max(0.0)
        } else {
            0.0
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn resource_obtained(&self, slot: AgentSlot) -> u32 {
        self.agents[slot.index()].resource_obtained()
    }

    pub fn agent(&self, slot: AgentSlot) -> &AgentController {
        &self.agents[slot.index()]
    }

    pub fn agent_mut(&mut self, slot: AgentSlot) -> &mut AgentController {
        &mut self.agents[slot.index()]
    }

    pub fn field(&self) -> &ResourceField {
        &self.field
    }

    /// Field and agents together, in registration order, for the fixed step
    pub fn arena_mut(&mut self) -> (&mut ResourceField, &mut [AgentController; 2]) {
        (&mut self.field, &mut self.agents)
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// When Playing was entered, if it has been
    pub fn timer_start(&self) -> Option<f64> {
        match self.state {
            SessionState::Playing | SessionState::GameOver => Some(self.timer_start),
            _ => None,
        }
    }
}
