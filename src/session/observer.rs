//! Session output toward the UI, audio and camera collaborators

use std::collections::VecDeque;

use crate::core::types::AgentSlot;
use crate::session::SessionState;

/// Maximum event log entries to keep
const MAX_LOG_ENTRIES: usize = 50;

/// Which view the display should use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraView {
    /// Overview camera used by the main menu
    #[default]
    Overview,
    /// The player agent's own camera
    Player,
}

/// Everything the session tells the outside world
///
/// Every method has a no-op default so collaborators only implement what
/// they display.
pub trait SessionObserver {
    fn show_banner(&mut self, _text: &str) {}
    fn show_button(&mut self, _label: &str) {}
    fn hide_button(&mut self) {}
    fn show_control_hint(&mut self, _visible: bool) {}
    /// Non-positive values hide the timer
    fn set_timer(&mut self, _time_remaining: f64) {}
    fn set_counter(&mut self, _slot: AgentSlot, _amount: u32) {}
    fn match_audio(&mut self, _playing: bool) {}
    fn select_camera(&mut self, _view: CameraView) {}
    fn state_changed(&mut self, _from: SessionState, _to: SessionState) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}

/// An entry in the UI event log
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub seq: u64,
    pub message: String,
}

/// Recorded UI state, as a headless display would show it
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub banner: String,
    /// Button label, `None` while hidden
    pub button: Option<String>,
    pub control_hint_visible: bool,
    /// Whole seconds left, empty while hidden
    pub timer_text: String,
    pub player_counter: u32,
    pub opponent_counter: u32,
    pub audio_playing: bool,
    pub camera: CameraView,
    /// Banner and state changes, oldest first
    pub event_log: VecDeque<LogEntry>,
    next_seq: u64,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            event_log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            ..Default::default()
        }
    }

    /// Add an entry to the event log
    pub fn log(&mut self, message: String) {
        if self.event_log.len() >= MAX_LOG_ENTRIES {
            self.event_log.pop_front();
        }
        self.event_log.push_back(LogEntry {
            seq: self.next_seq,
            message,
        });
        self.next_seq += 1;
    }

    /// Every non-empty banner shown so far that is still in the log
    pub fn banner_history(&self) -> Vec<&str> {
        self.event_log
            .iter()
            .filter_map(|entry| entry.message.strip_prefix("banner: "))
            .collect()
    }
}

/// Timer text shown for the remaining time
pub fn format_timer(time_remaining: f64) -> String {
    if time_remaining > 0.0 {
        format!("{:02.0}", time_remaining)
    } else {
        String::new()
    }
}

impl SessionObserver for UiState {
    fn show_banner(&mut self, text: &str) {
        self.banner = text.to_string();
        if !text.is_empty() {
            self.log(format!("banner: {text}"));
        }
    }

    fn show_button(&mut self, label: &str) {
        self.button = Some(label.to_string());
    }

    fn hide_button(&mut self) {
        self.button = None;
    }

    fn show_control_hint(&mut self, visible: bool) {
        self.control_hint_visible = visible;
    }

    fn set_timer(&mut self, time_remaining: f64) {
        self.timer_text = format_timer(time_remaining);
    }

    fn set_counter(&mut self, slot: AgentSlot, amount: u32) {
        match slot {
            AgentSlot::Player => self.player_counter = amount,
            AgentSlot::Opponent => self.opponent_counter = amount,
        }
    }

    fn match_audio(&mut self, playing: bool) {
        self.audio_playing = playing;
    }

    fn select_camera(&mut self, view: CameraView) {
        self.camera = view;
    }

    fn state_changed(&mut self, from: SessionState, to: SessionState) {
        self.log(format!("state: {from:?} -> {to:?}"));
    }
}
