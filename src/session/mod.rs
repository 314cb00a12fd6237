//! Session layer - match lifecycle, countdown, UI commands and observers

pub mod command;
pub mod controller;
pub mod countdown;
pub mod observer;

pub use command::{CommandQueue, SessionCommand};
pub use controller::{MatchOutcome, SessionController, SessionState};
pub use countdown::{Countdown, CountdownStep, COUNTDOWN_LABELS};
pub use observer::{format_timer, CameraView, LogEntry, NullObserver, SessionObserver, UiState};
