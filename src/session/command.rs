//! Commands delivered to the session from the UI

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// The single UI button (start / back to main menu)
    ButtonClicked,
    /// Escape key
    Quit,
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionCommand::ButtonClicked => write!(f, "button clicked"),
            SessionCommand::Quit => write!(f, "quit"),
        }
    }
}

/// Single-consumer queue; the session drains it on each update
#[derive(Debug)]
pub struct CommandQueue {
    sender: Sender<SessionCommand>,
    receiver: Receiver<SessionCommand>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// A handle producers can keep
    pub fn sender(&self) -> Sender<SessionCommand> {
        self.sender.clone()
    }

    pub fn push(&self, command: SessionCommand) {
        // The receiver lives as long as the queue, so this cannot fail
        let _ = self.sender.send(command);
    }

    /// Take every command queued so far
    pub fn drain(&self) -> Vec<SessionCommand> {
        self.receiver.try_iter().collect()
    }
}
