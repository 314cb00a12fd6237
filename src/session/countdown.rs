//! Pre-match countdown
//!
//! An externally clocked sub-state machine: every poll compares the caller's
//! clock against fixed deadlines, so it never blocks and a late tick simply
//! flushes every step that is due.

/// Banner text for each countdown step, in order
pub const COUNTDOWN_LABELS: [&str; 4] = ["3", "2", "1", "Go!"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Show this label now
    Show(&'static str),
    /// The last label has been held for its interval
    Finished,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    started_at: f64,
    interval: f64,
    next: usize,
}

impl Countdown {
    pub fn start(now: f64, interval: f64) -> Self {
        Self {
            started_at: now,
            interval,
            next: 0,
        }
    }

    fn deadline(&self, step: usize) -> f64 {
        self.started_at + step as f64 * self.interval
    }

    /// Next step that is due at `now`, if any
    pub fn poll(&mut self, now: f64) -> Option<CountdownStep> {
        if self.next > COUNTDOWN_LABELS.len() || now < self.deadline(self.next) {
            return None;
        }

        let step = match COUNTDOWN_LABELS.get(self.next) {
            Some(label) => CountdownStep::Show(label),
            None => CountdownStep::Finished,
        };
        self.next += 1;
        Some(step)
    }

    pub fn is_finished(&self) -> bool {
        self.next > COUNTDOWN_LABELS.len()
    }

    /// When the countdown will finish
    pub fn finishes_at(&self) -> f64 {
        self.deadline(COUNTDOWN_LABELS.len())
    }
}
