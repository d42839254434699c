//! Progress model behind the QKD session screen.

use std::time::Duration;

/// Progress added per tick
pub const PROGRESS_STEP: u8 = 2;

pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Pause between reaching 100 and reporting completion
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

pub const STAGES: [&str; 3] = [
    "Establishing Quantum-Secured Channel...",
    "Generating AES-256 Encryption Key...",
    "Securing Communication Channel...",
];

/// What a tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running,
    /// Progress reached 100 on an earlier tick; the caller waits
    /// [`SETTLE_DELAY`] and then moves on
    Completed,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QkdProgress {
    progress: u8,
    stage: usize,
    completed: bool,
}

impl QkdProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn stage_label(&self) -> &'static str {
        STAGES[self.stage]
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn tick(&mut self) -> Tick {
        if self.completed {
            return Tick::Done;
        }
        if self.progress >= 100 {
            self.completed = true;
            return Tick::Completed;
        }

        self.progress = (self.progress + PROGRESS_STEP).min(100);
        if self.progress > 33 && self.stage == 0 {
            self.stage = 1;
        }
        if self.progress > 66 && self.stage == 1 {
            self.stage = 2;
        }
        Tick::Running
    }
}
