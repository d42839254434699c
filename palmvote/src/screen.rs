//! State every screen controller carries.

use crate::*;
use std::time::Duration;

/// Loading flag and error banner of one screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenState {
    pub loading: bool,
    pub error: Option<String>,
}

impl ScreenState {
    /// Show `message` in the banner without making a call
    pub fn fail<M: Into<String>>(&mut self, message: M) {
        self.error = Some(message.into());
    }

    pub fn clear(&mut self) {
        self.error = None;
    }

    /// Run one backend call with the loading flag set. A failure lands in
    /// the banner and yields `None`.
    pub fn run<T, F>(&mut self, call: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, ApiError>,
    {
        self.loading = true;
        self.error = None;
        let result = call();
        self.loading = false;

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("request failed: {}", e);
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

/// A success message that clears itself after a fixed delay
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    hold: Duration,
    shown_for: Option<Duration>,
}

impl Confirmation {
    pub fn new(hold: Duration) -> Self {
        Confirmation { hold, shown_for: None }
    }

    pub fn show(&mut self) {
        self.shown_for = Some(Duration::from_millis(0));
    }

    pub fn is_shown(&self) -> bool {
        self.shown_for.is_some()
    }

    /// Advance the clock. Returns true on the tick the message expires.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        match self.shown_for {
            Some(shown) if shown + elapsed >= self.hold => {
                self.shown_for = None;
                true
            }
            Some(shown) => {
                self.shown_for = Some(shown + elapsed);
                false
            }
            None => false,
        }
    }
}
