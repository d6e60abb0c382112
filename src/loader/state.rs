//! Retry state machine for the content loader.
//!
//! `LoadController` is synchronous and owns no timers or I/O. Each input
//! returns a [`Directive`] that the driver carries out.

use std::fmt;
use std::time::Duration;

use crate::error::BootstrapError;

/// Where the loader currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// Surface is rendering; spinner shown
    Loading,
    /// First successful paint
    Loaded,
    /// Waiting on the retry timer for retry number `n`
    Retrying(u32),
    /// Retries exhausted; terminal panel shown
    Abandoned,
}

impl LoaderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoaderState::Abandoned)
    }
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderState::Loading => write!(f, "loading"),
            LoaderState::Loaded => write!(f, "loaded"),
            LoaderState::Retrying(n) => write!(f, "retrying ({})", n),
            LoaderState::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Attempt counter against a fixed retry ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadAttempt {
    count: u32,
    ceiling: u32,
}

impl LoadAttempt {
    pub fn new(ceiling: u32) -> Self {
        Self { count: 0, ceiling }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Total loads allowed, including the first one.
    pub fn max_loads(&self) -> u32 {
        self.ceiling.saturating_add(1)
    }

    fn exhausted(&self) -> bool {
        self.count >= self.ceiling
    }

    fn increment(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// What the driver should do after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Nothing to do
    Nothing,
    /// Arm the retry timer
    ScheduleRetry(Duration),
    /// Issue a fresh load now
    Reload,
    /// Give up; `fire_fallback` is true only the first time
    Abandon { fire_fallback: bool },
}

/// Pure retry/abandon policy for one mounted locator.
#[derive(Debug, Clone)]
pub struct LoadController {
    state: LoaderState,
    attempts: LoadAttempt,
    retry_delay: Duration,
    fallback_fired: bool,
}

impl LoadController {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            state: LoaderState::Loading,
            attempts: LoadAttempt::new(max_retries),
            retry_delay,
            fallback_fired: false,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn attempts(&self) -> LoadAttempt {
        self.attempts
    }

    /// The surface painted successfully.
    pub fn on_success(&mut self) -> Directive {
        if self.state == LoaderState::Loading {
            self.state = LoaderState::Loaded;
        }
        Directive::Nothing
    }

    /// The surface reported a failure of any kind.
    ///
    /// Ignored while a retry is pending or after abandonment.
    pub fn on_failure(&mut self, _error: &BootstrapError) -> Directive {
        match self.state {
            LoaderState::Retrying(_) | LoaderState::Abandoned => Directive::Nothing,
            LoaderState::Loading | LoaderState::Loaded => {
                if self.attempts.exhausted() {
                    self.state = LoaderState::Abandoned;
                    let fire_fallback = !self.fallback_fired;
                    self.fallback_fired = true;
                    Directive::Abandon { fire_fallback }
                } else {
                    let n = self.attempts.increment();
                    self.state = LoaderState::Retrying(n);
                    Directive::ScheduleRetry(self.retry_delay)
                }
            }
        }
    }

    /// The retry timer fired.
    pub fn on_retry_elapsed(&mut self) -> Directive {
        match self.state {
            LoaderState::Retrying(_) => {
                self.state = LoaderState::Loading;
                Directive::Reload
            }
            _ => Directive::Nothing,
        }
    }

    /// User pressed "Try Again" on the terminal panel.
    pub fn manual_retry(&mut self) -> Directive {
        match self.state {
            LoaderState::Abandoned => {
                self.attempts.reset();
                self.state = LoaderState::Loading;
                Directive::Reload
            }
            _ => Directive::Nothing,
        }
    }
}
