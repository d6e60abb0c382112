//! Session-scoped mode state.
//!
//! One `SessionState` lives for the whole process and is owned by the host.
//! Once remote mode has been abandoned it stays abandoned: later resolutions
//! that come back as `RemoteMode` are rendered native.

use tracing::{debug, info};

use crate::bootstrap::{Locator, ResolutionOutcome};

/// Top-level view the host should mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Native,
    Remote(Locator),
    /// Native underneath, plus the error message and a retry affordance
    InitError(String),
}

#[derive(Debug, Default)]
pub struct SessionState {
    remote_abandoned: bool,
    resolutions: u32,
    last_outcome: Option<ResolutionOutcome>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_remote_abandoned(&self) -> bool {
        self.remote_abandoned
    }

    /// Give up on remote mode for the rest of the session.
    pub fn abandon_remote(&mut self) {
        if !self.remote_abandoned {
            info!("Remote mode abandoned for this session");
        }
        self.remote_abandoned = true;
    }

    /// Number of resolutions recorded so far
    pub fn resolutions(&self) -> u32 {
        self.resolutions
    }

    pub fn last_outcome(&self) -> Option<&ResolutionOutcome> {
        self.last_outcome.as_ref()
    }

    /// Record a resolution and decide which view to mount.
    pub fn record_outcome(&mut self, outcome: ResolutionOutcome) -> View {
        self.resolutions += 1;
        let view = match &outcome {
            ResolutionOutcome::RemoteMode(_) if self.remote_abandoned => {
                debug!("Ignoring remote mode, already abandoned this session");
                View::Native
            }
            ResolutionOutcome::RemoteMode(locator) => View::Remote(locator.clone()),
            ResolutionOutcome::NativeMode => View::Native,
            ResolutionOutcome::Error(msg) => View::InitError(msg.clone()),
        };
        self.last_outcome = Some(outcome);
        view
    }
}
