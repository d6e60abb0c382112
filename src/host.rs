//! Host process: runs resolution, mounts the chosen view and routes user
//! actions.
//!
//! ```text
//! resolve -> Native     -> native screen, done
//!         -> InitError  -> error screen, wait for Retry Check / Quit
//!         -> Remote     -> mount loader -> retries exhausted -> terminal panel
//!                                       -> use native        -> abandon remote, native screen
//! ```

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::bootstrap::{Locator, ModeResolver};
use crate::loader::{self, LoaderExit, LoaderHandle, LoaderOptions, LoaderState, SurfaceFactory};
use crate::render::{Renderer, Screen};
use crate::session::{SessionState, View};

/// Input from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// "Retry Check" on the error screen, "Try Again" on the loader panel
    Retry,
    UseNative,
    Quit,
}

impl UserAction {
    /// Parse a line typed on stdin.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "r" | "retry" => Some(UserAction::Retry),
            "n" | "native" => Some(UserAction::UseNative),
            "q" | "quit" | "exit" => Some(UserAction::Quit),
            _ => None,
        }
    }
}

/// How the host run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostExit {
    /// Settled on the native app
    Native,
    /// User quit
    Quit,
}

pub struct Host {
    resolver: ModeResolver,
    surfaces: Box<dyn SurfaceFactory>,
    options: LoaderOptions,
    auto_fallback: bool,
    session: SessionState,
}

/// Load number shown on the next screen, given a state transition.
fn next_attempt(prev: LoaderState, next: LoaderState, attempt: u32) -> u32 {
    match (prev, next) {
        (_, LoaderState::Retrying(n)) => n + 1,
        (LoaderState::Abandoned, LoaderState::Loading) => 1,
        _ => attempt,
    }
}

impl Host {
    pub fn new(
        resolver: ModeResolver,
        surfaces: Box<dyn SurfaceFactory>,
        options: LoaderOptions,
        auto_fallback: bool,
    ) -> Self {
        Self {
            resolver,
            surfaces,
            options,
            auto_fallback,
            session: SessionState::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[cfg(test)]
    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Run until the session settles on native or the user quits.
    pub async fn run<R: Renderer>(
        &mut self,
        actions: &mut mpsc::Receiver<UserAction>,
        renderer: &mut R,
    ) -> Result<HostExit> {
        loop {
            renderer.render(&Screen::Resolving);
            let outcome = self.resolver.resolve().await;
            let view = self.session.record_outcome(outcome);
            debug!(
                "Resolution #{} -> {:?}",
                self.session.resolutions(),
                self.session.last_outcome()
            );

            match view {
                View::Native => {
                    renderer.render(&Screen::Native { notice: None });
                    return Ok(HostExit::Native);
                }
                View::InitError(message) => {
                    renderer.render(&Screen::InitError {
                        message: message.clone(),
                    });
                    match actions.recv().await {
                        Some(UserAction::Retry) => {
                            info!("Retrying remote mode check");
                            continue;
                        }
                        Some(UserAction::Quit) => return Ok(HostExit::Quit),
                        Some(UserAction::UseNative) | None => {
                            renderer.render(&Screen::Native {
                                notice: Some(message),
                            });
                            return Ok(HostExit::Native);
                        }
                    }
                }
                View::Remote(locator) => return self.run_remote(locator, actions, renderer).await,
            }
        }
    }

    async fn run_remote<R: Renderer>(
        &mut self,
        locator: Locator,
        actions: &mut mpsc::Receiver<UserAction>,
        renderer: &mut R,
    ) -> Result<HostExit> {
        let surface = match self.surfaces.create() {
            Ok(surface) => surface,
            Err(e) => {
                warn!("Could not create browsing surface: {}", e);
                self.session.abandon_remote();
                return Ok(self.settle_native(renderer, "Remote content unavailable"));
            }
        };

        let (fallback_tx, mut fallback_rx) = oneshot::channel();
        let mut handle = loader::mount(locator.clone(), surface, self.options, fallback_tx);
        let mut states = handle.subscribe();
        let max_loads = self.options.max_retries.saturating_add(1);

        let mut shown = LoaderState::Loading;
        let mut attempt = 1;
        let mut fallback_pending = true;
        let mut states_open = true;
        let mut actions_open = true;

        renderer.render(&remote_screen(&locator, shown, attempt, max_loads));

        loop {
            tokio::select! {
                biased;
                exit = handle.finished() => {
                    self.session.abandon_remote();
                    return Ok(self.settle_native(renderer, exit_notice(exit)));
                }
                fired = &mut fallback_rx, if fallback_pending => {
                    fallback_pending = false;
                    if fired.is_ok() {
                        if self.auto_fallback {
                            let exit = handle.unmount().await;
                            self.session.abandon_remote();
                            return Ok(self.settle_native(renderer, exit_notice(exit)));
                        }
                        // Abandonment is recorded once the user leaves the panel
                        debug!("Fallback offered, waiting on the terminal panel");
                    }
                }
                changed = states.changed(), if states_open => {
                    if changed.is_err() {
                        states_open = false;
                        continue;
                    }
                    let state = *states.borrow_and_update();
                    attempt = next_attempt(shown, state, attempt);
                    shown = state;
                    debug!("Loader state: {}", state);
                    renderer.render(&remote_screen(&locator, state, attempt, max_loads));
                }
                action = actions.recv(), if actions_open => match action {
                    Some(UserAction::Retry) => handle.retry(),
                    Some(UserAction::UseNative) => handle.use_native(),
                    Some(UserAction::Quit) => {
                        if handle.state().is_terminal() {
                            self.session.abandon_remote();
                        }
                        handle.unmount().await;
                        return Ok(HostExit::Quit);
                    }
                    None => actions_open = false,
                },
            }

            // Nobody left to answer the terminal panel
            if !actions_open && handle.state().is_terminal() {
                return Ok(self.unmount_to_native(handle, renderer).await);
            }
        }
    }

    async fn unmount_to_native<R: Renderer>(
        &mut self,
        handle: LoaderHandle,
        renderer: &mut R,
    ) -> HostExit {
        handle.unmount().await;
        self.session.abandon_remote();
        self.settle_native(renderer, "Remote content unavailable")
    }

    fn settle_native<R: Renderer>(&self, renderer: &mut R, notice: &str) -> HostExit {
        renderer.render(&Screen::Native {
            notice: Some(notice.to_string()),
        });
        HostExit::Native
    }
}

/// Notice shown when leaving remote content for native.
fn exit_notice(exit: LoaderExit) -> &'static str {
    match exit {
        LoaderExit::NativeRequested => "Switched to native app",
        LoaderExit::Unmounted => "Remote content unavailable",
    }
}

fn remote_screen(locator: &Locator, state: LoaderState, attempt: u32, max_loads: u32) -> Screen {
    Screen::Remote {
        locator: locator.clone(),
        state,
        attempt,
        max_loads,
    }
}
