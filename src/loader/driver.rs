//! Async driver for one mounted loader.
//!
//! The driver task owns the surface, the retry timer and the fallback
//! sender. Ending the task (unmount, "use native", or dropping the handle)
//! drops the timer, so no retry can fire against a torn-down loader.

use std::pin::Pin;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, info, warn};

use super::state::{Directive, LoadController, LoaderState};
use super::surface::{BrowsingSurface, LoadId, SurfaceEvent, SurfaceEventKind, SurfaceEvents};
use crate::bootstrap::Locator;
use crate::config::BootstrapConfig;

/// Retry policy for a mounted loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl LoaderOptions {
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self::from_config(&BootstrapConfig::default())
    }
}

/// User actions on the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderCommand {
    /// "Try Again" on the terminal panel
    Retry,
    /// "Use Native App"
    UseNative,
}

/// Why the loader task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderExit {
    Unmounted,
    NativeRequested,
}

/// Handle to a mounted loader.
///
/// Dropping the handle aborts the loader task.
pub struct LoaderHandle {
    commands: mpsc::UnboundedSender<LoaderCommand>,
    shutdown: Option<oneshot::Sender<()>>,
    state: watch::Receiver<LoaderState>,
    task: Option<JoinHandle<LoaderExit>>,
}

impl LoaderHandle {
    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoaderState> {
        self.state.clone()
    }

    pub fn state(&self) -> LoaderState {
        *self.state.borrow()
    }

    pub fn retry(&self) {
        let _ = self.commands.send(LoaderCommand::Retry);
    }

    pub fn use_native(&self) {
        let _ = self.commands.send(LoaderCommand::UseNative);
    }

    /// Wait for the loader to end on its own.
    ///
    /// Cancel-safe. Returns `Unmounted` if the task already ended.
    pub async fn finished(&mut self) -> LoaderExit {
        let Some(task) = self.task.as_mut() else {
            return LoaderExit::Unmounted;
        };
        let result = task.await;
        self.task = None;
        join_exit(result)
    }

    /// Tear the loader down and wait for the task to stop.
    pub async fn unmount(mut self) -> LoaderExit {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        match self.task.take() {
            Some(task) => join_exit(task.await),
            None => LoaderExit::Unmounted,
        }
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

fn join_exit(result: Result<LoaderExit, tokio::task::JoinError>) -> LoaderExit {
    match result {
        Ok(exit) => exit,
        Err(e) => {
            warn!("Loader task ended abnormally: {}", e);
            LoaderExit::Unmounted
        }
    }
}

/// Mount a loader for `locator`.
///
/// `fallback` is fired at most once: when retries are exhausted, or when
/// the user asks for the native app, whichever comes first.
pub fn mount(
    locator: Locator,
    surface: Box<dyn BrowsingSurface>,
    options: LoaderOptions,
    fallback: oneshot::Sender<()>,
) -> LoaderHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (state_tx, state_rx) = watch::channel(LoaderState::Loading);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let driver = Driver {
        locator,
        surface,
        controller: LoadController::new(options.max_retries, options.retry_delay),
        fallback: Some(fallback),
        state_tx,
        events_tx,
        load_id: 0,
        retry_timer: None,
    };
    let task = tokio::spawn(driver.run(commands_rx, shutdown_rx, events_rx));

    LoaderHandle {
        commands: commands_tx,
        shutdown: Some(shutdown_tx),
        state: state_rx,
        task: Some(task),
    }
}

struct Driver {
    locator: Locator,
    surface: Box<dyn BrowsingSurface>,
    controller: LoadController,
    fallback: Option<oneshot::Sender<()>>,
    state_tx: watch::Sender<LoaderState>,
    events_tx: SurfaceEvents,
    load_id: LoadId,
    retry_timer: Option<Pin<Box<Sleep>>>,
}

/// Resolves when the armed timer fires; pending forever when disarmed.
async fn retry_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => std::future::pending().await,
    }
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<LoaderCommand>,
        mut shutdown: oneshot::Receiver<()>,
        mut events: mpsc::UnboundedReceiver<SurfaceEvent>,
    ) -> LoaderExit {
        info!("🌐 Loading remote content: {}", self.locator);
        self.issue_load();

        let exit = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break LoaderExit::Unmounted,
                command = commands.recv() => match command {
                    Some(LoaderCommand::Retry) => {
                        info!("Manual retry requested");
                        let directive = self.controller.manual_retry();
                        self.apply(directive);
                    }
                    Some(LoaderCommand::UseNative) => {
                        info!("User switched to native app");
                        self.fire_fallback();
                        break LoaderExit::NativeRequested;
                    }
                    None => break LoaderExit::Unmounted,
                },
                () = retry_elapsed(&mut self.retry_timer) => {
                    self.retry_timer = None;
                    let directive = self.controller.on_retry_elapsed();
                    self.apply(directive);
                }
                Some(event) = events.recv() => self.handle_event(event),
            }
        };

        self.retry_timer = None;
        self.surface.close();
        debug!("Loader for {} stopped ({:?})", self.locator, exit);
        exit
    }

    fn handle_event(&mut self, event: SurfaceEvent) {
        if event.load_id != self.load_id {
            debug!(
                "Ignoring event for superseded load {} (current {})",
                event.load_id, self.load_id
            );
            return;
        }

        let directive = match event.kind {
            SurfaceEventKind::Started => {
                debug!("Load {} started", event.load_id);
                return;
            }
            SurfaceEventKind::Finished => {
                info!("✅ Remote content loaded");
                self.controller.on_success()
            }
            SurfaceEventKind::Failed(err) => {
                warn!("Remote content failed to load ({}): {}", err.kind(), err);
                self.controller.on_failure(&err)
            }
        };
        self.apply(directive);
    }

    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Nothing => {}
            Directive::ScheduleRetry(delay) => {
                let attempts = self.controller.attempts();
                info!(
                    "Retrying in {:?} (attempt {}/{})",
                    delay,
                    attempts.count() + 1,
                    attempts.max_loads()
                );
                self.retry_timer = Some(Box::pin(sleep(delay)));
            }
            Directive::Reload => {
                self.retry_timer = None;
                self.issue_load();
            }
            Directive::Abandon { fire_fallback } => {
                self.retry_timer = None;
                error!(
                    "❌ Unable to load web content after {} attempts",
                    self.controller.attempts().max_loads()
                );
                if fire_fallback {
                    self.fire_fallback();
                }
            }
        }
        self.state_tx.send_replace(self.controller.state());
    }

    fn issue_load(&mut self) {
        self.load_id += 1;
        self.surface
            .load(self.load_id, &self.locator, self.events_tx.clone());
    }

    fn fire_fallback(&mut self) {
        if let Some(fallback) = self.fallback.take() {
            info!("Signalling fallback to native app");
            let _ = fallback.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootstrapError;
    use crate::loader::testing::{Script, ScriptedSurface, Step};
    use std::sync::{Arc, Mutex};

    fn mount_scripted(
        steps: &[Step],
    ) -> (LoaderHandle, oneshot::Receiver<()>, Arc<Mutex<Script>>) {
        let script = Script::shared(steps);
        let (fallback_tx, fallback_rx) = oneshot::channel();
        let locator = Locator::parse("https://x.test/farm").unwrap();
        let handle = mount(
            locator,
            Box::new(ScriptedSurface(script.clone())),
            LoaderOptions::default(),
            fallback_tx,
        );
        (handle, fallback_rx, script)
    }

    fn loads(script: &Arc<Mutex<Script>>) -> usize {
        script.lock().unwrap().loads()
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_fire_fallback_once() {
        let (handle, fallback_rx, script) = mount_scripted(&[]);
        let mut state = handle.subscribe();

        assert_eq!(fallback_rx.await, Ok(()));
        state
            .wait_for(|s| *s == LoaderState::Abandoned)
            .await
            .unwrap();
        assert_eq!(loads(&script), 3);

        // Nothing else happens while abandoned
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(loads(&script), 3);
        assert_eq!(handle.state(), LoaderState::Abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_failures_exhaust_ceiling() {
        let (handle, fallback_rx, script) = mount_scripted(&[
            Step::FailWith(BootstrapError::HttpStatus { status: 500 }),
            Step::FailWith(BootstrapError::ProcessTerminated),
            Step::FailWith(BootstrapError::Render("reset".into())),
            Step::Succeed,
        ]);
        let mut state = handle.subscribe();

        assert_eq!(fallback_rx.await, Ok(()));
        state
            .wait_for(|s| *s == LoaderState::Abandoned)
            .await
            .unwrap();
        assert_eq!(loads(&script), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_delay() {
        let (handle, _fallback_rx, script) = mount_scripted(&[Step::Fail, Step::Hang]);
        let mut state = handle.subscribe();

        state
            .wait_for(|s| *s == LoaderState::Retrying(1))
            .await
            .unwrap();
        assert_eq!(loads(&script), 1);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(loads(&script), 1);

        state.wait_for(|s| *s == LoaderState::Loading).await.unwrap();
        assert_eq!(loads(&script), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failure_is_loaded() {
        let (handle, mut fallback_rx, script) = mount_scripted(&[Step::Fail, Step::Succeed]);
        let mut state = handle.subscribe();

        state.wait_for(|s| *s == LoaderState::Loaded).await.unwrap();
        assert_eq!(loads(&script), 2);
        assert!(fallback_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_retry_after_abandon_resets_attempts() {
        let (handle, fallback_rx, script) =
            mount_scripted(&[Step::Fail, Step::Fail, Step::Fail, Step::Fail, Step::Hang]);
        let mut state = handle.subscribe();

        assert_eq!(fallback_rx.await, Ok(()));
        state
            .wait_for(|s| *s == LoaderState::Abandoned)
            .await
            .unwrap();

        handle.retry();
        state
            .wait_for(|s| *s == LoaderState::Retrying(1))
            .await
            .unwrap();
        assert_eq!(loads(&script), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_pending_retry() {
        let (handle, fallback_rx, script) = mount_scripted(&[Step::Fail]);
        let mut state = handle.subscribe();

        state
            .wait_for(|s| *s == LoaderState::Retrying(1))
            .await
            .unwrap();

        assert_eq!(handle.unmount().await, LoaderExit::Unmounted);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(loads(&script), 1);
        assert_eq!(*state.borrow(), LoaderState::Retrying(1));
        assert!(state.has_changed().is_err());
        // Sender dropped without firing
        assert!(fallback_rx.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_pending_retry() {
        let (handle, _fallback_rx, script) = mount_scripted(&[Step::Fail]);
        let mut state = handle.subscribe();
        state
            .wait_for(|s| *s == LoaderState::Retrying(1))
            .await
            .unwrap();

        drop(handle);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(loads(&script), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_use_native_fires_fallback_and_exits() {
        let (mut handle, fallback_rx, _script) = mount_scripted(&[Step::Hang]);

        handle.use_native();
        assert_eq!(handle.finished().await, LoaderExit::NativeRequested);
        assert_eq!(fallback_rx.await, Ok(()));
        // Already finished
        assert_eq!(handle.finished().await, LoaderExit::Unmounted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_use_native_after_abandon_does_not_refire() {
        let (mut handle, fallback_rx, _script) = mount_scripted(&[]);
        assert_eq!(fallback_rx.await, Ok(()));

        handle.use_native();
        assert_eq!(handle.finished().await, LoaderExit::NativeRequested);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_events_are_ignored() {
        let (handle, _fallback_rx, script) =
            mount_scripted(&[Step::Fail, Step::StaleFailThenSucceed]);
        let mut state = handle.subscribe();

        state.wait_for(|s| *s == LoaderState::Loaded).await.unwrap();
        assert_eq!(loads(&script), 2);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.state(), LoaderState::Loaded);
    }
}
