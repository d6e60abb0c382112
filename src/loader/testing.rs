//! Scripted browsing surface for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::surface::{
    BrowsingSurface, LoadId, SurfaceEvent, SurfaceEventKind, SurfaceEvents, SurfaceFactory,
};
use crate::bootstrap::Locator;
use crate::error::BootstrapError;

#[derive(Debug, Clone)]
pub enum Step {
    /// Fail with a transport error
    Fail,
    FailWith(BootstrapError),
    Succeed,
    /// Report nothing
    Hang,
    /// Report a failure tagged with the previous load id, then succeed
    StaleFailThenSucceed,
}

/// Steps to answer loads with; once empty every load fails.
#[derive(Debug, Default)]
pub struct Script {
    steps: VecDeque<Step>,
    loads: usize,
}

impl Script {
    pub fn shared(steps: &[Step]) -> Arc<Mutex<Script>> {
        Arc::new(Mutex::new(Script {
            steps: steps.iter().cloned().collect(),
            loads: 0,
        }))
    }

    pub fn loads(&self) -> usize {
        self.loads
    }
}

pub struct ScriptedSurface(pub Arc<Mutex<Script>>);

impl BrowsingSurface for ScriptedSurface {
    fn load(&mut self, load_id: LoadId, _locator: &Locator, events: SurfaceEvents) {
        let mut script = self.0.lock().unwrap();
        script.loads += 1;
        let step = script.steps.pop_front().unwrap_or(Step::Fail);

        let _ = events.send(SurfaceEvent::new(load_id, SurfaceEventKind::Started));
        let failed = SurfaceEventKind::Failed(BootstrapError::Transport("offline".into()));
        match step {
            Step::Fail => {
                let _ = events.send(SurfaceEvent::new(load_id, failed));
            }
            Step::FailWith(err) => {
                let _ = events.send(SurfaceEvent::new(load_id, SurfaceEventKind::Failed(err)));
            }
            Step::Succeed => {
                let _ = events.send(SurfaceEvent::new(load_id, SurfaceEventKind::Finished));
            }
            Step::Hang => {}
            Step::StaleFailThenSucceed => {
                let _ = events.send(SurfaceEvent::new(load_id - 1, failed));
                let _ = events.send(SurfaceEvent::new(load_id, SurfaceEventKind::Finished));
            }
        }
    }
}

/// Hands out surfaces that share one script.
pub struct ScriptedFactory {
    pub script: Arc<Mutex<Script>>,
    pub created: Arc<Mutex<usize>>,
}

impl ScriptedFactory {
    pub fn new(steps: &[Step]) -> Self {
        Self {
            script: Script::shared(steps),
            created: Arc::new(Mutex::new(0)),
        }
    }
}

impl SurfaceFactory for ScriptedFactory {
    fn create(&self) -> anyhow::Result<Box<dyn BrowsingSurface>> {
        *self.created.lock().unwrap() += 1;
        Ok(Box::new(ScriptedSurface(self.script.clone())))
    }
}
