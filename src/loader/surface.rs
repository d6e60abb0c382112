//! Browsing surface abstraction and the HTTP-backed implementation.
//!
//! A surface renders one locator at a time. Every load is tagged with a
//! `LoadId`; progress is reported as [`SurfaceEvent`]s on the channel the
//! driver passes in, and the driver discards events for superseded loads.

use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::bootstrap::Locator;
use crate::error::BootstrapError;

/// Identifier of one issued load
pub type LoadId = u64;

/// Sender half the surface reports on
pub type SurfaceEvents = mpsc::UnboundedSender<SurfaceEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEventKind {
    Started,
    /// Content painted
    Finished,
    Failed(BootstrapError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEvent {
    pub load_id: LoadId,
    pub kind: SurfaceEventKind,
}

impl SurfaceEvent {
    pub fn new(load_id: LoadId, kind: SurfaceEventKind) -> Self {
        Self { load_id, kind }
    }
}

/// An embedded browser, or anything that can stand in for one.
pub trait BrowsingSurface: Send {
    /// Start loading `locator`, superseding any load still in flight.
    fn load(&mut self, load_id: LoadId, locator: &Locator, events: SurfaceEvents);

    /// Stop any in-flight work. Called once when the loader ends.
    fn close(&mut self) {}
}

/// Creates a fresh surface for each mounted loader.
pub trait SurfaceFactory: Send + Sync {
    fn create(&self) -> anyhow::Result<Box<dyn BrowsingSurface>>;
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Surface that "renders" by fetching the locator over HTTP.
///
/// The fetch runs in its own task; if that task dies abnormally the load is
/// reported as `ProcessTerminated`, the same way a crashed content process
/// would be.
pub struct HttpSurface {
    client: Client,
    in_flight: Option<AbortOnDrop<()>>,
}

impl HttpSurface {
    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build surface HTTP client: {}", e))?;
        Ok(Self {
            client,
            in_flight: None,
        })
    }
}

async fn fetch_content(request: reqwest::RequestBuilder) -> SurfaceEventKind {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return SurfaceEventKind::Failed(BootstrapError::from_reqwest(&e)),
    };

    let status = response.status();
    if !status.is_success() {
        return SurfaceEventKind::Failed(BootstrapError::HttpStatus {
            status: status.as_u16(),
        });
    }

    match response.bytes().await {
        Ok(body) => {
            debug!("Surface received {} bytes", body.len());
            SurfaceEventKind::Finished
        }
        Err(e) => SurfaceEventKind::Failed(BootstrapError::Render(e.to_string())),
    }
}

/// Run `work` for one load in a worker task and report its outcome.
///
/// A worker that dies before producing an outcome is reported as
/// `ProcessTerminated`. Dropping the returned guard cancels both tasks
/// without reporting.
fn spawn_load<F>(load_id: LoadId, events: SurfaceEvents, work: F) -> AbortOnDrop<()>
where
    F: Future<Output = SurfaceEventKind> + Send + 'static,
{
    AbortOnDrop(tokio::spawn(async move {
        let _ = events.send(SurfaceEvent::new(load_id, SurfaceEventKind::Started));

        let mut worker = AbortOnDrop(tokio::spawn(work));
        let kind = match (&mut worker.0).await {
            Ok(kind) => kind,
            Err(e) => {
                debug!("Surface worker for load {} ended abnormally: {}", load_id, e);
                SurfaceEventKind::Failed(BootstrapError::ProcessTerminated)
            }
        };
        let _ = events.send(SurfaceEvent::new(load_id, kind));
    }))
}

impl BrowsingSurface for HttpSurface {
    fn load(&mut self, load_id: LoadId, locator: &Locator, events: SurfaceEvents) {
        // Dropping the previous guard cancels its fetch
        self.in_flight = None;

        let request = self.client.get(locator.as_str());
        self.in_flight = Some(spawn_load(load_id, events, fetch_content(request)));
    }

    fn close(&mut self) {
        self.in_flight = None;
    }
}

/// Builds an [`HttpSurface`] per mount.
pub struct HttpSurfaceFactory {
    user_agent: String,
    timeout: Duration,
}

impl HttpSurfaceFactory {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

impl SurfaceFactory for HttpSurfaceFactory {
    fn create(&self) -> anyhow::Result<Box<dyn BrowsingSurface>> {
        Ok(Box::new(HttpSurface::new(&self.user_agent, self.timeout)?))
    }
}
