//! Mode resolver: decides remote vs native mode at launch.
//!
//! Flow:
//! ```text
//! GET flag    -> parse JSON -> not `true`?  -> NativeMode
//! GET locator -> parse JSON -> extract      -> validate -> RemoteMode(locator)
//! any failure                               -> Error(message)
//! ```
//!
//! The locator request is only sent after the flag request completed and
//! parsed to `true`. Nothing is persisted between calls.

use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

use super::locator::{Locator, LocatorPayload};
use crate::api::ConfigClient;
use crate::error::{BootstrapError, BootstrapResult};

/// Result handed to the host after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Render the remote destination
    RemoteMode(Locator),
    /// Render the native app
    NativeMode,
    /// Resolution failed; render native and surface the message
    Error(String),
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionOutcome::RemoteMode(locator) => write!(f, "remote: {}", locator),
            ResolutionOutcome::NativeMode => write!(f, "native"),
            ResolutionOutcome::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Fetches the remote flag and locator and decides the session mode.
pub struct ModeResolver {
    client: ConfigClient,
    flag_url: Url,
    locator_url: Url,
}

impl ModeResolver {
    pub fn new(client: ConfigClient, flag_url: Url, locator_url: Url) -> Self {
        Self {
            client,
            flag_url,
            locator_url,
        }
    }

    /// Run one resolution attempt. Never fails; errors become
    /// `ResolutionOutcome::Error`.
    pub async fn resolve(&self) -> ResolutionOutcome {
        info!("🏁 Checking remote mode flag...");
        match self.try_resolve().await {
            Ok(Some(locator)) => {
                info!("✅ Remote mode enabled: {}", locator);
                ResolutionOutcome::RemoteMode(locator)
            }
            Ok(None) => {
                info!("Remote mode disabled, loading native app");
                ResolutionOutcome::NativeMode
            }
            Err(e) => {
                warn!("⚠️  Remote mode check failed ({}): {}", e.kind(), e);
                ResolutionOutcome::Error(format!("Failed to check remote mode: {}", e))
            }
        }
    }

    async fn try_resolve(&self) -> BootstrapResult<Option<Locator>> {
        let flag = self.fetch_json(&self.flag_url, "flag").await?;
        if !is_enabled(&flag) {
            debug!("Flag value {} is not `true`", flag);
            return Ok(None);
        }

        let body = self.fetch_json(&self.locator_url, "locator").await?;
        let payload = LocatorPayload::classify(&body);
        debug!("Locator payload: {:?}", payload);
        payload.into_locator().map(Some)
    }

    async fn fetch_json(&self, url: &Url, what: &'static str) -> BootstrapResult<Value> {
        let text = self.client.get_text(url).await?;
        debug!("{} response text: {}", what, text);
        serde_json::from_str(&text).map_err(|e| {
            debug!("Failed to parse {} JSON: {}", what, e);
            BootstrapError::Parse { what }
        })
    }
}

/// Only the literal JSON boolean `true` enables remote mode.
pub fn is_enabled(flag: &Value) -> bool {
    matches!(flag, Value::Bool(true))
}
