use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{BootstrapError, BootstrapResult};

/// Default CLI version (from Cargo.toml)
const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the User-Agent string for config requests
fn build_user_agent() -> String {
    std::env::var("FARMGATE_USER_AGENT")
        .unwrap_or_else(|_| format!("farmgate/{}", DEFAULT_VERSION))
}

/// Client for the remote configuration endpoints
#[derive(Clone)]
pub struct ConfigClient {
    client: Client,
    user_agent: String,
    session_id: String,
}

impl ConfigClient {
    /// Create a new config client
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            user_agent: build_user_agent(),
            session_id: Uuid::new_v4().to_string(),
        })
    }

    /// Identifier sent with every request of this process
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// GET `url` and return the body text.
    ///
    /// Non-success statuses are reported as `HttpStatus`; no retries happen
    /// here, the user drives retries from the error screen.
    pub async fn get_text(&self, url: &Url) -> BootstrapResult<String> {
        let request_id = Uuid::new_v4().to_string();

        debug!("=== Config Request ===");
        debug!("URL: {}", url);
        debug!("Request ID: {}", request_id);

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .header("User-Agent", &self.user_agent)
            .header("x-request-id", &request_id)
            .header("x-request-session-id", &self.session_id)
            .send()
            .await
            .map_err(|e| BootstrapError::from_reqwest(&e))?;

        let status = response.status();
        debug!("=== Config Response ===");
        debug!("Status: {}", status);

        if !status.is_success() {
            return Err(BootstrapError::HttpStatus {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| BootstrapError::from_reqwest(&e))
    }
}
