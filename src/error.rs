//! Error taxonomy for the launch bootstrap.
//!
//! Resolver failures (transport, status, parse, validation) are folded into
//! a `ResolutionOutcome::Error` message. Loader failures (transport, status,
//! render, process termination) are folded into the retry state machine.
//! None of them reach `main` as a hard error.

use thiserror::Error;

/// Failures observed while bootstrapping remote mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// Could not reach the endpoint (DNS, connect, timeout, body read)
    #[error("network error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status
    #[error("HTTP error! status: {status}")]
    HttpStatus { status: u16 },

    /// The body was not valid JSON
    #[error("invalid {what} format")]
    Parse { what: &'static str },

    /// No http-prefixed locator could be extracted
    #[error("{0}")]
    Validation(String),

    /// The browsing surface failed to paint the content
    #[error("render error: {0}")]
    Render(String),

    /// The content-rendering process went away
    #[error("content process terminated")]
    ProcessTerminated,
}

impl BootstrapError {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return BootstrapError::HttpStatus {
                status: status.as_u16(),
            };
        }
        let kind = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "connection failed"
        } else if err.is_body() || err.is_decode() {
            "failed to read response body"
        } else {
            "request failed"
        };
        BootstrapError::Transport(format!("{}: {}", kind, err))
    }

    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            BootstrapError::Transport(_) => "transport",
            BootstrapError::HttpStatus { .. } => "http_status",
            BootstrapError::Parse { .. } => "parse",
            BootstrapError::Validation(_) => "validation",
            BootstrapError::Render(_) => "render",
            BootstrapError::ProcessTerminated => "process_terminated",
        }
    }
}

/// Result type for bootstrap operations
pub type BootstrapResult<T> = std::result::Result<T, BootstrapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_error_display() {
        let err = BootstrapError::HttpStatus { status: 503 };
        assert_eq!(err.to_string(), "HTTP error! status: 503");

        let err = BootstrapError::Parse { what: "flag" };
        assert_eq!(err.to_string(), "invalid flag format");

        let err = BootstrapError::Validation("no valid URL found".to_string());
        assert_eq!(err.to_string(), "no valid URL found");
    }

    #[test]
    fn test_bootstrap_error_kind() {
        assert_eq!(BootstrapError::ProcessTerminated.kind(), "process_terminated");
        assert_eq!(BootstrapError::Transport("x".into()).kind(), "transport");
    }
}
