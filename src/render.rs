//! Terminal rendering of host screens.
//!
//! stdout carries the screens; logs go to stderr.

use crate::bootstrap::Locator;
use crate::loader::LoaderState;

/// Everything the host can put on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Resolution in progress
    Resolving,
    Native {
        notice: Option<String>,
    },
    InitError {
        message: String,
    },
    Remote {
        locator: Locator,
        state: LoaderState,
        /// 1-based load number the surface is on
        attempt: u32,
        max_loads: u32,
    },
}

pub trait Renderer {
    fn render(&mut self, screen: &Screen);
}

/// Loading line shown over the surface, as the app displays it.
pub fn loading_label(attempt: u32) -> String {
    if attempt > 1 {
        format!("Loading... (Attempt {})", attempt)
    } else {
        "Loading...".to_string()
    }
}

/// Prints screens to stdout.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    last: Option<Screen>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines(screen: &Screen) -> Vec<String> {
        match screen {
            Screen::Resolving => vec![
                "🐔 Poultry Farm ERP".to_string(),
                "   Loading your farm management system...".to_string(),
            ],
            Screen::Native { notice } => {
                let mut lines = vec!["✅ Native farm management app ready".to_string()];
                if let Some(notice) = notice {
                    lines.push(format!("   {}", notice));
                }
                lines
            }
            Screen::InitError { message } => vec![
                "⚠️  Loading Error".to_string(),
                format!("   {}", message),
                "   Loading native application instead...".to_string(),
                "   [r] Retry Check   [q] Quit".to_string(),
            ],
            Screen::Remote {
                locator,
                state,
                attempt,
                max_loads,
            } => match state {
                LoaderState::Loading => vec![format!("⏳ {} {}", loading_label(*attempt), locator)],
                LoaderState::Loaded => vec![
                    format!("🌐 Showing remote content: {}", locator),
                    "   [n] Use Native App   [q] Quit".to_string(),
                ],
                LoaderState::Retrying(n) => vec![format!(
                    "↻  Load failed, retrying ({} of {})",
                    n,
                    max_loads.saturating_sub(1)
                )],
                LoaderState::Abandoned => vec![
                    "☁️  Connection Failed".to_string(),
                    format!("   Unable to load web content after {} attempts", max_loads),
                    "   [r] Try Again   [n] Use Native App   [q] Quit".to_string(),
                ],
            },
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, screen: &Screen) {
        if self.last.as_ref() == Some(screen) {
            return;
        }
        for line in Self::lines(screen) {
            println!("{}", line);
        }
        self.last = Some(screen.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_label() {
        assert_eq!(loading_label(1), "Loading...");
        assert_eq!(loading_label(2), "Loading... (Attempt 2)");
    }

    #[test]
    fn test_abandoned_panel_lines() {
        let screen = Screen::Remote {
            locator: Locator::parse("https://x.test").unwrap(),
            state: LoaderState::Abandoned,
            attempt: 3,
            max_loads: 3,
        };
        let lines = TerminalRenderer::lines(&screen);
        assert_eq!(lines[0], "☁️  Connection Failed");
        assert!(lines[1].contains("after 3 attempts"));
        assert!(lines[2].contains("Try Again"));
        assert!(lines[2].contains("Use Native App"));
    }

    #[test]
    fn test_init_error_lines_offer_retry() {
        let screen = Screen::InitError {
            message: "Failed to check remote mode: HTTP error! status: 500".into(),
        };
        let lines = TerminalRenderer::lines(&screen);
        assert!(lines[1].contains("status: 500"));
        assert!(lines.iter().any(|l| l.contains("Retry Check")));
    }
}
