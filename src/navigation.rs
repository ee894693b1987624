//! Navigation side effects.
//!
//! The session controller and the route guard move the user between views (to the
//! dashboard after login, back to the login page after logout). They do so through the
//! `Navigator` trait so the host (a CLI, a UI shell, a test) decides what a navigation
//! actually means.

use std::sync::Mutex;

use log::info;

use crate::config::ClientConfig;

/// Well-known destinations of the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    /// Where a successful login lands.
    pub post_login: String,
    /// The public entry point: where logout and guard redirects lead.
    pub public: String,
}

impl Routes {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            post_login: config.post_login_route.clone(),
            public: config.public_route.clone(),
        }
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

pub trait Navigator: Send + Sync {
    fn push(&self, route: &str);
}

/// Navigator that only logs the requested route.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn push(&self, route: &str) {
        info!("Navigating to {}", route);
    }
}

/// Navigator that keeps the history of requested routes.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.history().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl Navigator for HistoryNavigator {
    fn push(&self, route: &str) {
        info!("Navigating to {}", route);
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(route.to_string());
    }
}
