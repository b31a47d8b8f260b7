//! User-facing notifications and the consuming-app launcher.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// A single toast-style notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Displays notifications. Called exactly once per terminal capture outcome.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Emits notifications as structured log events.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, n: Notification) {
        match n.level {
            NotificationLevel::Success => {
                tracing::info!(title = %n.title, "{}", n.message);
            }
            NotificationLevel::Warning => {
                tracing::warn!(title = %n.title, "{}", n.message);
            }
            NotificationLevel::Error => {
                tracing::error!(title = %n.title, "{}", n.message);
            }
        }
    }
}

/// Opens the consuming application on a freshly uploaded screenshot.
#[async_trait]
pub trait AppLauncher: Send + Sync {
    async fn open(&self, url: &str);
}

/// Prints the URL for the user (or a wrapping script) to open.
#[derive(Debug, Default)]
pub struct StdoutLauncher;

#[async_trait]
impl AppLauncher for StdoutLauncher {
    async fn open(&self, url: &str) {
        println!("{url}");
    }
}
