//! Notification sinks for achievement unlocks
//!
//! Notifications are fire-and-forget: a failing sink is logged and never
//! blocks or rolls back progression.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

/// A push/toast notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Something that can deliver notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Deliver a notification, logging (and swallowing) any failure
pub fn dispatch(notifier: &dyn Notifier, notification: &Notification) {
    if let Err(e) = notifier.notify(notification) {
        warn!("[howtobase:notify] Failed to send {:?}: {:#}", notification.title, e);
    }
}

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            "[howtobase:notify] {} - {}",
            notification.title, notification.body
        );
        Ok(())
    }
}

/// Discards notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: &Notification) -> Result<()> {
        Ok(())
    }
}

/// POSTs notifications as JSON to a webhook on a background thread
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    client: ureq::Agent,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(10))
            .build();

        Self {
            url: url.into(),
            client,
        }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        let url = self.url.clone();
        let client = self.client.clone();
        let notification = notification.clone();

        thread::Builder::new()
            .name("howtobase-notify".to_string())
            .spawn(move || {
                if let Err(e) = client.post(&url).send_json(&notification) {
                    warn!("[howtobase:notify] Webhook {} failed: {}", url, e);
                }
            })
            .context("Failed to spawn notification thread")?;

        Ok(())
    }
}
