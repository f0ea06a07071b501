//! Configuration loading and management

mod io;
mod settings;

pub use settings::{NotificationSettings, RelaySettings, ServerSettings, StorageSettings};

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::notify::{LogNotifier, Notifier, NullNotifier, WebhookNotifier};

/// Environment variables that override values from the config file
pub const ENV_PAYMASTER_URL: &str = "HOWTOBASE_PAYMASTER_URL";
pub const ENV_PAYMASTER_API_KEY: &str = "HOWTOBASE_PAYMASTER_API_KEY";
pub const ENV_SPENDER_URL: &str = "HOWTOBASE_SPENDER_URL";
pub const ENV_NOTIFY_WEBHOOK: &str = "HOWTOBASE_NOTIFY_WEBHOOK";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub relay: RelaySettings,
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (empty values are ignored)
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_PAYMASTER_URL) {
            self.relay.paymaster_url = Some(url);
        }
        if let Some(key) = get(ENV_PAYMASTER_API_KEY) {
            self.relay.paymaster_api_key = Some(key);
        }
        if let Some(url) = get(ENV_SPENDER_URL) {
            self.relay.spender_url = Some(url);
        }
        if let Some(url) = get(ENV_NOTIFY_WEBHOOK) {
            self.notifications.webhook_url = Some(url);
        }
    }

    /// Resolved database path (None when persistence is off)
    pub fn database_path(&self) -> Option<PathBuf> {
        if !self.storage.persist {
            return None;
        }
        Some(
            self.storage
                .database_path
                .clone()
                .unwrap_or_else(|| Self::global_config_dir().join("progress.db")),
        )
    }

    /// Which notification sink `[notifications]` asks for
    pub fn notifier_kind(&self) -> NotifierKind {
        if !self.notifications.enabled {
            return NotifierKind::Disabled;
        }
        match self
            .notifications
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        {
            Some(url) => NotifierKind::Webhook(url.to_string()),
            None => NotifierKind::Log,
        }
    }

    /// Build the notifier described by `[notifications]`
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        match self.notifier_kind() {
            NotifierKind::Disabled => Arc::new(NullNotifier),
            NotifierKind::Log => Arc::new(LogNotifier),
            NotifierKind::Webhook(url) => Arc::new(WebhookNotifier::new(url)),
        }
    }
}

/// Notification sink selected by configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierKind {
    Disabled,
    Log,
    Webhook(String),
}

impl std::fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Log => write!(f, "log"),
            Self::Webhook(_) => write!(f, "webhook"),
        }
    }
}
