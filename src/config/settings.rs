//! Settings configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// HTTP API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of threads pulling requests off the listener
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Sessions kept in memory; the least recently used idle one is evicted
    /// past this
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Sessions untouched for this long are dropped from memory
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Shared secret expected in the `X-HowToBase-Token` header.
    /// Auth is only enforced when this is set and non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9877
}

fn default_workers() -> usize {
    4
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_session_idle_secs() -> u64 {
    60 * 60
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            max_sessions: default_max_sessions(),
            session_idle_secs: default_session_idle_secs(),
            auth_token: None,
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Progress persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Keep session progress in SQLite. When false, progress lives in memory
    /// and is lost on restart.
    #[serde(default = "default_persist")]
    pub persist: bool,

    /// Database location (defaults to ~/.howtobase/progress.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

fn default_persist() -> bool {
    true
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            persist: default_persist(),
            database_path: None,
        }
    }
}

/// Unlock notification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,

    /// POST target for notifications; without it they only go to the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

fn default_notifications_enabled() -> bool {
    true
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
            webhook_url: None,
        }
    }
}

/// Upstream services the relay endpoints forward to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_url: Option<String>,

    /// Sent as a bearer token to the paymaster. Prefer the
    /// HOWTOBASE_PAYMASTER_API_KEY environment variable over the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_api_key: Option<String>,

    /// Service that submits approved spend permissions on-chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spender_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            paymaster_url: None,
            paymaster_api_key: None,
            spender_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
