//! Shared test utilities for progression integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use howtobase::config::RelaySettings;
use howtobase::notify::{Notification, Notifier, NullNotifier};
use howtobase::progression::ProgressDb;
use howtobase::relay::RelayClient;
use howtobase::server::{ServerState, SessionRegistry};

/// Collects every notification it is handed
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn bodies(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("notifier lock")
            .iter()
            .map(|n| n.body.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().expect("notifier lock").len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push(notification.clone());
        Ok(())
    }
}

/// In-memory server state with no upstream relays configured
pub fn memory_state() -> ServerState {
    ServerState::new(
        SessionRegistry::new(None, Arc::new(NullNotifier)),
        RelayClient::new(RelaySettings::default()),
        None,
    )
}

/// Server state backed by a database file
pub fn persistent_state(db: ProgressDb) -> ServerState {
    ServerState::new(
        SessionRegistry::new(Some(db), Arc::new(NullNotifier)),
        RelayClient::new(RelaySettings::default()),
        None,
    )
}

/// In-memory server state caching at most `max_sessions` sessions
pub fn limited_state(max_sessions: usize) -> ServerState {
    ServerState::new(
        SessionRegistry::new(None, Arc::new(NullNotifier))
            .with_limits(max_sessions, Duration::from_secs(3600)),
        RelayClient::new(RelaySettings::default()),
        None,
    )
}

/// Database-backed server state caching at most `max_sessions` sessions
pub fn persistent_state_with_limit(db: ProgressDb, max_sessions: usize) -> ServerState {
    ServerState::new(
        SessionRegistry::new(Some(db), Arc::new(NullNotifier))
            .with_limits(max_sessions, Duration::from_secs(3600)),
        RelayClient::new(RelaySettings::default()),
        None,
    )
}
