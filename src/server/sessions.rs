//! Per-session progression state for the HTTP API
//!
//! Each session gets its own [`ProgressionManager`] behind its own mutex, so
//! completions for one learner are applied one at a time while other sessions
//! proceed in parallel.
//!
//! Only writes cache a session. Idle sessions are dropped after a timeout and
//! the least recently used one is evicted once the cap is reached; with a
//! database behind the registry they are reloaded on next use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::notify::Notifier;
use crate::progression::{ProgressDb, ProgressionManager};

const MAX_SESSION_ID_LEN: usize = 64;
const DEFAULT_MAX_SESSIONS: usize = 10_000;
const DEFAULT_IDLE_AFTER: Duration = Duration::from_secs(60 * 60);

/// Session ids are 1-64 characters of `[A-Za-z0-9_-]`
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub type SessionHandle = Arc<Mutex<ProgressionManager>>;

struct CachedSession {
    handle: SessionHandle,
    last_used: Instant,
}

impl CachedSession {
    /// Someone outside the registry still holds the handle
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.handle) > 1
    }
}

/// Lazily loaded sessions, optionally backed by the progress database
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, CachedSession>>,
    db: Option<ProgressDb>,
    notifier: Arc<dyn Notifier>,
    max_sessions: usize,
    idle_after: Duration,
}

impl SessionRegistry {
    pub fn new(db: Option<ProgressDb>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            db,
            notifier,
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_after: DEFAULT_IDLE_AFTER,
        }
    }

    /// Cap the number of cached sessions and how long an idle one is kept
    pub fn with_limits(mut self, max_sessions: usize, idle_after: Duration) -> Self {
        self.max_sessions = max_sessions.max(1);
        self.idle_after = idle_after;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CachedSession>>> {
        self.sessions
            .lock()
            .map_err(|_| anyhow!("Session registry lock poisoned"))
    }

    fn load(&self, session_id: &str) -> Result<ProgressionManager> {
        match &self.db {
            Some(db) => ProgressionManager::with_db(session_id, self.notifier.clone(), db.clone()),
            None => Ok(ProgressionManager::new(session_id, self.notifier.clone())),
        }
    }

    /// Session to write to: the cached one, or loaded (or started fresh) and
    /// cached
    pub fn get(&self, session_id: &str) -> Result<SessionHandle> {
        let mut sessions = self.lock()?;
        let now = Instant::now();

        if let Some(cached) = sessions.get_mut(session_id) {
            cached.last_used = now;
            return Ok(cached.handle.clone());
        }

        let handle = Arc::new(Mutex::new(self.load(session_id)?));
        self.make_room(&mut sessions, now);
        sessions.insert(
            session_id.to_string(),
            CachedSession {
                handle: handle.clone(),
                last_used: now,
            },
        );
        debug!("[howtobase:http] Opened session {}", session_id);
        Ok(handle)
    }

    /// Session to read from: the cached one, or a loaded copy that is not
    /// cached
    pub fn peek(&self, session_id: &str) -> Result<SessionHandle> {
        let mut sessions = self.lock()?;
        if let Some(cached) = sessions.get_mut(session_id) {
            cached.last_used = Instant::now();
            return Ok(cached.handle.clone());
        }
        drop(sessions);

        Ok(Arc::new(Mutex::new(self.load(session_id)?)))
    }

    /// Start a new session with a random id
    pub fn create(&self) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().simple().to_string();
        self.get(&session_id)?;
        Ok(session_id)
    }

    /// Drop a session from memory. Returns whether it was cached.
    pub fn remove(&self, session_id: &str) -> Result<bool> {
        Ok(self.lock()?.remove(session_id).is_some())
    }

    fn make_room(&self, sessions: &mut HashMap<String, CachedSession>, now: Instant) {
        sessions.retain(|id, cached| {
            let keep = cached.in_use() || now.duration_since(cached.last_used) < self.idle_after;
            if !keep {
                debug!("[howtobase:http] Dropping idle session {}", id);
            }
            keep
        });

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, cached)| !cached.in_use())
                .min_by_key(|(_, cached)| cached.last_used)
                .map(|(id, _)| id.clone());

            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!("[howtobase:http] Evicted session {}", id);
                }
                None => {
                    warn!(
                        "[howtobase:http] All {} sessions busy, going over the limit",
                        sessions.len()
                    );
                    break;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
