//! Progression Manager - ties a session's store to persistence and notifications
//!
//! Turns raw unlocks into gamification events (achievement, XP, level-up,
//! streak) and pushes a notification for every unlock.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::db::ProgressDb;
use super::store::{Achievement, ProgressSnapshot, ProgressionStore};
use crate::notify::{dispatch, Notification, Notifier};

/// A level up event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
    pub new_title: &'static str,
    pub badge: &'static str,
}

/// Events that can happen while a learner progresses
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GamificationEvent {
    AchievementUnlocked {
        achievement: Achievement,
    },
    #[serde(rename_all = "camelCase")]
    XpAwarded {
        amount: u32,
        reason: String,
        total_xp: u32,
    },
    LevelUp(LevelUp),
    StreakExtended {
        count: u32,
        longest: u32,
    },
}

/// Result of a completion request
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    /// The newly unlocked achievement, `None` for unknown or repeated ids
    pub unlocked: Option<Achievement>,
    pub events: Vec<GamificationEvent>,
}

impl CompletionOutcome {
    fn nothing() -> Self {
        Self {
            unlocked: None,
            events: Vec::new(),
        }
    }
}

/// Notification pushed after an unlock
pub fn unlock_notification(achievement: &Achievement) -> Notification {
    Notification {
        title: "Achievement Unlocked! 🎉".to_string(),
        body: format!(
            "{} {} (+{} XP)",
            achievement.icon(),
            achievement.title(),
            achievement.xp()
        ),
    }
}

/// Owns one session's progression state
pub struct ProgressionManager {
    session_id: String,
    store: ProgressionStore,
    notifier: Arc<dyn Notifier>,
    db: Option<ProgressDb>,
}

impl ProgressionManager {
    /// In-memory manager with a fresh store
    pub fn new(session_id: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            session_id: session_id.into(),
            store: ProgressionStore::new(),
            notifier,
            db: None,
        }
    }

    /// Persistent manager; loads whatever the database holds for the session
    pub fn with_db(
        session_id: impl Into<String>,
        notifier: Arc<dyn Notifier>,
        db: ProgressDb,
    ) -> Result<Self> {
        let session_id = session_id.into();
        let store = db.load_store(&session_id)?;
        Ok(Self {
            session_id,
            store,
            notifier,
            db: Some(db),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn store(&self) -> &ProgressionStore {
        &self.store
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.store.snapshot()
    }

    /// Complete an achievement and report what happened.
    ///
    /// Unknown and already completed ids produce an empty outcome. Only a
    /// storage failure is an error; in that case nothing is unlocked.
    pub fn complete(&mut self, id: &str) -> Result<CompletionOutcome> {
        let unlockable = self
            .store
            .achievement(id)
            .filter(|a| !a.is_completed())
            .map(|a| a.id());
        let Some(achievement_id) = unlockable else {
            return Ok(CompletionOutcome::nothing());
        };

        let mut unlocked_at = Utc::now();
        if let Some(db) = &self.db {
            if !db.record_unlock(&self.session_id, achievement_id, unlocked_at)? {
                // Another writer stored it first; keep its timestamp
                warn!(
                    "[howtobase:progress] {} already has {} stored, reusing its unlock time",
                    self.session_id, achievement_id
                );
                if let Some(stored) = db.unlocked_at(&self.session_id, achievement_id)? {
                    unlocked_at = stored;
                }
            }
        }

        let old_level = self.store.level();
        let Some(unlocked) = self.store.complete_achievement_at(id, unlocked_at) else {
            return Ok(CompletionOutcome::nothing());
        };
        let new_level = self.store.level();
        let total_xp = self.store.progress().total_xp();

        info!(
            "[howtobase:progress] {} unlocked {} (+{} XP, total {})",
            self.session_id,
            unlocked.id(),
            unlocked.xp(),
            total_xp
        );

        let mut events = vec![
            GamificationEvent::AchievementUnlocked {
                achievement: unlocked.clone(),
            },
            GamificationEvent::XpAwarded {
                amount: unlocked.xp(),
                reason: format!("Achievement: {}", unlocked.title()),
                total_xp,
            },
        ];

        if new_level.level > old_level.level {
            info!(
                "[howtobase:progress] {} reached level {} ({})",
                self.session_id, new_level.level, new_level.title
            );
            events.push(GamificationEvent::LevelUp(LevelUp {
                old_level: old_level.level,
                new_level: new_level.level,
                new_title: new_level.title,
                badge: new_level.badge,
            }));
        }

        dispatch(self.notifier.as_ref(), &unlock_notification(&unlocked));

        Ok(CompletionOutcome {
            unlocked: Some(unlocked),
            events,
        })
    }

    /// Record activity for `day`, persisting the streak when it changes
    pub fn record_activity(&mut self, day: NaiveDate) -> Result<Option<GamificationEvent>> {
        let mut streak = self.store.progress().streak().clone();
        let Some(count) = streak.record(day) else {
            return Ok(None);
        };

        if let Some(db) = &self.db {
            db.save_streak(&self.session_id, &streak)?;
        }

        let longest = streak.longest;
        self.store.restore_streak(streak);
        Ok(Some(GamificationEvent::StreakExtended { count, longest }))
    }

    /// Forget all progress for this session
    pub fn reset(&mut self) -> Result<()> {
        if let Some(db) = &self.db {
            db.reset_session(&self.session_id)?;
        }
        self.store = ProgressionStore::new();
        info!("[howtobase:progress] {} reset", self.session_id);
        Ok(())
    }
}
