//! Per-session progression state
//!
//! A [`ProgressionStore`] owns one learner's copy of the achievement catalog
//! together with their XP, completed ids and streak. Stores are independent:
//! unlocking in one never affects another.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use tracing::debug;

use super::definitions::{AchievementCategory, AchievementDef, AchievementId, CATALOG};
use super::levels::{calculate_level, LevelInfo};
use super::streaks::Streak;

/// An achievement together with its completion state.
///
/// `completed` is derived from `completed_at`, so a completed achievement
/// always carries its unlock time.
#[derive(Debug, Clone, PartialEq)]
pub struct Achievement {
    def: &'static AchievementDef,
    completed_at: Option<DateTime<Utc>>,
}

impl Achievement {
    fn new(def: &'static AchievementDef) -> Self {
        Self {
            def,
            completed_at: None,
        }
    }

    pub fn id(&self) -> AchievementId {
        self.def.id
    }

    pub fn title(&self) -> &'static str {
        self.def.title
    }

    pub fn description(&self) -> &'static str {
        self.def.description
    }

    pub fn icon(&self) -> &'static str {
        self.def.icon
    }

    pub fn category(&self) -> AchievementCategory {
        self.def.category
    }

    pub fn xp(&self) -> u32 {
        self.def.xp
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AchievementView<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    xp: u32,
    icon: &'a str,
    category: AchievementCategory,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl Serialize for Achievement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AchievementView {
            id: self.def.id.as_str(),
            title: self.def.title,
            description: self.def.description,
            xp: self.def.xp,
            icon: self.def.icon,
            category: self.def.category,
            completed: self.is_completed(),
            completed_at: self.completed_at,
        }
        .serialize(serializer)
    }
}

/// XP, unlock history and streak for one learner
#[derive(Debug, Clone, Default)]
pub struct UserProgress {
    total_xp: u32,
    completed_achievements: Vec<AchievementId>,
    streak: Streak,
}

impl UserProgress {
    pub fn total_xp(&self) -> u32 {
        self.total_xp
    }

    /// Completed ids in unlock order
    pub fn completed_achievements(&self) -> &[AchievementId] {
        &self.completed_achievements
    }

    pub fn current_streak(&self) -> u32 {
        self.streak.current
    }

    pub fn longest_streak(&self) -> u32 {
        self.streak.longest
    }

    pub fn streak(&self) -> &Streak {
        &self.streak
    }

    /// Level derived from the XP total
    pub fn level(&self) -> LevelInfo {
        calculate_level(i64::from(self.total_xp))
    }
}

/// Serializable view of a learner's progress
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub level: LevelInfo,
    #[serde(rename = "totalXP")]
    pub total_xp: u32,
    pub completed_achievements: Vec<&'static str>,
    pub completed_count: usize,
    pub total_count: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// One learner's achievements and progress
#[derive(Debug, Clone)]
pub struct ProgressionStore {
    achievements: Vec<Achievement>,
    progress: UserProgress,
}

impl Default for ProgressionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionStore {
    /// Fresh store: every catalog entry present and not completed
    pub fn new() -> Self {
        Self {
            achievements: CATALOG.iter().map(Achievement::new).collect(),
            progress: UserProgress::default(),
        }
    }

    /// Unlock an achievement now. See [`Self::complete_achievement_at`].
    pub fn complete_achievement(&mut self, id: &str) -> Option<Achievement> {
        self.complete_achievement_at(id, Utc::now())
    }

    /// Unlock an achievement with an explicit timestamp.
    ///
    /// Returns the completed record the first time an id is unlocked and
    /// credits its XP. Unknown and already completed ids return `None` and
    /// leave the store untouched.
    pub fn complete_achievement_at(
        &mut self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Option<Achievement> {
        let Some(achievement) = self
            .achievements
            .iter_mut()
            .find(|a| a.def.id.as_str() == id)
        else {
            debug!("[progression] Ignoring unknown achievement id {:?}", id);
            return None;
        };

        if achievement.is_completed() {
            debug!("[progression] {} already completed", id);
            return None;
        }

        achievement.completed_at = Some(at);
        self.progress.total_xp = self.progress.total_xp.saturating_add(achievement.xp());
        self.progress.completed_achievements.push(achievement.id());

        Some(achievement.clone())
    }

    /// Achievements of one category, in catalog order
    pub fn achievements_by_category(&self, category: AchievementCategory) -> Vec<&Achievement> {
        self.achievements
            .iter()
            .filter(|a| a.category() == category)
            .collect()
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.def.id.as_str() == id)
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn level(&self) -> LevelInfo {
        self.progress.level()
    }

    pub fn completed_count(&self) -> usize {
        self.progress.completed_achievements.len()
    }

    /// Record tutorial activity on `day`; returns the new streak if it changed
    pub fn record_activity(&mut self, day: NaiveDate) -> Option<u32> {
        self.progress.streak.record(day)
    }

    /// Replace the streak wholesale (used when loading persisted state)
    pub fn restore_streak(&mut self, streak: Streak) {
        self.progress.streak = streak;
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            level: self.level(),
            total_xp: self.progress.total_xp,
            completed_achievements: self
                .progress
                .completed_achievements
                .iter()
                .map(|id| id.as_str())
                .collect(),
            completed_count: self.completed_count(),
            total_count: self.achievements.len(),
            current_streak: self.progress.current_streak(),
            longest_streak: self.progress.longest_streak(),
        }
    }
}
