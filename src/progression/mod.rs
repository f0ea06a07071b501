//! Gamification core: achievement catalog, XP, levels and streaks
//!
//! ```text
//!  wallet/tx event ──► ProgressionManager::complete(id)
//!                          │
//!                          ├─► ProgressionStore (catalog copy + UserProgress)
//!                          ├─► ProgressDb       (optional, SQLite)
//!                          └─► Notifier         (fire-and-forget)
//! ```
//!
//! # Usage
//!
//! ```
//! use howtobase::progression::{calculate_level, ProgressionStore};
//!
//! let mut store = ProgressionStore::new();
//! let unlocked = store.complete_achievement("wallet_connected").unwrap();
//! assert_eq!(unlocked.xp(), 100);
//! assert!(store.complete_achievement("wallet_connected").is_none());
//!
//! let info = calculate_level(i64::from(store.progress().total_xp()));
//! assert_eq!(info.title, "Base Beginner");
//! ```

mod db;
mod definitions;
mod levels;
mod manager;
mod store;
mod streaks;

pub use db::ProgressDb;
pub use definitions::{AchievementCategory, AchievementDef, AchievementId, CATALOG};
pub use levels::{calculate_level, Level, LevelInfo, LEVELS};
pub use manager::{
    unlock_notification, CompletionOutcome, GamificationEvent, LevelUp, ProgressionManager,
};
pub use store::{Achievement, ProgressSnapshot, ProgressionStore, UserProgress};
pub use streaks::{today, Streak};
