//! HowToBase Academy - gamified progression for Base builder tutorials
//!
//! Learners unlock achievements as they connect wallets, send transactions,
//! swap, mint and so on. Each achievement awards XP once; XP maps onto a
//! ten-level table with titles and badges.
//!
//! ## Layers
//!
//! 1. **Engine** ([`progression`]): catalog, levels, per-session store,
//!    streaks. Pure and synchronous.
//! 2. **Service** ([`server`]): HTTP API with one mutex per session, optional
//!    SQLite persistence, unlock notifications ([`notify`]), and relays to the
//!    paymaster and spend-permission services ([`relay`]).

pub mod config;
pub mod notify;
pub mod progression;
pub mod relay;
pub mod server;

pub use progression::{
    calculate_level, Achievement, AchievementCategory, LevelInfo, ProgressionStore, UserProgress,
};
