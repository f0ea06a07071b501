//! XP and Level system
//!
//! Defines level thresholds, titles and badges, and maps an XP total to the
//! level a learner has reached.

use serde::Serialize;

/// Level definition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub level: u32,
    pub xp_required: u32,
    pub title: &'static str,
    pub badge: &'static str,
}

/// All level definitions (sorted by level, thresholds strictly increasing)
pub static LEVELS: &[Level] = &[
    Level {
        level: 1,
        xp_required: 0,
        title: "Base Beginner",
        badge: "🌱",
    },
    Level {
        level: 2,
        xp_required: 500,
        title: "Chain Explorer",
        badge: "🔍",
    },
    Level {
        level: 3,
        xp_required: 1200,
        title: "DeFi Discoverer",
        badge: "💎",
    },
    Level {
        level: 4,
        xp_required: 2000,
        title: "NFT Enthusiast",
        badge: "🎨",
    },
    Level {
        level: 5,
        xp_required: 3000,
        title: "Swap Specialist",
        badge: "🔄",
    },
    Level {
        level: 6,
        xp_required: 4500,
        title: "Base Builder",
        badge: "🏗️",
    },
    Level {
        level: 7,
        xp_required: 6500,
        title: "Chain Master",
        badge: "⚡",
    },
    Level {
        level: 8,
        xp_required: 9000,
        title: "Base Legend",
        badge: "🌟",
    },
    Level {
        level: 9,
        xp_required: 12000,
        title: "Ecosystem Expert",
        badge: "🌐",
    },
    Level {
        level: 10,
        xp_required: 16000,
        title: "Base God",
        badge: "🔥",
    },
];

impl Level {
    /// Highest level whose threshold is not exceeded by `xp`
    pub fn for_xp(xp: u32) -> &'static Level {
        LEVELS
            .iter()
            .rev()
            .find(|l| xp >= l.xp_required)
            .unwrap_or(&LEVELS[0])
    }

    /// The level after this one (None at max level)
    pub fn next(&self) -> Option<&'static Level> {
        LEVELS.iter().find(|l| l.level == self.level + 1)
    }

    pub fn max_level() -> u32 {
        LEVELS.last().map(|l| l.level).unwrap_or(1)
    }
}

/// Display-ready level information for an XP total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: u32,
    pub title: &'static str,
    pub badge: &'static str,
    /// Percentage towards the next level, 0.0 - 100.0
    pub progress: f64,
}

impl LevelInfo {
    pub fn is_max_level(&self) -> bool {
        self.level == Level::max_level()
    }
}

/// Calculate level, title, badge and progress for an XP total.
///
/// Negative totals are clamped to 0 (level 1, no progress). Totals at or past
/// the last threshold are pinned to the max level with 100% progress.
pub fn calculate_level(total_xp: i64) -> LevelInfo {
    let xp = total_xp.clamp(0, i64::from(u32::MAX)) as u32;
    let current = Level::for_xp(xp);

    let progress = match current.next() {
        Some(next) => {
            let span = f64::from(next.xp_required - current.xp_required);
            let into = f64::from(xp - current.xp_required);
            (into / span * 100.0).clamp(0.0, 100.0)
        }
        None => 100.0,
    };

    LevelInfo {
        level: current.level,
        title: current.title,
        badge: current.badge,
        progress,
    }
}
