//! Simulate command: replay completions against a fresh session

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use howtobase::notify::LogNotifier;
use howtobase::progression::{GamificationEvent, ProgressionManager};

pub fn simulate_command(ids: &[String], json: bool) -> Result<()> {
    let mut manager = ProgressionManager::new("simulation", Arc::new(LogNotifier));
    let mut events = Vec::new();

    for id in ids {
        let outcome = manager.complete(id)?;
        if outcome.unlocked.is_none() && !json {
            println!("  - {} (no unlock)", id);
        }
        events.extend(outcome.events);
    }

    if json {
        let report = json!({ "events": events, "progress": manager.snapshot() });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for event in &events {
        match event {
            GamificationEvent::AchievementUnlocked { achievement } => {
                println!("  {} {} unlocked", achievement.icon(), achievement.title());
            }
            GamificationEvent::XpAwarded { amount, total_xp, .. } => {
                println!("    +{} XP (total {})", amount, total_xp);
            }
            GamificationEvent::LevelUp(level_up) => {
                println!(
                    "  {} Level up! {} -> {} ({})",
                    level_up.badge, level_up.old_level, level_up.new_level, level_up.new_title
                );
            }
            GamificationEvent::StreakExtended { count, .. } => {
                println!("  Streak: {} days", count);
            }
        }
    }

    let snapshot = manager.snapshot();
    let to_next = if snapshot.level.is_max_level() {
        "max level".to_string()
    } else {
        format!("{:.1}% to next level", snapshot.level.progress)
    };
    println!(
        "\n{} Level {} - {} | {} XP | {}/{} complete | {}",
        snapshot.level.badge,
        snapshot.level.level,
        snapshot.level.title,
        snapshot.total_xp,
        snapshot.completed_count,
        snapshot.total_count,
        to_next
    );
    Ok(())
}
