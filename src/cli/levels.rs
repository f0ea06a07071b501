//! Level table and XP lookup commands

use anyhow::Result;

use howtobase::progression::{calculate_level, AchievementDef, LEVELS};

/// Print the level table
pub fn levels_command() -> Result<()> {
    println!("Levels ({}):\n", LEVELS.len());
    for level in LEVELS {
        println!(
            "  {:>2} {} {:<18} {:>6} XP",
            level.level, level.badge, level.title, level.xp_required
        );
    }
    println!(
        "\n{} achievements worth {} XP in total",
        AchievementDef::total_count(),
        AchievementDef::total_xp()
    );
    Ok(())
}

/// Print the level reached with `xp`
pub fn level_command(xp: i64, json: bool) -> Result<()> {
    let info = calculate_level(xp);
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    if info.is_max_level() {
        println!("{} Level {} - {} (max level)", info.badge, info.level, info.title);
    } else {
        println!(
            "{} Level {} - {} ({:.1}% to next level)",
            info.badge, info.level, info.title, info.progress
        );
    }
    Ok(())
}
