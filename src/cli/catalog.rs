//! Catalog command implementation

use anyhow::Result;

use howtobase::progression::{AchievementCategory, ProgressionStore};

/// List achievements, optionally limited to one category
pub fn catalog_command(category: Option<String>, json: bool) -> Result<()> {
    let store = ProgressionStore::new();

    let categories: Vec<AchievementCategory> = match category.as_deref() {
        Some(name) => match AchievementCategory::parse(name) {
            Some(c) => vec![c],
            None => {
                eprintln!("Unknown category: {}", name);
                Vec::new()
            }
        },
        None => AchievementCategory::all().to_vec(),
    };

    if json {
        let achievements: Vec<_> = categories
            .iter()
            .flat_map(|c| store.achievements_by_category(*c))
            .collect();
        println!("{}", serde_json::to_string_pretty(&achievements)?);
        return Ok(());
    }

    for category in categories {
        println!("{} {}", category.icon(), category.label());
        for achievement in store.achievements_by_category(category) {
            println!(
                "  {} {:<22} {:>5} XP  {}",
                achievement.icon(),
                achievement.id().as_str(),
                achievement.xp(),
                achievement.description()
            );
        }
        println!();
    }

    Ok(())
}
