//! Init command implementation

use std::path::PathBuf;

use anyhow::{bail, Result};

use howtobase::config::Config;

/// Write a default configuration file
pub fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if !Config::default().create_file(&config_path, force)? {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    println!("Created: {}", config_path.display());
    println!(
        "Secrets belong in the environment: {}, {}",
        howtobase::config::ENV_PAYMASTER_API_KEY,
        howtobase::config::ENV_PAYMASTER_URL
    );

    Ok(())
}
