//! Configuration file I/O operations

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.howtobase/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".howtobase")
    }

    /// Get the global config file path (~/.howtobase/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration and apply environment overrides.
    ///
    /// An explicit path must exist. Without one, the global config is used if
    /// present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let global_path = Self::global_config_path();
                if global_path.exists() {
                    Self::from_file(&global_path)?
                } else {
                    tracing::debug!(
                        "No config at {}, using defaults",
                        global_path.display()
                    );
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Write the config to `path` unless a file already exists there.
    ///
    /// Returns false (and leaves the file alone) when it exists and `force`
    /// is off. The existence check happens under the same lock as the write.
    pub fn create_file(&self, path: &Path, force: bool) -> Result<bool> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let _lock = ConfigLock::acquire(path)?;

        if !force && path.exists() {
            return Ok(false);
        }

        write_atomic(path, content.as_bytes())?;
        Ok(true)
    }
}

/// Exclusive advisory lock on `<config>.lock`, released on drop
struct ConfigLock(std::fs::File);

impl ConfigLock {
    fn acquire(config_path: &Path) -> Result<Self> {
        let lock_path = config_path.with_extension("toml.lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", lock_path.display()))?;
        Ok(Self(file))
    }
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

/// Write through a synced temp file, then rename over `path`
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("toml.tmp");
    let mut temp = std::fs::File::create(&temp_path)
        .with_context(|| format!("Failed to create {}", temp_path.display()))?;
    temp.write_all(content)
        .and_then(|_| temp.sync_all())
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))
}
