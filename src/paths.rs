//! Where settings, logs and autosaves live.
//!
//! Resolution order for both the config and the data directory:
//! 1. `--config-dir` on the command line
//! 2. `MUSA_CONFIG_DIR` environment variable
//! 3. The current folder, if it already holds a musa file
//! 4. Platform directories from `dirs-next`
//!    - Linux: `~/.config/musa`, `~/.local/share/musa`
//!    - macOS: `~/Library/Application Support/musa`
//!    - Windows: `%APPDATA%\musa`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment override for the config/data directory
pub const CONFIG_DIR_ENV: &str = "MUSA_CONFIG_DIR";

/// Settings file name
pub const SETTINGS_FILE: &str = "musa.json";
/// Default log file name
pub const LOG_FILE: &str = "musa.log";

/// Files whose presence makes the current folder the config home
const LOCAL_MARKERS: &[&str] = &[SETTINGS_FILE, LOG_FILE];

const APP_DIR: &str = "musa";

/// Directory overrides collected at startup.
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom directory (from CLI or ENV), used for config and data alike
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI arg, then `MUSA_CONFIG_DIR`, then none (defaults).
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from));
        Self { config_dir }
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: Some(dir.into()),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.resolve(dirs_next::config_dir())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(dirs_next::data_dir())
    }

    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir().join(name)
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir().join(name)
    }

    /// Create the config and data directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        let config_dir = self.config_dir();
        let data_dir = self.data_dir();

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
        if data_dir != config_dir {
            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        }
        Ok(())
    }

    fn resolve(&self, platform: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = &self.config_dir {
            return dir.clone();
        }
        if let Ok(cwd) = std::env::current_dir()
            && has_local_files(&cwd)
        {
            return cwd;
        }
        platform
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn has_local_files(dir: &Path) -> bool {
    LOCAL_MARKERS.iter().any(|f| dir.join(f).exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_dir_wins() {
        let config = PathConfig::with_dir("/custom");
        assert_eq!(config.config_file("musa.json"), PathBuf::from("/custom/musa.json"));
        assert_eq!(config.data_file("musa.log"), PathBuf::from("/custom/musa.log"));
    }

    #[test]
    fn test_cli_beats_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from/cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn test_local_markers() {
        let dir = std::env::temp_dir().join(format!("musa_paths_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(!has_local_files(&dir));
        std::fs::write(dir.join(SETTINGS_FILE), "{}").unwrap();
        assert!(has_local_files(&dir));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_ensure_dirs_creates_custom_dir() {
        let dir = std::env::temp_dir().join(format!("musa_dirs_{}", uuid::Uuid::new_v4()));
        let config = PathConfig::with_dir(&dir);
        config.ensure_dirs().unwrap();
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
