//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/accord/config.toml)
//! 3. Environment variables (ACCORD_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sync::SessionConfig;

/// Environment variable prefix
const ENV_PREFIX: &str = "ACCORD";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Quiet period after the last edit before autosave writes, in ms
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Echo grace window after a write resolves, in ms
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Log file path (optional)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            settle_ms: default_settle_ms(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (ACCORD_DEBOUNCE_MS, ACCORD_SETTLE_MS)
    /// 2. Config file (~/.config/accord/config.toml or ACCORD_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DEBOUNCE_MS", ENV_PREFIX)) {
            if let Ok(ms) = val.parse() {
                self.debounce_ms = ms;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_SETTLE_MS", ENV_PREFIX)) {
            if let Ok(ms) = val.parse() {
                self.settle_ms = ms;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with ACCORD_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("accord")
            .join("config.toml")
    }

    /// Autosave debounce delay
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Echo grace window
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Timing knobs for a sync session
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            debounce: self.debounce(),
            settle: self.settle(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_settle_ms() -> u64 {
    1500
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &["ACCORD_DEBOUNCE_MS", "ACCORD_SETTLE_MS", "ACCORD_LOG_FILE"];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.debounce_ms, 2000);
        assert_eq!(config.settle_ms, 1500);
        assert!(config.log_file.is_none());
        assert_eq!(config.debounce(), Duration::from_secs(2));
    }

    #[test]
    fn test_env_override_debounce() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ACCORD_DEBOUNCE_MS", "500");
        config.apply_env_overrides();

        assert_eq!(config.debounce_ms, 500);
    }

    #[test]
    fn test_env_override_ignores_garbage() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ACCORD_DEBOUNCE_MS", "not-a-number");
        config.apply_env_overrides();

        assert_eq!(config.debounce_ms, 2000);
    }

    #[test]
    fn test_env_override_log_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ACCORD_LOG_FILE", "/tmp/accord.log");
        config.apply_env_overrides();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/accord.log")));

        // Empty string clears it
        env::set_var("ACCORD_LOG_FILE", "");
        config.apply_env_overrides();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            debounce_ms = 1000
            settle_ms = 250
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.debounce_ms, 1000);
        assert_eq!(config.settle_ms, 250);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert_eq!(config.debounce_ms, 2000);
    }

    #[test]
    fn test_load_from_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "debounce_ms = 750\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.debounce_ms, 750);
        assert_eq!(config.settle_ms, 1500);
    }

    #[test]
    fn test_session_config_conversion() {
        let config = Config {
            debounce_ms: 100,
            settle_ms: 50,
            log_file: None,
        };
        let session = config.session_config();
        assert_eq!(session.debounce, Duration::from_millis(100));
        assert_eq!(session.settle, Duration::from_millis(50));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            debounce_ms: 1234,
            settle_ms: 456,
            log_file: Some(PathBuf::from("/var/log/accord.log")),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.debounce_ms, config.debounce_ms);
        assert_eq!(parsed.settle_ms, config.settle_ms);
        assert_eq!(parsed.log_file, config.log_file);
    }
}
