//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/loom/config.toml)
//! 3. Environment variables (LOOM_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::collection::WritePolicy;

/// Environment variable prefix
const ENV_PREFIX: &str = "LOOM";

/// Google Books volumes endpoint
pub const DEFAULT_SEARCH_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Results requested per catalog search
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the persisted collections
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Catalog search endpoint
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// API key appended to catalog requests (optional)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum results per search
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// What a collection does when a durable write fails
    #[serde(default)]
    pub write_policy: WritePolicy,

    /// Log file path (stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            search_url: default_search_url(),
            api_key: None,
            max_results: DEFAULT_MAX_RESULTS,
            write_policy: WritePolicy::default(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (LOOM_DATA_DIR, LOOM_SEARCH_URL, ...)
    /// 2. Config file (~/.config/loom/config.toml or LOOM_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path from the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_SEARCH_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.search_url = val;
            }
        }

        // Empty string clears the key
        if let Ok(val) = std::env::var(format!("{}_API_KEY", ENV_PREFIX)) {
            self.api_key = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_WRITE_POLICY", ENV_PREFIX)) {
            self.write_policy = val
                .parse()
                .with_context(|| format!("Invalid {}_WRITE_POLICY", ENV_PREFIX))?;
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with LOOM_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("loom")
            .join("config.toml")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loom")
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
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

    const ENV_VARS: &[&str] = &[
        "LOOM_DATA_DIR",
        "LOOM_SEARCH_URL",
        "LOOM_API_KEY",
        "LOOM_WRITE_POLICY",
        "LOOM_LOG_FILE",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data_dir.ends_with("loom"));
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.max_results, 20);
        assert_eq!(config.write_policy, WritePolicy::FailOpen);
        assert!(config.api_key.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LOOM_DATA_DIR", "/tmp/loom-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/loom-test"));
    }

    #[test]
    fn test_env_override_write_policy() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LOOM_WRITE_POLICY", "fail_closed");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.write_policy, WritePolicy::FailClosed);

        env::set_var("LOOM_WRITE_POLICY", "sometimes");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_env_override_api_key() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LOOM_API_KEY", "secret");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.api_key, Some("secret".to_string()));

        // Empty string clears it
        env::set_var("LOOM_API_KEY", "");
        config.apply_env_overrides().unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/loom"),
            search_url: "http://localhost:8080/volumes".to_string(),
            api_key: Some("k".to_string()),
            max_results: 5,
            write_policy: WritePolicy::FailClosed,
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("write_policy = \"fail_closed\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.search_url, config.search_url);
        assert_eq!(parsed.max_results, 5);
        assert_eq!(parsed.write_policy, WritePolicy::FailClosed);
    }

    #[test]
    fn test_load_from_str_fills_defaults() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(r#"data_dir = "/custom/data""#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.write_policy, WritePolicy::FailOpen);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        env::set_var("LOOM_DATA_DIR", &data_dir);

        let config = Config::load_from_path(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.data_dir, data_dir);
        // Data directory is created on load
        assert!(data_dir.exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            max_results: 7,
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.max_results, 7);
        assert_eq!(loaded.data_dir, temp_dir.path().join("data"));
    }
}
