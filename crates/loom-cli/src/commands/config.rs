//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use loom_core::Config;

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str = "data_dir, search_url, api_key, max_results, write_policy, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "search_url": config.search_url,
                    "api_key": config.api_key.as_ref().map(|_| "(set)"),
                    "max_results": config.max_results,
                    "write_policy": config.write_policy.to_string(),
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:     {}", config.data_dir.display());
            println!("  search_url:   {}", config.search_url);
            println!(
                "  api_key:      {}",
                if config.api_key.is_some() { "(set)" } else { "(not set)" }
            );
            println!("  max_results:  {}", config.max_results);
            println!("  write_policy: {}", config.write_policy);
            println!(
                "  log_file:     {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "api_key" && !value.is_empty() {
        "(set)"
    } else {
        value.as_str()
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "search_url" => {
            if value.is_empty() {
                bail!("search_url cannot be empty");
            }
            config.search_url = value.to_string();
        }
        "api_key" => {
            config.api_key = optional(value);
        }
        "max_results" => {
            let max: u32 = value
                .parse()
                .context("Invalid value for max_results. Use a number from 1 to 40.")?;
            if !(1..=40).contains(&max) {
                bail!("max_results must be between 1 and 40, got {}", max);
            }
            config.max_results = max;
        }
        "write_policy" => {
            config.write_policy = value
                .parse()
                .context("Invalid value for write_policy. Use 'fail_open' or 'fail_closed'.")?;
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

/// Empty or "none" clears an optional setting
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::WritePolicy;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "write_policy", "fail_closed").unwrap();
        apply(&mut config, "max_results", "10").unwrap();
        apply(&mut config, "api_key", "secret").unwrap();
        apply(&mut config, "log_file", "/tmp/loom.log").unwrap();

        assert_eq!(config.write_policy, WritePolicy::FailClosed);
        assert_eq!(config.max_results, 10);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/loom.log")));

        apply(&mut config, "api_key", "none").unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();

        assert!(apply(&mut config, "max_results", "0").is_err());
        assert!(apply(&mut config, "max_results", "many").is_err());
        assert!(apply(&mut config, "write_policy", "maybe").is_err());
        assert!(apply(&mut config, "search_url", "").is_err());
        assert!(apply(&mut config, "sync_url", "ws://x").is_err());
    }
}
