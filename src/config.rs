//! Runtime configuration, read once at startup from
//! `~/.rosterline/config.json` with an env-var escape hatch for the
//! store URL.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Env var that overrides `apiUrl` from the config file.
pub const API_URL_ENV: &str = "ROSTERLINE_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Endpoint of the sheet-backed store (the apps-script exec URL).
    pub api_url: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
    /// Start the background refresh poller on boot.
    #[serde(default = "default_poll_on_start")]
    pub poll_on_start: bool,
}

fn default_listen_port() -> u16 {
    8750
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_on_start() -> bool {
    true
}

/// Canonical config file path (`~/.rosterline/config.json`).
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".rosterline").join("config.json"))
}

/// Load configuration. The config file is optional when the store URL
/// comes from the environment.
pub fn load_config() -> Result<Config, String> {
    let path = config_path()?;

    let mut config = if path.exists() {
        let content =
            fs::read_to_string(&path).map_err(|e| format!("Failed to read config: {}", e))?;
        serde_json::from_str::<Config>(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?
    } else {
        Config {
            api_url: String::new(),
            listen_port: default_listen_port(),
            poll_interval_minutes: default_poll_interval(),
            poll_on_start: default_poll_on_start(),
        }
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.api_url = url.trim().to_string();
        }
    }

    if config.api_url.is_empty() {
        return Err(format!(
            "No store URL configured. Set {} or create {} with: {{ \"apiUrl\": \"https://...\" }}",
            API_URL_ENV,
            path.display()
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"apiUrl":"https://sheets.example/exec"}"#).unwrap();
        assert_eq!(config.listen_port, 8750);
        assert_eq!(config.poll_interval_minutes, 5);
        assert!(config.poll_on_start);
    }

    #[test]
    fn test_full_config_round_trips() {
        let config = Config {
            api_url: "https://sheets.example/exec".to_string(),
            listen_port: 9000,
            poll_interval_minutes: 10,
            poll_on_start: false,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.listen_port, 9000);
        assert_eq!(back.poll_interval_minutes, 10);
        assert!(!back.poll_on_start);
    }
}
