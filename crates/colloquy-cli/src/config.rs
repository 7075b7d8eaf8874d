//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for colloquy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Answer service base URL
    pub endpoint: Option<String>,
    /// History service base URL (defaults to the answer endpoint)
    pub history_endpoint: Option<String>,
    /// Bearer token forwarded to both services
    pub token: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("colloquy")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for COLLOQUY_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("COLLOQUY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        let dir = path.parent().unwrap();
        fs::create_dir_all(dir)?;

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            endpoint: Some("https://chat.example.com/api".to_string()),
            history_endpoint: None,
            token: None,
        };

        default_config.save()?;
        Ok(path)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# colloquy configuration file
# Place at ~/.config/colloquy/config.toml (Linux/Mac) or %APPDATA%\colloquy\config.toml (Windows)

# Answer service base URL
endpoint = "https://chat.example.com/api"

# History service base URL (optional - defaults to the answer endpoint)
# history_endpoint = "https://chat.example.com/api"

# Bearer token forwarded to both services (optional)
# Acquire and refresh it with your identity provider's tooling
# token = "eyJ..."
"#
}
