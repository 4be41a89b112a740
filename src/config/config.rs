use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api_client::DEFAULT_TIMEOUT_SECS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub export: ExportConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the analysis service
    pub base_url: String,

    /// Overall request timeout, applied uniformly to every call
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Where exported files land; current directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Colored terminal output
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            export: ExportConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { output_dir: None }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("solar-cli").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Solar CLI Configuration File
# Location: ~/.config/solar-cli/config.toml (Linux/macOS)
#           %APPDATA%\solar-cli\config.toml (Windows)

[api]
# Base URL of the solar site analysis service
# Can be overridden with the SOLAR_API_URL environment variable
base_url = "http://localhost:8000"

# Request timeout in seconds, applied to every call
timeout_secs = 30

[export]
# Directory for exported files (defaults to the current directory)
# output_dir = "/path/to/exports"

[display]
# Colored terminal output
color = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_service() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.export.output_dir.is_none());
        assert!(config.display.color);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://solar.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://solar.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.display.color);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.api.timeout_secs = 5;
        config.export.output_dir = Some(PathBuf::from("/tmp/exports"));

        let serialized = toml::to_string_pretty(&config).unwrap();
        let reloaded: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(reloaded.api.timeout_secs, 5);
        assert_eq!(reloaded.export.output_dir, Some(PathBuf::from("/tmp/exports")));
    }

    #[test]
    fn commented_template_parses() {
        let config: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(config.api.base_url, Config::default().api.base_url);
    }
}
