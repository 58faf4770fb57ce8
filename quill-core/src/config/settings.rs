//! Settings configuration loaded from TOML files.
//!
//! Non-sensitive configuration stored in the XDG config directory
//! (~/.config/quill/config.toml). Secrets stay in the environment.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# quill configuration file
# Located at: ~/.config/quill/config.toml
#
# This file contains non-sensitive configuration.
# Secrets (API keys) are loaded from environment variables:
#   - QUILL_API_KEY        (shared secret clients send in x-api-key)
#   - NEWAPI_FREE_API_KEY  (optional free-tier channel key)
#   - NEWAPI_VIP_API_KEY   (VIP-tier channel key)

[vertex]
project_id = ""
location = "us-central1"
default_model = "gemini-2.0-flash-exp"
key_file = ""
models = ["gemini-2.0-flash-exp", "gemini-1.5-pro", "gemini-1.5-flash"]
# proxy_url = "http://127.0.0.1:7890"

[newapi]
base_url = "https://api.example.com"
default_model = "gpt-4o-mini"

[gateway]
host = "127.0.0.1"
port = 3000
# "*" allows every client address
allowed_ips = ["*"]

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Vertex AI backend configuration
    #[serde(default)]
    pub vertex: VertexSettings,

    /// newapi (OpenAI-compatible) backend configuration
    #[serde(default)]
    pub newapi: NewApiSettings,

    /// Gateway server configuration
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Vertex AI backend settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VertexSettings {
    /// Google Cloud project id
    #[serde(default)]
    pub project_id: String,

    /// Google Cloud region, also selects the gRPC endpoint
    #[serde(default = "default_vertex_location")]
    pub location: String,

    /// Model used when the request carries no override
    #[serde(default = "default_vertex_model")]
    pub default_model: String,

    /// Path to the service-account JSON key file
    #[serde(default)]
    pub key_file: String,

    /// Models advertised by the listing endpoint
    #[serde(default = "default_vertex_models")]
    pub models: Vec<String>,

    /// Optional outbound proxy for the token exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

/// newapi backend settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewApiSettings {
    /// Base URL of the OpenAI-compatible deployment
    #[serde(default)]
    pub base_url: String,

    /// Model used when the request carries no override
    #[serde(default = "default_newapi_model")]
    pub default_model: String,
}

/// Gateway server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Host to bind to
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Client addresses allowed through the IP gate ("*" allows all)
    #[serde(default = "default_allowed_ips")]
    pub allowed_ips: Vec<String>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_vertex_location() -> String {
    "us-central1".to_string()
}

fn default_vertex_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_vertex_models() -> Vec<String> {
    vec![
        "gemini-2.0-flash-exp".to_string(),
        "gemini-1.5-pro".to_string(),
        "gemini-1.5-flash".to_string(),
    ]
}

fn default_newapi_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_allowed_ips() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VertexSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: default_vertex_location(),
            default_model: default_vertex_model(),
            key_file: String::new(),
            models: default_vertex_models(),
            proxy_url: None,
        }
    }
}

impl Default for NewApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_model: default_newapi_model(),
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            allowed_ips: default_allowed_ips(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    /// The file is located at `~/.config/quill/config.toml`.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/quill/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("QUILL_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("quill");

        Ok(config_dir.join("config.toml"))
    }

    /// Create the default configuration file.
    fn create_default_config(path: &PathBuf) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.gateway.host, "127.0.0.1");
        assert_eq!(settings.gateway.port, 3000);
        assert_eq!(settings.gateway.allowed_ips, vec!["*".to_string()]);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.vertex.location, "us-central1");
        assert!(!settings.vertex.models.is_empty());
        assert_eq!(settings.newapi.default_model, "gpt-4o-mini");
    }

    #[test]
    fn test_default_config_template_parses() {
        let settings = Settings::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(settings.bind_addr(), "127.0.0.1:3000");
        assert_eq!(settings.vertex.default_model, "gemini-2.0-flash-exp");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = Settings::from_toml(
            r#"
[vertex]
project_id = "my-project"
key_file = "/etc/quill/sa.json"

[gateway]
port = 8080
"#,
        )
        .unwrap();

        assert_eq!(settings.vertex.project_id, "my-project");
        assert_eq!(settings.vertex.location, "us-central1");
        assert_eq!(settings.gateway.port, 8080);
        assert_eq!(settings.gateway.host, "127.0.0.1");
        assert_eq!(settings.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_load_creates_default_config_file() {
        let dir = tempfile::tempdir().unwrap();
        unsafe { std::env::set_var("QUILL_CONFIG_DIR", dir.path()) };

        let settings = Settings::load().unwrap();

        assert!(dir.path().join("config.toml").exists());
        assert_eq!(settings.gateway.port, 3000);

        unsafe { std::env::remove_var("QUILL_CONFIG_DIR") };
    }

    #[test]
    fn test_roundtrip() {
        let mut settings = Settings::default();
        settings.vertex.project_id = "proj".to_string();
        settings.gateway.allowed_ips = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];

        let toml = settings.to_toml().unwrap();
        let parsed = Settings::from_toml(&toml).unwrap();

        assert_eq!(parsed.vertex.project_id, "proj");
        assert_eq!(parsed.gateway.allowed_ips.len(), 2);
    }
}
