//! Configuration management for quill.
//!
//! This module provides a unified configuration system that separates
//! secrets (from environment variables) from settings (from TOML files).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `QUILL_API_KEY` - shared secret clients must send in `x-api-key`
//! - `NEWAPI_FREE_API_KEY` - free-tier channel key (optional)
//! - `NEWAPI_VIP_API_KEY` - VIP-tier channel key
//!
//! ## Settings (TOML File)
//! Located at `~/.config/quill/config.toml`:
//! ```toml
//! [vertex]
//! project_id = "my-project"
//! location = "us-central1"
//! default_model = "gemini-2.0-flash-exp"
//! key_file = "/etc/quill/service-account.json"
//!
//! [newapi]
//! base_url = "https://api.example.com"
//! default_model = "gpt-4o-mini"
//!
//! [gateway]
//! host = "127.0.0.1"
//! port = 3000
//! allowed_ips = ["*"]
//!
//! [logging]
//! level = "info"
//! ```

mod secrets;
mod settings;

pub use secrets::{Secrets, SecretsError};
pub use settings::{
    GatewaySettings, LoggingSettings, NewApiSettings, Settings, SettingsError, VertexSettings,
};

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Vertex backend is missing required setting: {0}")]
    VertexIncomplete(&'static str),

    #[error("newapi backend has no base_url configured")]
    NewApiBaseUrlMissing,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The gateway shared secret is not set
    /// - The TOML file cannot be read or parsed
    /// - A backend with channel keys configured lacks its settings
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env()?;
        let settings = Settings::load()?;

        let config = Self { secrets, settings };
        config.validate()?;
        Ok(config)
    }

    /// Cross-source validation. Backends that cannot possibly serve a
    /// request should fail here rather than at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vertex_enabled() {
            if self.settings.vertex.location.trim().is_empty() {
                return Err(ConfigError::VertexIncomplete("location"));
            }
            if self.settings.vertex.key_file.trim().is_empty() {
                return Err(ConfigError::VertexIncomplete("key_file"));
            }
        }

        if self.newapi_enabled() && self.settings.newapi.base_url.trim().is_empty() {
            return Err(ConfigError::NewApiBaseUrlMissing);
        }

        Ok(())
    }

    /// Whether the Vertex backend has enough configuration to be built.
    pub fn vertex_enabled(&self) -> bool {
        !self.settings.vertex.project_id.trim().is_empty()
    }

    /// Whether the newapi backend has at least one channel key.
    pub fn newapi_enabled(&self) -> bool {
        self.secrets.newapi_free_key.is_some() || self.secrets.newapi_vip_key.is_some()
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        self.settings.bind_addr()
    }
}

/// Load .env file if it exists (for development convenience).
///
/// This is called automatically by `Config::load()` but is also
/// exported for use in other contexts.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
