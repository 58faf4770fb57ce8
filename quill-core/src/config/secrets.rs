//! Secrets configuration loaded from environment variables only.
//!
//! API keys never live in the settings file; they are read from the
//! process environment (with `.env` loaded first for development).

use std::env;

use crate::request::ChannelTier;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Shared secret clients must present in `x-api-key` (env: QUILL_API_KEY)
    pub gateway_api_key: String,

    /// Free-tier key for the newapi channel (env: NEWAPI_FREE_API_KEY)
    pub newapi_free_key: Option<String>,

    /// VIP-tier key for the newapi channel (env: NEWAPI_VIP_API_KEY)
    pub newapi_vip_key: Option<String>,
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("QUILL_API_KEY is not set; the gateway cannot authenticate clients")]
    GatewayKeyMissing,
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// Loads `.env` first if present (development convenience); production
    /// should rely on real environment variables.
    pub fn from_env() -> Result<Self, SecretsError> {
        let _ = dotenvy::dotenv();

        Self::from_env_inner()
    }

    /// Internal method to load from environment without loading .env
    pub(crate) fn from_env_inner() -> Result<Self, SecretsError> {
        let gateway_api_key = env::var("QUILL_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SecretsError::GatewayKeyMissing)?;

        Ok(Self {
            gateway_api_key,
            newapi_free_key: non_empty(env::var("NEWAPI_FREE_API_KEY").ok()),
            newapi_vip_key: non_empty(env::var("NEWAPI_VIP_API_KEY").ok()),
        })
    }

    /// The key configured for a newapi channel tier, if any.
    pub fn newapi_key(&self, tier: ChannelTier) -> Option<&str> {
        match tier {
            ChannelTier::Free => self.newapi_free_key.as_deref(),
            ChannelTier::Vip => self.newapi_vip_key.as_deref(),
        }
    }

    /// Tiers that actually have a key configured.
    pub fn configured_tiers(&self) -> Vec<ChannelTier> {
        let mut tiers = Vec::new();
        if self.newapi_free_key.is_some() {
            tiers.push(ChannelTier::Free);
        }
        if self.newapi_vip_key.is_some() {
            tiers.push(ChannelTier::Vip);
        }
        tiers
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
