//! Provider trait for abstracting the generation backends.

use quill_core::{ChannelTier, GenerateRequest};

/// Provider error types.
///
/// Anything of this type is terminal for the request: the free-tier
/// fallback inside the newapi adapter is resolved before an error ever
/// crosses this boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Google API error: {message} (code: {code})")]
    Rpc { code: String, message: String },
    #[error("{0} channel key is not configured")]
    ChannelNotConfigured(ChannelTier),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("No content in response")]
    NoContent,
}

/// Provider trait for the generation backends behind the gateway.
#[async_trait::async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Registry key this adapter serves.
    fn name(&self) -> &str;

    /// Model used when a request carries no override.
    fn default_model(&self) -> &str;

    /// Generate content for a request. The returned text is already
    /// normalized for the request's output mode.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError>;

    /// Model identifiers this backend can serve, deduplicated and sorted.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;
}
