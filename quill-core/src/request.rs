//! Shared request types exchanged between the HTTP surface and the
//! provider adapters.

use serde::{Deserialize, Serialize};

/// Markup contract requested for the generated content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Clean single-line HTML (default).
    #[default]
    Html,
    /// Raw model text with fences stripped, newlines preserved.
    PlainText,
}

impl OutputMode {
    pub fn is_html(self) -> bool {
        matches!(self, OutputMode::Html)
    }
}

/// Backend selector. The key set is fixed at compile time; lookups are
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKey {
    /// Vertex AI (gRPC).
    Google,
    /// OpenAI-compatible aggregator with free/VIP channel fallback.
    NewApi,
    /// Echo stub.
    OpenAi,
}

impl ProviderKey {
    /// Every registered key, in the order shown in error messages.
    pub const ALL: [ProviderKey; 3] = [ProviderKey::Google, ProviderKey::NewApi, ProviderKey::OpenAi];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKey::Google => "google",
            ProviderKey::NewApi => "newapi",
            ProviderKey::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKey::Google),
            "newapi" | "new_api" | "new-api" => Ok(ProviderKey::NewApi),
            "openai" | "open_ai" => Ok(ProviderKey::OpenAi),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Credential tier within the chat-completion adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTier {
    /// Low-cost channel, tried first when configured.
    Free,
    /// Premium channel, the fallback of last resort.
    Vip,
}

impl ChannelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelTier::Free => "free",
            ChannelTier::Vip => "vip",
        }
    }
}

impl std::fmt::Display for ChannelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single content-generation request. Immutable once deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Topic or instruction for the backend. Must be non-empty after trim;
    /// the gateway handler enforces that.
    pub prompt: String,

    /// Explicit model override. When absent the adapter's configured
    /// default is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    /// Requested markup contract for the response content.
    #[serde(default)]
    pub output_mode: OutputMode,

    /// Backend selector, matched case-insensitively against the registry.
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    ProviderKey::Google.as_str().to_string()
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model_name: None,
            output_mode: OutputMode::default(),
            provider: default_provider(),
        }
    }

    /// The model to request from the backend: explicit override wins,
    /// otherwise the supplied default.
    pub fn resolved_model<'a>(&'a self, default: &'a str) -> &'a str {
        match self.model_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn provider_key_parse_is_case_insensitive() {
        assert_eq!(ProviderKey::from_str("Google").unwrap(), ProviderKey::Google);
        assert_eq!(ProviderKey::from_str("  NEWAPI ").unwrap(), ProviderKey::NewApi);
        assert_eq!(ProviderKey::from_str("OpenAI").unwrap(), ProviderKey::OpenAi);
    }

    #[test]
    fn provider_key_rejects_unknown() {
        let err = ProviderKey::from_str("baidu").unwrap_err();
        assert!(err.contains("baidu"));
    }

    #[test]
    fn output_mode_defaults_to_html() {
        let request: GenerateRequest = serde_json::from_str(r#"{"prompt":"hi"}"#).unwrap();
        assert_eq!(request.output_mode, OutputMode::Html);
        assert_eq!(request.provider, "google");
        assert!(request.model_name.is_none());
    }

    #[test]
    fn output_mode_wire_names() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"prompt":"hi","output_mode":"plain-text"}"#).unwrap();
        assert_eq!(request.output_mode, OutputMode::PlainText);
        assert!(!request.output_mode.is_html());
    }

    #[test]
    fn resolved_model_prefers_override() {
        let mut request = GenerateRequest::new("hi");
        assert_eq!(request.resolved_model("base-model"), "base-model");

        request.model_name = Some("fancy-model".to_string());
        assert_eq!(request.resolved_model("base-model"), "fancy-model");

        // A blank override falls back to the default.
        request.model_name = Some("   ".to_string());
        assert_eq!(request.resolved_model("base-model"), "base-model");
    }
}
