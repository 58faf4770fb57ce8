//! Provider registry: the fixed key→adapter map built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use quill_core::{ChannelTier, Config, ProviderKey};

use crate::providers::Provider;
use crate::providers::echo::EchoClient;
use crate::providers::newapi::NewApiClient;
use crate::providers::vertex::{VertexBuildError, VertexClient};

/// Read-only after construction; shared freely across request tasks.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKey, Arc<dyn Provider>>,
}

/// Client-input failure when resolving a provider key.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unsupported provider: '{key}'. Use one of: {allowed}")]
    Unsupported { key: String, allowed: String },
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under a key. Later registrations replace
    /// earlier ones; the key set itself is closed by the enum.
    pub fn register(&mut self, key: ProviderKey, provider: Arc<dyn Provider>) {
        self.providers.insert(key, provider);
    }

    /// Resolve a request's provider string, case-insensitively.
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn Provider>, RegistryError> {
        let parsed: ProviderKey = key.parse().map_err(|_| self.unsupported(key))?;
        self.providers
            .get(&parsed)
            .cloned()
            .ok_or_else(|| self.unsupported(key))
    }

    /// Registered keys in display order, for logs and error messages.
    pub fn keys(&self) -> Vec<&'static str> {
        ProviderKey::ALL
            .iter()
            .filter(|key| self.providers.contains_key(*key))
            .map(|key| key.as_str())
            .collect()
    }

    fn unsupported(&self, key: &str) -> RegistryError {
        RegistryError::Unsupported {
            key: key.to_string(),
            allowed: self
                .keys()
                .iter()
                .map(|k| format!("'{k}'"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Build the registry from configuration. Backends without enough
/// configuration are skipped; a vertex backend that is configured but
/// cannot load its credentials aborts startup.
pub fn build_from_config(config: &Config) -> Result<ProviderRegistry, VertexBuildError> {
    let mut registry = ProviderRegistry::new();

    if config.vertex_enabled() {
        let client = VertexClient::new(&config.settings.vertex)?;
        info!(
            "Vertex client created for project '{}' in {} (default model: {})",
            config.settings.vertex.project_id,
            config.settings.vertex.location,
            config.settings.vertex.default_model
        );
        registry.register(ProviderKey::Google, Arc::new(client));
    } else {
        info!("Skipping vertex provider - no project_id configured");
    }

    if config.newapi_enabled() {
        let client = NewApiClient::new(
            config.settings.newapi.base_url.clone(),
            config.settings.newapi.default_model.clone(),
            config.secrets.newapi_key(ChannelTier::Free).map(str::to_string),
            config.secrets.newapi_key(ChannelTier::Vip).map(str::to_string),
        );
        info!(
            "newapi client created for {} (default model: {})",
            config.settings.newapi.base_url, config.settings.newapi.default_model
        );
        registry.register(ProviderKey::NewApi, Arc::new(client));
    } else {
        info!("Skipping newapi provider - no channel key configured");
    }

    registry.register(ProviderKey::OpenAi, Arc::new(EchoClient::new()));

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use quill_core::GenerateRequest;

    #[derive(Debug)]
    struct FakeProvider {
        name: &'static str,
    }

    #[async_trait::async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn default_model(&self) -> &str {
            "fake-model"
        }

        async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
            Ok(request.prompt.clone())
        }

        async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
            Ok(vec!["fake-model".to_string()])
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderKey::Google, Arc::new(FakeProvider { name: "google" }));
        registry.register(ProviderKey::NewApi, Arc::new(FakeProvider { name: "newapi" }));
        registry
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.resolve("Google").unwrap().name(), "google");
        assert_eq!(registry.resolve(" NEWAPI ").unwrap().name(), "newapi");
    }

    #[test]
    fn unknown_key_lists_registered_providers() {
        let registry = registry();
        let err = registry.resolve("baidu").unwrap_err();
        let message = err.to_string();

        assert!(message.contains("baidu"));
        assert!(message.contains("'google'"));
        assert!(message.contains("'newapi'"));
    }

    #[test]
    fn known_key_without_adapter_is_unsupported() {
        let registry = registry();
        // "openai" parses but was not registered here.
        assert!(registry.resolve("openai").is_err());
        assert_eq!(registry.keys(), vec!["google", "newapi"]);
    }
}
