//! Shared application state.

use crate::registry::ProviderRegistry;

/// Built once in main and shared read-only across request tasks.
pub struct AppState {
    /// Provider registry, fixed at startup
    pub registry: ProviderRegistry,
    /// Shared secret clients must present in `x-api-key`
    pub api_key: String,
    /// Allowed client addresses ("*" disables the gate)
    pub allowed_ips: Vec<String>,
}

impl AppState {
    pub fn new(registry: ProviderRegistry, api_key: String, allowed_ips: Vec<String>) -> Self {
        Self {
            registry,
            api_key,
            allowed_ips,
        }
    }
}
