pub mod config;
pub mod request;

pub use config::{Config, ConfigError, Secrets, SecretsError, Settings, SettingsError, load_dotenv};
pub use request::{ChannelTier, GenerateRequest, OutputMode, ProviderKey};
