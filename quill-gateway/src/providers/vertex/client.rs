//! Vertex AI PredictionService client (gRPC).

use std::time::Duration;

use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, ClientTlsConfig};

use quill_core::GenerateRequest;
use quill_core::config::VertexSettings;

use crate::normalize::clean;
use crate::providers::provider::{Provider, ProviderError};
use crate::providers::vertex::auth::{CredentialsError, ServiceAccountKey, TokenProvider};
use crate::providers::vertex::proto::google::cloud::aiplatform::v1 as aiplatform;
use crate::providers::vertex::proto::google::cloud::aiplatform::v1::prediction_service_client::PredictionServiceClient;

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: i32 = 8000;
// Long-form generation can take minutes.
const CALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Vertex AI client. One synchronous generate call per request; failures
/// surface immediately, never retried.
#[derive(Debug)]
pub struct VertexClient {
    grpc: PredictionServiceClient<Channel>,
    tokens: TokenProvider,
    project_id: String,
    location: String,
    default_model: String,
    models: Vec<String>,
}

/// Construction-time failures. All of these are fatal for the process:
/// a vertex backend that cannot authenticate should not be registered.
#[derive(Debug, thiserror::Error)]
pub enum VertexBuildError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Invalid Vertex endpoint {0}")]
    Endpoint(String),

    #[error("Failed to configure Vertex transport: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Failed to build token exchange HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl VertexClient {
    /// Create a new Vertex client.
    ///
    /// Loads the service-account key file immediately; a missing or
    /// malformed file is a construction error, not a per-request one.
    pub fn new(settings: &VertexSettings) -> Result<Self, VertexBuildError> {
        let key = ServiceAccountKey::from_file(&settings.key_file)?;

        // The token exchange goes over plain HTTPS; the optional proxy
        // applies there. The gRPC channel connects directly.
        let mut http = reqwest::Client::builder();
        if let Some(proxy_url) = &settings.proxy_url {
            tracing::info!("Vertex token exchange using proxy: {}", proxy_url);
            http = http.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        let http = http.build()?;

        let endpoint = format!("https://{}-aiplatform.googleapis.com", settings.location);
        let channel = Channel::from_shared(endpoint.clone())
            .map_err(|e| VertexBuildError::Endpoint(format!("{endpoint}: {e}")))?
            .tls_config(ClientTlsConfig::new().with_native_roots())?
            .timeout(CALL_TIMEOUT)
            .connect_lazy();

        Ok(Self {
            grpc: PredictionServiceClient::new(channel),
            tokens: TokenProvider::new(key, http),
            project_id: settings.project_id.clone(),
            location: settings.location.clone(),
            default_model: settings.default_model.clone(),
            models: settings.models.clone(),
        })
    }

    fn model_resource_name(&self, model: &str) -> String {
        publisher_model_path(&self.project_id, &self.location, model)
    }
}

/// Fully qualified publisher model resource path.
fn publisher_model_path(project_id: &str, location: &str, model: &str) -> String {
    format!("projects/{project_id}/locations/{location}/publishers/google/models/{model}")
}

#[async_trait::async_trait]
impl Provider for VertexClient {
    fn name(&self) -> &str {
        "google"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let model = request.resolved_model(&self.default_model);

        let grpc_request = aiplatform::GenerateContentRequest {
            model: self.model_resource_name(model),
            contents: vec![aiplatform::Content {
                role: "user".to_string(),
                parts: vec![aiplatform::Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: Some(aiplatform::GenerationConfig {
                temperature: Some(TEMPERATURE),
                max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            }),
        };

        let token = self.tokens.token().await?;
        let bearer: MetadataValue<_> = format!("Bearer {token}")
            .parse()
            .map_err(|_| ProviderError::Auth("access token is not a valid header value".to_string()))?;

        let mut call = tonic::Request::new(grpc_request);
        call.metadata_mut().insert("authorization", bearer);

        let response = self
            .grpc
            .clone()
            .generate_content(call)
            .await
            .map_err(|status| ProviderError::Rpc {
                code: format!("{:?}", status.code()),
                message: status.message().to_string(),
            })?
            .into_inner();

        // All text parts of the first candidate, in order.
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::NoContent);
        }

        Ok(clean(&text, request.output_mode))
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.models.clone())
    }
}
