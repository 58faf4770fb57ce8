//! Echo stub backend, the placeholder third registry variant.

use quill_core::GenerateRequest;

use crate::normalize::clean;
use crate::providers::provider::{Provider, ProviderError};

const ECHO_MODEL: &str = "echo-1";

/// Stub adapter registered under the "openai" key. Performs no I/O.
#[derive(Debug, Default, Clone)]
pub struct EchoClient;

impl EchoClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Provider for EchoClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        ECHO_MODEL
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let reply = format!("OpenAI reply: {}", request.prompt);
        Ok(clean(&reply, request.output_mode))
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec![ECHO_MODEL.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::OutputMode;

    #[tokio::test]
    async fn echoes_the_prompt() {
        let client = EchoClient::new();
        let mut request = GenerateRequest::new("ping");
        request.output_mode = OutputMode::PlainText;

        let content = client.generate(&request).await.unwrap();
        assert_eq!(content, "OpenAI reply: ping");
    }

    #[tokio::test]
    async fn html_mode_output_is_wrapped() {
        let client = EchoClient::new();
        let request = GenerateRequest::new("ping");

        let content = client.generate(&request).await.unwrap();
        assert_eq!(
            content,
            "<div class=\"generated-article\"><p>OpenAI reply: ping</p></div>"
        );
    }
}
