//! OpenAI-compatible aggregator client with free/VIP channel fallback.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use quill_core::{ChannelTier, GenerateRequest};

use crate::normalize::clean;
use crate::prompt::{BuiltPrompt, build_prompt};
use crate::providers::provider::{Provider, ProviderError};

const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(5);

// Some aggregator deployments sit behind Cloudflare and reject the stock
// reqwest User-Agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// newapi client. Owns its transport and both channel keys exclusively.
#[derive(Debug, Clone)]
pub struct NewApiClient {
    http_client: reqwest::Client,
    base_url: String,
    default_model: String,
    free_key: Option<String>,
    vip_key: Option<String>,
}

/// Request body for the Chat Completions API
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

/// Chat-style message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl NewApiClient {
    /// Create a new newapi client.
    pub fn new(
        base_url: impl Into<String>,
        default_model: impl Into<String>,
        free_key: Option<String>,
        vip_key: Option<String>,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            base_url: base_url.into(),
            default_model: default_model.into(),
            free_key,
            vip_key,
        }
    }

    fn key_for(&self, tier: ChannelTier) -> Option<&str> {
        match tier {
            ChannelTier::Free => self.free_key.as_deref(),
            ChannelTier::Vip => self.vip_key.as_deref(),
        }
    }

    fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    fn chat_completions_url(&self) -> String {
        let base = self.normalized_base_url();
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn models_url(&self) -> String {
        let base = self.normalized_base_url();
        if base.ends_with("/v1") {
            format!("{}/models", base)
        } else {
            format!("{}/v1/models", base)
        }
    }

    /// One chat-completion attempt through a single channel key.
    async fn execute_chat(
        &self,
        model: &str,
        prompt: &BuiltPrompt,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let request_body = ChatCompletionsRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .http_client
            .post(self.chat_completions_url())
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(extract_message_content(&body))
    }

    /// Model listing for one channel. Errors and timeouts degrade to an
    /// empty list so one bad channel never fails the union.
    async fn fetch_models(&self, tier: ChannelTier, api_key: &str) -> Vec<String> {
        match tokio::time::timeout(MODEL_LIST_TIMEOUT, self.fetch_models_inner(api_key)).await {
            Ok(Ok(models)) => models,
            Ok(Err(e)) => {
                warn!("{} channel model listing failed: {}", tier, e);
                Vec::new()
            }
            Err(_) => {
                warn!("{} channel model listing timed out", tier);
                Vec::new()
            }
        }
    }

    async fn fetch_models_inner(&self, api_key: &str) -> Result<Vec<String>, ProviderError> {
        let response = self
            .http_client
            .get(self.models_url())
            .bearer_auth(api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        let models = body
            .get("data")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }
}

/// Pull `choices[0].message.content` out of a chat-completion body. An
/// unfamiliar shape degrades to the raw body rather than an error.
fn extract_message_content(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait::async_trait]
impl Provider for NewApiClient {
    fn name(&self) -> &str {
        "newapi"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let model = request.resolved_model(&self.default_model);
        let prompt = build_prompt(&request.prompt, request.output_mode);

        // Free channel first when configured. Any failure here (missing
        // model, bad key, upstream outage) stays internal and routes the
        // request to the VIP channel instead.
        if let Some(free_key) = self.key_for(ChannelTier::Free) {
            match self.execute_chat(model, &prompt, free_key).await {
                Ok(raw) => return Ok(clean(&raw, request.output_mode)),
                Err(e) => {
                    warn!(
                        "free channel could not serve '{}': {} - switching to vip channel",
                        model, e
                    );
                }
            }
        }

        let vip_key = self
            .key_for(ChannelTier::Vip)
            .ok_or(ProviderError::ChannelNotConfigured(ChannelTier::Vip))?;
        let raw = self.execute_chat(model, &prompt, vip_key).await?;
        Ok(clean(&raw, request.output_mode))
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let tiers: Vec<(ChannelTier, &str)> = [ChannelTier::Free, ChannelTier::Vip]
            .into_iter()
            .filter_map(|tier| self.key_for(tier).map(|key| (tier, key)))
            .collect();

        if tiers.is_empty() {
            return Err(ProviderError::ChannelNotConfigured(ChannelTier::Vip));
        }

        // Fan out one listing per channel; each branch has its own timeout
        // so a slow channel never blocks the others.
        let fetches = tiers
            .into_iter()
            .map(|(tier, key)| self.fetch_models(tier, key));
        let results = futures::future::join_all(fetches).await;

        let union: BTreeSet<String> = results.into_iter().flatten().collect();
        if union.is_empty() {
            return Ok(vec![self.default_model.clone()]);
        }

        Ok(union.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::OutputMode;

    fn client_with(server_url: &str, free: Option<&str>, vip: Option<&str>) -> NewApiClient {
        NewApiClient::new(
            server_url,
            "test-model",
            free.map(str::to_string),
            vip.map(str::to_string),
        )
    }

    fn chat_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn chat_completions_url_without_v1_suffix() {
        let client = client_with("http://127.0.0.1:8080/", None, Some("k"));
        assert_eq!(
            client.chat_completions_url(),
            "http://127.0.0.1:8080/v1/chat/completions"
        );
    }

    #[test]
    fn chat_completions_url_with_v1_suffix() {
        let client = client_with("http://127.0.0.1:8080/v1", None, Some("k"));
        assert_eq!(
            client.chat_completions_url(),
            "http://127.0.0.1:8080/v1/chat/completions"
        );
        assert_eq!(client.models_url(), "http://127.0.0.1:8080/v1/models");
    }

    #[test]
    fn extract_message_content_degrades_to_raw_body() {
        let familiar = chat_body("hello");
        assert_eq!(extract_message_content(&familiar), "hello");

        let unfamiliar = r#"{"result":"hello"}"#;
        assert_eq!(extract_message_content(unfamiliar), unfamiliar);

        let not_json = "plain text error page";
        assert_eq!(extract_message_content(not_json), not_json);
    }

    #[tokio::test]
    async fn generate_uses_free_channel_when_it_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-free")
            .with_status(200)
            .with_body(chat_body("<p>free answer</p>"))
            .create_async()
            .await;

        let client = client_with(&server.url(), Some("sk-free"), Some("sk-vip"));
        let request = GenerateRequest::new("topic");
        let content = client.generate(&request).await.unwrap();

        assert_eq!(content, "<p>free answer</p>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_falls_back_to_vip_when_free_fails() {
        let mut server = mockito::Server::new_async().await;
        let free = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-free")
            .with_status(404)
            .with_body("model not available on this plan")
            .create_async()
            .await;
        let vip = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-vip")
            .with_status(200)
            .with_body(chat_body("<p>vip answer</p>"))
            .create_async()
            .await;

        let client = client_with(&server.url(), Some("sk-free"), Some("sk-vip"));
        let request = GenerateRequest::new("topic");
        let content = client.generate(&request).await.unwrap();

        // The free failure is invisible in the result.
        assert_eq!(content, "<p>vip answer</p>");
        free.assert_async().await;
        vip.assert_async().await;
    }

    #[tokio::test]
    async fn generate_skips_free_channel_when_not_configured() {
        let mut server = mockito::Server::new_async().await;
        let vip = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-vip")
            .with_status(200)
            .with_body(chat_body("<p>answer</p>"))
            .expect(1)
            .create_async()
            .await;

        let client = client_with(&server.url(), None, Some("sk-vip"));
        let request = GenerateRequest::new("topic");
        client.generate(&request).await.unwrap();

        vip.assert_async().await;
    }

    #[tokio::test]
    async fn generate_surfaces_vip_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .expect(2)
            .create_async()
            .await;

        let client = client_with(&server.url(), Some("sk-free"), Some("sk-vip"));
        let request = GenerateRequest::new("topic");
        let err = client.generate(&request).await.unwrap_err();

        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("upstream exploded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_without_any_vip_key_is_a_configuration_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("down")
            .create_async()
            .await;

        let client = client_with(&server.url(), Some("sk-free"), None);
        let request = GenerateRequest::new("topic");
        let err = client.generate(&request).await.unwrap_err();

        assert!(matches!(
            err,
            ProviderError::ChannelNotConfigured(ChannelTier::Vip)
        ));
    }

    #[tokio::test]
    async fn generate_sends_model_override() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"model":"gpt-4o"}"#.to_string(),
            ))
            .with_status(200)
            .with_body(chat_body("ok"))
            .create_async()
            .await;

        let client = client_with(&server.url(), None, Some("sk-vip"));
        let mut request = GenerateRequest::new("topic");
        request.model_name = Some("gpt-4o".to_string());
        request.output_mode = OutputMode::PlainText;
        client.generate(&request).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_normalizes_fenced_output() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(chat_body("```html\n<p>Hello</p>\n```"))
            .create_async()
            .await;

        let client = client_with(&server.url(), None, Some("sk-vip"));
        let request = GenerateRequest::new("AI 发展");
        let content = client.generate(&request).await.unwrap();

        assert_eq!(content, "<p>Hello</p>");
    }

    #[tokio::test]
    async fn list_models_unions_and_sorts_across_channels() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-free")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"b"},{"id":"a"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-vip")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"c"},{"id":"b"}]}"#)
            .create_async()
            .await;

        let client = client_with(&server.url(), Some("sk-free"), Some("sk-vip"));
        let models = client.list_models().await.unwrap();

        assert_eq!(models, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn list_models_ignores_a_failing_channel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-free")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;
        server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-vip")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"only"}]}"#)
            .create_async()
            .await;

        let client = client_with(&server.url(), Some("sk-free"), Some("sk-vip"));
        let models = client.list_models().await.unwrap();

        assert_eq!(models, vec!["only"]);
    }

    #[tokio::test]
    async fn list_models_falls_back_to_default_when_union_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/models")
            .with_status(500)
            .with_body("nope")
            .expect(2)
            .create_async()
            .await;

        let client = client_with(&server.url(), Some("sk-free"), Some("sk-vip"));
        let models = client.list_models().await.unwrap();

        assert_eq!(models, vec!["test-model"]);
    }
}
