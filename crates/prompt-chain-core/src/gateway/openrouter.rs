//! OpenRouter (OpenAI-compatible) chat-completion gateway.
//!
//! One user message per call, no system prompt, no retries. The bearer credential, endpoint
//! and model come from [`ChainConfig`] at construction time; nothing is read from the
//! environment here.

use super::{GatewayError, ModelGateway};
use crate::config::{ChainConfig, ConfigError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

pub struct OpenRouterGateway {
    api_key: String,
    api_url: String,
    model: String,
    app_title: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OpenRouterGateway {
    /// Build a gateway from explicit configuration. Fails when no API key is configured or
    /// the HTTP client cannot be built with the configured timeout.
    pub fn new(config: &ChainConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            app_title: config.app_title.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    /// Override the model (e.g. `meta-llama/llama-3.3-70b-instruct`).
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Pull `choices[0].message.content` out of a raw response body.
fn extract_content(body: &str) -> Result<String, GatewayError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedEnvelope(format!("response is not JSON: {}", e)))?;
    parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            GatewayError::MalformedEnvelope("missing choices[0].message.content".to_string())
        })
}

#[async_trait]
impl ModelGateway for OpenRouterGateway {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        if prompt.trim().is_empty() {
            return Err(GatewayError::EmptyPrompt);
        }

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("X-Title", &self.app_title)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Transport(format!("request timed out: {}", e))
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "completion service error body: {}", body);
            return Err(match status.as_u16() {
                401 | 403 => GatewayError::AuthFailure {
                    status: status.as_u16(),
                    body,
                },
                code => GatewayError::NonSuccessStatus { status: code, body },
            });
        }

        let text = res
            .text()
            .await
            .map_err(|e| GatewayError::Transport(format!("reading response body: {}", e)))?;
        extract_content(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_content_trims_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Card Services\n"}},{"message":{"content":"ignored"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Card Services");
    }

    #[test]
    fn extract_content_rejects_missing_fields() {
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            "<html>bad gateway</html>",
        ] {
            let err = extract_content(body).unwrap_err();
            assert!(
                matches!(err, GatewayError::MalformedEnvelope(_)),
                "{} -> {:?}",
                body,
                err
            );
        }
    }

    #[test]
    fn request_body_matches_chat_completion_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: None,
            max_tokens: Some(64),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 64
            })
        );
    }

    #[test]
    fn new_requires_api_key() {
        let config = ChainConfig::default();
        assert!(matches!(
            OpenRouterGateway::new(&config),
            Err(ConfigError::MissingApiKey)
        ));
        let gw = OpenRouterGateway::new(&config.with_api_key("sk-test")).unwrap();
        assert_eq!(gw.model(), crate::config::DEFAULT_MODEL);
    }
}
