use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling a language model
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Inference API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("No response from LLM")]
    EmptyResponse,
}

/// A single-turn completion request: one system message, fixed temperature
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Deterministic-leaning request (temperature 0)
    pub fn system(model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature: 0.0,
        }
    }
}

/// Anything that can turn a completion request into raw completion text
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completion endpoint
/// (the Hugging Face inference router by default)
pub struct InferenceClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl InferenceClient {
    /// Create a new inference client
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for InferenceClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionBody {
            model: &request.model,
            temperature: request.temperature,
            messages: vec![ChatMessage {
                role: "system",
                content: &request.system_prompt,
            }],
        };

        tracing::debug!(
            "Requesting completion from {} ({} prompt chars)",
            request.model,
            request.system_prompt.len()
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Inference call to {} failed: {} - {}", request.model, status, body);
            return Err(CompletionError::ApiError { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test_key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "small-model",
                "temperature": 0.0,
                "messages": [{"role": "system", "content": "Extract fields"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"{\"ok\": true}"}}]}"#)
            .create_async()
            .await;

        let client = InferenceClient::new(server.url(), "test_key".to_string(), 5).unwrap();
        let text = client
            .complete(&CompletionRequest::system("small-model", "Extract fields"))
            .await
            .unwrap();

        assert_eq!(text, r#"{"ok": true}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_null_content_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
            .create_async()
            .await;

        let client = InferenceClient::new(server.url(), "k".to_string(), 5).unwrap();
        let err = client
            .complete(&CompletionRequest::system("m", "p"))
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid token")
            .create_async()
            .await;

        let client = InferenceClient::new(format!("{}/", server.url()), "bad".to_string(), 5).unwrap();
        let err = client
            .complete(&CompletionRequest::system("m", "p"))
            .await
            .unwrap_err();

        match err {
            CompletionError::ApiError { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid token");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
