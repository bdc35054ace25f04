//! OpenAI chat completion client implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::llm::{ChatMessage, LanguageModel};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI chat completion client
#[derive(Debug)]
pub struct OpenAiChatClient<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl<C: HttpClientTrait> OpenAiChatClient<C> {
    /// Create a new client
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_OPENAI_BASE_URL)
    }

    /// Create a new client with a custom base URL
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.0,
        }
    }

    /// Override the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<String, DomainError> {
        let response: OpenAiChatResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::language_model(format!("failed to parse completion response: {e}"))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| DomainError::language_model("completion response had no choices"))
    }
}

#[async_trait]
impl<C: HttpClientTrait> LanguageModel for OpenAiChatClient<C> {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, DomainError> {
        let url = self.chat_completions_url();
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| DomainError::language_model(e.to_string()))?;

        self.parse_response(response)
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/chat/completions";

    fn completion_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
        })
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let client =
            MockHttpClient::new().with_response(TEST_URL, completion_response("Our hours are 9-5."));
        let chat = OpenAiChatClient::new(client, "test-key", "gpt-3.5-turbo");

        let reply = chat
            .complete(&[
                ChatMessage::system("You answer from context."),
                ChatMessage::user("What are your hours?"),
            ])
            .await
            .unwrap();

        assert_eq!(reply, "Our hours are 9-5.");
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        let client =
            MockHttpClient::new().with_response(TEST_URL, completion_response("ok"));
        let chat = OpenAiChatClient::new(client, "test-key", "gpt-3.5-turbo").with_temperature(0.2);

        chat.complete(&[ChatMessage::user("hi")]).await.unwrap();

        let requests = chat.client.requests();
        assert_eq!(requests.len(), 1);
        let body = &requests[0].body;
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let response = serde_json::json!({"choices": []});
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let chat = OpenAiChatClient::new(client, "test-key", "gpt-3.5-turbo");

        let err = chat.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, DomainError::LanguageModel { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_maps_to_language_model() {
        let client = MockHttpClient::new().with_error(TEST_URL, "connection refused");
        let chat = OpenAiChatClient::new(client, "test-key", "gpt-3.5-turbo");

        let err = chat.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, DomainError::LanguageModel { .. }));
    }
}
