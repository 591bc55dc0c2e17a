use async_trait::async_trait;

use crate::error::{PromoreelError, Result};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// A text-in/text-out language model. Every pipeline stage that needs
/// a model takes an explicit `&dyn ChatModel`, so tests can substitute
/// a scripted implementation and no global client is shared.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_url: OPENAI_CHAT_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Override the endpoint (used by tests against a local server).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| PromoreelError::ChatFailed {
                reason: format!("Invalid API response: {:?}", response),
            })?;

        Ok(content.trim().to_string())
    }
}


#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn invoke_extracts_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "  solar, panels, energy  " } }]
            })))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new(reqwest::Client::new(), "test-key", "test-model")
            .with_api_url(format!("{}/chat", server.uri()));
        let reply = chat.invoke("hello").await.unwrap();
        assert_eq!(reply, "solar, panels, energy");
    }

    #[tokio::test]
    async fn invoke_rejects_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "nope"})),
            )
            .mount(&server)
            .await;

        let chat = OpenAiChat::new(reqwest::Client::new(), "test-key", "test-model")
            .with_api_url(format!("{}/chat", server.uri()));
        assert!(matches!(
            chat.invoke("hello").await,
            Err(PromoreelError::ChatFailed { .. })
        ));
    }
}
