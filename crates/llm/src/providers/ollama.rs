use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message};

/// Local Ollama `/api/chat` backend.
pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(client: reqwest::Client, url: String, model: String) -> Self {
        Self { client, url, model }
    }

    fn request_body(&self, messages: &[Message], temperature: f32, max_tokens: u32) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "format": "json",
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        })
    }
}

fn response_content(resp: &Value) -> Result<String, LlmError> {
    resp["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError("missing message.content".into()))
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.url);
        debug!(url = %url, model = %self.model, "Ollama request");

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(&messages, temperature, max_tokens))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let resp: Value = response.json().await?;
        response_content(&resp)
    }
}
