use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message};

/// OpenAI-compatible chat completions backend.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url,
        }
    }

    fn request_body(&self, messages: &[Message], temperature: f32, max_tokens: u32) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        })
    }
}

fn response_content(resp: &Value) -> Result<String, LlmError> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "OpenAI request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_model_and_sampling() {
        let provider = OpenAiProvider::new(
            reqwest::Client::new(),
            "sk-test".into(),
            "gpt-4o-mini".into(),
            "https://api.openai.com".into(),
        );
        let body = provider.request_body(&[Message::user("hi")], 0.1, 512);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn content_is_read_from_first_choice() {
        let resp = json!({"choices": [{"message": {"role": "assistant", "content": "{}"}}]});
        assert_eq!(response_content(&resp).unwrap(), "{}");
        assert!(matches!(
            response_content(&json!({"choices": []})),
            Err(LlmError::ParseError(_))
        ));
    }
}
