pub mod ollama;
pub mod openai;

use std::time::Duration;

use screening_core::config::{LlmConfig, OllamaConfig};

use crate::provider::{LlmError, LlmProvider};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Create the appropriate LLM provider based on config.
///
/// The `heuristic` provider has no LLM backend and is reported as not
/// configured; callers use the heuristic judge directly instead.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    let client = http_client(llm_config.timeout())?;
    match llm_config.provider.as_str() {
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = llm_config
                .openai_base_url
                .as_deref()
                .unwrap_or(DEFAULT_OPENAI_BASE_URL);
            Ok(Box::new(openai::OpenAiProvider::new(
                client,
                api_key.clone(),
                llm_config.openai_model.clone(),
                base_url.trim_end_matches('/').to_string(),
            )))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            client,
            ollama_config.url.trim_end_matches('/').to_string(),
            ollama_config.model.clone(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "no LLM backend for provider '{}'",
            other
        ))),
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
