use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub screening: ScreeningConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SCREENING_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SCREENING_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            screening: ScreeningConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  screening:   rules={}, context_field={}, judge_timeout={}s",
            self.screening.rules_path.display(),
            self.screening.context_field,
            self.screening.judge_timeout_secs
        );
        tracing::info!(
            "  llm:         provider={}, configured={}",
            self.llm.provider,
            self.llm.is_configured()
        );
        tracing::info!("  ollama:      url={}, model={}", self.ollama.url, self.ollama.model);
    }

    /// Return a redacted view safe for reports (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "screening": {
                "rules_path": self.screening.rules_path,
                "context_field": self.screening.context_field,
                "judge_timeout_secs": self.screening.judge_timeout_secs,
            },
            "llm": {
                "provider": self.llm.provider,
                "configured": self.llm.is_configured(),
                "timeout_secs": self.llm.timeout_secs,
            },
            "ollama": { "url": self.ollama.url, "model": self.ollama.model },
        })
    }
}

// ── Screening ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Rules file consumed when no `--rules` flag is given.
    pub rules_path: PathBuf,
    /// Record field passed to the judge as the free-text context hint.
    pub context_field: String,
    /// Outer deadline for one unstructured judge call.
    pub judge_timeout_secs: u64,
}

impl ScreeningConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_path: PathBuf::from(profiled_env_or(p, "RULES_PATH", "config/rules.json")),
            context_field: profiled_env_or(p, "CONTEXT_FIELD", "post_applied_for"),
            judge_timeout_secs: profiled_env_parse(p, "JUDGE_TIMEOUT_SECS", 45),
        }
    }

    pub fn judge_timeout(&self) -> Duration {
        Duration::from_secs(self.judge_timeout_secs)
    }
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("config/rules.json"),
            context_field: "post_applied_for".to_string(),
            judge_timeout_secs: 45,
        }
    }
}

// ── LLM (OpenAI-compatible) ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "ollama", "heuristic"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "openai"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.1),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 1024),
            timeout_secs: profiled_env_parse(p, "LLM_TIMEOUT_SECS", 30),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "qwen2.5:0.5b"),
        }
    }
}
