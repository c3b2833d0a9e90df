//! Language-model backed judge.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use screening_core::config::{LlmConfig, OllamaConfig};

use crate::provider::{LlmError, LlmProvider, Message};
use crate::providers::create_provider;

use super::{
    Assessment, FieldEvaluation, JudgeError, JudgeRequest, JudgeVerdict, UnstructuredJudge,
};

const SYSTEM_PROMPT: &str = "You are an expert HR evaluator for government positions. \
Evaluate applications objectively and fairly.";

const DEFAULT_CONTEXT: &str = "Government Position";

const ANSWER_FORMAT: &str = r#"{
  "overall_assessment": "PASS" or "FAIL",
  "overall_reasoning": "Brief explanation of overall decision",
  "field_evaluations": [
    {
      "field": "field_name",
      "assessment": "PASS" or "FAIL",
      "reasoning": "Brief explanation"
    }
  ]
}"#;

/// Judges unstructured fields by prompting an [`LlmProvider`].
pub struct LlmJudge {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmJudge {
    pub fn new(provider: Box<dyn LlmProvider>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(
        llm_config: &LlmConfig,
        ollama_config: &OllamaConfig,
    ) -> Result<Self, LlmError> {
        let provider = create_provider(llm_config, ollama_config)?;
        Ok(Self::new(provider, llm_config.temperature, llm_config.max_tokens))
    }
}

#[async_trait]
impl UnstructuredJudge for LlmJudge {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        info!(
            provider = self.provider.name(),
            fields = request.fields.len(),
            "requesting unstructured judgment"
        );
        let response = self
            .provider
            .complete(build_messages(request), self.temperature, self.max_tokens)
            .await?;
        debug!(response = %response, "judge response");
        parse_verdict(&response)
    }
}

// ── Prompt ──────────────────────────────────────────────────────────

pub(crate) fn build_messages(request: &JudgeRequest) -> Vec<Message> {
    let context = if request.context.trim().is_empty() {
        DEFAULT_CONTEXT
    } else {
        request.context.as_str()
    };

    let mut prompt = vec![
        format!("You are evaluating a job application for the position: {context}"),
        "Evaluate each unstructured field below and decide whether it reveals anything \
         that would disqualify the candidate."
            .to_string(),
        "Give every field an assessment of PASS or FAIL with brief reasoning.".to_string(),
        String::new(),
        "IMPORTANT: If ANY field evaluation is FAIL, the overall_assessment MUST be FAIL.".to_string(),
        "The overall_assessment is PASS only when ALL field evaluations are PASS.".to_string(),
        String::new(),
        "Unstructured data to evaluate:".to_string(),
    ];

    for field in &request.fields {
        prompt.push(format!("\n{}:", field.field.to_uppercase()));
        prompt.push(format!("Description: {}", field.description));
        prompt.push(format!("Value: {}", render_value(&field.value)));
        prompt.push(format!("Evaluation Criteria: {}", field.evaluation_criteria));
        prompt.push("---".to_string());
    }

    prompt.push("\nRespond with JSON only, in this format:".to_string());
    prompt.push(ANSWER_FORMAT.to_string());

    vec![Message::system(SYSTEM_PROMPT), Message::user(prompt.join("\n"))]
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawVerdict {
    #[serde(default)]
    overall_assessment: Option<String>,
    #[serde(default)]
    overall_reasoning: Option<String>,
    #[serde(default)]
    field_evaluations: Vec<RawFieldEvaluation>,
}

#[derive(Deserialize)]
struct RawFieldEvaluation {
    #[serde(default)]
    field: String,
    #[serde(default)]
    assessment: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Decode a model answer. A missing `overall_assessment` counts as FAIL.
pub(crate) fn parse_verdict(response: &str) -> Result<JudgeVerdict, JudgeError> {
    let raw: RawVerdict =
        serde_json::from_str(extract_json(response)).map_err(|e| JudgeError::Unparsable {
            reason: e.to_string(),
            raw_response: response.to_string(),
        })?;

    let passed = raw
        .overall_assessment
        .as_deref()
        .map(Assessment::from_label)
        .is_some_and(Assessment::is_pass);

    let field_evaluations = raw
        .field_evaluations
        .into_iter()
        .map(|e| FieldEvaluation {
            field: e.field,
            assessment: Assessment::from_label(e.assessment.as_deref().unwrap_or_default()),
            reasoning: e.reasoning.unwrap_or_default(),
        })
        .collect();

    Ok(JudgeVerdict {
        passed,
        overall_reasoning: raw.overall_reasoning.unwrap_or_default(),
        field_evaluations,
        raw_response: response.to_string(),
    })
}

/// Extract JSON from an LLM response, handling markdown code blocks.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // ```json ... ```
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // ``` ... ```, skipping any language tag on the fence line
    if let Some(start) = trimmed.find("```") {
        let after_tick = &trimmed[start + 3..];
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    // Prose around a bare object
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::judge::FieldSubmission;

    /// Replays a canned answer.
    struct ScriptedProvider {
        answer: Result<String, u16>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::ApiError {
                    status: *status,
                    body: "unavailable".into(),
                }),
            }
        }
    }

    fn request() -> JudgeRequest {
        JudgeRequest {
            context: "Management Support Officer".into(),
            fields: vec![FieldSubmission {
                field: "conviction_details".into(),
                value: json!("Fined for a traffic offence in 2015"),
                description: "Details about any court conviction".into(),
                evaluation_criteria: "Evaluate seriousness".into(),
            }],
        }
    }

    #[test]
    fn prompt_lists_fields_and_answer_format() {
        let messages = build_messages(&request());
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("expert HR evaluator"));
        let user = &messages[1].content;
        assert!(user.contains("position: Management Support Officer"));
        assert!(user.contains("CONVICTION_DETAILS:"));
        assert!(user.contains("Value: Fined for a traffic offence in 2015"));
        assert!(user.contains("Evaluation Criteria: Evaluate seriousness"));
        assert!(user.contains("\"overall_assessment\""));
    }

    #[test]
    fn empty_context_uses_default_position() {
        let mut req = request();
        req.context = "  ".into();
        let messages = build_messages(&req);
        assert!(messages[1].content.contains("position: Government Position"));
    }

    #[test]
    fn parse_fenced_verdict() {
        let response = "Here you go:\n```json\n{\"overall_assessment\": \"pass\", \
            \"overall_reasoning\": \"minor\", \"field_evaluations\": \
            [{\"field\": \"conviction_details\", \"assessment\": \"PASS\", \"reasoning\": \"minor\"}]}\n```";
        let verdict = parse_verdict(response).unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.overall_reasoning, "minor");
        assert_eq!(verdict.field_evaluations[0].assessment, Assessment::Pass);
        assert_eq!(verdict.raw_response, response);
    }

    #[test]
    fn missing_overall_assessment_is_fail() {
        let verdict = parse_verdict(r#"{"field_evaluations": []}"#).unwrap();
        assert!(!verdict.passed);
    }

    #[test]
    fn unknown_field_label_is_fail() {
        let verdict = parse_verdict(
            r#"{"overall_assessment": "PASS", "field_evaluations": [{"field": "x", "assessment": "UNSURE"}]}"#,
        )
        .unwrap();
        assert!(verdict.passed);
        assert!(verdict.has_failed_fields());
    }

    #[test]
    fn prose_answer_is_unparsable() {
        let err = parse_verdict("The candidate looks fine. PASS.").unwrap_err();
        assert!(matches!(err, JudgeError::Unparsable { .. }));
    }

    #[test]
    fn extract_json_variants() {
        assert_eq!(extract_json(r#"{"a": 1}"#), r#"{"a": 1}"#);
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), r#"{"a": 1}"#);
        assert_eq!(extract_json("Sure! {\"a\": 1} Hope that helps."), r#"{"a": 1}"#);
    }

    #[tokio::test]
    async fn judge_sends_prompt_and_parses_answer() {
        let provider = ScriptedProvider {
            answer: Ok(r#"{"overall_assessment": "FAIL", "overall_reasoning": "serious",
                "field_evaluations": [{"field": "conviction_details", "assessment": "FAIL", "reasoning": "fraud"}]}"#
                .into()),
        };
        let judge = LlmJudge::new(Box::new(provider), 0.1, 256);
        let verdict = judge.judge(&request()).await.unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.field_evaluations[0].reasoning, "fraud");
        assert_eq!(judge.name(), "scripted");
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let provider = ScriptedProvider {
            answer: Err(503),
        };
        let judge = LlmJudge::new(Box::new(provider), 0.1, 256);
        let err = judge.judge(&request()).await.unwrap_err();
        assert!(matches!(err, JudgeError::Provider(LlmError::ApiError { status: 503, .. })));
    }
}
