//! Concurrent structured + unstructured evaluation of one record.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use screening_core::Config;
use screening_llm::{
    Assessment, FieldEvaluation, FieldSubmission, HeuristicJudge, JudgeError, JudgeRequest,
    JudgeVerdict, LlmError, LlmJudge, UnstructuredJudge,
};
use screening_rules::{
    EvaluationDetail, FieldPath, Rule, RuleSetEvaluator, RuleSetResult, UnstructuredField,
};

use crate::gather::{context_hint, gather_unstructured};
use crate::result::{HybridResult, UnstructuredResult, UnstructuredSource};

const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_CONTEXT_FIELD: &str = "post_applied_for";

/// Runs both evaluation branches and merges them.
///
/// The judge is injected; a failing or slow judge degrades to the heuristic
/// judge and never affects the structured branch.
pub struct HybridEvaluator {
    judge: Arc<dyn UnstructuredJudge>,
    source: UnstructuredSource,
    fallback: HeuristicJudge,
    judge_timeout: Duration,
    context_field: FieldPath,
}

impl HybridEvaluator {
    /// Evaluator backed by a model judge.
    pub fn new(judge: Arc<dyn UnstructuredJudge>) -> Self {
        Self {
            judge,
            source: UnstructuredSource::Llm,
            fallback: HeuristicJudge::new(),
            judge_timeout: DEFAULT_JUDGE_TIMEOUT,
            context_field: FieldPath::parse(DEFAULT_CONTEXT_FIELD),
        }
    }

    /// Evaluator that only uses the heuristic judge.
    pub fn heuristic() -> Self {
        Self {
            source: UnstructuredSource::Heuristic,
            ..Self::new(Arc::new(HeuristicJudge::new()))
        }
    }

    /// Pick the judge from config. Providers without credentials, and
    /// `LLM_PROVIDER=heuristic`, use the heuristic judge.
    pub fn from_config(config: &Config, force_heuristic: bool) -> Result<Self, LlmError> {
        let evaluator = if force_heuristic || !config.llm.is_configured() {
            if !force_heuristic && config.llm.provider != "heuristic" {
                warn!(
                    provider = %config.llm.provider,
                    "LLM provider not configured; using heuristic judge"
                );
            }
            Self::heuristic()
        } else {
            let judge = LlmJudge::from_config(&config.llm, &config.ollama)?;
            Self::new(Arc::new(judge))
        };
        Ok(evaluator
            .with_judge_timeout(config.screening.judge_timeout())
            .with_context_field(&config.screening.context_field))
    }

    pub fn with_judge_timeout(mut self, timeout: Duration) -> Self {
        self.judge_timeout = timeout;
        self
    }

    pub fn with_context_field(mut self, field: &str) -> Self {
        self.context_field = FieldPath::parse(field);
        self
    }

    pub fn judge_name(&self) -> &str {
        self.judge.name()
    }

    /// Evaluate `record` against the structured rules and the unstructured
    /// field definitions.
    pub async fn evaluate(
        &self,
        record: &Value,
        structured: &[Rule],
        unstructured: &[UnstructuredField],
    ) -> HybridResult {
        info!(
            structured_rules = structured.len(),
            unstructured_fields = unstructured.len(),
            judge = self.judge.name(),
            "starting hybrid evaluation"
        );

        let rules = structured.to_vec();
        let owned_record = record.clone();
        let structured_task =
            tokio::task::spawn_blocking(move || RuleSetEvaluator::evaluate(&owned_record, &rules));

        let (structured_join, (unstructured_result, data_found)) = tokio::join!(
            structured_task,
            self.evaluate_unstructured(record, unstructured)
        );

        let structured_result = match structured_join {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "structured evaluation task failed");
                failed_rule_set(structured, &e.to_string())
            }
        };

        info!(
            structured_passed = structured_result.passed,
            failed_rules = structured_result.failed_count(),
            unstructured_passed = unstructured_result.passed,
            source = ?unstructured_result.source,
            "hybrid evaluation finished"
        );
        HybridResult::merge(structured_result, unstructured_result, data_found)
    }

    async fn evaluate_unstructured(
        &self,
        record: &Value,
        fields: &[UnstructuredField],
    ) -> (UnstructuredResult, Vec<FieldSubmission>) {
        if fields.is_empty() {
            return (no_criteria(), Vec::new());
        }

        let submissions = gather_unstructured(record, fields);
        if submissions.is_empty() {
            warn!(expected = fields.len(), "no unstructured field data in record");
            return (missing_data(fields), submissions);
        }

        let request = JudgeRequest {
            context: context_hint(record, &self.context_field),
            fields: submissions,
        };

        let (verdict, source) = match self.call_judge(&request).await {
            Ok(verdict) => (verdict, self.source),
            Err(e) => {
                warn!(
                    judge = self.judge.name(),
                    error = %e,
                    "unstructured judge failed; falling back to heuristics"
                );
                (self.fallback.evaluate(&request), UnstructuredSource::HeuristicFallback)
            }
        };

        let mut result = UnstructuredResult::from_verdict(verdict, source);
        enforce_consistency(&mut result);
        (result, request.fields)
    }

    async fn call_judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        match tokio::time::timeout(self.judge_timeout, self.judge.judge(request)).await {
            Ok(answer) => answer,
            Err(_) => Err(JudgeError::Timeout(self.judge_timeout)),
        }
    }
}

/// A PASS overall verdict with any FAIL field is turned into FAIL.
fn enforce_consistency(result: &mut UnstructuredResult) {
    let failed: Vec<&str> = result
        .field_evaluations
        .iter()
        .filter(|e| !e.assessment.is_pass())
        .map(|e| e.field.as_str())
        .collect();
    if result.passed && !failed.is_empty() {
        warn!(
            failed_fields = ?failed,
            "judge reported PASS with failing fields; correcting to FAIL"
        );
        result.passed = false;
        result.overall_reasoning = format!(
            "Overall assessment corrected to FAIL due to failed field evaluations. Original reasoning: {}",
            result.overall_reasoning
        );
    }
}

fn no_criteria() -> UnstructuredResult {
    UnstructuredResult {
        passed: true,
        overall_reasoning: "No unstructured evaluation criteria defined".to_string(),
        field_evaluations: Vec::new(),
        raw_response: String::new(),
        source: UnstructuredSource::Skipped,
    }
}

fn missing_data(fields: &[UnstructuredField]) -> UnstructuredResult {
    UnstructuredResult {
        passed: false,
        overall_reasoning: format!(
            "Required unstructured data missing. Expected {} field(s) but none provided.",
            fields.len()
        ),
        field_evaluations: fields
            .iter()
            .map(|f| {
                FieldEvaluation::new(
                    f.field.to_string(),
                    Assessment::Fail,
                    "Required field data not provided",
                )
            })
            .collect(),
        raw_response: String::new(),
        source: UnstructuredSource::Skipped,
    }
}

fn failed_rule_set(rules: &[Rule], message: &str) -> RuleSetResult {
    let details: Vec<EvaluationDetail> = rules
        .iter()
        .map(|rule| EvaluationDetail {
            rule: rule.clone(),
            passed: false,
            reason: format!("Rule evaluation error: {message}"),
            sub_results: Vec::new(),
        })
        .collect();
    RuleSetResult {
        passed: details.is_empty(),
        details,
    }
}
