//! Unstructured-field judgment.
//!
//! An [`UnstructuredJudge`] receives the free-text fields of one application
//! together with their evaluation criteria and returns a PASS/FAIL verdict per
//! field plus an overall verdict. Two implementations ship:
//! - [`LlmJudge`]: prompts a language model through an [`LlmProvider`](crate::LlmProvider)
//! - [`HeuristicJudge`]: deterministic per-field heuristics, used when no
//!   model is configured or the model call fails

mod heuristic;
mod llm;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::LlmError;

pub use heuristic::HeuristicJudge;
pub use llm::{extract_json, LlmJudge};

// ── Request ─────────────────────────────────────────────────────────

/// One unstructured field with a present value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSubmission {
    pub field: String,
    pub value: Value,
    pub description: String,
    pub evaluation_criteria: String,
}

/// Everything the judge sees for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRequest {
    /// Free-text hint such as the post applied for. May be empty.
    pub context: String,
    pub fields: Vec<FieldSubmission>,
}

// ── Verdict ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Assessment {
    Pass,
    Fail,
}

impl Assessment {
    /// `PASS` in any case is a pass; every other label is a fail.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("pass") {
            Assessment::Pass
        } else {
            Assessment::Fail
        }
    }

    pub fn is_pass(self) -> bool {
        self == Assessment::Pass
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Assessment::Pass => "PASS",
            Assessment::Fail => "FAIL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEvaluation {
    pub field: String,
    pub assessment: Assessment,
    pub reasoning: String,
}

impl FieldEvaluation {
    pub fn new(field: impl Into<String>, assessment: Assessment, reasoning: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            assessment,
            reasoning: reasoning.into(),
        }
    }
}

/// A judge's answer, exactly as it reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub passed: bool,
    pub overall_reasoning: String,
    pub field_evaluations: Vec<FieldEvaluation>,
    /// Unprocessed model output, or a short marker for non-model judges.
    pub raw_response: String,
}

impl JudgeVerdict {
    pub fn has_failed_fields(&self) -> bool {
        self.field_evaluations
            .iter()
            .any(|e| !e.assessment.is_pass())
    }
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("LLM provider failed: {0}")]
    Provider(#[from] LlmError),

    #[error("judge did not answer within {0:?}")]
    Timeout(Duration),

    #[error("judge output is not a verdict: {reason}")]
    Unparsable { reason: String, raw_response: String },
}

// ── Trait ───────────────────────────────────────────────────────────

/// Produces a verdict over an application's unstructured fields.
#[async_trait]
pub trait UnstructuredJudge: Send + Sync {
    /// Short name for logs and result provenance.
    fn name(&self) -> &str;

    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assessment_labels() {
        assert_eq!(Assessment::from_label("PASS"), Assessment::Pass);
        assert_eq!(Assessment::from_label(" pass "), Assessment::Pass);
        assert_eq!(Assessment::from_label("FAIL"), Assessment::Fail);
        assert_eq!(Assessment::from_label("REVIEW"), Assessment::Fail);
        assert_eq!(Assessment::from_label(""), Assessment::Fail);
    }

    #[test]
    fn assessment_serializes_uppercase() {
        let eval = FieldEvaluation::new("conviction_details", Assessment::Fail, "serious");
        let value = serde_json::to_value(&eval).unwrap();
        assert_eq!(value["assessment"], "FAIL");
    }
}
