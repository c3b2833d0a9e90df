//! Deterministic stand-in for the language-model judge.

use async_trait::async_trait;
use serde_json::Value;

use super::{
    Assessment, FieldEvaluation, FieldSubmission, JudgeError, JudgeRequest, JudgeVerdict,
    UnstructuredJudge,
};

/// Fields that must be empty for a clean application.
const DISCLOSURE_FIELDS: &[&str] = &[
    "investigation_details",
    "conviction_details",
    "resignation_details",
];

const MIN_ADDRESS_CHARS: usize = 10;

/// Rule-of-thumb judgments per field name. Never fails to answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicJudge;

impl HeuristicJudge {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, request: &JudgeRequest) -> JudgeVerdict {
        let field_evaluations: Vec<FieldEvaluation> =
            request.fields.iter().map(assess_field).collect();
        let passed = field_evaluations.iter().all(|e| e.assessment.is_pass());

        JudgeVerdict {
            passed,
            overall_reasoning: "Heuristic evaluation completed; configure an LLM provider for \
                                full unstructured assessment"
                .to_string(),
            field_evaluations,
            raw_response: "heuristic".to_string(),
        }
    }
}

#[async_trait]
impl UnstructuredJudge for HeuristicJudge {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        Ok(self.evaluate(request))
    }
}

fn assess_field(submission: &FieldSubmission) -> FieldEvaluation {
    let field = submission.field.as_str();
    let (assessment, reasoning) = if DISCLOSURE_FIELDS.contains(&field) {
        let label = field.replace('_', " ");
        if is_empty(&submission.value) {
            (Assessment::Pass, format!("No concerning {label}"))
        } else {
            (Assessment::Fail, format!("Has {label} that needs review"))
        }
    } else if field == "other_qualifications" {
        (
            Assessment::Pass,
            "Additional qualifications are beneficial".to_string(),
        )
    } else if field == "residential_address" {
        let complete =
            !is_empty(&submission.value) && rendered_len(&submission.value) > MIN_ADDRESS_CHARS;
        if complete {
            (Assessment::Pass, "Address appears complete".to_string())
        } else {
            (Assessment::Fail, "Address appears incomplete".to_string())
        }
    } else {
        (Assessment::Pass, "No issues identified".to_string())
    };
    FieldEvaluation::new(field, assessment, reasoning)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn rendered_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn submission(field: &str, value: Value) -> FieldSubmission {
        FieldSubmission {
            field: field.into(),
            value,
            description: String::new(),
            evaluation_criteria: String::new(),
        }
    }

    fn judge(fields: Vec<FieldSubmission>) -> JudgeVerdict {
        HeuristicJudge::new().evaluate(&JudgeRequest {
            context: String::new(),
            fields,
        })
    }

    #[test]
    fn clean_application_passes() {
        let verdict = judge(vec![
            submission("conviction_details", json!("")),
            submission("other_qualifications", json!("Diploma in Accounting")),
            submission("residential_address", json!("12 Royal Road, Curepipe")),
            submission("hobbies", json!(["chess"])),
        ]);
        assert!(verdict.passed);
        assert_eq!(verdict.raw_response, "heuristic");
        let reasons: Vec<&str> = verdict
            .field_evaluations
            .iter()
            .map(|e| e.reasoning.as_str())
            .collect();
        assert_eq!(
            reasons,
            vec![
                "No concerning conviction details",
                "Additional qualifications are beneficial",
                "Address appears complete",
                "No issues identified",
            ]
        );
    }

    #[test]
    fn disclosed_investigation_fails() {
        let verdict = judge(vec![submission(
            "investigation_details",
            json!("Under inquiry since 2022"),
        )]);
        assert!(!verdict.passed);
        assert_eq!(verdict.field_evaluations[0].assessment, Assessment::Fail);
        assert_eq!(
            verdict.field_evaluations[0].reasoning,
            "Has investigation details that needs review"
        );
    }

    #[test]
    fn falsy_disclosures_pass() {
        for value in [json!(false), json!(0), json!([]), json!({}), Value::Null] {
            let verdict = judge(vec![submission("resignation_details", value.clone())]);
            assert!(verdict.passed, "{value}");
        }
    }

    #[test]
    fn short_address_fails() {
        let verdict = judge(vec![submission("residential_address", json!("Curepipe"))]);
        assert!(!verdict.passed);
        assert_eq!(
            verdict.field_evaluations[0].reasoning,
            "Address appears incomplete"
        );
    }

    #[tokio::test]
    async fn trait_answer_matches_direct_evaluation() {
        let request = JudgeRequest {
            context: "Clerk".into(),
            fields: vec![submission("conviction_details", json!("Fraud"))],
        };
        let judge = HeuristicJudge::new();
        let verdict = judge.judge(&request).await.unwrap();
        assert_eq!(verdict, judge.evaluate(&request));
        assert_eq!(judge.name(), "heuristic");
    }
}
