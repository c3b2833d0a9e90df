pub mod judge;
pub mod provider;
pub mod providers;

pub use judge::{
    Assessment, FieldEvaluation, FieldSubmission, HeuristicJudge, JudgeError, JudgeRequest,
    JudgeVerdict, LlmJudge, UnstructuredJudge,
};
pub use provider::{LlmError, LlmProvider, Message, Role};
