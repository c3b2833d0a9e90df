//! Hybrid screening: structured rules plus a judged pass over free-text fields.
//!
//! [`HybridEvaluator`] runs the rule engine and the unstructured judge
//! concurrently, keeps the judge's verdict self-consistent, falls back to the
//! heuristic judge when the model is unavailable, and merges both into a
//! single [`HybridResult`].

pub mod aggregator;
pub mod gather;
pub mod result;

pub use aggregator::HybridEvaluator;
pub use gather::{context_hint, gather_unstructured};
pub use result::{hybrid_score, HybridResult, Summary, UnstructuredResult, UnstructuredSource};
