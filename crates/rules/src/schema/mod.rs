//! Rule schema: the closed set of rule shapes the engine evaluates.
//!
//! Defines the rule tree consumed by the evaluator:
//! - `Rule`: tagged union of predicates, match predicates, combinators,
//!   unstructured markers, and malformed definitions
//! - `Predicate`: the typed leaf checks with their parameters
//! - `FieldPath`: dotted paths with numeric indices and `*` wildcards
//! - `Pattern`: `regex` patterns compiled when the rule is read
//!
//! Definitions are plain JSON objects discriminated by `type`. Parsing never
//! rejects a single rule; shape problems are kept on [`Rule::Invalid`].

mod parse;
mod path;
mod pattern;
mod rule;

pub use path::*;
pub use pattern::Pattern;
pub use rule::*;
