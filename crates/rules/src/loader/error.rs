//! Error type for rules file loading.

use std::path::PathBuf;

/// A rules source that cannot be used at all.
///
/// Individual malformed rules are not load errors; they are kept as
/// `Rule::Invalid` and fail when evaluated.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Filesystem I/O error.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON decode error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decode error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Decoded, but not a list of rules.
    #[error("expected a list of rules or an object with a 'rules' list, found {found}")]
    NotAList { found: &'static str },
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;
