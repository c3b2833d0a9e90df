use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Eligibility screening for job applications.
///
/// Evaluates applications against a declarative rule set and, for free-text
/// fields, an LLM judge (or its heuristic stand-in).
#[derive(Parser, Debug)]
#[command(name = "screening", about = "Eligibility screening for job applications")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full hybrid evaluation on one application
    Evaluate {
        /// Rules file (.json, .yml, .yaml); defaults to RULES_PATH
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Application record (JSON)
        #[arg(long)]
        application: PathBuf,

        /// Write the full result as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip the LLM and judge free-text fields heuristically
        #[arg(long)]
        heuristic: bool,
    },

    /// Lint a rules file; exits non-zero when any rule is malformed
    Check {
        /// Rules file; defaults to RULES_PATH
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Structured-only evaluation of many applications in parallel
    Batch {
        /// Rules file; defaults to RULES_PATH
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Application records (JSON)
        #[arg(required = true)]
        applications: Vec<PathBuf>,
    },
}
