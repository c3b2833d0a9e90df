mod cli;
mod terminal;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{debug, info};

use screening_core::config::{load_dotenv, Config};
use screening_hybrid::HybridEvaluator;
use screening_rules::{load_rules_file, split_rules, validate_rules, RuleFile, RuleSetEvaluator};

use crate::cli::{CliArgs, Command};
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    load_dotenv();
    let config = Config::from_env();
    config.log_summary();
    debug!(config = %config.redacted_summary(), "effective configuration");

    let args = CliArgs::parse();
    let terminal = Terminal::new();

    match args.command {
        Command::Evaluate {
            rules,
            application,
            output,
            heuristic,
        } => {
            let rules_path = rules.unwrap_or_else(|| config.screening.rules_path.clone());
            evaluate(&config, &terminal, &rules_path, &application, output.as_deref(), heuristic)
                .await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { rules } => {
            let rules_path = rules.unwrap_or_else(|| config.screening.rules_path.clone());
            let file = load_rules(&rules_path)?;
            let result = validate_rules(&file.rules);
            terminal.print_validation(&rules_path, &result)?;
            Ok(if result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Batch {
            rules,
            applications,
        } => {
            let rules_path = rules.unwrap_or_else(|| config.screening.rules_path.clone());
            batch(&terminal, &rules_path, &applications)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn evaluate(
    config: &Config,
    terminal: &Terminal,
    rules_path: &Path,
    application_path: &Path,
    output: Option<&Path>,
    heuristic: bool,
) -> Result<()> {
    let (structured, unstructured) = split_rules(load_rules(rules_path)?.rules);
    let application = read_json(application_path)?;

    let evaluator = HybridEvaluator::from_config(config, heuristic)
        .context("failed to create unstructured judge")?;
    info!(judge = evaluator.judge_name(), "evaluating application");

    let result = evaluator
        .evaluate(&application, &structured, &unstructured)
        .await;
    terminal.print_report(application_path, &result)?;

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        terminal.print_info(&format!("Result written to {}", path.display()))?;
    }
    Ok(())
}

fn batch(terminal: &Terminal, rules_path: &Path, applications: &[PathBuf]) -> Result<()> {
    let (structured, unstructured) = split_rules(load_rules(rules_path)?.rules);
    if !unstructured.is_empty() {
        info!(
            fields = unstructured.len(),
            "batch mode evaluates structured rules only; unstructured fields skipped"
        );
    }

    let records = applications
        .iter()
        .map(|path| read_json(path))
        .collect::<Result<Vec<_>>>()?;
    let results = RuleSetEvaluator::evaluate_batch(&records, &structured);

    for (path, result) in applications.iter().zip(&results) {
        terminal.print_batch_line(path, result)?;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    terminal.print_info(&format!("{passed} of {} application(s) passed", results.len()))?;
    Ok(())
}

fn load_rules(path: &Path) -> Result<RuleFile> {
    load_rules_file(path).with_context(|| format!("failed to load rules from {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}
