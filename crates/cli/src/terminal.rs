use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

use screening_hybrid::HybridResult;
use screening_rules::{RuleSetResult, ValidationResult};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const PASS: Color = Color::Green;
    const FAIL: Color = Color::Red;
    const WARN: Color = Color::Yellow;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Writes human-readable reports to stdout.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Full report for one hybrid evaluation.
    pub fn print_report(&self, application: &Path, result: &HybridResult) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!("Screening report: {}\n", application.display())),
            ResetColor,
        )?;
        self.print_verdict("Overall", result.overall_passed)?;
        execute!(
            stdout,
            Print(format!("Score:      {}\n", percent(result.overall_score))),
            SetForegroundColor(Colors::DIM),
            Print("---\n"),
            ResetColor,
        )?;

        let summary = &result.summary;
        self.print_verdict("Structured", summary.structured_passed)?;
        execute!(
            stdout,
            Print(format!(
                "  {} of {} rules passed ({})\n",
                summary.total_structured_rules - summary.failed_structured_rules,
                summary.total_structured_rules,
                percent(summary.structured_score)
            )),
        )?;
        for failure in result.structured_evaluation.failures() {
            let field = failure
                .rule
                .field()
                .map(|f| f.as_str())
                .unwrap_or(failure.rule.kind());
            execute!(
                stdout,
                SetForegroundColor(Colors::FAIL),
                Print(format!("  x {field}: ")),
                ResetColor,
                Print(format!("{}\n", failure.reason)),
            )?;
        }

        let unstructured = &result.unstructured_evaluation;
        self.print_verdict("Free text", unstructured.passed)?;
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!(
                "  source: {} | fields evaluated: {}\n",
                source_label(unstructured.source),
                summary.unstructured_fields_evaluated
            )),
            ResetColor,
            Print(format!("  {}\n", unstructured.overall_reasoning)),
        )?;
        for evaluation in &unstructured.field_evaluations {
            let color = if evaluation.assessment.is_pass() {
                Colors::PASS
            } else {
                Colors::FAIL
            };
            execute!(
                stdout,
                SetForegroundColor(color),
                Print(format!("  [{}] ", evaluation.assessment)),
                ResetColor,
                Print(format!("{}: {}\n", evaluation.field, evaluation.reasoning)),
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Lint findings for a rules file.
    pub fn print_validation(&self, rules: &Path, result: &ValidationResult) -> Result<()> {
        let mut stdout = io::stdout();
        for error in &result.errors {
            execute!(
                stdout,
                SetForegroundColor(Colors::FAIL),
                Print(format!("error   {}: ", error.path)),
                ResetColor,
                Print(format!("{}\n", error.message)),
            )?;
            if let Some(suggestion) = &error.suggestion {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::DIM),
                    Print(format!("        {suggestion}\n")),
                    ResetColor,
                )?;
            }
        }
        for warning in &result.warnings {
            execute!(
                stdout,
                SetForegroundColor(Colors::WARN),
                Print(format!("warning {}: ", warning.path)),
                ResetColor,
                Print(format!("{}\n", warning.message)),
            )?;
        }
        let (color, status) = if result.valid {
            (Colors::PASS, "ok")
        } else {
            (Colors::FAIL, "invalid")
        };
        execute!(
            stdout,
            SetForegroundColor(color),
            Print(format!("{status}: ")),
            ResetColor,
            Print(format!(
                "{} ({} error(s), {} warning(s))\n",
                rules.display(),
                result.errors.len(),
                result.warnings.len()
            )),
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// One line per application in a batch run.
    pub fn print_batch_line(&self, application: &Path, result: &RuleSetResult) -> Result<()> {
        let mut stdout = io::stdout();
        let color = if result.passed { Colors::PASS } else { Colors::FAIL };
        let first_failure = result
            .failures()
            .next()
            .map(|d| format!("  {}", d.reason))
            .unwrap_or_default();
        execute!(
            stdout,
            SetForegroundColor(color),
            Print(format!("{:<5}", verdict_label(result.passed))),
            ResetColor,
            Print(format!(
                " {} {}/{} ({}){}\n",
                application.display(),
                result.passed_count(),
                result.total(),
                percent(result.score()),
                first_failure
            )),
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    fn print_verdict(&self, label: &str, passed: bool) -> Result<()> {
        let mut stdout = io::stdout();
        let color = if passed { Colors::PASS } else { Colors::FAIL };
        execute!(
            stdout,
            Print(format!("{:<12}", format!("{label}:"))),
            SetForegroundColor(color),
            Print(verdict_label(passed)),
            ResetColor,
            Print("\n"),
        )?;
        Ok(())
    }
}

fn verdict_label(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

fn source_label(source: screening_hybrid::UnstructuredSource) -> &'static str {
    use screening_hybrid::UnstructuredSource::*;
    match source {
        Llm => "llm",
        Heuristic => "heuristic",
        HeuristicFallback => "heuristic fallback",
        Skipped => "skipped",
    }
}
