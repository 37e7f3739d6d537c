use crate::e_command_builder::{invocation_for, CompilerInvocation};
use crate::e_extract::{ExtractionReport, Extractor};
use crate::e_filter::FileFilter;
use crate::e_patterns::PatternSet;
use crate::e_runner::{CompilerOutput, CompilerRunner};
use crate::e_settings::Settings;
use crate::e_types::Diagnostic;
use anyhow::{bail, Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Lines of compiler output quoted when a failed run yields nothing parseable.
const FAILURE_TAIL_LINES: usize = 20;

/// Result of compiling the inspected file once.
#[derive(Debug, Clone)]
pub struct LintOutcome {
    pub invocation: CompilerInvocation,
    pub output: CompilerOutput,
    pub report: ExtractionReport,
}

impl LintOutcome {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.report.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.report.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Compiles `inspected` as `settings` describe and extracts its diagnostics.
///
/// A compiler that fails without printing anything recognisable is reported
/// as an error; everything else, including a failed compile with diagnostics,
/// is a normal outcome.
pub fn lint_file(
    settings: &Settings,
    inspected: &Path,
    working_dir: &Path,
    runner: &dyn CompilerRunner,
) -> Result<LintOutcome> {
    let patterns = PatternSet::new(settings.trace_classifier()?);
    let invocation = invocation_for(settings, inspected, working_dir);
    if let Some(dir) = &invocation.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let output = runner.run(&invocation)?;
    let report = extract_with(&patterns, &output, inspected);
    if !output.success && !report.recognised_any() {
        bail!(
            "`{}` failed ({}) and printed no recognisable diagnostics:\n{}",
            invocation.command_line(),
            output
                .exit_code
                .map_or_else(|| "killed by signal".to_string(), |code| format!("exit code {}", code)),
            tail(&output.text, FAILURE_TAIL_LINES)
        );
    }

    Ok(LintOutcome {
        invocation,
        output,
        report,
    })
}

/// Extracts diagnostics from output that was produced elsewhere, e.g. piped
/// in by an editor that already ran the compiler.
pub fn lint_output(
    settings: &Settings,
    output: &CompilerOutput,
    inspected: &Path,
) -> Result<ExtractionReport> {
    let patterns = PatternSet::new(settings.trace_classifier()?);
    Ok(extract_with(&patterns, output, inspected))
}

fn extract_with(patterns: &PatternSet, output: &CompilerOutput, inspected: &Path) -> ExtractionReport {
    let filter = FileFilter::new(&output.working_dir, inspected);
    let report = Extractor::new(patterns, filter).extract_report(&output.text);
    debug!(
        "{} diagnostics for {}, {} for other files",
        report.diagnostics.len(),
        inspected.display(),
        report.foreign.len()
    );
    report
}

fn tail(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(count)..].join("\n")
}
