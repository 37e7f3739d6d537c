use crate::e_types::{Diagnostic, Severity};
use anyhow::Result;
use nu_ansi_term::{Color, Style};

/// How diagnostics are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// `file:line: severity: message`, one per line.
    #[default]
    Text,
    /// A JSON array of `{file, line, severity, message}` objects.
    Json,
}

pub fn render(diagnostics: &[Diagnostic], format: ReportFormat, uses_color: bool) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(diagnostics, uses_color)),
        ReportFormat::Json => render_json(diagnostics),
    }
}

pub fn render_text(diagnostics: &[Diagnostic], uses_color: bool) -> String {
    diagnostics
        .iter()
        .map(|diag| render_line(diag, uses_color))
        .collect::<Vec<String>>()
        .join("\n")
}

fn render_line(diag: &Diagnostic, uses_color: bool) -> String {
    if !uses_color {
        return diag.to_string();
    }
    let severity = match diag.severity {
        Severity::Error => Color::Red.bold().paint(diag.severity.as_str()),
        Severity::Warning => Color::Yellow.bold().paint(diag.severity.as_str()),
    };
    let location = Style::new()
        .underline()
        .paint(format!("{}:{}", diag.file, diag.line));
    format!("{}: {}: {}", location, severity, diag.message)
}

#[cfg(feature = "uses_serde")]
pub fn render_json(diagnostics: &[Diagnostic]) -> Result<String> {
    Ok(serde_json::to_string_pretty(diagnostics)?)
}

#[cfg(not(feature = "uses_serde"))]
pub fn render_json(_diagnostics: &[Diagnostic]) -> Result<String> {
    anyhow::bail!("JSON output needs the `uses_serde` feature")
}

/// One-line count summary, e.g. `1 error, 2 warnings`.
pub fn summary(diagnostics: &[Diagnostic]) -> String {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;
    format!(
        "{} error{}, {} warning{}",
        errors,
        if errors == 1 { "" } else { "s" },
        warnings,
        if warnings == 1 { "" } else { "s" }
    )
}
