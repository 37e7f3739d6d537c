//! The extraction pipeline: scan compiler output, normalize what the patterns
//! recognise, and keep what belongs to the inspected file.

use crate::e_filter::FileFilter;
use crate::e_normalize::normalize;
use crate::e_patterns::{PatternSet, RawMatch, DEFAULT_PATTERNS};
use crate::e_types::Diagnostic;
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;

static ANSI_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ansi escape regex is valid"));

/// Everything one extraction produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Diagnostics for the inspected file, in output order.
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics that resolved to some other file.
    pub foreign: Vec<Diagnostic>,
}

impl ExtractionReport {
    /// Whether the output contained anything recognisable at all.
    pub fn recognised_any(&self) -> bool {
        !self.diagnostics.is_empty() || !self.foreign.is_empty()
    }
}

enum Stage {
    Scanning,
    Matched(RawMatch),
    Accepted(Diagnostic),
    Rejected(Diagnostic),
    Done,
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Scanning => "SCANNING",
            Stage::Matched(_) => "MATCHED",
            Stage::Accepted(_) => "ACCEPTED",
            Stage::Rejected(_) => "REJECTED",
            Stage::Done => "DONE",
        }
    }
}

/// Runs a [`PatternSet`] over compiler output for one inspected file.
///
/// The pattern set is only borrowed; any number of extractors may share it.
#[derive(Debug, Clone)]
pub struct Extractor<'p> {
    patterns: &'p PatternSet,
    filter: FileFilter,
}

impl<'p> Extractor<'p> {
    pub fn new(patterns: &'p PatternSet, filter: FileFilter) -> Self {
        Extractor { patterns, filter }
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    pub fn extract(&self, output: &str) -> Vec<Diagnostic> {
        self.extract_report(output).diagnostics
    }

    pub fn extract_report(&self, output: &str) -> ExtractionReport {
        let text = strip_ansi(output);
        let lines: Vec<&str> = text.lines().collect();
        let mut report = ExtractionReport::default();
        let mut cursor = 0;
        let mut stage = Stage::Scanning;

        loop {
            let next = match stage {
                Stage::Scanning => match self.scan(&lines, &mut cursor) {
                    Some(raw) => Stage::Matched(raw),
                    None => Stage::Done,
                },
                Stage::Matched(raw) => {
                    cursor = raw.span.end;
                    let diag = normalize(&raw);
                    if self.filter.accepts(&diag) {
                        Stage::Accepted(diag)
                    } else {
                        Stage::Rejected(diag)
                    }
                }
                Stage::Accepted(diag) => {
                    report.diagnostics.push(diag);
                    Stage::Scanning
                }
                Stage::Rejected(diag) => {
                    debug!(
                        "dropping diagnostic for {} (inspecting {}): {}",
                        diag.file,
                        self.filter.inspected().display(),
                        diag
                    );
                    report.foreign.push(diag);
                    Stage::Scanning
                }
                Stage::Done => break,
            };
            self.trace_transition(&next, cursor);
            stage = next;
        }
        report
    }

    /// Advances `cursor` to the next line where some pattern fires.
    fn scan(&self, lines: &[&str], cursor: &mut usize) -> Option<RawMatch> {
        while *cursor < lines.len() {
            if let Some(raw) = self.patterns.first_match(lines, *cursor) {
                return Some(raw);
            }
            *cursor += 1;
        }
        None
    }

    fn trace_transition(&self, next: &Stage, cursor: usize) {
        match next {
            Stage::Matched(raw) => trace!(
                "extract -> {} tag={} lines={}..{} file={} line={:?}",
                next.name(),
                raw.tag,
                raw.span.start,
                raw.span.end,
                raw.file,
                raw.line
            ),
            Stage::Accepted(diag) | Stage::Rejected(diag) => {
                trace!("extract -> {} {}", next.name(), diag)
            }
            Stage::Scanning | Stage::Done => trace!("extract -> {} at line {}", next.name(), cursor),
        }
    }
}

/// Removes terminal colour sequences such as the ones `mix` emits on a tty.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE_RE.replace_all(text, "")
}

/// Extracts the diagnostics for `inspected` from `output` using the built-in
/// patterns.
///
/// # Example
/// ```
/// use elixirc_lint::{extract_diagnostics, Severity};
///
/// let output = "== Compilation error on file web/router.ex ==\n\
///               ** (CompileError) web/router.ex:19: undefined function get/2\n";
/// let diags = extract_diagnostics(output, "/project", "web/router.ex");
///
/// assert_eq!(diags.len(), 1);
/// assert_eq!(diags[0].line, 19);
/// assert_eq!(diags[0].severity, Severity::Error);
/// assert_eq!(diags[0].message, "undefined function get/2");
/// ```
pub fn extract_diagnostics(
    output: &str,
    working_dir: impl AsRef<Path>,
    inspected: impl AsRef<Path>,
) -> Vec<Diagnostic> {
    let filter = FileFilter::new(working_dir.as_ref(), inspected);
    Extractor::new(&DEFAULT_PATTERNS, filter).extract(output)
}
