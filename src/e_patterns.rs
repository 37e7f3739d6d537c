//! The recognised shapes of `elixirc` / `mix compile` diagnostic output.
//!
//! Each shape is its own [`DiagnosticPattern`]. A [`PatternSet`] tries them in
//! priority order at a given output line and the first one that fires wins.

use crate::e_trace::TraceClassifier;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Range;

static BANNER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^== Compilation error (?:on|in) file (?P<file>\S.*?) ==\s*$")
        .expect("banner regex is valid")
});

static ERROR_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\* \((?P<kind>[^()\s]+)\) (?P<rest>.+)$").expect("error line regex is valid")
});

// What follows the banner's file name on an inline error line.
static INLINE_TAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:(?:(?P<line>\d+)(?::\d+)?:)?\s+(?P<message>\S.*)$")
        .expect("inline tail regex is valid")
});

static LOCATION_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z]:)?[^\s:]+:\d+(?::\d+)?: ").expect("location prefix regex is valid")
});

static BARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\*\* \((?P<kind>[^()\s]+)\) )?(?P<file>(?:[A-Za-z]:)?[^\s:]+)(?::(?P<line>\d+)(?::\d+)?)?: (?P<message>\S.*)$",
    )
    .expect("bare error regex is valid")
});

static WARNING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<file>(?:[A-Za-z]:)?[^\s:]+):(?P<line>\d+)(?::\d+)?: warning: (?P<message>\S.*)$",
    )
    .expect("warning regex is valid")
});

static BLOCK_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<severity>warning|error): (?P<message>\S.*)$")
        .expect("block head regex is valid")
});

// `  lib/foo.ex:5: Foo.bar/0` (1.10 - 1.14) or `    └─ lib/foo.ex:5:3: Foo.bar/0` (1.15+)
static BLOCK_LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+(?:└─\s*)?(?P<file>(?:[A-Za-z]:)?[^\s:│]+):(?P<line>\d+)(?::\d+)?(?::.*)?$")
        .expect("block location regex is valid")
});

// Source snippet line in 1.16+ blocks; wide line numbers push it to column 0.
static SNIPPET_GUTTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+ │").expect("snippet gutter regex is valid"));

const ELIXIR_EXTENSIONS: [&str; 5] = [".ex", ".exs", ".eex", ".leex", ".heex"];

/// Identifies which pattern produced a match.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum PatternTag {
    CompileErrorInline,
    CompileErrorTraced,
    CompileErrorBare,
    WarningInline,
    WarningBlock,
    CompileErrorBlock,
}

impl PatternTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::CompileErrorInline => "compile-error-inline",
            PatternTag::CompileErrorTraced => "compile-error-traced",
            PatternTag::CompileErrorBare => "compile-error-bare",
            PatternTag::WarningInline => "warning-inline",
            PatternTag::WarningBlock => "warning-block",
            PatternTag::CompileErrorBlock => "compile-error-block",
        }
    }
}

impl fmt::Display for PatternTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a pattern captured, before it is turned into a [`crate::Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub tag: PatternTag,
    pub file: String,
    /// Absent for error shapes that carry no line number.
    pub line: Option<usize>,
    pub message: String,
    /// Output lines consumed by the match, as indices into the split output.
    pub span: Range<usize>,
}

/// One recognised output shape.
///
/// `try_match` looks at `lines[at..]` and either consumes at least one line
/// starting at `at` or returns `None`. It must not look behind `at`.
pub trait DiagnosticPattern: fmt::Debug + Send + Sync {
    fn tag(&self) -> PatternTag;
    fn try_match(&self, lines: &[&str], at: usize, trace: &TraceClassifier) -> Option<RawMatch>;
}

fn banner_file(line: &str) -> Option<&str> {
    BANNER_RE
        .captures(line)
        .and_then(|caps| caps.name("file"))
        .map(|m| m.as_str())
}

/// The text after `** (Kind) ` on an error line.
fn error_rest(line: &str) -> Option<&str> {
    ERROR_LINE_RE
        .captures(line)
        .and_then(|caps| caps.name("rest"))
        .map(|m| m.as_str())
}

fn parse_line(m: Option<regex::Match<'_>>) -> Option<usize> {
    m.and_then(|m| m.as_str().parse().ok())
}

fn has_elixir_extension(file: &str) -> bool {
    ELIXIR_EXTENSIONS.iter().any(|ext| file.ends_with(ext))
}

/// `== Compilation error on file X ==` directly followed by
/// `** (Kind) X:LINE: message` naming the same `X`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineCompileError;

impl DiagnosticPattern for InlineCompileError {
    fn tag(&self) -> PatternTag {
        PatternTag::CompileErrorInline
    }

    fn try_match(&self, lines: &[&str], at: usize, _trace: &TraceClassifier) -> Option<RawMatch> {
        let file = banner_file(lines.get(at)?)?;
        let rest = error_rest(lines.get(at + 1)?)?;
        let caps = INLINE_TAIL_RE.captures(rest.strip_prefix(file)?)?;
        Some(RawMatch {
            tag: self.tag(),
            file: file.to_string(),
            line: parse_line(caps.name("line")),
            message: caps.name("message")?.as_str().to_string(),
            span: at..at + 2,
        })
    }
}

/// A banner, an error line without a location, then a trace. The error is
/// pinned to whichever frame the [`TraceClassifier`] picks as the anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracedCompileError;

impl DiagnosticPattern for TracedCompileError {
    fn tag(&self) -> PatternTag {
        PatternTag::CompileErrorTraced
    }

    fn try_match(&self, lines: &[&str], at: usize, trace: &TraceClassifier) -> Option<RawMatch> {
        let banner = banner_file(lines.get(at)?)?;
        let rest = error_rest(lines.get(at + 1)?)?;
        if LOCATION_PREFIX_RE.is_match(rest) {
            return None;
        }
        for (index, line) in lines.iter().enumerate().skip(at + 2) {
            // Argument dumps sit between blank lines; the trace goes on while
            // the next non-blank line is still indented.
            if line.trim().is_empty() {
                if resumes_indented(&lines[index + 1..]) {
                    continue;
                }
                return None;
            }
            // The first line that is not a frame ends the trace.
            let frame = trace.classify(line)?;
            if !trace.is_anchor(&frame, banner) {
                continue;
            }
            let (file, line_no) = frame.location()?;
            return Some(RawMatch {
                tag: self.tag(),
                file: file.to_string(),
                line: Some(line_no),
                message: rest.to_string(),
                span: at..index + 1,
            });
        }
        None
    }
}

fn resumes_indented(lines: &[&str]) -> bool {
    lines
        .iter()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.starts_with(char::is_whitespace))
}

/// `file:LINE: message` (optionally prefixed with `** (Kind) `) without a
/// banner, as printed for some macro expansion failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct BareError;

impl DiagnosticPattern for BareError {
    fn tag(&self) -> PatternTag {
        PatternTag::CompileErrorBare
    }

    fn try_match(&self, lines: &[&str], at: usize, _trace: &TraceClassifier) -> Option<RawMatch> {
        let caps = BARE_RE.captures(lines.get(at)?)?;
        let file = caps.name("file")?.as_str();
        let message = caps.name("message")?.as_str();
        if message.starts_with("warning:") {
            return None;
        }
        if caps.name("line").is_none() && (caps.name("kind").is_none() || !has_elixir_extension(file))
        {
            return None;
        }
        Some(RawMatch {
            tag: self.tag(),
            file: file.to_string(),
            line: parse_line(caps.name("line")),
            message: message.to_string(),
            span: at..at + 1,
        })
    }
}

/// `file:LINE: warning: message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineWarning;

impl DiagnosticPattern for InlineWarning {
    fn tag(&self) -> PatternTag {
        PatternTag::WarningInline
    }

    fn try_match(&self, lines: &[&str], at: usize, _trace: &TraceClassifier) -> Option<RawMatch> {
        let caps = WARNING_RE.captures(lines.get(at)?)?;
        Some(RawMatch {
            tag: self.tag(),
            file: caps.name("file")?.as_str().to_string(),
            line: parse_line(caps.name("line")),
            message: caps.name("message")?.as_str().to_string(),
            span: at..at + 1,
        })
    }
}

/// The multi-line layout used since Elixir 1.10: a `warning: ...` or
/// `error: ...` head, indented detail lines, then an indented location.
#[derive(Debug, Clone, Copy)]
pub struct BlockDiagnostic {
    tag: PatternTag,
    head: &'static str,
}

impl BlockDiagnostic {
    pub fn warnings() -> Self {
        BlockDiagnostic {
            tag: PatternTag::WarningBlock,
            head: "warning",
        }
    }

    pub fn errors() -> Self {
        BlockDiagnostic {
            tag: PatternTag::CompileErrorBlock,
            head: "error",
        }
    }
}

impl DiagnosticPattern for BlockDiagnostic {
    fn tag(&self) -> PatternTag {
        self.tag
    }

    fn try_match(&self, lines: &[&str], at: usize, _trace: &TraceClassifier) -> Option<RawMatch> {
        let head = BLOCK_HEAD_RE.captures(lines.get(at)?)?;
        if head.name("severity")?.as_str() != self.head {
            return None;
        }
        let message = head.name("message")?.as_str();
        for (index, line) in lines.iter().enumerate().skip(at + 1) {
            let indented = line.starts_with(char::is_whitespace) || SNIPPET_GUTTER_RE.is_match(line);
            if line.trim().is_empty() || !indented {
                return None;
            }
            if let Some(caps) = BLOCK_LOCATION_RE.captures(line) {
                return Some(RawMatch {
                    tag: self.tag,
                    file: caps.name("file")?.as_str().to_string(),
                    line: parse_line(caps.name("line")),
                    message: message.to_string(),
                    span: at..index + 1,
                });
            }
        }
        None
    }
}

/// The ordered, immutable list of patterns plus the trace classifier they share.
#[derive(Debug)]
pub struct PatternSet {
    patterns: Vec<Box<dyn DiagnosticPattern>>,
    trace: TraceClassifier,
}

/// Built-in patterns with the default trace classification.
pub static DEFAULT_PATTERNS: Lazy<PatternSet> = Lazy::new(PatternSet::default);

impl PatternSet {
    /// A set with no patterns; add them with [`PatternSet::with_pattern`].
    pub fn empty(trace: TraceClassifier) -> Self {
        PatternSet {
            patterns: Vec::new(),
            trace,
        }
    }

    /// All built-in patterns, most specific first.
    pub fn new(trace: TraceClassifier) -> Self {
        PatternSet::empty(trace)
            .with_pattern(InlineCompileError)
            .with_pattern(TracedCompileError)
            .with_pattern(BareError)
            .with_pattern(InlineWarning)
            .with_pattern(BlockDiagnostic::warnings())
            .with_pattern(BlockDiagnostic::errors())
    }

    /// Appends `pattern` with the lowest priority so far.
    pub fn with_pattern<P: DiagnosticPattern + 'static>(mut self, pattern: P) -> Self {
        self.patterns.push(Box::new(pattern));
        self
    }

    pub fn tags(&self) -> Vec<PatternTag> {
        self.patterns.iter().map(|p| p.tag()).collect()
    }

    pub fn trace(&self) -> &TraceClassifier {
        &self.trace
    }

    /// Result of the highest-priority pattern that fires at `lines[at]`.
    pub fn first_match(&self, lines: &[&str], at: usize) -> Option<RawMatch> {
        self.patterns
            .iter()
            .find_map(|pattern| {
                pattern
                    .try_match(lines, at, &self.trace)
                    .filter(|m| m.span.start == at && m.span.end > at)
            })
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        PatternSet::new(TraceClassifier::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e_trace::TraceAnchor;

    fn first(text: &str) -> Option<RawMatch> {
        let lines: Vec<&str> = text.lines().collect();
        DEFAULT_PATTERNS.first_match(&lines, 0)
    }

    #[test]
    fn test_builtin_priority_order() {
        assert_eq!(
            PatternSet::default().tags(),
            vec![
                PatternTag::CompileErrorInline,
                PatternTag::CompileErrorTraced,
                PatternTag::CompileErrorBare,
                PatternTag::WarningInline,
                PatternTag::WarningBlock,
                PatternTag::CompileErrorBlock,
            ]
        );
    }

    #[test]
    fn test_inline_compile_error() {
        let m = first(
            "== Compilation error on file web/router.ex ==\n\
             ** (CompileError) web/router.ex:19: undefined function get/2",
        )
        .unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorInline);
        assert_eq!(m.file, "web/router.ex");
        assert_eq!(m.line, Some(19));
        assert_eq!(m.message, "undefined function get/2");
        assert_eq!(m.span, 0..2);
    }

    #[test]
    fn test_inline_compile_error_newer_banner_and_no_line() {
        let m = first(
            "== Compilation error in file lib/foo.ex ==\n\
             ** (CompileError) lib/foo.ex: cannot compile module Foo (errors have been logged)",
        )
        .unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorInline);
        assert_eq!(m.line, None);
        assert_eq!(
            m.message,
            "cannot compile module Foo (errors have been logged)"
        );
    }

    #[test]
    fn test_inline_requires_identical_file() {
        // `web/router.exs` is not `web/router.ex`; the banner is left alone and
        // the error line is picked up on its own later.
        let m = first(
            "== Compilation error on file web/router.ex ==\n\
             ** (CompileError) web/router.exs:19: undefined function get/2",
        );
        assert!(m.is_none());
    }

    #[test]
    fn test_traced_compile_error_skips_library_frames() {
        let m = first(
            "== Compilation error on file web/router.ex ==\n\
             ** (FunctionClauseError) no function clause matching in Phoenix.Router.Resource.build/3\n    \
             (phoenix) lib/phoenix/router/resource.ex:30: Phoenix.Router.Resource.build(:users, UserController, [])\n    \
             web/router.ex:20: (module)\n    \
             (stdlib) erl_eval.erl:669: :erl_eval.do_apply/6",
        )
        .unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorTraced);
        assert_eq!(m.file, "web/router.ex");
        assert_eq!(m.line, Some(20));
        assert_eq!(
            m.message,
            "no function clause matching in Phoenix.Router.Resource.build/3"
        );
        assert_eq!(m.span, 0..4);
    }

    #[test]
    fn test_traced_compile_error_first_source_frame_anchor() {
        let set = PatternSet::new(TraceClassifier::new(TraceAnchor::FirstSourceFrame));
        let text = "== Compilation error on file web/router.ex ==\n\
                    ** (ArgumentError) argument error\n    \
                    (elixir) lib/kernel.ex:10: Kernel.foo/1\n    \
                    lib/helper.ex:4: Helper.run/0\n    \
                    web/router.ex:20: (module)";
        let lines: Vec<&str> = text.lines().collect();
        let m = set.first_match(&lines, 0).unwrap();
        assert_eq!(m.file, "lib/helper.ex");
        assert_eq!(m.line, Some(4));
        assert_eq!(m.span, 0..4);
    }

    #[test]
    fn test_traced_stops_at_end_of_trace() {
        let m = first(
            "== Compilation error on file web/router.ex ==\n\
             ** (ArgumentError) argument error\n    \
             (elixir) lib/kernel.ex:10: Kernel.foo/1\n\
             \n\
             Compiling 2 files (.ex)\n    \
             web/router.ex:20: (module)",
        );
        assert!(m.is_none());
        assert!(first(
            "== Compilation error on file web/router.ex ==\n\
             ** (ArgumentError) argument error\n    \
             (elixir) lib/kernel.ex:10: Kernel.foo/1\n\
             \n"
        )
        .is_none());
    }

    #[test]
    fn test_traced_skips_blank_separated_argument_dump() {
        let text = "== Compilation error on file web/router.ex ==\n\
                    ** (FunctionClauseError) no function clause matching in Phoenix.Router.Resource.build/3    \n\
                    \n    \
                    The following arguments were given:\n\
                    \n        \
                    # 1\n        \
                    :users\n\
                    \n    \
                    (phoenix) lib/phoenix/router/resource.ex:30: Phoenix.Router.Resource.build/3\n    \
                    web/router.ex:20: (module)\n";
        let m = first(text).unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorTraced);
        assert_eq!(m.file, "web/router.ex");
        assert_eq!(m.line, Some(20));
        assert_eq!(m.span, 0..10);
    }

    #[test]
    fn test_traced_rejects_located_error_line() {
        let text = "== Compilation error on file web/router.ex ==\n\
                    ** (CompileError) lib/helper.ex:3: undefined function x/0\n    \
                    web/router.ex:20: (module)";
        assert!(first(text).is_none());
        let lines: Vec<&str> = text.lines().collect();
        let m = DEFAULT_PATTERNS.first_match(&lines, 1).unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorBare);
        assert_eq!(m.file, "lib/helper.ex");
    }

    #[test]
    fn test_bare_error() {
        let m = first("web/router.ex:19: undefined function get/2").unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorBare);
        assert_eq!(m.line, Some(19));

        let m = first("** (CompileError) lib/foo.ex:3:7: undefined function bar/0").unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorBare);
        assert_eq!(m.file, "lib/foo.ex");
        assert_eq!(m.line, Some(3));
        assert_eq!(m.message, "undefined function bar/0");
    }

    #[test]
    fn test_bare_error_without_line() {
        let m = first("** (CompileError) lib/foo.ex: undefined function bar/0").unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorBare);
        assert_eq!(m.line, None);

        // Without the `** (Kind)` prefix a missing line is too loose to trust.
        assert!(first("lib/foo.ex: something happened").is_none());
        assert!(first("error: something happened").is_none());
    }

    #[test]
    fn test_indented_lines_are_not_bare_errors() {
        assert!(first("    web/router.ex:20: (module)").is_none());
    }

    #[test]
    fn test_inline_warning() {
        let m = first("lib/foo.ex:5: warning: variable \"x\" is unused").unwrap();
        assert_eq!(m.tag, PatternTag::WarningInline);
        assert_eq!(m.file, "lib/foo.ex");
        assert_eq!(m.line, Some(5));
        assert_eq!(m.message, "variable \"x\" is unused");
    }

    #[test]
    fn test_windows_drive_paths() {
        let m = first(r"C:\proj\lib\foo.ex:5: warning: variable x is unused").unwrap();
        assert_eq!(m.tag, PatternTag::WarningInline);
        assert_eq!(m.file, r"C:\proj\lib\foo.ex");
    }

    #[test]
    fn test_warning_block_1_10_layout() {
        let m = first(
            "warning: variable \"x\" is unused (if the variable is not meant to be used, prefix it with an underscore)\n  \
             lib/foo.ex:5: Foo.bar/0\n",
        )
        .unwrap();
        assert_eq!(m.tag, PatternTag::WarningBlock);
        assert_eq!(m.file, "lib/foo.ex");
        assert_eq!(m.line, Some(5));
        assert_eq!(m.span, 0..2);
    }

    #[test]
    fn test_error_block_1_15_layout() {
        let text = "    error: undefined variable \"x\"\n    \
                    │\n  \
                    3 │     x\n    \
                    │     ^\n    \
                    │\n    \
                    └─ lib/foo.ex:3:5: Foo.bar/0\n";
        let m = first(text).unwrap();
        assert_eq!(m.tag, PatternTag::CompileErrorBlock);
        assert_eq!(m.file, "lib/foo.ex");
        assert_eq!(m.line, Some(3));
        assert_eq!(m.message, "undefined variable \"x\"");
        assert_eq!(m.span, 0..6);
    }

    #[test]
    fn test_block_with_unindented_snippet_gutter() {
        let text = "warning: unused alias Foo\n     \
                    │\n\
                    1204 │   alias Foo\n     \
                    │   ~\n     \
                    │\n     \
                    └─ lib/big.ex:1204:3\n";
        let m = first(text).unwrap();
        assert_eq!(m.tag, PatternTag::WarningBlock);
        assert_eq!(m.file, "lib/big.ex");
        assert_eq!(m.line, Some(1204));
    }

    #[test]
    fn test_block_without_location() {
        assert!(first("warning: redefining module Foo\n\nlib/foo.ex:1: warning: x").is_none());
        assert!(first("error: unknown").is_none());
    }

    #[test]
    fn test_custom_pattern_is_tried_last() {
        #[derive(Debug)]
        struct Everything;
        impl DiagnosticPattern for Everything {
            fn tag(&self) -> PatternTag {
                PatternTag::CompileErrorBare
            }
            fn try_match(
                &self,
                lines: &[&str],
                at: usize,
                _trace: &TraceClassifier,
            ) -> Option<RawMatch> {
                Some(RawMatch {
                    tag: self.tag(),
                    file: "catch_all.ex".to_string(),
                    line: None,
                    message: lines.get(at)?.to_string(),
                    span: at..at + 1,
                })
            }
        }

        let set = PatternSet::default().with_pattern(Everything);
        let lines = ["lib/foo.ex:5: warning: unused", "anything"];
        assert_eq!(
            set.first_match(&lines, 0).unwrap().tag,
            PatternTag::WarningInline
        );
        assert_eq!(set.first_match(&lines, 1).unwrap().file, "catch_all.ex");
    }

    #[test]
    fn test_bad_span_falls_through_to_next_pattern() {
        #[derive(Debug)]
        struct Misplaced;
        impl DiagnosticPattern for Misplaced {
            fn tag(&self) -> PatternTag {
                PatternTag::CompileErrorBare
            }
            fn try_match(
                &self,
                _lines: &[&str],
                at: usize,
                _trace: &TraceClassifier,
            ) -> Option<RawMatch> {
                Some(RawMatch {
                    tag: self.tag(),
                    file: "misplaced.ex".to_string(),
                    line: None,
                    message: "empty span".to_string(),
                    span: at..at,
                })
            }
        }

        let set = PatternSet::empty(TraceClassifier::default())
            .with_pattern(Misplaced)
            .with_pattern(InlineWarning);
        let lines = ["lib/foo.ex:5: warning: unused"];
        let m = set.first_match(&lines, 0).unwrap();
        assert_eq!(m.tag, PatternTag::WarningInline);
        assert_eq!(m.file, "lib/foo.ex");
    }
}
