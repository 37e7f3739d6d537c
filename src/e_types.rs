use serde::{Deserialize, Serialize};
use std::fmt;

/// Line a diagnostic is anchored to when the compiler reports none.
pub const DEFAULT_LINE: usize = 1;

/// How serious a diagnostic is. The compiler only reports these two.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic, ready to hand to whatever draws it in the editor.
///
/// `file` is the path exactly as the compiler printed it (usually relative to
/// the compiler's working directory). `line` is always at least 1.
///
/// # Example
/// ```
/// use elixirc_lint::{Diagnostic, Severity};
///
/// let diag = Diagnostic {
///     file: "lib/foo.ex".to_string(),
///     line: 5,
///     severity: Severity::Warning,
///     message: "variable \"x\" is unused".to_string(),
/// };
///
/// assert_eq!(diag.to_string(), "lib/foo.ex:5: warning: variable \"x\" is unused");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.file, self.line, self.severity, self.message
        )
    }
}
