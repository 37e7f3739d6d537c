use crate::e_patterns::{PatternTag, RawMatch};
use crate::e_types::{Diagnostic, Severity, DEFAULT_LINE};

/// Severity implied by the pattern that fired.
pub fn severity_for(tag: PatternTag) -> Severity {
    match tag {
        PatternTag::CompileErrorInline
        | PatternTag::CompileErrorTraced
        | PatternTag::CompileErrorBare
        | PatternTag::CompileErrorBlock => Severity::Error,
        PatternTag::WarningInline | PatternTag::WarningBlock => Severity::Warning,
    }
}

/// Turns a raw match into the canonical record. A missing (or zero) line
/// number becomes [`DEFAULT_LINE`].
pub fn normalize(raw: &RawMatch) -> Diagnostic {
    Diagnostic {
        file: raw.file.clone(),
        line: raw
            .line
            .filter(|line| *line >= 1)
            .unwrap_or(DEFAULT_LINE),
        severity: severity_for(raw.tag),
        message: raw.message.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(tag: PatternTag, line: Option<usize>) -> RawMatch {
        RawMatch {
            tag,
            file: "web/router.ex".to_string(),
            line,
            message: " undefined function get/2 ".to_string(),
            span: 0..1,
        }
    }

    #[test]
    fn test_every_tag_has_one_severity() {
        let cases = [
            (PatternTag::CompileErrorInline, Severity::Error),
            (PatternTag::CompileErrorTraced, Severity::Error),
            (PatternTag::CompileErrorBare, Severity::Error),
            (PatternTag::CompileErrorBlock, Severity::Error),
            (PatternTag::WarningInline, Severity::Warning),
            (PatternTag::WarningBlock, Severity::Warning),
        ];
        for (tag, severity) in cases {
            let diag = normalize(&raw(tag, Some(19)));
            assert_eq!(diag.severity, severity, "{tag}");
            assert_eq!(diag.line, 19);
            assert_eq!(diag.file, "web/router.ex");
            assert_eq!(diag.message, "undefined function get/2");
        }
    }

    #[test]
    fn test_missing_line_defaults_to_one() {
        assert_eq!(normalize(&raw(PatternTag::CompileErrorBare, None)).line, 1);
        assert_eq!(normalize(&raw(PatternTag::CompileErrorBare, Some(0))).line, 1);
    }

    #[test]
    fn test_normalize_is_pure() {
        let m = raw(PatternTag::CompileErrorTraced, Some(20));
        assert_eq!(normalize(&m), normalize(&m));
    }
}
