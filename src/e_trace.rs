//! Classification of the stack-trace lines that follow a compile error.
//!
//! The compiler prints a trace under errors raised while a module body is being
//! evaluated. Which of those frames the error should be pinned to has moved
//! around between Elixir releases, so both the frame classification and the
//! anchoring rule are configurable rather than baked into the patterns.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

// `    (app) path/to/file.ex:30: Mod.fun/3` or `    path/to/file.ex:20: (module)`
static FRAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s+(?:\((?P<app>[^()\s]+)\)\s+)?(?P<file>(?:[A-Za-z]:)?[^\s:()]+):(?P<line>\d+)(?::\d+)?(?::|\s|$)",
    )
    .expect("trace frame regex is valid")
});

/// One classified trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFrame<'a> {
    /// A frame inside a dependency or OTP application, e.g. `(phoenix) lib/...:30`.
    Library {
        app: Option<&'a str>,
        file: &'a str,
        line: usize,
    },
    /// A frame in a project source file, e.g. `web/router.ex:20: (module)`.
    Source { file: &'a str, line: usize },
    /// Anything else indented under the error: bare function names,
    /// `anonymous fn/...` frames, `(elixir) expanding macro: ...`.
    Function,
}

impl<'a> TraceFrame<'a> {
    pub fn location(&self) -> Option<(&'a str, usize)> {
        match *self {
            TraceFrame::Library { file, line, .. } | TraceFrame::Source { file, line } => {
                Some((file, line))
            }
            TraceFrame::Function => None,
        }
    }
}

/// Which frame of a trace a banner-headed error is attributed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TraceAnchor {
    /// The first frame that names the file from the compilation-error banner.
    #[default]
    BannerFile,
    /// The first frame that is not a library or function-only frame.
    FirstSourceFrame,
}

/// Decides what counts as a trace line and which frame anchors a traced error.
#[derive(Debug, Clone, Default)]
pub struct TraceClassifier {
    anchor: TraceAnchor,
    library_paths: Vec<Regex>,
}

impl TraceClassifier {
    pub fn new(anchor: TraceAnchor) -> Self {
        TraceClassifier {
            anchor,
            library_paths: Vec::new(),
        }
    }

    /// Treat source frames whose path matches any of `patterns` as library
    /// frames (e.g. `^deps/`).
    pub fn with_library_patterns<I, S>(mut self, patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.library_paths.push(Regex::new(pattern.as_ref())?);
        }
        Ok(self)
    }

    pub fn anchor(&self) -> TraceAnchor {
        self.anchor
    }

    /// Classifies `line`, or returns `None` when it is not part of a trace
    /// (blank, or not indented).
    pub fn classify<'a>(&self, line: &'a str) -> Option<TraceFrame<'a>> {
        if line.trim().is_empty() || !line.starts_with(char::is_whitespace) {
            return None;
        }
        let Some(caps) = FRAME_RE.captures(line) else {
            return Some(TraceFrame::Function);
        };
        let (Some(file), Some(line_no)) = (
            caps.name("file").map(|m| m.as_str()),
            caps.name("line").and_then(|m| m.as_str().parse::<usize>().ok()),
        ) else {
            return Some(TraceFrame::Function);
        };
        let app = caps.name("app").map(|m| m.as_str());
        if app.is_some() || self.library_paths.iter().any(|re| re.is_match(file)) {
            Some(TraceFrame::Library {
                app,
                file,
                line: line_no,
            })
        } else {
            Some(TraceFrame::Source {
                file,
                line: line_no,
            })
        }
    }

    /// Whether `frame` is where an error announced for `banner_file` belongs.
    pub fn is_anchor(&self, frame: &TraceFrame<'_>, banner_file: &str) -> bool {
        match self.anchor {
            TraceAnchor::BannerFile => frame
                .location()
                .is_some_and(|(file, _)| file == banner_file),
            TraceAnchor::FirstSourceFrame => matches!(frame, TraceFrame::Source { .. }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_library_frame() {
        let classifier = TraceClassifier::default();
        let frame = classifier.classify(
            "    (phoenix) lib/phoenix/router/resource.ex:30: Phoenix.Router.Resource.build(:users, UserController, [])",
        );
        assert_eq!(
            frame,
            Some(TraceFrame::Library {
                app: Some("phoenix"),
                file: "lib/phoenix/router/resource.ex",
                line: 30,
            })
        );
    }

    #[test]
    fn test_classify_source_and_function_frames() {
        let classifier = TraceClassifier::default();
        assert_eq!(
            classifier.classify("    web/router.ex:20: (module)"),
            Some(TraceFrame::Source {
                file: "web/router.ex",
                line: 20
            })
        );
        assert_eq!(
            classifier.classify("    (elixir) expanding macro: Kernel.def/2"),
            Some(TraceFrame::Function)
        );
        assert_eq!(
            classifier.classify("    anonymous fn/4 in Kernel.ParallelCompiler.spawn_workers/7"),
            Some(TraceFrame::Function)
        );
    }

    #[test]
    fn test_non_trace_lines() {
        let classifier = TraceClassifier::default();
        assert_eq!(classifier.classify(""), None);
        assert_eq!(classifier.classify("    "), None);
        assert_eq!(classifier.classify("web/router.ex:20: (module)"), None);
    }

    #[test]
    fn test_configured_library_paths() {
        let classifier = TraceClassifier::default()
            .with_library_patterns(["^deps/"])
            .unwrap();
        assert_eq!(
            classifier.classify("    deps/plug/lib/plug/builder.ex:12: Plug.Builder.init/1"),
            Some(TraceFrame::Library {
                app: None,
                file: "deps/plug/lib/plug/builder.ex",
                line: 12,
            })
        );
        assert!(TraceClassifier::default()
            .with_library_patterns(["("])
            .is_err());
    }

    #[test]
    fn test_anchor_policies() {
        let library = TraceFrame::Library {
            app: Some("my_app"),
            file: "web/router.ex",
            line: 7,
        };
        let source = TraceFrame::Source {
            file: "lib/other.ex",
            line: 3,
        };

        let banner = TraceClassifier::new(TraceAnchor::BannerFile);
        assert!(banner.is_anchor(&library, "web/router.ex"));
        assert!(!banner.is_anchor(&source, "web/router.ex"));
        assert!(!banner.is_anchor(&TraceFrame::Function, "web/router.ex"));

        let first_source = TraceClassifier::new(TraceAnchor::FirstSourceFrame);
        assert!(!first_source.is_anchor(&library, "web/router.ex"));
        assert!(first_source.is_anchor(&source, "web/router.ex"));
    }
}
