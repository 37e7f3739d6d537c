#![doc = include_str!("../README.md")]

pub mod prelude {
    pub use std::env;
    pub use std::fs;
    pub use std::io;
    pub use std::path::{Path, PathBuf};
    pub use std::process::exit;
    pub use log::{debug, error, info, log_enabled, trace, warn, Level};
}

pub mod e_types;
pub use e_types::*;
pub mod e_cli;
pub use e_cli::Cli;
pub mod e_trace;
pub use e_trace::{TraceAnchor, TraceClassifier, TraceFrame};
pub mod e_patterns;
pub use e_patterns::{DiagnosticPattern, PatternSet, PatternTag, RawMatch, DEFAULT_PATTERNS};
pub mod e_normalize;
pub use e_normalize::normalize;
pub mod e_filter;
pub use e_filter::FileFilter;
pub mod e_extract;
pub use e_extract::{extract_diagnostics, strip_ansi, ExtractionReport, Extractor};
pub mod e_settings;
pub use e_settings::Settings;
pub mod e_command_builder;
pub use e_command_builder::{CompilerInvocation, ElixircCommandBuilder};
pub mod e_runner;
pub use e_runner::{CompilerOutput, CompilerRunner, ProcessRunner};
pub mod e_lint;
pub use e_lint::{lint_file, lint_output, LintOutcome};
pub mod e_reports;
pub use e_reports::ReportFormat;
