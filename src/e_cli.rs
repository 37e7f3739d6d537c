use crate::e_reports::ReportFormat;
use crate::e_trace::TraceAnchor;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile an Elixir file and report the diagnostics that belong to it.", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version and feature flags in JSON format.
    #[arg(
        long,
        short = 'v',
        help = "Print version and feature flags in JSON format."
    )]
    pub version: bool,

    #[arg(
        long,
        short = 'C',
        help = "Directory the compiler runs in (default: current directory, or the mix project root with --mix)."
    )]
    pub cwd: Option<PathBuf>,

    #[arg(
        long = "include-dir",
        short = 'I',
        help = "Extra source directory whose *.ex files are required first. Repeatable."
    )]
    pub include_dirs: Vec<PathBuf>,

    #[arg(long, help = "Extra code path passed to the compiler with -pa. Repeatable.")]
    pub pa: Vec<PathBuf>,

    #[arg(long, short = 'm', help = "Run `mix compile` instead of `elixirc`.")]
    pub mix: bool,

    #[arg(
        long,
        short = 'c',
        help = "Settings file (default: nearest .elixirc-lint.toml)."
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Compiler program to run instead of elixirc / mix.")]
    pub executable: Option<String>,

    #[arg(
        long,
        value_enum,
        help = "Which trace frame a traced compile error is attributed to."
    )]
    pub anchor: Option<TraceAnchor>,

    #[arg(
        long,
        help = "Read compiler output from stdin instead of running the compiler."
    )]
    pub stdin: bool,

    #[arg(
        long,
        value_enum,
        default_value_t = ReportFormat::Text,
        help = "Output format."
    )]
    pub format: ReportFormat,

    #[arg(long, help = "Disable coloured output.")]
    pub no_color: bool,

    #[arg(
        required_unless_present = "version",
        help = "The Elixir source file being edited."
    )]
    pub file: Option<PathBuf>,

    #[arg(last = true, help = "Additional arguments passed to the compiler.")]
    pub extra: Vec<String>,
}

/// Print the version and the JSON array of feature flags.
pub fn print_version_and_features() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown");
    let json_features = format!(
        "[{}]",
        get_feature_flags()
            .iter()
            .map(|f| format!("\"{}\"", f))
            .collect::<Vec<String>>()
            .join(", ")
    );
    println!("elixirc-lint {}", version);
    println!("{}", json_features);
}

/// Returns a vector of feature flag strings.
/// Enabled features are listed as-is while disabled ones are prefixed with "!".
pub fn get_feature_flags() -> Vec<&'static str> {
    let mut flags = Vec::new();
    if cfg!(feature = "uses_serde") {
        flags.push("uses_serde");
    } else {
        flags.push("!uses_serde");
    }
    flags
}
