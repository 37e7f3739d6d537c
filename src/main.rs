//! # elixirc-lint
//!
//! `elixirc-lint` compiles one Elixir source file (with `elixirc`, or
//! `mix compile` inside a mix project) and prints the errors and warnings that
//! belong to that file, one `file:line: severity: message` per line.
//!
//! ## Quick Start
//! ```sh
//! cargo install elixirc-lint
//! elixirc-lint -I lib web/router.ex
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use elixirc_lint::e_cli::print_version_and_features;
use elixirc_lint::e_command_builder::mix_project_root;
use elixirc_lint::e_reports::{render, summary};
use elixirc_lint::prelude::*;
use elixirc_lint::{lint_file, lint_output, Cli, CompilerOutput, ProcessRunner, Settings};
use std::io::IsTerminal;

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();
    if cli.version {
        print_version_and_features();
        exit(0);
    }

    let current_dir = env::current_dir().context("failed to read the current directory")?;
    let Some(file) = cli.file.as_deref() else {
        anyhow::bail!("no source file given");
    };
    let file = current_dir.join(file);
    let start = file.parent().unwrap_or(current_dir.as_path());

    let mut settings = Settings::resolve(cli.config.as_deref(), start)?;
    settings.merge_cli(&cli);
    debug!("settings: {:?}", settings);

    let working_dir = match &cli.cwd {
        Some(dir) => current_dir.join(dir),
        None if settings.mix_project => mix_project_root(&file).unwrap_or_else(|| {
            warn!("no mix.exs above {}; compiling in {}", file.display(), current_dir.display());
            current_dir.clone()
        }),
        None => current_dir.clone(),
    };

    let report = if cli.stdin {
        let text = io::read_to_string(io::stdin()).context("failed to read compiler output from stdin")?;
        let output = CompilerOutput {
            text,
            exit_code: None,
            success: true,
            working_dir,
        };
        lint_output(&settings, &output, &file)?
    } else {
        lint_file(&settings, &file, &working_dir, &ProcessRunner)?.report
    };

    let uses_color = !cli.no_color && io::stdout().is_terminal();
    let rendered = render(&report.diagnostics, cli.format, uses_color)?;
    if !rendered.is_empty() {
        println!("{}", rendered);
    }
    info!("{}", summary(&report.diagnostics));

    if report.diagnostics.iter().any(|diag| diag.is_error()) {
        exit(1);
    }
    Ok(())
}
