use crate::e_cli::Cli;
use crate::e_trace::{TraceAnchor, TraceClassifier};
use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project settings file.
pub const SETTINGS_FILE_NAME: &str = ".elixirc-lint.toml";

/// User settings, read from `.elixirc-lint.toml` and then overridden from the
/// command line.
///
/// ```toml
/// include_dirs = ["lib", "web"]
/// pa = ["_build/dev/lib/my_dep/ebin"]
/// mix_project = false
///
/// [trace]
/// anchor = "banner-file"
/// library_patterns = ["^deps/"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Extra source directories; every `*.ex` below them is required before compiling.
    pub include_dirs: Vec<PathBuf>,
    /// Extra code paths handed to the compiler with `-pa`.
    pub pa: Vec<PathBuf>,
    /// Run `mix compile` instead of `elixirc`.
    pub mix_project: bool,
    /// Overrides the compiler program (`elixirc` or `mix`).
    pub executable: Option<String>,
    /// Extra arguments appended to the compiler command line.
    pub args: Vec<String>,
    pub trace: TraceSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceSettings {
    pub anchor: TraceAnchor,
    /// Regexes matched against trace frame paths that should count as library code.
    pub library_patterns: Vec<String>,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid elixirc-lint settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings = Self::from_toml_str(&contents)
            .with_context(|| format!("in settings file {}", path.display()))?;
        debug!("loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// Looks for [`SETTINGS_FILE_NAME`] in `start` and each of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(SETTINGS_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Settings from `explicit` if given, otherwise from the nearest settings
    /// file above `start`, otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>, start: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::discover(start) {
                Some(path) => Self::load(&path),
                None => {
                    debug!("no {} found above {}", SETTINGS_FILE_NAME, start.display());
                    Ok(Settings::default())
                }
            },
        }
    }

    /// List options from the command line extend the file's lists; scalar
    /// options replace the file's values.
    pub fn merge_cli(&mut self, cli: &Cli) {
        self.include_dirs.extend(cli.include_dirs.iter().cloned());
        self.pa.extend(cli.pa.iter().cloned());
        self.args.extend(cli.extra.iter().cloned());
        if cli.mix {
            self.mix_project = true;
        }
        if let Some(executable) = &cli.executable {
            self.executable = Some(executable.clone());
        }
        if let Some(anchor) = cli.anchor {
            self.trace.anchor = anchor;
        }
    }

    pub fn trace_classifier(&self) -> Result<TraceClassifier> {
        TraceClassifier::new(self.trace.anchor)
            .with_library_patterns(&self.trace.library_patterns)
            .context("invalid regex in trace.library_patterns")
    }
}
