use crate::e_settings::Settings;
use log::debug;
use std::env;
use std::path::{Path, PathBuf};

pub const ELIXIRC: &str = "elixirc";
pub const MIX: &str = "mix";

/// Which front end compiles the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerKind {
    Elixirc,
    Mix,
}

impl CompilerKind {
    pub fn default_program(&self) -> &'static str {
        match self {
            CompilerKind::Elixirc => ELIXIRC,
            CompilerKind::Mix => MIX,
        }
    }
}

/// Everything needed to start the compiler once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Where `elixirc -o` writes the .beam files; must exist before running.
    pub output_dir: Option<PathBuf>,
}

impl CompilerInvocation {
    /// The command line as a single string, for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

/// Directory the compiled .beam files are thrown away into.
pub fn default_output_dir() -> PathBuf {
    env::temp_dir().join("elixirc-lint")
}

/// Nearest ancestor of `file` that holds a `mix.exs`.
pub fn mix_project_root(file: &Path) -> Option<PathBuf> {
    file.ancestors()
        .skip(1)
        .find(|dir| dir.join("mix.exs").is_file())
        .map(Path::to_path_buf)
}

/// A builder that constructs an `elixirc` or `mix compile` command line.
#[derive(Debug, Clone)]
pub struct ElixircCommandBuilder {
    kind: CompilerKind,
    program: Option<String>,
    args: Vec<String>,
    output_dir: Option<PathBuf>,
}

impl Default for ElixircCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ElixircCommandBuilder {
    /// An `elixirc` command with the flags every lint run uses.
    pub fn new() -> Self {
        ElixircCommandBuilder {
            kind: CompilerKind::Elixirc,
            program: None,
            args: vec![
                "--warnings-as-errors".to_string(),
                "--ignore-module-conflict".to_string(),
            ],
            output_dir: None,
        }
    }

    /// A `mix compile` command; compiles the whole project it runs in.
    pub fn mix() -> Self {
        ElixircCommandBuilder {
            kind: CompilerKind::Mix,
            program: None,
            args: vec!["compile".to_string()],
            output_dir: None,
        }
    }

    pub fn kind(&self) -> CompilerKind {
        self.kind
    }

    /// Runs `program` instead of the default `elixirc` / `mix`.
    pub fn with_program(mut self, program: Option<&str>) -> Self {
        self.program = program.map(str::to_string);
        self
    }

    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        if self.kind == CompilerKind::Mix {
            debug!("mix compile manages its own build directory; ignoring {}", dir.display());
            return self;
        }
        self.args.push("-o".into());
        self.args.push(dir.display().to_string());
        self.output_dir = Some(dir.to_path_buf());
        self
    }

    /// Adds `-pa <path>` for each extra code path.
    pub fn with_code_paths(mut self, paths: &[PathBuf]) -> Self {
        if self.kind == CompilerKind::Mix {
            if !paths.is_empty() {
                debug!("pa is not used with mix compile: {:?}", paths);
            }
            return self;
        }
        for path in paths {
            self.args.push("-pa".into());
            self.args.push(path.display().to_string());
        }
        self
    }

    /// Adds `-r <dir>/**/*.ex` for each include directory.
    pub fn with_include_dirs(mut self, dirs: &[PathBuf]) -> Self {
        if self.kind == CompilerKind::Mix {
            if !dirs.is_empty() {
                debug!("include_dirs is not used with mix compile: {:?}", dirs);
            }
            return self;
        }
        for dir in dirs {
            let dir = dir.display().to_string().replace('\\', "/");
            self.args.push("-r".into());
            self.args.push(format!("{}/**/*.ex", dir.trim_end_matches('/')));
        }
        self
    }

    /// Appends extra arguments to the command.
    pub fn with_extra_args(mut self, extra: &[String]) -> Self {
        self.args.extend(extra.iter().cloned());
        self
    }

    /// The file to compile. `mix compile` picks its own files, so this is a
    /// no-op there.
    pub fn with_file(mut self, file: &Path) -> Self {
        if self.kind == CompilerKind::Elixirc {
            self.args.push(file.display().to_string());
        }
        self
    }

    /// Builds the final vector of command-line arguments.
    pub fn build(self) -> Vec<String> {
        self.args
    }

    pub fn build_invocation(self, working_dir: &Path) -> CompilerInvocation {
        CompilerInvocation {
            program: self
                .program
                .unwrap_or_else(|| self.kind.default_program().to_string()),
            args: self.args,
            working_dir: working_dir.to_path_buf(),
            output_dir: self.output_dir,
        }
    }
}

/// Assembles the compiler invocation for `file` from `settings`.
pub fn invocation_for(settings: &Settings, file: &Path, working_dir: &Path) -> CompilerInvocation {
    let builder = if settings.mix_project {
        ElixircCommandBuilder::mix()
    } else {
        ElixircCommandBuilder::new()
    };
    let invocation = builder
        .with_program(settings.executable.as_deref())
        .with_output_dir(&default_output_dir())
        .with_code_paths(&settings.pa)
        .with_include_dirs(&settings.include_dirs)
        .with_extra_args(&settings.args)
        .with_file(file)
        .build_invocation(working_dir);
    debug!(
        "compiler command: {} (in {})",
        invocation.command_line(),
        invocation.working_dir.display()
    );
    invocation
}
