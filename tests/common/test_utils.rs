#![allow(dead_code)]
use std::fs;
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// A throwaway Elixir project on disk.
pub struct TestProject {
    /// Removed together with everything below it when dropped.
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestProject {
    /// An empty project directory called `project_name`.
    pub fn new(project_name: &str) -> IoResult<Self> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path().join(project_name);
        fs::create_dir_all(&root)?;
        Ok(TestProject { temp_dir, root })
    }

    /// A project with a `mix.exs`, so `--mix` finds its root.
    pub fn new_mix(project_name: &str) -> IoResult<Self> {
        let project = Self::new(project_name)?;
        project.write(
            "mix.exs",
            "defmodule MyApp.MixProject do\n  use Mix.Project\n\n  def project, do: [app: :my_app, version: \"0.1.0\"]\nend\n",
        )?;
        Ok(project)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> IoResult<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_settings(&self, toml: &str) -> IoResult<PathBuf> {
        self.write(".elixirc-lint.toml", toml)
    }

    /// A stand-in compiler that prints `output` and exits with `code`,
    /// for use with `--executable`.
    #[cfg(unix)]
    pub fn fake_compiler(&self, output: &str, code: i32) -> IoResult<PathBuf> {
        use std::os::unix::fs::PermissionsExt;
        let script = format!(
            "#!/bin/sh\ncat <<'ELIXIRC_LINT_EOF'\n{}\nELIXIRC_LINT_EOF\nexit {}\n",
            output.trim_end_matches('\n'),
            code
        );
        let path = self.write("bin/fake-elixirc", &script)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }
}
