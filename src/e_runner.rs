use crate::e_command_builder::CompilerInvocation;
use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use which::which;

/// What one compiler run left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOutput {
    /// stdout followed by stderr.
    pub text: String,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Directory the compiler ran in; relative paths in `text` are relative to it.
    pub working_dir: PathBuf,
}

/// Runs the compiler. The lint driver only depends on this trait, so tests
/// and editors can plug in their own.
pub trait CompilerRunner {
    fn run(&self, invocation: &CompilerInvocation) -> Result<CompilerOutput>;
}

/// Runs the compiler as a child process and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CompilerRunner for ProcessRunner {
    fn run(&self, invocation: &CompilerInvocation) -> Result<CompilerOutput> {
        let program = which(&invocation.program)
            .with_context(|| format!("'{}' not found in PATH", invocation.program))?;
        debug!(
            "running {} (resolved to {}) in {}",
            invocation.command_line(),
            program.display(),
            invocation.working_dir.display()
        );

        let output = Command::new(&program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to run {}", invocation.command_line()))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        debug!(
            "compiler exited with {:?}, {} bytes of output",
            output.status.code(),
            text.len()
        );

        Ok(CompilerOutput {
            text,
            exit_code: output.status.code(),
            success: output.status.success(),
            working_dir: invocation.working_dir.clone(),
        })
    }
}
