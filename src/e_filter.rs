use crate::e_types::Diagnostic;
use std::path::{Component, Path, PathBuf};

/// Keeps only the diagnostics that belong to the inspected file.
///
/// The compiler reports paths relative to the directory it was started in,
/// which need not be the editor's directory, so both sides are resolved
/// against that working directory before being compared. Nothing here touches
/// the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    working_dir: PathBuf,
    inspected: PathBuf,
}

impl FileFilter {
    pub fn new(working_dir: impl Into<PathBuf>, inspected: impl AsRef<Path>) -> Self {
        let working_dir = working_dir.into();
        let inspected = resolve_against(&working_dir, inspected.as_ref());
        FileFilter {
            working_dir,
            inspected,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn inspected(&self) -> &Path {
        &self.inspected
    }

    /// Absolute, lexically normalized form of a path printed by the compiler.
    pub fn resolve(&self, file: &str) -> PathBuf {
        resolve_against(&self.working_dir, Path::new(file))
    }

    pub fn accepts(&self, diag: &Diagnostic) -> bool {
        !diag.file.is_empty() && self.resolve(&diag.file) == self.inspected
    }

    pub fn apply(&self, diags: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diags.into_iter().filter(|d| self.accepts(d)).collect()
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

/// Drops `.` components and folds `..` into its parent without consulting the
/// filesystem. `..` above the root is discarded.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(Component::ParentDir) | Some(Component::CurDir) | None => {
                    out.push(component)
                }
            },
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component)
            }
        }
    }
    out
}
