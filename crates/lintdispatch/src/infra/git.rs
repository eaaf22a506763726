//! Git integration utilities.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::errors::LintError;

/// Source of the staged change set.
pub trait ChangeSource {
    /// Absolute paths of every staged file under `root`.
    fn staged_files(&self, root: &Path) -> Result<Vec<PathBuf>, LintError>;
}

/// Change source backed by the `git` executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitClient;

impl GitClient {
    pub fn new() -> Self {
        Self
    }
}

impl ChangeSource for GitClient {
    fn staged_files(&self, root: &Path) -> Result<Vec<PathBuf>, LintError> {
        let output = Command::new("git")
            .args(["diff", "--name-only", "--cached", "--relative"])
            .current_dir(root)
            .output()
            .map_err(|source| LintError::Spawn {
                tool: "git".into(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LintError::ChangeSet(stderr.trim().to_owned()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let files = parse_name_list(root, &stdout);
        tracing::debug!(count = files.len(), "resolved staged files");
        Ok(files)
    }
}

/// Turn newline-delimited root-relative names into absolute paths.
pub fn parse_name_list(root: &Path, stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| root.join(line))
        .collect()
}

/// Locate the work tree containing `path`, if any.
pub fn discover_work_tree(path: &Path) -> Option<PathBuf> {
    let repo = gix::discover(path).ok()?;
    repo.work_dir()
        .map(Path::to_path_buf)
        .or_else(|| repo.path().parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_line_endings() {
        let root = Path::new("/src/electron");
        let files = parse_name_list(root, "shell/a.cc\r\nlib/b.js\n\npatches/x.patch\n");
        assert_eq!(
            files,
            vec![
                root.join("shell/a.cc"),
                root.join("lib/b.js"),
                root.join("patches/x.patch"),
            ]
        );
    }

    #[test]
    fn empty_output_means_no_changes() {
        assert!(parse_name_list(Path::new("/src"), "").is_empty());
        assert!(parse_name_list(Path::new("/src"), "\n").is_empty());
    }

    #[test]
    fn discovers_enclosing_work_tree() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        gix::init(temp.path())?;
        let nested = temp.path().join("shell/browser");
        std::fs::create_dir_all(&nested)?;

        let found = discover_work_tree(&nested).expect("work tree found");
        assert_eq!(found.canonicalize()?, temp.path().canonicalize()?);
        Ok(())
    }
}
