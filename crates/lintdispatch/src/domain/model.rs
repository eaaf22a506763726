//! Value types flowing through selection, batching, and checker invocation.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Lexically normalize `path`, resolving it against `base` when relative.
///
/// `.` components are dropped and `..` pops the previous component. The
/// filesystem is not consulted, so symlinks are left untouched.
pub fn normalize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// A path expressed relative to the source root.
///
/// This is the only form handed to checkers so that fix-patches they emit stay
/// portable between checkouts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath(String);

impl RelativePath {
    /// Strip `root` from `absolute`. Returns `None` when the path lies outside the root.
    pub fn from_absolute(root: &Path, absolute: &Path) -> Option<Self> {
        let rel = absolute.strip_prefix(root).ok()?;
        Some(Self(rel.to_string_lossy().into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, the unit the batch ceiling is expressed in.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Resolve back to an absolute path under `root`.
    pub fn to_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered group of files handed to a single checker invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBatch {
    files: Vec<RelativePath>,
}

impl FileBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: RelativePath) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[RelativePath] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of the character lengths of every path in the batch.
    pub fn total_len(&self) -> usize {
        self.files.iter().map(RelativePath::char_len).sum()
    }
}

impl From<Vec<RelativePath>> for FileBatch {
    fn from(files: Vec<RelativePath>) -> Self {
        Self { files }
    }
}

impl IntoIterator for FileBatch {
    type Item = RelativePath;
    type IntoIter = std::vec::IntoIter<RelativePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Flags forwarded to every checker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub fix: bool,
    pub verbose: bool,
}

/// Outcome of one checker invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    /// Carries the exit status to propagate. Never zero.
    Failed(i32),
}

impl Verdict {
    /// Build a verdict from a child process exit code. Signals (`None`) count as failure.
    pub fn from_status(code: Option<i32>) -> Self {
        match code {
            Some(0) => Verdict::Passed,
            Some(code) => Verdict::Failed(code),
            None => Verdict::Failed(1),
        }
    }

    pub fn from_ok(ok: bool) -> Self {
        if ok { Verdict::Passed } else { Verdict::Failed(1) }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    /// Process exit status for this verdict, clamped into `1..=255` for failures.
    pub fn exit_code(&self) -> u8 {
        match *self {
            Verdict::Passed => 0,
            Verdict::Failed(code) => u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1),
        }
    }
}
