//! Splitting file lists to respect command-line length limits.

use crate::domain::model::{FileBatch, RelativePath};

/// Argument-length ceiling for the platform this binary was built for.
///
/// Windows caps a command line at 2047 characters; elsewhere the limit is high
/// enough that every selection fits in one batch.
#[cfg(windows)]
pub const PLATFORM_CEILING: usize = 1900;
#[cfg(not(windows))]
pub const PLATFORM_CEILING: usize = 100 * 1024;

/// Greedy batch planner over an injected ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlanner {
    ceiling: usize,
}

impl BatchPlanner {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    /// A planner that never splits.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Partition `files` in order. A file longer than the ceiling gets a batch to itself.
    pub fn plan(&self, files: Vec<RelativePath>) -> Vec<FileBatch> {
        let mut batches = Vec::new();
        let mut current = FileBatch::new();
        let mut running = 0usize;

        for file in files {
            let len = file.char_len();
            if !current.is_empty() && running.saturating_add(len) > self.ceiling {
                batches.push(std::mem::take(&mut current));
                running = 0;
            }
            running = running.saturating_add(len);
            current.push(file);
        }

        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}
