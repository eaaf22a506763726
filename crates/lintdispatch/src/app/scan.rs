//! Recursive file discovery under domain roots.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ignore::{DirEntry, WalkBuilder, WalkState};

/// Directory name marking binary caches. Never descended into.
pub const SENTINEL_DIR: &str = ".bin";

/// Walks a root and collects every regular file accepted by a membership predicate.
///
/// Directory reads run in parallel; callers always get the complete, sorted result.
#[derive(Debug, Default)]
pub struct TreeScanner;

impl TreeScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan `root` recursively. A missing root yields an empty list.
    pub fn scan<F>(&self, root: &Path, membership: F) -> Vec<PathBuf>
    where
        F: Fn(&Path) -> bool + Sync,
    {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "scan root missing, skipping");
            return Vec::new();
        }

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(|entry| entry.file_name() != SENTINEL_DIR);

        let files = Mutex::new(Vec::new());
        let membership = &membership;

        builder.build_parallel().run(|| {
            let files = &files;
            Box::new(move |result| match result {
                Ok(entry) => {
                    if let Some(path) = accept(&entry, membership)
                        && let Ok(mut guard) = files.lock()
                    {
                        guard.push(path);
                    }
                    WalkState::Continue
                }
                Err(err) => {
                    tracing::warn!(error = %err, "scanner error");
                    WalkState::Continue
                }
            })
        });

        let mut files = files.into_inner().unwrap_or_else(PoisonError::into_inner);
        files.sort();
        files.dedup();
        files
    }
}

fn accept<F>(entry: &DirEntry, membership: &F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
    (is_file && membership(entry.path())).then(|| entry.path().to_path_buf())
}
