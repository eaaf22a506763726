//! File selection for a single lint domain.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::app::filters::PathFilterSet;
use crate::app::scan::TreeScanner;
use crate::domain::errors::LintError;
use crate::domain::model::{RelativePath, normalize};
use crate::domain::registry::Domain;
use crate::infra::git::ChangeSource;

/// Restricts selection to a known set of absolute paths.
///
/// Built either from the staged change set or from an explicit file list; the
/// selector does not care which.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionFilter {
    paths: HashSet<PathBuf>,
}

impl InclusionFilter {
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn admits(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Build the run-wide inclusion filter from `--changed` / `--only` intent.
///
/// An empty staged set short-circuits to an empty filter. When an explicit list is
/// present it replaces the staged set. Explicit paths are resolved against `cwd`.
pub fn resolve_inclusion(
    root: &Path,
    cwd: &Path,
    changed_only: bool,
    explicit: Option<&[PathBuf]>,
    changes: &dyn ChangeSource,
) -> Result<Option<InclusionFilter>, LintError> {
    let mut filter = None;

    if changed_only {
        let staged = changes.staged_files(root)?;
        if staged.is_empty() {
            return Ok(Some(InclusionFilter::default()));
        }
        filter = Some(InclusionFilter::from_paths(staged));
    }

    if let Some(explicit) = explicit {
        filter = Some(InclusionFilter::from_paths(
            explicit.iter().map(|path| normalize(cwd, path)),
        ));
    }

    Ok(filter)
}

/// Produces the ordered, deduplicated, root-relative file list for a domain.
#[derive(Debug)]
pub struct FileSelector<'a> {
    root: &'a Path,
    filters: &'a PathFilterSet,
    scanner: TreeScanner,
}

impl<'a> FileSelector<'a> {
    pub fn new(root: &'a Path, filters: &'a PathFilterSet) -> Self {
        Self {
            root,
            filters,
            scanner: TreeScanner::new(),
        }
    }

    pub fn select(&self, domain: Domain, inclusion: Option<&InclusionFilter>) -> Vec<RelativePath> {
        if inclusion.is_some_and(InclusionFilter::is_empty) {
            return Vec::new();
        }

        let membership = |path: &Path| domain.is_member(path);

        let mut candidates: BTreeSet<PathBuf> = domain
            .roots()
            .iter()
            .flat_map(|rel| self.scanner.scan(&normalize(self.root, Path::new(rel)), membership))
            .collect();

        for rel in domain.exclusion_roots() {
            let dir = self.root.join(rel);
            if !dir.exists() {
                continue;
            }
            let excluded: HashSet<PathBuf> = self.scanner.scan(&dir, membership).into_iter().collect();
            candidates.retain(|path| !excluded.contains(path));
        }

        candidates
            .into_iter()
            .filter(|path| !self.filters.is_excluded(path))
            .filter(|path| inclusion.is_none_or(|filter| filter.admits(path)))
            .filter_map(|path| RelativePath::from_absolute(self.root, &path))
            .collect()
    }
}
