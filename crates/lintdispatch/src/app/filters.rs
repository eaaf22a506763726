//! Process-wide deny-list of paths that are never linted.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

use crate::domain::model::normalize;

/// Generated headers, vendored assets, and smoke-test fixtures using non-standard syntax.
const BUILTIN_IGNORES: &[&[&str]] = &[
    &["shell", "browser", "resources", "win", "resource.h"],
    &["shell", "browser", "notifications", "mac", "notification_center_delegate.h"],
    &["shell", "browser", "ui", "cocoa", "event_dispatching_window.h"],
    &["shell", "browser", "ui", "cocoa", "NSColor+Hex.h"],
    &["shell", "browser", "ui", "cocoa", "NSString+ANSI.h"],
    &["shell", "common", "node_includes.h"],
    &["spec", "static", "jquery-2.0.3.min.js"],
    &["spec", "ts-smoke", "electron", "main.ts"],
    &["spec", "ts-smoke", "electron", "renderer.ts"],
    &["spec", "ts-smoke", "runner.js"],
];

static BUILTIN_RELATIVE: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    BUILTIN_IGNORES
        .iter()
        .map(|tokens| tokens.iter().collect::<PathBuf>())
        .collect()
});

/// Exact-match exclusion set of absolute, normalized paths.
#[derive(Debug, Clone, Default)]
pub struct PathFilterSet {
    paths: HashSet<PathBuf>,
}

impl PathFilterSet {
    /// Resolve the built-in list plus `extra` root-relative entries against `root`.
    pub fn new<I, P>(root: &Path, extra: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut paths: HashSet<PathBuf> = BUILTIN_RELATIVE
            .iter()
            .map(|rel| normalize(root, rel))
            .collect();
        paths.extend(extra.into_iter().map(|rel| normalize(root, rel.as_ref())));
        Self { paths }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }
}
