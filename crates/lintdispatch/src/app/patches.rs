//! Consistency checks between `.patches` manifests and patch directories,
//! plus content policy for individual patch files.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::errors::LintError;
use crate::domain::model::{RelativePath, normalize};
use crate::infra::config;

pub const MANIFEST_FILE: &str = ".patches";
pub const CONFIG_FILE: &str = "config.json";
const README_FILE: &str = "README.md";
const PATCH_EXTENSION: &str = ".patch";

/// A `Subject:` header followed directly by the diff, with no description in between.
static MISSING_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Subject: .*$\s+^diff").expect("static regex"));

/// A non-fatal policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A file in the patch directory that the manifest does not list.
    Unlisted { manifest: PathBuf, file: String },
    /// A manifest entry with no file on disk.
    Orphan { manifest: PathBuf, entry: String },
    NoDescription { patch: String },
    TrailingWhitespace { patch: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Unlisted { manifest, file } => write!(
                f,
                "Expected the .patches file at \"{}\" to contain a patch file (\"{file}\") present in the directory but it did not",
                manifest.display()
            ),
            Finding::Orphan { manifest, entry } => write!(
                f,
                "Patch file \"{entry}\" is listed in the .patches file at \"{}\" but does not exist",
                manifest.display()
            ),
            Finding::NoDescription { patch } => write!(
                f,
                "Patch file '{patch}' has no description. Every patch must contain a justification for why the patch exists and the plan for its removal."
            ),
            Finding::TrailingWhitespace { patch } => {
                write!(f, "Patch file '{patch}' has trailing whitespace on some lines.")
            }
        }
    }
}

/// Findings gathered across both passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub findings: Vec<Finding>,
}

impl PatchReport {
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Validates every patch set under the patches directory.
#[derive(Debug, Clone)]
pub struct PatchManifestChecker {
    source_root: PathBuf,
    patches_dir: PathBuf,
    target_root: PathBuf,
}

impl PatchManifestChecker {
    /// `patches_dir` holds one subdirectory per patch set; `config.json` keys in those
    /// subdirectories are resolved against `target_root`.
    pub fn new(source_root: PathBuf, patches_dir: PathBuf, target_root: PathBuf) -> Self {
        Self {
            source_root,
            patches_dir,
            target_root,
        }
    }

    pub fn from_config(source_root: &Path, patches_dir: &Path, cfg: &config::Patches) -> Self {
        Self::new(
            source_root.to_path_buf(),
            normalize(source_root, patches_dir),
            normalize(source_root, Path::new(&cfg.target_root)),
        )
    }

    /// Run the structural pass over every patch set, then the content pass over
    /// the `.patch` files among `selected`.
    pub fn check(&self, selected: &[RelativePath]) -> Result<PatchReport, LintError> {
        let mut findings = self.check_structure()?;

        for rel in selected.iter().filter(|rel| rel.as_str().ends_with(PATCH_EXTENSION)) {
            let path = rel.to_absolute(&self.source_root);
            let bytes = fs::read(&path).map_err(|err| LintError::io(&path, err))?;
            let text = String::from_utf8_lossy(&bytes);
            findings.extend(check_patch_text(rel.as_str(), &text));
        }

        Ok(PatchReport { findings })
    }

    /// Manifest/directory agreement for every subdirectory carrying a `config.json`.
    pub fn check_structure(&self) -> Result<Vec<Finding>, LintError> {
        if !self.patches_dir.is_dir() {
            tracing::debug!(dir = %self.patches_dir.display(), "no patches directory");
            return Ok(Vec::new());
        }

        let mut findings = Vec::new();
        for patch_set in sorted_entries(&self.patches_dir)? {
            let config_path = patch_set.join(CONFIG_FILE);
            if !config_path.is_file() {
                continue;
            }

            for key in read_patch_config(&config_path)? {
                let target_dir = normalize(&self.target_root, Path::new(&key));
                findings.extend(check_manifest(&target_dir)?);
            }
        }
        Ok(findings)
    }
}

/// Top-level keys of a patch set's `config.json`.
fn read_patch_config(path: &Path) -> Result<Vec<String>, LintError> {
    let raw = fs::read_to_string(path).map_err(|err| LintError::io(path, err))?;
    let config: Map<String, Value> =
        serde_json::from_str(&raw).map_err(|source| LintError::MalformedConfig {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(config.into_iter().map(|(key, _)| key).collect())
}

/// Compare the manifest in `target_dir` with the files beside it.
pub fn check_manifest(target_dir: &Path) -> Result<Vec<Finding>, LintError> {
    if !target_dir.is_dir() {
        return Err(LintError::MissingTargetDir {
            path: target_dir.to_path_buf(),
        });
    }

    let manifest = target_dir.join(MANIFEST_FILE);
    if !manifest.is_file() {
        return Err(LintError::MissingManifest { path: manifest });
    }

    let contents = fs::read_to_string(&manifest).map_err(|err| LintError::io(&manifest, err))?;
    let declared = parse_manifest(&manifest, &contents)?;
    let mut remaining: HashSet<&str> = declared.iter().map(String::as_str).collect();

    let mut findings = Vec::new();
    for file in disk_files(target_dir)? {
        if !remaining.remove(file.as_str()) {
            findings.push(Finding::Unlisted {
                manifest: manifest.clone(),
                file,
            });
        }
    }

    findings.extend(
        declared
            .iter()
            .filter(|entry| remaining.contains(entry.as_str()))
            .map(|entry| Finding::Orphan {
                manifest: manifest.clone(),
                entry: entry.clone(),
            }),
    );
    Ok(findings)
}

/// Parse a newline-delimited manifest, rejecting duplicate entries. Blank lines are skipped.
pub fn parse_manifest(manifest: &Path, contents: &str) -> Result<Vec<String>, LintError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for line in contents.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        if !seen.insert(line) {
            return Err(LintError::DuplicateManifestEntry {
                entry: line.to_owned(),
                manifest: manifest.to_path_buf(),
            });
        }
        entries.push(line.to_owned());
    }
    Ok(entries)
}

/// Content policy for a single patch file.
pub fn check_patch_text(name: &str, text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    if MISSING_DESCRIPTION.is_match(text) {
        findings.push(Finding::NoDescription {
            patch: name.to_owned(),
        });
    }

    let trailing = text
        .split('\n')
        .filter(|line| line.starts_with('+'))
        .any(|line| line.ends_with(char::is_whitespace));
    if trailing {
        findings.push(Finding::TrailingWhitespace {
            patch: name.to_owned(),
        });
    }
    findings
}

fn disk_files(dir: &Path) -> Result<Vec<String>, LintError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| LintError::io(dir, err))? {
        let entry = entry.map_err(|err| LintError::io(dir, err))?;
        if !entry.file_type().is_ok_and(|ft| ft.is_file()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == MANIFEST_FILE || name == README_FILE {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, LintError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| LintError::io(dir, err))? {
        let entry = entry.map_err(|err| LintError::io(dir, err))?;
        if entry.file_type().is_ok_and(|ft| ft.is_dir()) {
            entries.push(entry.path());
        }
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    const CLEAN_PATCH: &str = "From 1234 Mon Sep 17 00:00:00 2001
Subject: fix: guard against null frame

The frame can be torn down before the callback fires.

diff --git a/a.cc b/a.cc
--- a/a.cc
+++ b/a.cc
@@ -1 +1,2 @@
 int a;
+int b;
";

    fn write_manifest(dir: &Path, entries: &[&str]) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(MANIFEST_FILE), entries.join("\n") + "\n")?;
        Ok(())
    }

    fn touch_all(dir: &Path, names: &[&str]) -> Result<()> {
        for name in names {
            fs::write(dir.join(name), CLEAN_PATCH)?;
        }
        Ok(())
    }

    #[test]
    fn duplicate_entry_is_fatal() -> Result<()> {
        let temp = tempfile::tempdir()?;
        write_manifest(temp.path(), &["a.patch", "a.patch"])?;
        touch_all(temp.path(), &["a.patch"])?;

        let err = check_manifest(temp.path()).unwrap_err();
        assert!(matches!(
            err,
            LintError::DuplicateManifestEntry { ref entry, .. } if entry == "a.patch"
        ));
        Ok(())
    }

    #[test]
    fn unlisted_file_is_a_finding() -> Result<()> {
        let temp = tempfile::tempdir()?;
        write_manifest(temp.path(), &["a.patch"])?;
        touch_all(temp.path(), &["a.patch", "b.patch"])?;
        fs::write(temp.path().join(README_FILE), "docs")?;

        let findings = check_manifest(temp.path())?;
        assert_eq!(
            findings,
            vec![Finding::Unlisted {
                manifest: temp.path().join(MANIFEST_FILE),
                file: "b.patch".into(),
            }]
        );
        Ok(())
    }

    #[test]
    fn orphan_entry_is_a_finding() -> Result<()> {
        let temp = tempfile::tempdir()?;
        write_manifest(temp.path(), &["a.patch", "c.patch"])?;
        touch_all(temp.path(), &["a.patch"])?;

        let findings = check_manifest(temp.path())?;
        assert_eq!(
            findings,
            vec![Finding::Orphan {
                manifest: temp.path().join(MANIFEST_FILE),
                entry: "c.patch".into(),
            }]
        );
        Ok(())
    }

    #[test]
    fn matching_manifest_has_no_findings() -> Result<()> {
        let temp = tempfile::tempdir()?;
        write_manifest(temp.path(), &["b.patch", "a.patch"])?;
        touch_all(temp.path(), &["a.patch", "b.patch"])?;
        assert!(check_manifest(temp.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn missing_target_and_manifest_are_fatal() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let missing = temp.path().join("nope");
        assert!(matches!(
            check_manifest(&missing),
            Err(LintError::MissingTargetDir { .. })
        ));
        assert!(matches!(
            check_manifest(temp.path()),
            Err(LintError::MissingManifest { .. })
        ));
        Ok(())
    }

    #[test]
    fn manifest_ignores_blank_lines_and_crlf() -> Result<()> {
        let entries = parse_manifest(Path::new(".patches"), "a.patch\r\n\r\nb.patch\n\n")?;
        assert_eq!(entries, ["a.patch", "b.patch"]);
        Ok(())
    }

    #[test]
    fn patch_without_description_is_flagged() {
        let text = "Subject: do a thing\n\ndiff --git a/x b/x\n+clean\n";
        assert_eq!(
            check_patch_text("patches/chromium/x.patch", text),
            vec![Finding::NoDescription {
                patch: "patches/chromium/x.patch".into()
            }]
        );
    }

    #[test]
    fn added_line_with_trailing_space_is_flagged() {
        let text = CLEAN_PATCH.replace("+int b;", "+int b;  ");
        assert_eq!(
            check_patch_text("x.patch", &text),
            vec![Finding::TrailingWhitespace {
                patch: "x.patch".into()
            }]
        );
    }

    #[test]
    fn context_line_whitespace_is_allowed() {
        let text = CLEAN_PATCH.replace(" int a;", " int a;   ");
        assert!(check_patch_text("x.patch", &text).is_empty());
    }

    #[test]
    fn clean_patch_passes() {
        assert!(check_patch_text("x.patch", CLEAN_PATCH).is_empty());
    }

    #[test]
    fn structure_pass_follows_config_keys() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let top = temp.path();
        let root = top.join("src/electron");
        let group = root.join("patches/common");
        let patch_set = group.join("chromium");
        fs::create_dir_all(&patch_set)?;
        fs::write(
            group.join(CONFIG_FILE),
            r#"{ "src/electron/patches/common/chromium": "src" }"#,
        )?;
        write_manifest(&patch_set, &["a.patch", "gone.patch"])?;
        touch_all(&patch_set, &["a.patch"])?;
        // Groups without a config are skipped entirely.
        fs::create_dir_all(root.join("patches/unconfigured"))?;
        fs::write(root.join("patches/unconfigured/stray.patch"), "")?;

        let checker = PatchManifestChecker::from_config(
            &root,
            Path::new("patches"),
            &config::Patches {
                target_root: "../..".into(),
            },
        );
        let findings = checker.check_structure()?;
        assert_eq!(
            findings,
            vec![Finding::Orphan {
                manifest: patch_set.join(MANIFEST_FILE),
                entry: "gone.patch".into(),
            }]
        );
        Ok(())
    }

    #[test]
    fn malformed_config_is_fatal() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("patches/v8"))?;
        fs::write(root.join("patches/v8/config.json"), "[1, 2")?;

        let checker =
            PatchManifestChecker::new(root.to_path_buf(), root.join("patches"), root.to_path_buf());
        assert!(matches!(
            checker.check_structure(),
            Err(LintError::MalformedConfig { .. })
        ));
        Ok(())
    }

    #[test]
    fn non_utf8_patches_are_still_checked() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("patches/node"))?;
        let mut latin1 = b"Subject: x\n\nKeep the accent.\n\ndiff --git a/a b/a\n+caf".to_vec();
        latin1.extend_from_slice(b"\xe9 \n");
        fs::write(root.join("patches/node/a.patch"), latin1)?;

        let checker =
            PatchManifestChecker::new(root.to_path_buf(), root.join("patches"), root.to_path_buf());
        let selected: Vec<_> = RelativePath::from_absolute(root, &root.join("patches/node/a.patch"))
            .into_iter()
            .collect();
        let report = checker.check(&selected)?;
        assert_eq!(
            report.findings,
            vec![Finding::TrailingWhitespace {
                patch: "patches/node/a.patch".into()
            }]
        );
        Ok(())
    }

    #[test]
    fn content_pass_only_reads_patch_files() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("patches/node"))?;
        fs::write(root.join("patches/node/bad.patch"), "Subject: x\ndiff --git\n")?;
        fs::write(root.join("patches/node/notes.txt"), "Subject: x\ndiff\n")?;

        let checker =
            PatchManifestChecker::new(root.to_path_buf(), root.join("patches"), root.to_path_buf());
        let selected: Vec<_> = ["patches/node/bad.patch", "patches/node/notes.txt"]
            .iter()
            .filter_map(|rel| RelativePath::from_absolute(root, &root.join(rel)))
            .collect();
        let report = checker.check(&selected)?;
        assert!(!report.passed());
        assert_eq!(
            report.findings,
            vec![Finding::NoDescription {
                patch: "patches/node/bad.patch".into()
            }]
        );
        Ok(())
    }
}
