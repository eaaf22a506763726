//! External checker collaborators.
//!
//! Each checker receives a batch of root-relative paths and reports a single
//! [`Verdict`]. Tool output is passed straight through to the console, except for
//! cpplint whose status chatter on stderr is filtered.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::app::dispatch::Invoker;
use crate::app::patches::PatchManifestChecker;
use crate::domain::errors::LintError;
use crate::domain::model::{CheckOptions, FileBatch, Verdict, normalize};
use crate::domain::registry::Domain;
use crate::infra::config::Config;

const OBJC_CPPLINT_FILTERS: &[&str] = &[
    "-readability/casting",
    "-whitespace/braces",
    "-whitespace/indent",
    "-whitespace/parens",
];

/// Invokes the real tool for each domain.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    root: PathBuf,
    depot_tools: PathBuf,
    buildtools: PathBuf,
    options: CheckOptions,
    patches: PatchManifestChecker,
}

impl ToolInvoker {
    pub fn new(root: &Path, config: &Config, options: CheckOptions) -> Self {
        let patches_root = Domain::Patches.roots().first().copied().unwrap_or("patches");
        Self {
            root: root.to_path_buf(),
            depot_tools: normalize(root, Path::new(&config.tools.depot_tools)),
            buildtools: normalize(root, Path::new(&config.tools.buildtools)),
            options,
            patches: PatchManifestChecker::from_config(root, Path::new(patches_root), &config.patches),
        }
    }

    fn command(&self, program: impl AsRef<std::ffi::OsStr>) -> Command {
        let mut cmd = Command::new(program);
        cmd.current_dir(&self.root).stdin(Stdio::null());
        cmd
    }

    /// `PATH` with depot_tools appended, since developers may not have it installed globally.
    fn path_with_depot_tools(&self) -> Option<OsString> {
        let mut paths: Vec<PathBuf> = env::var_os("PATH")
            .map(|raw| env::split_paths(&raw).collect())
            .unwrap_or_default();
        paths.push(self.depot_tools.clone());
        env::join_paths(paths).ok()
    }

    fn run(&self, tool: &str, mut cmd: Command) -> Result<Verdict, LintError> {
        if self.options.verbose {
            tracing::info!(command = ?cmd, "running {tool}");
        }
        let status = cmd.status().map_err(|source| LintError::Spawn {
            tool: tool.to_owned(),
            source,
        })?;
        Ok(Verdict::from_status(status.code()))
    }

    fn clang_format(&self, batch: &FileBatch) -> Result<Verdict, LintError> {
        let mut cmd = self.command("python");
        cmd.arg("script/run-clang-format.py");
        if self.options.fix {
            cmd.arg("--fix");
        }
        cmd.args(batch.files().iter().map(|f| f.as_str()));
        self.run("clang-format", cmd)
    }

    fn cpplint(&self, extra: &[String], batch: &FileBatch) -> Result<Verdict, LintError> {
        let program = if cfg!(windows) { "cpplint.bat" } else { "cpplint.py" };
        let mut cmd = self.command(program);
        cmd.args(extra).args(batch.files().iter().map(|f| f.as_str()));
        if let Some(path) = self.path_with_depot_tools() {
            cmd.env("PATH", path);
        }
        if self.options.verbose {
            tracing::info!(command = ?cmd, "running cpplint");
        }

        let output = cmd.output().map_err(|source| LintError::Spawn {
            tool: "cpplint".into(),
            source,
        })?;

        // cpplint writes everything to stderr, status messages included.
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in relevant_cpplint_lines(&stderr) {
            tracing::warn!(target: "cpplint", "{line}");
        }
        Ok(Verdict::from_status(output.status.code()))
    }

    fn lint_native(&self, batch: &FileBatch, cpplint_args: &[String]) -> Result<Verdict, LintError> {
        let formatted = self.clang_format(batch)?;
        if !formatted.is_pass() {
            return Ok(formatted);
        }
        self.cpplint(cpplint_args, batch)
    }

    fn pylint(&self, batch: &FileBatch) -> Result<Verdict, LintError> {
        let mut cmd = self.command("pylint.py");
        cmd.arg(format!("--rcfile={}", self.depot_tools.join("pylintrc").display()))
            .args(batch.files().iter().map(|f| f.as_str()));
        if env::var_os("PYTHONPATH").is_none() {
            cmd.env("PYTHONPATH", self.root.join("script"));
        }
        if let Some(path) = self.path_with_depot_tools() {
            cmd.env("PATH", path);
        }
        self.run("pylint", cmd)
    }

    fn eslint(&self, batch: &FileBatch) -> Result<Verdict, LintError> {
        let program = if cfg!(windows) { "eslint.cmd" } else { "eslint" };
        let mut cmd = self.command(self.root.join("node_modules").join(".bin").join(program));
        if self.options.fix {
            cmd.arg("--fix");
        }
        cmd.args(["--cache", "--ext", ".js,.ts"])
            .args(batch.files().iter().map(|f| f.as_str()));
        self.run("eslint", cmd)
    }

    /// `gn format` runs once per file; every file is tried before the batch fails.
    fn gn_format(&self, batch: &FileBatch) -> Result<Verdict, LintError> {
        let program = if cfg!(windows) { "gn.bat" } else { "gn" };
        let mut ok = true;
        for file in batch.files() {
            let mut cmd = self.command(program);
            cmd.args(["format", file.as_str()]);
            if !self.options.fix {
                cmd.arg("--dry-run");
            }
            if env::var_os("CHROMIUM_BUILDTOOLS_PATH").is_none() {
                cmd.env("CHROMIUM_BUILDTOOLS_PATH", &self.buildtools);
            }
            if env::var_os("DEPOT_TOOLS_WIN_TOOLCHAIN").is_none() {
                cmd.env("DEPOT_TOOLS_WIN_TOOLCHAIN", "0");
            }
            if let Some(path) = self.path_with_depot_tools() {
                cmd.env("PATH", path);
            }

            match self.run("gn", cmd)? {
                Verdict::Passed => {}
                Verdict::Failed(2) => {
                    tracing::warn!(
                        "GN format errors in \"{file}\". Run 'gn format \"{file}\"' or rerun with --fix to fix them."
                    );
                    ok = false;
                }
                Verdict::Failed(code) => {
                    tracing::warn!("Error running 'gn format --dry-run \"{file}\"': exit code {code}");
                    ok = false;
                }
            }
        }
        Ok(Verdict::from_ok(ok))
    }

    fn patches(&self, batch: &FileBatch) -> Result<Verdict, LintError> {
        let report = self.patches.check(batch.files())?;
        for finding in &report.findings {
            tracing::warn!("{finding}");
        }
        Ok(Verdict::from_ok(report.passed()))
    }
}

impl Invoker for ToolInvoker {
    fn invoke(&self, domain: Domain, batch: &FileBatch) -> Result<Verdict, LintError> {
        match domain {
            Domain::Cpp => self.lint_native(batch, &[]),
            Domain::ObjC => self.lint_native(
                batch,
                &[
                    "--extensions=mm".to_owned(),
                    format!("--filter={}", OBJC_CPPLINT_FILTERS.join(",")),
                ],
            ),
            Domain::Python => self.pylint(batch),
            Domain::JavaScript => self.eslint(batch),
            Domain::Gn => self.gn_format(batch),
            Domain::Patches => self.patches(batch),
        }
    }
}

/// Drop cpplint's per-file progress and zero-error summary lines.
fn relevant_cpplint_lines(stderr: &str) -> impl Iterator<Item = &str> {
    stderr.split(['\r', '\n']).filter(|line| {
        !line.is_empty() && !line.starts_with("Done processing ") && *line != "Total errors found: 0"
    })
}
