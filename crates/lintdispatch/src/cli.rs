//! Command-line surface.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::app::batch::BatchPlanner;
use crate::app::dispatch::{Dispatcher, RunRequest};
use crate::app::filters::PathFilterSet;
use crate::app::selection::{FileSelector, resolve_inclusion};
use crate::domain::model::{CheckOptions, Verdict, normalize};
use crate::domain::registry::Domain;
use crate::infra::checkers::ToolInvoker;
use crate::infra::config::Config;
use crate::infra::git::{self, GitClient};

/// Run the repository linters over the files each of them owns.
///
/// With no domain flags every domain is linted.
#[derive(Debug, Parser)]
#[command(
    name = "lintdispatch",
    version,
    override_usage = "lintdispatch [--cc] [--objc] [--js] [--py] [--gn] [--patches] [-c|--changed] [-h|--help] [-v|--verbose] [--fix] [--only -- file1 file2]"
)]
pub struct Cli {
    /// Lint C++ sources and headers
    #[arg(long = "cc", visible_aliases = ["c++", "cpp", "cxx"])]
    pub cpp: bool,
    /// Lint Objective-C++ sources
    #[arg(long)]
    pub objc: bool,
    /// Lint JavaScript and TypeScript
    #[arg(long = "js", visible_aliases = ["javascript", "es"])]
    pub javascript: bool,
    /// Lint Python scripts
    #[arg(long = "py", visible_alias = "python")]
    pub python: bool,
    /// Check formatting of GN build files
    #[arg(long)]
    pub gn: bool,
    /// Check patch manifests and patch contents
    #[arg(long)]
    pub patches: bool,
    /// Only lint files staged in git
    #[arg(short, long)]
    pub changed: bool,
    /// Only lint the files given as positional arguments
    #[arg(long)]
    pub only: bool,
    /// Let checkers fix what they can
    #[arg(long)]
    pub fix: bool,
    /// Report what is being linted
    #[arg(short, long)]
    pub verbose: bool,
    /// Source root (defaults to the enclosing git work tree)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
    /// Files to lint with --only
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Parse `std::env::args`. Unknown flags print usage and exit successfully.
    pub fn parse_or_usage() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(err) if err.kind() == ErrorKind::UnknownArgument => {
                let _ = Self::command().print_help();
                std::process::exit(0);
            }
            Err(err) => err.exit(),
        }
    }

    /// Domains explicitly requested. Empty when no domain flag was given.
    pub fn domains(&self) -> Vec<Domain> {
        [
            (self.cpp, Domain::Cpp),
            (self.objc, Domain::ObjC),
            (self.python, Domain::Python),
            (self.javascript, Domain::JavaScript),
            (self.gn, Domain::Gn),
            (self.patches, Domain::Patches),
        ]
        .into_iter()
        .filter_map(|(enabled, domain)| enabled.then_some(domain))
        .collect()
    }

    pub fn options(&self) -> CheckOptions {
        CheckOptions {
            fix: self.fix,
            verbose: self.verbose,
        }
    }
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<Verdict> {
    let cwd = env::current_dir().context("unable to determine working directory")?;
    let root = resolve_root(&cwd, cli.root.as_deref())?;
    tracing::debug!(root = %root.display(), "source root");

    let config = Config::load(&root)?;
    let filters = PathFilterSet::new(&root, &config.ignore.paths);

    if !cli.only && !cli.files.is_empty() {
        tracing::debug!("positional files ignored without --only");
    }
    let explicit = cli.only.then_some(cli.files.as_slice());
    let inclusion = resolve_inclusion(&root, &cwd, cli.changed, explicit, &GitClient::new())?;

    let invoker = ToolInvoker::new(&root, &config, cli.options());
    let dispatcher = Dispatcher::new(
        FileSelector::new(&root, &filters),
        BatchPlanner::new(config.defaults.batch_ceiling()),
        &invoker,
    );

    let request = RunRequest {
        domains: cli.domains(),
        inclusion,
    };
    Ok(dispatcher.run_all(&request)?)
}

fn resolve_root(cwd: &Path, requested: Option<&Path>) -> Result<PathBuf> {
    let root = match requested {
        Some(dir) => normalize(cwd, dir),
        None => git::discover_work_tree(cwd).unwrap_or_else(|| cwd.to_path_buf()),
    };
    root.canonicalize()
        .with_context(|| format!("invalid source root: {}", root.display()))
}
