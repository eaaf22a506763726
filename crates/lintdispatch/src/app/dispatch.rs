//! Sequential, fail-fast dispatch of selected domains to their checkers.

use crate::app::batch::BatchPlanner;
use crate::app::selection::{FileSelector, InclusionFilter};
use crate::domain::errors::LintError;
use crate::domain::model::{FileBatch, Verdict};
use crate::domain::registry::Domain;

/// Runs one domain's checker over one batch.
pub trait Invoker {
    fn invoke(&self, domain: Domain, batch: &FileBatch) -> Result<Verdict, LintError>;
}

/// What to lint in a single run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Requested domains. Empty means every registered domain.
    pub domains: Vec<Domain>,
    pub inclusion: Option<InclusionFilter>,
}

impl RunRequest {
    /// Requested domains in registration order.
    pub fn selected_domains(&self) -> Vec<Domain> {
        Domain::ALL
            .into_iter()
            .filter(|domain| self.domains.is_empty() || self.domains.contains(domain))
            .collect()
    }
}

pub struct Dispatcher<'a> {
    selector: FileSelector<'a>,
    planner: BatchPlanner,
    invoker: &'a dyn Invoker,
}

impl<'a> Dispatcher<'a> {
    pub fn new(selector: FileSelector<'a>, planner: BatchPlanner, invoker: &'a dyn Invoker) -> Self {
        Self {
            selector,
            planner,
            invoker,
        }
    }

    /// Lint every selected domain, stopping at the first failing batch.
    pub fn run_all(&self, request: &RunRequest) -> Result<Verdict, LintError> {
        for domain in request.selected_domains() {
            let files = self.selector.select(domain, request.inclusion.as_ref());
            if files.is_empty() {
                tracing::debug!(domain = %domain, "nothing to lint");
                continue;
            }

            let noun = if files.len() == 1 { "file" } else { "files" };
            tracing::info!("linting {} {domain} {noun}", files.len());

            let planner = if domain.is_batched() {
                self.planner
            } else {
                BatchPlanner::unbounded()
            };

            for batch in planner.plan(files) {
                let verdict = self.invoker.invoke(domain, &batch)?;
                if !verdict.is_pass() {
                    tracing::debug!(domain = %domain, ?verdict, "checker failed, stopping");
                    return Ok(verdict);
                }
            }
        }
        Ok(Verdict::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};

    use anyhow::Result;

    use crate::app::filters::PathFilterSet;

    #[derive(Default)]
    struct RecordingInvoker {
        calls: RefCell<Vec<(Domain, Vec<String>)>>,
        fail: Option<(Domain, i32)>,
    }

    impl Invoker for RecordingInvoker {
        fn invoke(&self, domain: Domain, batch: &FileBatch) -> Result<Verdict, LintError> {
            let files = batch.files().iter().map(ToString::to_string).collect();
            self.calls.borrow_mut().push((domain, files));
            match self.fail {
                Some((failing, code)) if failing == domain => Ok(Verdict::Failed(code)),
                _ => Ok(Verdict::Passed),
            }
        }
    }

    fn touch(root: &Path, rel: &str) -> Result<()> {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "")?;
        Ok(())
    }

    fn fixture() -> Result<tempfile::TempDir> {
        let temp = tempfile::tempdir()?;
        touch(temp.path(), "shell/a.cc")?;
        touch(temp.path(), "script/build.py")?;
        touch(temp.path(), "lib/one.js")?;
        touch(temp.path(), "lib/two.js")?;
        touch(temp.path(), "lib/three.js")?;
        Ok(temp)
    }

    #[test]
    fn empty_request_selects_every_domain() {
        assert_eq!(RunRequest::default().selected_domains(), Domain::ALL.to_vec());
        let request = RunRequest {
            domains: vec![Domain::Patches, Domain::Cpp],
            inclusion: None,
        };
        assert_eq!(request.selected_domains(), [Domain::Cpp, Domain::Patches]);
    }

    #[test]
    fn runs_domains_in_registration_order_and_skips_empty() -> Result<()> {
        let temp = fixture()?;
        let filters = PathFilterSet::new(temp.path(), Vec::<PathBuf>::new());
        let invoker = RecordingInvoker::default();
        let dispatcher = Dispatcher::new(
            FileSelector::new(temp.path(), &filters),
            BatchPlanner::unbounded(),
            &invoker,
        );

        let verdict = dispatcher.run_all(&RunRequest::default())?;
        assert_eq!(verdict, Verdict::Passed);

        let domains: Vec<_> = invoker.calls.borrow().iter().map(|(d, _)| *d).collect();
        assert_eq!(domains, [Domain::Cpp, Domain::Python, Domain::JavaScript]);
        Ok(())
    }

    #[test]
    fn batches_follow_the_ceiling() -> Result<()> {
        let temp = fixture()?;
        let filters = PathFilterSet::new(temp.path(), Vec::<PathBuf>::new());
        let invoker = RecordingInvoker::default();
        // "lib/one.js" and friends are 10-12 characters each.
        let dispatcher = Dispatcher::new(
            FileSelector::new(temp.path(), &filters),
            BatchPlanner::new(24),
            &invoker,
        );
        let request = RunRequest {
            domains: vec![Domain::JavaScript],
            inclusion: None,
        };
        dispatcher.run_all(&request)?;

        let calls = invoker.calls.borrow();
        let batches: Vec<_> = calls.iter().map(|(_, files)| files.clone()).collect();
        assert_eq!(
            batches,
            vec![vec!["lib/one.js", "lib/three.js"], vec!["lib/two.js"]]
        );
        Ok(())
    }

    #[test]
    fn first_failure_stops_the_run() -> Result<()> {
        let temp = fixture()?;
        let filters = PathFilterSet::new(temp.path(), Vec::<PathBuf>::new());
        let invoker = RecordingInvoker {
            fail: Some((Domain::Python, 3)),
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(
            FileSelector::new(temp.path(), &filters),
            BatchPlanner::unbounded(),
            &invoker,
        );

        let verdict = dispatcher.run_all(&RunRequest::default())?;
        assert_eq!(verdict, Verdict::Failed(3));
        let domains: Vec<_> = invoker.calls.borrow().iter().map(|(d, _)| *d).collect();
        assert_eq!(domains, [Domain::Cpp, Domain::Python]);
        Ok(())
    }

    #[test]
    fn failure_in_first_batch_skips_remaining_batches() -> Result<()> {
        let temp = fixture()?;
        let filters = PathFilterSet::new(temp.path(), Vec::<PathBuf>::new());
        let invoker = RecordingInvoker {
            fail: Some((Domain::JavaScript, 1)),
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(
            FileSelector::new(temp.path(), &filters),
            BatchPlanner::new(1),
            &invoker,
        );
        let request = RunRequest {
            domains: vec![Domain::JavaScript],
            inclusion: None,
        };

        assert_eq!(dispatcher.run_all(&request)?, Verdict::Failed(1));
        assert_eq!(invoker.calls.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn patches_are_never_split() -> Result<()> {
        let temp = tempfile::tempdir()?;
        touch(temp.path(), "patches/node/a.patch")?;
        touch(temp.path(), "patches/node/b.patch")?;
        let filters = PathFilterSet::new(temp.path(), Vec::<PathBuf>::new());
        let invoker = RecordingInvoker::default();
        let dispatcher = Dispatcher::new(
            FileSelector::new(temp.path(), &filters),
            BatchPlanner::new(1),
            &invoker,
        );
        let request = RunRequest {
            domains: vec![Domain::Patches],
            inclusion: None,
        };

        dispatcher.run_all(&request)?;
        let calls = invoker.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, ["patches/node/a.patch", "patches/node/b.patch"]);
        Ok(())
    }

    #[test]
    fn single_domain_with_no_files_never_invokes() -> Result<()> {
        let temp = fixture()?;
        let filters = PathFilterSet::new(temp.path(), Vec::<PathBuf>::new());
        let invoker = RecordingInvoker::default();
        let dispatcher = Dispatcher::new(
            FileSelector::new(temp.path(), &filters),
            BatchPlanner::unbounded(),
            &invoker,
        );
        let request = RunRequest {
            domains: vec![Domain::Gn],
            inclusion: None,
        };

        assert_eq!(dispatcher.run_all(&request)?, Verdict::Passed);
        assert!(invoker.calls.borrow().is_empty());
        Ok(())
    }
}
