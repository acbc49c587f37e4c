//! engine::ops
//!
//! Merge, rebase, cherry-pick and pull, and the abort / continue / resolve
//! calls that get an interrupted repository back to clean.

use std::fs;

use tracing::{debug, info, warn};

use super::state::{RepoState, CONFLICTS, MERGE_MSG};
use crate::core::types::{self, ConflictSide};
use crate::core::value::Value;
use crate::error::{Error, Result};
use crate::model::Conflict;
use crate::parse::listing;
use crate::repo::Repository;

/// Engine output fragment that marks a stopped operation. Matched without
/// regard to case.
const CONFLICT_MARKER: &str = "conflict";

/// Reclassify an engine failure that reports conflicts.
fn classify_conflict(err: Error) -> Error {
    match err {
        Error::Engine { output, .. }
            if output
                .iter()
                .any(|l| l.to_lowercase().contains(CONFLICT_MARKER)) =>
        {
            Error::Conflict { output }
        }
        other => other,
    }
}

impl Repository {
    /// Current operation state, read from the marker files.
    pub fn state(&self) -> Result<RepoState> {
        self.ensure_repository()?;
        Ok(RepoState::detect(&self.control_dir()))
    }

    pub fn is_merging(&self) -> Result<bool> {
        Ok(self.state()? == RepoState::Merging)
    }

    pub fn is_rebasing(&self) -> Result<bool> {
        Ok(matches!(self.state()?, RepoState::Rebasing { .. }))
    }

    /// The message prepared for a stopped merge; empty when none is
    /// pending.
    pub fn merge_message(&self) -> Result<String> {
        self.ensure_repository()?;
        match fs::read_to_string(self.control_dir().join(MERGE_MSG)) {
            Ok(message) => Ok(message),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Run a branch-moving command, turning a conflict report into
    /// [`Error::Conflict`].
    fn run_interruptible(&self, args: &[&str]) -> Result<()> {
        match self.run_mutating(args) {
            Ok(_) => Ok(()),
            Err(e) => {
                let e = classify_conflict(e);
                if e.is_interrupted_operation() {
                    info!(command = args.first().copied().unwrap_or_default(), "stopped with conflicts");
                }
                Err(e)
            }
        }
    }

    /// Merge `reference` into the current branch.
    ///
    /// With `no_commit` the merge result is left staged; otherwise
    /// `message` replaces the default merge message.
    ///
    /// # Errors
    ///
    /// `Conflict` if the merge stopped; the repository is then merging.
    pub fn merge(&self, reference: &str, no_commit: bool, message: Option<&str>) -> Result<()> {
        let mut args = vec!["merge", reference];
        if no_commit {
            args.push("--no-commit");
        } else if let Some(message) = message {
            args.extend(["-m", message]);
        }
        self.run_interruptible(&args)
    }

    /// Replay the current branch on top of `reference`.
    pub fn rebase(&self, reference: &str) -> Result<()> {
        self.run_interruptible(&["rebase", reference])
    }

    /// Apply the changes of one commit on top of the current branch.
    pub fn cherry_pick(&self, reference: &str) -> Result<()> {
        self.run_interruptible(&["cherry-pick", reference])
    }

    /// Fetch `branch` from `remote` and merge (or rebase onto) it.
    ///
    /// Defaults to the configured remote and the current branch.
    pub fn pull(&self, remote: Option<&str>, branch: Option<&str>, rebase: bool) -> Result<()> {
        let remote = remote.unwrap_or(self.settings().remote.as_str()).to_string();
        let branch = match branch {
            Some(b) => b.to_string(),
            None => self.current_branch()?,
        };
        let mut args = vec!["pull", remote.as_str(), branch.as_str()];
        if rebase {
            args.push("--rebase");
        }
        self.run_interruptible(&args)
    }

    /// Leave a stopped merge or rebase, restoring the pre-operation head.
    ///
    /// Does nothing when the repository is clean.
    pub fn abort(&self) -> Result<()> {
        match self.state()? {
            RepoState::Rebasing { .. } => {
                self.run_mutating(&["rebase", "--abort"])?;
            }
            RepoState::Merging => {
                self.reset(types::HEAD, types::ResetMode::Hard)?;
            }
            RepoState::Clean => {
                debug!("abort: nothing in progress");
            }
        }
        self.invalidate_cache();
        Ok(())
    }

    /// Resume a stopped rebase once its conflicts are staged.
    ///
    /// Does nothing unless rebasing.
    ///
    /// # Errors
    ///
    /// `RebaseIncomplete` if the repository is still rebasing afterwards.
    pub fn continue_operation(&self) -> Result<()> {
        if !self.is_rebasing()? {
            debug!("continue: no rebase in progress");
            return Ok(());
        }
        self.run_mutating(&["rebase", "--continue"])
            .map_err(classify_conflict)?;
        if self.is_rebasing()? {
            warn!("rebase still in progress after continue");
            return Err(Error::RebaseIncomplete);
        }
        Ok(())
    }

    /// Conflicted paths of a stopped merge or rebase, in engine order.
    ///
    /// Returns an empty list without calling the engine when the conflict
    /// marker file is missing or empty.
    pub fn conflicts(&self) -> Result<Vec<Conflict<'_>>> {
        self.ensure_repository()?;
        let has_conflicts = fs::metadata(self.control_dir().join(CONFLICTS))
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !has_conflicts {
            return Ok(Vec::new());
        }
        let records = listing::parse_conflicts(&self.run(&["conflicts", "--refspecs-only"])?)?;
        Ok(records
            .iter()
            .map(|r| Conflict::from_record(self, r))
            .collect())
    }

    /// Resolve `paths` by keeping one side, then stage them.
    pub fn solve_conflicts(&self, paths: &[&str], side: ConflictSide) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["checkout", side.flag(), "-p"];
        args.extend_from_slice(paths);
        self.run(&args)?;
        self.add(paths)
    }

    /// Resolve `path` with an explicit attribute set.
    ///
    /// The path is reset to `HEAD` first so the unmerged entry is dropped,
    /// then the new version is written and staged.
    pub fn solve_conflict(&self, path: &str, values: &[(String, Value)]) -> Result<()> {
        self.reset_path(types::HEAD, path)?;
        self.insert_feature(path, values)?;
        self.add(&[path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{MERGE_HEAD, ORIG_HEAD, REBASE_BRANCH, REBASE_DIR};
    use crate::repo::{LogQuery, RepoSettings, CONTROL_DIR};
    use crate::transport::MockTransport;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BASE: &str = "1111111111111111111111111111111111111111";
    const OURS: &str = "2222222222222222222222222222222222222222";
    const THEIRS: &str = "3333333333333333333333333333333333333333";

    fn open(mock: &MockTransport) -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let control = temp.path().join(CONTROL_DIR);
        fs::create_dir(&control).unwrap();
        fs::write(control.join("HEAD"), "ref: refs/heads/master\n").unwrap();
        let repo = Repository::open_with(temp.path(), Arc::new(mock.clone()), RepoSettings::default()).unwrap();
        (temp, repo)
    }

    fn mark_merging(location: &Path) {
        let control = location.join(CONTROL_DIR);
        fs::write(control.join(ORIG_HEAD), BASE).unwrap();
        fs::write(control.join(MERGE_HEAD), THEIRS).unwrap();
        fs::write(control.join(MERGE_MSG), "Merge branch 'topic'\n").unwrap();
        fs::write(control.join(CONFLICTS), "parks/5\n").unwrap();
    }

    fn mark_rebasing(location: &Path) {
        let control = location.join(CONTROL_DIR);
        fs::write(control.join(ORIG_HEAD), BASE).unwrap();
        fs::create_dir_all(control.join(REBASE_DIR)).unwrap();
        fs::write(control.join(REBASE_DIR).join(REBASE_BRANCH), "master").unwrap();
    }

    fn clear_markers(location: &Path) {
        let control = location.join(CONTROL_DIR);
        for name in [ORIG_HEAD, MERGE_HEAD, MERGE_MSG, CONFLICTS] {
            let _ = fs::remove_file(control.join(name));
        }
        let _ = fs::remove_dir_all(control.join(REBASE_DIR));
    }

    #[test]
    fn conflict_classification_ignores_case() {
        let err = classify_conflict(Error::Engine {
            command: "merge topic".into(),
            output: vec!["CONFLICT: Merge conflict in parks/5".into()],
        });
        assert!(err.is_interrupted_operation());

        let err = classify_conflict(Error::Engine {
            command: "merge topic".into(),
            output: vec!["Ref not found".into()],
        });
        assert!(matches!(err, Error::Engine { .. }));
    }

    mod merge {
        use super::*;

        #[test]
        fn clean_merge_invalidates_cache() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.log(&LogQuery::new()).unwrap();
            repo.merge("topic", false, Some("msg")).unwrap();
            repo.log(&LogQuery::new()).unwrap();

            assert!(mock.called(&["merge", "topic", "-m", "msg"]));
            assert_eq!(mock.count(&["rev-list"]), 2);
            assert_eq!(repo.state().unwrap(), RepoState::Clean);
        }

        #[test]
        fn no_commit_wins_over_message() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.merge("topic", true, Some("ignored")).unwrap();
            assert!(mock.called(&["merge", "topic", "--no-commit"]));
        }

        #[test]
        fn conflicting_merge_enters_merging() {
            let mock = MockTransport::new().fail_with(
                &["merge", "topic"],
                &["CONFLICT: merge conflict in parks/5"],
                mark_merging,
            );
            let (_t, repo) = open(&mock);
            repo.log(&LogQuery::new()).unwrap();

            let err = repo.merge("topic", false, None).unwrap_err();
            assert!(matches!(err, Error::Conflict { .. }));
            assert!(repo.is_merging().unwrap());
            assert_eq!(repo.merge_message().unwrap(), "Merge branch 'topic'\n");

            repo.log(&LogQuery::new()).unwrap();
            assert_eq!(mock.count(&["rev-list"]), 2);
        }

        #[test]
        fn cherry_pick_and_pull_report_conflicts() {
            let mock = MockTransport::new()
                .fail(&["cherry-pick", "abc"], &["conflict in roads/1"])
                .fail(&["pull", "origin", "master", "--rebase"], &["Conflicts found"]);
            let (_t, repo) = open(&mock);
            assert!(repo.cherry_pick("abc").unwrap_err().is_interrupted_operation());
            assert!(repo.pull(None, None, true).unwrap_err().is_interrupted_operation());
        }

        #[test]
        fn pull_on_detached_head_needs_branch() {
            let mock = MockTransport::new();
            let (temp, repo) = open(&mock);
            fs::write(temp.path().join(CONTROL_DIR).join("HEAD"), BASE).unwrap();
            assert!(matches!(repo.pull(None, None, false), Err(Error::DetachedHead)));
            repo.pull(Some("mirror"), Some("dev"), false).unwrap();
            assert!(mock.called(&["pull", "mirror", "dev"]));
        }
    }

    mod abort {
        use super::*;

        #[test]
        fn clean_is_noop() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.abort().unwrap();
            repo.abort().unwrap();
            assert!(mock.calls().is_empty());
            assert_eq!(repo.state().unwrap(), RepoState::Clean);
        }

        #[test]
        fn merge_resets_hard() {
            let mock = MockTransport::new().respond_with(&["reset", "HEAD", "--hard"], &[], clear_markers);
            let (temp, repo) = open(&mock);
            mark_merging(temp.path());

            repo.abort().unwrap();
            assert!(mock.called(&["reset", "HEAD", "--hard"]));
            assert_eq!(repo.state().unwrap(), RepoState::Clean);
            assert_eq!(repo.merge_message().unwrap(), "");
        }

        #[test]
        fn rebase_aborts() {
            let mock = MockTransport::new().respond_with(&["rebase", "--abort"], &[], clear_markers);
            let (temp, repo) = open(&mock);
            mark_rebasing(temp.path());

            repo.abort().unwrap();
            assert!(mock.called(&["rebase", "--abort"]));
            assert!(!repo.is_rebasing().unwrap());
        }
    }

    mod resume {
        use super::*;

        #[test]
        fn continue_when_clean_does_nothing() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.continue_operation().unwrap();
            assert!(mock.calls().is_empty());
        }

        #[test]
        fn continue_that_finishes() {
            let mock = MockTransport::new().respond_with(&["rebase", "--continue"], &[], clear_markers);
            let (temp, repo) = open(&mock);
            mark_rebasing(temp.path());
            repo.continue_operation().unwrap();
            assert_eq!(repo.state().unwrap(), RepoState::Clean);
        }

        #[test]
        fn continue_that_stays_rebasing() {
            let mock = MockTransport::new();
            let (temp, repo) = open(&mock);
            mark_rebasing(temp.path());
            assert!(matches!(repo.continue_operation(), Err(Error::RebaseIncomplete)));
        }
    }

    mod conflicts {
        use super::*;

        #[test]
        fn empty_marker_skips_engine() {
            let mock = MockTransport::new();
            let (temp, repo) = open(&mock);
            assert!(repo.conflicts().unwrap().is_empty());
            fs::write(temp.path().join(CONTROL_DIR).join(CONFLICTS), "").unwrap();
            assert!(repo.conflicts().unwrap().is_empty());
            assert!(mock.calls().is_empty());
        }

        #[test]
        fn three_versions_per_path() {
            let mock = MockTransport::new().respond(
                &["conflicts", "--refspecs-only"],
                &[&format!("parks/5 {BASE} {OURS} {THEIRS}")],
            );
            let (temp, repo) = open(&mock);
            mark_merging(temp.path());

            let conflicts = repo.conflicts().unwrap();
            assert_eq!(conflicts.len(), 1);
            let c = &conflicts[0];
            assert_eq!(c.path, "parks/5");
            assert_eq!(c.ours.reference(), OURS);
            assert_eq!(c.theirs.refspec(), format!("{THEIRS}:parks/5"));
        }

        #[test]
        fn keep_one_side_then_stage() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.solve_conflicts(&["parks/5"], ConflictSide::Theirs).unwrap();
            let calls: Vec<String> = mock.calls().iter().map(|c| c.join(" ")).collect();
            assert_eq!(calls, vec!["checkout --theirs -p parks/5", "add parks/5"]);
        }

        #[test]
        fn explicit_resolution_resets_inserts_stages() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.solve_conflict("parks/5", &[("area".to_string(), Value::Double(1.5))])
                .unwrap();
            let commands: Vec<String> = mock.calls().iter().map(|c| c[..2].join(" ")).collect();
            assert_eq!(commands, vec!["reset HEAD", "insert -f", "add parks/5"]);
            assert!(mock.called(&["reset", "HEAD", "-p", "parks/5"]));
        }
    }
}
