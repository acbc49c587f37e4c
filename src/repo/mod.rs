//! repo
//!
//! The repository handle.
//!
//! # Overview
//!
//! A [`Repository`] binds a location on disk to a [`Transport`]. Every
//! operation builds an argument vector, runs it through the transport and
//! hands the output to a parser from [`crate::parse`].
//!
//! # Caching
//!
//! Two caches live on the handle:
//! - the argument-free `log` result, dropped by every call that can move a
//!   branch (commit, reset, checkout, merge, rebase, cherry-pick, pull, ...)
//! - commits by id, which never go stale because ids are content hashes
//!
//! Caches are per handle. A handle is `Send` but not `Sync`; share it across
//! threads only behind a lock.
//!
//! # Modules
//!
//! - [`history`]: log queries, commit lookup, ahead/behind counts
//! - [`contents`]: listings, feature data, insert and remove
//! - [`diff`]: path diffs, tree statistics, feature and tree diffs
//! - [`interchange`]: import and export pass-throughs
//! - [`remote`]: read-only queries against repositories served over HTTP

pub mod contents;
pub mod diff;
pub mod history;
pub mod interchange;
pub mod remote;

pub use history::LogQuery;
pub use remote::HttpRemote;
pub use interchange::{ImportOptions, MappingSource, OsmField, OsmMapping, OsmMappingRule, PgConnection};

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::core::config::Config;
use crate::core::types::{self, ObjectId, ResetMode};
use crate::error::{Error, Result};
use crate::model::{Commit, Commitish, Tag};
use crate::parse::listing;
use crate::parse::TimestampMode;
use crate::transport::Transport;

/// Name of the engine's control directory.
pub const CONTROL_DIR: &str = ".geogig";

/// Per-repository settings taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSettings {
    /// How signature timestamps are read from log output.
    pub timestamps: TimestampMode,
    /// Remote used when none is named.
    pub remote: String,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            timestamps: TimestampMode::default(),
            remote: types::ORIGIN.to_string(),
        }
    }
}

/// Handle to one versioned store.
pub struct Repository {
    location: PathBuf,
    transport: Arc<dyn Transport>,
    settings: RepoSettings,
    log_cache: RefCell<Option<Arc<Vec<Commit>>>>,
    commits: RefCell<HashMap<ObjectId, Commit>>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("location", &self.location)
            .field("transport", &self.transport.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Repository {
    /// Open an existing repository with the configuration found for it.
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        let location = location.as_ref();
        let config = Config::load(Some(location))?.config;
        let transport = config.transport().map_err(|e| Error::Transport {
            message: e.to_string(),
        })?;
        Self::open_with(location, transport, config.settings())
    }

    /// Open an existing repository over an explicit transport.
    ///
    /// # Errors
    ///
    /// `NotARepository` if the location has no control directory.
    pub fn open_with(
        location: impl Into<PathBuf>,
        transport: Arc<dyn Transport>,
        settings: RepoSettings,
    ) -> Result<Self> {
        let repo = Self::unchecked(location.into(), transport, settings);
        repo.ensure_repository()?;
        debug!(location = %repo.location.display(), transport = repo.transport.name(), "opened repository");
        Ok(repo)
    }

    fn unchecked(location: PathBuf, transport: Arc<dyn Transport>, settings: RepoSettings) -> Self {
        Self {
            location,
            transport,
            settings,
            log_cache: RefCell::new(None),
            commits: RefCell::new(HashMap::new()),
        }
    }

    /// Create the directory if needed and initialize a new repository.
    ///
    /// `params` are passed to the engine as `key=value,key=value`.
    ///
    /// # Errors
    ///
    /// `AlreadyARepository` if the location is already initialized.
    pub fn init(
        location: impl Into<PathBuf>,
        transport: Arc<dyn Transport>,
        settings: RepoSettings,
        params: &[(&str, &str)],
    ) -> Result<Self> {
        let location = location.into();
        fs::create_dir_all(&location)?;
        if location.join(CONTROL_DIR).exists() {
            return Err(Error::AlreadyARepository { path: location });
        }

        let repo = Self::unchecked(location, transport, settings);
        let mut args = vec!["init".to_string()];
        if !params.is_empty() {
            let joined: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            args.push(joined.join(","));
        }
        repo.run(&args)?;
        repo.ensure_repository()?;
        debug!(location = %repo.location.display(), "initialized repository");
        Ok(repo)
    }

    /// Clone `url` into `dest` and open the result.
    pub fn clone_from(
        url: &str,
        dest: impl Into<PathBuf>,
        transport: Arc<dyn Transport>,
        settings: RepoSettings,
        credentials: Option<(&str, &str)>,
    ) -> Result<Self> {
        let dest = dest.into();
        let dest = if dest.is_absolute() {
            dest
        } else {
            std::env::current_dir()?.join(dest)
        };
        let workdir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&workdir)?;

        let mut args = vec![
            "clone".to_string(),
            url.to_string(),
            dest.display().to_string(),
        ];
        if let Some((user, password)) = credentials {
            args.extend(["--username", user, "--password", password].map(String::from));
        }
        let staging = Self::unchecked(workdir, Arc::clone(&transport), settings.clone());
        staging.run(&args)?;

        Self::open_with(dest, transport, settings)
    }

    /// Clone this repository into `dest`, sharing this handle's transport.
    pub fn clone_to(&self, dest: impl Into<PathBuf>) -> Result<Repository> {
        let url = self.location.display().to_string().replace('\\', "/");
        Self::clone_from(
            &url,
            dest,
            Arc::clone(&self.transport),
            self.settings.clone(),
            None,
        )
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn settings(&self) -> &RepoSettings {
        &self.settings
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn control_dir(&self) -> PathBuf {
        self.location.join(CONTROL_DIR)
    }

    pub(crate) fn ensure_repository(&self) -> Result<()> {
        if self.control_dir().is_dir() {
            Ok(())
        } else {
            Err(Error::NotARepository {
                path: self.location.clone(),
            })
        }
    }

    // =========================================================================
    // Engine calls
    // =========================================================================

    /// Run a read-only command.
    pub(crate) fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<String>> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        self.transport
            .execute(&self.location, &args)
            .map_err(|e| Error::from_transport(&args, e))
    }

    /// Run a command that can move a branch. The log cache is dropped
    /// whether or not the command succeeds.
    pub(crate) fn run_mutating<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<String>> {
        let result = self.run(args);
        self.invalidate_cache();
        result
    }

    /// Forget the cached log.
    pub fn invalidate_cache(&self) {
        if self.log_cache.borrow_mut().take().is_some() {
            trace!(location = %self.location.display(), "log cache invalidated");
        }
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Resolve a reference to an absolute id.
    ///
    /// Canonical ids are returned without asking the engine.
    ///
    /// # Errors
    ///
    /// `ReferenceResolution` if the engine rejects the reference or answers
    /// with something that is not a 40-character id.
    pub fn revparse(&self, reference: &str) -> Result<ObjectId> {
        if ObjectId::is_canonical(reference) {
            return ObjectId::new(reference).map_err(|_| Error::ReferenceResolution {
                reference: reference.to_string(),
                output: Vec::new(),
            });
        }
        let output = self
            .run(&["rev-parse", reference])
            .map_err(|e| match e {
                Error::Engine { output, .. } => Error::ReferenceResolution {
                    reference: reference.to_string(),
                    output,
                },
                other => other,
            })?;
        let first = output.first().map(|l| l.trim()).unwrap_or_default();
        ObjectId::new(first).map_err(|_| Error::ReferenceResolution {
            reference: reference.to_string(),
            output: output.clone(),
        })
    }

    /// A handle on an arbitrary reference.
    pub fn commitish(&self, reference: &str) -> Commitish<'_> {
        Commitish::new(self, reference)
    }

    /// Name of the checked-out branch, or the commit id when detached,
    /// read from the `HEAD` marker.
    pub fn head_name(&self) -> Result<String> {
        self.ensure_repository()?;
        let contents = fs::read_to_string(self.control_dir().join("HEAD"))?;
        let reference = contents
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().last())
            .unwrap_or_default();
        Ok(reference
            .strip_prefix("refs/heads/")
            .unwrap_or(reference)
            .to_string())
    }

    pub fn head(&self) -> Result<Commitish<'_>> {
        Ok(Commitish::new(self, self.head_name()?))
    }

    /// True when `HEAD` names a commit rather than a branch.
    pub fn is_detached(&self) -> Result<bool> {
        Ok(ObjectId::is_canonical(&self.head_name()?))
    }

    /// The staging area.
    pub fn index(&self) -> Commitish<'_> {
        Commitish::new(self, types::STAGE_HEAD)
    }

    pub fn working_tree(&self) -> Commitish<'_> {
        Commitish::new(self, types::WORK_HEAD)
    }

    pub fn master(&self) -> Commitish<'_> {
        Commitish::new(self, types::MASTER)
    }

    /// The current branch, or `DetachedHead`.
    pub(crate) fn current_branch(&self) -> Result<String> {
        if self.is_detached()? {
            return Err(Error::DetachedHead);
        }
        self.head_name()
    }

    pub fn branches(&self) -> Result<BTreeMap<String, ObjectId>> {
        let output = self.run(&["show-ref"])?;
        Ok(listing::parse_refs(&output, "refs/heads/")?)
    }

    pub fn tags(&self) -> Result<BTreeMap<String, Tag>> {
        let output = self.run(&["show-ref"])?;
        let refs = listing::parse_refs(&output, "refs/tags/")?;
        Ok(refs
            .into_iter()
            .map(|(name, id)| (name.clone(), Tag::new(name, id)))
            .collect())
    }

    /// Create a branch at `reference`. With `checkout` the new branch is
    /// also checked out.
    pub fn create_branch(&self, reference: &str, name: &str, force: bool, checkout: bool) -> Result<Commitish<'_>> {
        types::BranchName::new(name).map_err(|e| Error::InvalidArgument(e.to_string()))?;
        let mut args = vec!["branch", name, reference];
        if force {
            args.push("-f");
        }
        if checkout {
            args.push("-c");
            self.run_mutating(&args)?;
        } else {
            self.run(&args)?;
        }
        Ok(Commitish::new(self, name))
    }

    pub fn delete_branch(&self, name: &str) -> Result<()> {
        self.run(&["branch", "-d", name]).map(drop)
    }

    pub fn create_tag(&self, reference: &str, name: &str, message: &str) -> Result<()> {
        self.run(&["tag", name, reference, "-m", message]).map(drop)
    }

    pub fn delete_tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", "-d", name]).map(drop)
    }

    // =========================================================================
    // Remotes and configuration
    // =========================================================================

    /// Remote names and urls.
    pub fn remotes(&self) -> Result<BTreeMap<String, String>> {
        Ok(listing::parse_remotes(&self.run(&["remote", "list", "-v"])?))
    }

    pub fn add_remote(&self, name: &str, url: &str, credentials: Option<(&str, &str)>) -> Result<()> {
        let args = match credentials {
            Some((user, password)) => vec!["remote", "add", "-u", user, "--password", password, name, url],
            None => vec!["remote", "add", name, url],
        };
        self.run(&args).map(drop)
    }

    pub fn remove_remote(&self, name: &str) -> Result<()> {
        self.run(&["remote", "rm", name]).map(drop)
    }

    /// Set an engine configuration value.
    pub fn config(&self, key: &str, value: &str, global: bool) -> Result<()> {
        let mut args = vec!["config", key, value];
        if global {
            args.push("--global");
        }
        self.run(&args).map(drop)
    }

    /// Read an engine configuration value; `None` when unset.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let output = self.run(&["config", "--get", key])?;
        Ok(output.into_iter().next().filter(|v| !v.is_empty()))
    }

    // =========================================================================
    // Working tree and history updates
    // =========================================================================

    /// Stage paths; every unstaged change when `paths` is empty.
    pub fn add(&self, paths: &[&str]) -> Result<()> {
        if paths.is_empty() {
            return self.run(&["add"]).map(drop);
        }
        for path in paths {
            self.run(&["add", path])?;
        }
        Ok(())
    }

    /// Commit staged changes, restricted to `paths` when given.
    ///
    /// # Errors
    ///
    /// `UnconfiguredIdentity` when the engine has no author name or email.
    pub fn commit(&self, message: &str, paths: &[&str]) -> Result<()> {
        let mut args = vec!["commit", "-m", message];
        args.extend_from_slice(paths);
        match self.run_mutating(&args) {
            Err(e) if e.output_contains("user.name not found") || e.output_contains("user.email not found") => {
                Err(Error::UnconfiguredIdentity {
                    output: e.output().to_vec(),
                })
            }
            other => other.map(drop),
        }
    }

    pub fn add_and_commit(&self, message: &str, paths: &[&str]) -> Result<()> {
        self.add(paths)?;
        self.commit(message, paths)
    }

    /// Check out `reference`, or only `paths` from it.
    ///
    /// `force` applies to whole-tree checkouts only.
    pub fn checkout(&self, reference: &str, paths: &[&str], force: bool) -> Result<()> {
        let mut args = vec!["checkout", reference];
        if !paths.is_empty() {
            args.push("-p");
            args.extend_from_slice(paths);
        } else if force {
            args.push("--force");
        }
        self.run_mutating(&args).map(drop)
    }

    /// Move the current branch to `reference`.
    pub fn reset(&self, reference: &str, mode: ResetMode) -> Result<()> {
        self.run_mutating(&["reset", reference, mode.flag()]).map(drop)
    }

    /// Reset a single path to its version at `reference`.
    pub fn reset_path(&self, reference: &str, path: &str) -> Result<()> {
        self.run_mutating(&["reset", reference, "-p", path]).map(drop)
    }

    /// Bring `paths` to their versions at `reference`, clearing any
    /// conflict on them.
    pub fn update_path_to_ref(&self, reference: &str, paths: &[&str]) -> Result<()> {
        for path in paths {
            self.reset_path(reference, path)?;
        }
        self.checkout(reference, paths, false)
    }

    /// Push `branch` (the current one by default), or every branch.
    pub fn push(&self, remote: Option<&str>, branch: Option<&str>, all: bool) -> Result<()> {
        let remote = remote.unwrap_or(self.settings.remote.as_str());
        if all {
            return self.run(&["push", remote, "--all"]).map(drop);
        }
        let branch = match branch {
            Some(b) => b.to_string(),
            None => self.current_branch()?,
        };
        self.run(&["push", remote, &branch]).map(drop)
    }

    /// When the control directory was created.
    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        let meta = fs::metadata(self.control_dir())?;
        let time = meta.created().or_else(|_| meta.modified())?;
        Ok(time.into())
    }
}
