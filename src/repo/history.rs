//! repo::history
//!
//! Log queries and commit lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use super::remote::HttpRemote;
use super::Repository;
use crate::core::types::{self, ObjectId};
use crate::error::{Error, Result};
use crate::model::Commit;
use crate::parse::parse_commits;

/// Engine message for a history with no commits yet.
const EMPTY_HISTORY: &str = "HEAD does not resolve";
/// Engine message when two refs share no history.
const NO_COMMON_ANCESTOR: &str = "No common ancestor";

/// Filters for [`Repository::log`].
///
/// The default query (tip `HEAD`, no filters) is the cached one.
///
/// ```
/// use geogig_porcelain::repo::LogQuery;
///
/// assert!(LogQuery::new().is_default());
/// assert!(LogQuery::new().tip("HEAD").is_default());
/// assert!(!LogQuery::new().path("parks").is_default());
/// assert_eq!(
///     LogQuery::new().since_commit("v1").tip("master").limit(3).args(),
///     vec!["rev-list", "v1..master", "-n", "3"],
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    tip: Option<String>,
    since_commit: Option<String>,
    since: Option<String>,
    until: Option<String>,
    paths: Vec<String>,
    limit: Option<usize>,
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `tip` instead of `HEAD`.
    pub fn tip(mut self, tip: impl Into<String>) -> Self {
        self.tip = Some(tip.into());
        self
    }

    /// Exclude commits reachable from `commit`.
    pub fn since_commit(mut self, commit: impl Into<String>) -> Self {
        self.since_commit = Some(commit.into());
        self
    }

    /// Only commits after `date`, in any form the engine accepts.
    pub fn since(mut self, date: impl Into<String>) -> Self {
        self.since = Some(date.into());
        self
    }

    /// Only commits before `date`, in any form the engine accepts.
    pub fn until(mut self, date: impl Into<String>) -> Self {
        self.until = Some(date.into());
        self
    }

    /// Only commits touching `path`. May be given more than once.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// True for the argument-free query on `HEAD`.
    pub fn is_default(&self) -> bool {
        let tip_is_head = self.tip.as_deref().map_or(true, |t| t == types::HEAD);
        tip_is_head
            && self.since_commit.is_none()
            && self.since.is_none()
            && self.until.is_none()
            && self.paths.is_empty()
            && self.limit.is_none()
    }

    /// The `rev-list` command line for this query.
    pub fn args(&self) -> Vec<String> {
        let tip = self.tip.as_deref().unwrap_or(types::HEAD);
        let range = match &self.since_commit {
            Some(since) => format!("{since}..{tip}"),
            None => tip.to_string(),
        };
        let mut args = vec!["rev-list".to_string(), range];
        if !self.paths.is_empty() {
            args.push("-p".into());
            args.extend(self.paths.iter().cloned());
        }
        if let Some(until) = &self.until {
            args.extend(["--until".to_string(), until.clone()]);
        }
        if let Some(since) = &self.since {
            args.extend(["--since".to_string(), since.clone()]);
        }
        if let Some(n) = self.limit {
            args.extend(["-n".to_string(), n.to_string()]);
        }
        args
    }
}

impl Repository {
    /// Commits matching `query`, newest first.
    ///
    /// A repository without commits yields an empty list. The default query
    /// is answered from cache until something moves a branch.
    pub fn log(&self, query: &LogQuery) -> Result<Arc<Vec<Commit>>> {
        let cacheable = query.is_default();
        if cacheable {
            if let Some(cached) = self.log_cache.borrow().as_ref() {
                trace!("log served from cache");
                return Ok(Arc::clone(cached));
            }
        }

        let commits = match self.run(&query.args()) {
            Ok(output) => parse_commits(&output, self.settings.timestamps)?,
            Err(e) if e.output_contains(EMPTY_HISTORY) => {
                debug!("empty history");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        self.remember(&commits);

        let commits = Arc::new(commits);
        if cacheable {
            *self.log_cache.borrow_mut() = Some(Arc::clone(&commits));
        }
        Ok(commits)
    }

    fn remember(&self, commits: &[Commit]) {
        let mut known = self.commits.borrow_mut();
        for c in commits {
            known.entry(c.id().clone()).or_insert_with(|| c.clone());
        }
    }

    /// Look a commit up by id.
    ///
    /// # Errors
    ///
    /// `ReferenceResolution` if the engine has no such commit.
    pub fn find_commit_by_id(&self, id: &ObjectId) -> Result<Commit> {
        if let Some(commit) = self.commits.borrow().get(id) {
            return Ok(commit.clone());
        }
        let commits = self.log(&LogQuery::new().tip(id.as_str()).limit(1))?;
        commits
            .first()
            .filter(|c| c.id() == id)
            .cloned()
            .ok_or_else(|| Error::ReferenceResolution {
                reference: id.to_string(),
                output: Vec::new(),
            })
    }

    /// Resolve `reference` and return its commit.
    pub fn find_commit(&self, reference: &str) -> Result<Commit> {
        let id = self.revparse(reference)?;
        self.find_commit_by_id(&id)
    }

    /// The newest commit on `HEAD` made no later than `instant`.
    pub fn commit_at_date(&self, instant: DateTime<Utc>) -> Result<Commit> {
        let query = LogQuery::new()
            .until(instant.timestamp_millis().to_string())
            .limit(1);
        let commits = self.log(&query)?;
        commits
            .first()
            .cloned()
            .ok_or_else(|| Error::ReferenceResolution {
                reference: instant.to_rfc3339(),
                output: Vec::new(),
            })
    }

    /// Best common ancestor of two references; `None` for unrelated
    /// histories.
    pub fn common_ancestor(&self, a: &str, b: &str) -> Result<Option<Commit>> {
        match self.run(&["merge-base", a, b]) {
            Ok(output) => {
                let first = output.first().map(|l| l.trim()).unwrap_or_default();
                let id = crate::parse::object_id("merge-base", first)?;
                self.find_commit_by_id(&id).map(Some)
            }
            Err(e) if e.output_contains(NO_COMMON_ANCESTOR) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Commits `(ahead, behind)` of the remote for `branch` (the current
    /// branch by default).
    ///
    /// The remote used is the configured default remote if it exists,
    /// otherwise the first one listed. Local (`file:` or plain path) and
    /// `http(s)` remotes can be compared.
    pub fn synced(&self, branch: Option<&str>) -> Result<(usize, usize)> {
        self.synced_with(branch, None)
    }

    /// [`synced`](Self::synced), authenticating to an `http(s)` remote
    /// with `credentials`.
    pub fn synced_with(&self, branch: Option<&str>, credentials: Option<(&str, &str)>) -> Result<(usize, usize)> {
        let branch = match branch {
            Some(b) if b != types::HEAD => b.to_string(),
            _ => self.current_branch()?,
        };

        let remotes = self.remotes()?;
        let (name, url) = remotes
            .get_key_value(&self.settings.remote)
            .or_else(|| remotes.iter().next())
            .ok_or_else(|| Error::InvalidArgument("no remotes defined".into()))?;
        let remote = self.peer(name, url, credentials)?;

        let local_tip = self.revparse(&branch)?;
        let remote_tip = remote.revparse(&branch)?;
        if local_tip == remote_tip {
            return Ok((0, 0));
        }
        if remote_tip.is_zero() {
            return Ok((self.log(&LogQuery::new().tip(&branch))?.len(), 0));
        }

        let tracked = self.revparse(&format!("refs/remotes/{name}/{branch}"))?;
        let ahead = self.log(&LogQuery::new().tip(&branch).since_commit(tracked.as_str()))?.len();
        let behind = remote.count_since(&branch, &tracked)?;
        debug!(%branch, remote = %name, ahead, behind, "sync state");
        Ok((ahead, behind))
    }

    fn peer(&self, name: &str, url: &str, credentials: Option<(&str, &str)>) -> Result<Peer> {
        if HttpRemote::is_remote_url(url) {
            return HttpRemote::new(url, credentials).map(Peer::Http);
        }
        let location = match url.strip_prefix("file://").or_else(|| url.strip_prefix("file:")) {
            Some(path) => path,
            None if !url.contains("://") => url,
            None => {
                return Err(Error::InvalidArgument(format!(
                    "remote '{name}' uses an unsupported scheme: {url}"
                )))
            }
        };
        Repository::open_with(location, Arc::clone(&self.transport), self.settings.clone()).map(Peer::Local)
    }
}

/// The other side of an ahead/behind comparison.
enum Peer {
    Local(Repository),
    Http(HttpRemote),
}

impl Peer {
    fn revparse(&self, reference: &str) -> Result<ObjectId> {
        match self {
            Peer::Local(repo) => repo.revparse(reference),
            Peer::Http(remote) => remote.revparse(reference),
        }
    }

    fn count_since(&self, branch: &str, since: &ObjectId) -> Result<usize> {
        match self {
            Peer::Local(repo) => Ok(repo.log(&LogQuery::new().tip(branch).since_commit(since.as_str()))?.len()),
            Peer::Http(remote) => Ok(remote.commits_between(branch, Some(since.as_str()))?.len()),
        }
    }
}
