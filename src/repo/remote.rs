//! repo::remote
//!
//! Read-only access to a repository published over HTTP.
//!
//! Only what ahead/behind counting needs is here: resolving a ref through
//! `GET <url>/refparse?name=<ref>` (an XML answer carrying `<objectId>`)
//! and listing commits through
//! `GET <url>/commits?newRefSpec=<id>&oldRefSpec=<id>` (a JSON answer with a
//! `commits` array).

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::core::types::ObjectId;
use crate::error::{Error, Result};

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CommitList {
    #[serde(default)]
    commits: Vec<CommitSummary>,
}

#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
}

/// A remote repository behind a web gateway.
#[derive(Clone)]
pub struct HttpRemote {
    base: String,
    client: Client,
    credentials: Option<(String, String)>,
}

impl HttpRemote {
    /// Whether `url` names a repository served over HTTP.
    ///
    /// ```
    /// use geogig_porcelain::repo::HttpRemote;
    ///
    /// assert!(HttpRemote::is_remote_url("https://maps.example.org/repos/parks"));
    /// assert!(!HttpRemote::is_remote_url("file:///data/parks"));
    /// assert!(!HttpRemote::is_remote_url("/data/parks"));
    /// ```
    pub fn is_remote_url(url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    pub fn new(url: &str, credentials: Option<(&str, &str)>) -> Result<Self> {
        let client = Client::builder().timeout(TIMEOUT).build().map_err(http_error)?;
        Ok(Self {
            base: url.trim_end_matches('/').to_string(),
            client,
            credentials: credentials.map(|(user, password)| (user.to_string(), password.to_string())),
        })
    }

    pub fn url(&self) -> &str {
        &self.base
    }

    /// Resolve `reference` on the remote. Full ids are returned as given.
    pub fn revparse(&self, reference: &str) -> Result<ObjectId> {
        if ObjectId::is_canonical(reference) {
            return ObjectId::new(reference).map_err(|e| Error::InvalidArgument(e.to_string()));
        }
        let body = self
            .get("refparse", &[("name", reference)])?
            .text()
            .map_err(http_error)?;
        element_text(&body, "objectId")
            .and_then(|id| ObjectId::new(id).ok())
            .ok_or_else(|| Error::ReferenceResolution {
                reference: reference.to_string(),
                output: body.lines().map(str::to_string).collect(),
            })
    }

    /// Ids of the commits reachable from `tip` but not from `since`,
    /// newest first.
    pub fn commits_between(&self, tip: &str, since: Option<&str>) -> Result<Vec<ObjectId>> {
        let tip = self.revparse(tip)?;
        let since = since.map(|s| self.revparse(s)).transpose()?;

        let mut query = vec![("newRefSpec", tip.as_str())];
        if let Some(since) = &since {
            query.push(("oldRefSpec", since.as_str()));
        }
        let list: CommitList = self.get("commits", &query)?.json().map_err(http_error)?;
        list.commits
            .into_iter()
            .map(|c| {
                ObjectId::new(&c.sha).map_err(|_| Error::Transport {
                    message: format!("{} listed a malformed commit id '{}'", self.base, c.sha),
                })
            })
            .collect()
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = format!("{}/{}", self.base, endpoint);
        debug!(%url, ?query, "remote request");
        let mut request = self.client.get(&url).query(query);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }
        request
            .send()
            .and_then(Response::error_for_status)
            .map_err(http_error)
    }
}

fn http_error(e: reqwest::Error) -> Error {
    Error::Transport {
        message: format!("remote request failed: {e}"),
    }
}

/// Text of the first `<name>` element, trimmed.
fn element_text<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = xml.find(&open)? + open.len();
    let len = xml[start..].find(&close)?;
    Some(xml[start..start + len].trim())
}
