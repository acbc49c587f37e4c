//! transport::mock
//!
//! Scripted transport for deterministic testing.
//!
//! # Design
//!
//! Responses are keyed by the full command line (arguments joined with a
//! single space). Each key holds a queue: responses are handed out in order
//! and the last one repeats. Unscripted commands succeed with no output.
//! Every call is recorded for later verification.
//!
//! A response may carry an effect, run against the repository location
//! before the response is returned. Tests use effects to create or remove
//! the engine's marker files the way a real merge or commit would.
//!
//! # Example
//!
//! ```
//! use geogig_porcelain::transport::{MockTransport, Transport};
//! use std::path::Path;
//!
//! let mock = MockTransport::new()
//!     .respond(&["rev-parse", "HEAD"], &["4f1c6a25e71cb4a1fe17e7ad11ec4c6f5d6d10f0"]);
//!
//! let lines = mock
//!     .execute(Path::new("/r"), &["rev-parse".to_string(), "HEAD".to_string()])
//!     .unwrap();
//! assert_eq!(lines.len(), 1);
//! assert_eq!(mock.calls(), vec![vec!["rev-parse".to_string(), "HEAD".to_string()]]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Transport, TransportError};

/// Side effect applied to the repository location when a response fires.
pub type Effect = Arc<dyn Fn(&Path) + Send + Sync>;

#[derive(Clone)]
struct Scripted {
    result: Result<Vec<String>, TransportError>,
    effect: Option<Effect>,
}

impl fmt::Debug for Scripted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scripted")
            .field("result", &self.result)
            .field("effect", &self.effect.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct MockTransportInner {
    responses: HashMap<String, VecDeque<Scripted>>,
    calls: Vec<Vec<String>>,
}

/// Scripted transport.
///
/// Clones share state, so a test can keep one handle while a repository
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

fn key<S: AsRef<str>>(args: &[S]) -> String {
    args.iter().map(|a| a.as_ref()).collect::<Vec<_>>().join(" ")
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(self, args: &[&str], scripted: Scripted) -> Self {
        self.lock()
            .responses
            .entry(key(args))
            .or_default()
            .push_back(scripted);
        self
    }

    /// Script a successful response.
    pub fn respond(self, args: &[&str], lines: &[&str]) -> Self {
        self.push(
            args,
            Scripted {
                result: Ok(owned(lines)),
                effect: None,
            },
        )
    }

    /// Script a failure with exit status 1.
    pub fn fail(self, args: &[&str], lines: &[&str]) -> Self {
        self.push(
            args,
            Scripted {
                result: Err(TransportError::Engine {
                    status: Some(1),
                    output: owned(lines),
                }),
                effect: None,
            },
        )
    }

    /// Script a successful response that also runs `effect`.
    pub fn respond_with(
        self,
        args: &[&str],
        lines: &[&str],
        effect: impl Fn(&Path) + Send + Sync + 'static,
    ) -> Self {
        self.push(
            args,
            Scripted {
                result: Ok(owned(lines)),
                effect: Some(Arc::new(effect)),
            },
        )
    }

    /// Script a failure that also runs `effect`.
    pub fn fail_with(
        self,
        args: &[&str],
        lines: &[&str],
        effect: impl Fn(&Path) + Send + Sync + 'static,
    ) -> Self {
        self.push(
            args,
            Scripted {
                result: Err(TransportError::Engine {
                    status: Some(1),
                    output: owned(lines),
                }),
                effect: Some(Arc::new(effect)),
            },
        )
    }

    /// Make the transport unreachable for `args`.
    pub fn unavailable(self, args: &[&str]) -> Self {
        self.push(
            args,
            Scripted {
                result: Err(TransportError::Unavailable("mock engine offline".into())),
                effect: None,
            },
        )
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls whose command line starts with `prefix`.
    pub fn count(&self, prefix: &[&str]) -> usize {
        let prefix = key(prefix);
        self.lock()
            .calls
            .iter()
            .filter(|c| key(c.as_slice()).starts_with(&prefix))
            .count()
    }

    /// Whether a call with exactly these arguments was recorded.
    pub fn called(&self, args: &[&str]) -> bool {
        let wanted = key(args);
        self.lock().calls.iter().any(|c| key(c.as_slice()) == wanted)
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn execute(&self, location: &Path, args: &[String]) -> Result<Vec<String>, TransportError> {
        let scripted = {
            let mut inner = self.lock();
            inner.calls.push(args.to_vec());
            inner.responses.get_mut(&key(args)).and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
        };

        match scripted {
            Some(Scripted { result, effect }) => {
                if let Some(effect) = effect {
                    effect(location);
                }
                result
            }
            None => Ok(Vec::new()),
        }
    }
}
