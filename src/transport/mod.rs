//! transport
//!
//! The command channel to the storage engine.
//!
//! # Architecture
//!
//! The [`Transport`] trait is the only way the rest of the crate reaches the
//! engine: run an argument vector against a repository location, get the
//! output lines back, or fail with the captured output. Repositories and
//! the versioning engine never know which realization they are talking to.
//!
//! # Modules
//!
//! - [`process`]: one engine process per call
//! - [`gateway`]: one long-lived engine session, output drained page by page
//! - [`mock`]: scripted transport for deterministic testing
//!
//! # Example
//!
//! ```no_run
//! use geogig_porcelain::transport::{ProcessTransport, Transport};
//! use std::path::Path;
//!
//! let transport = ProcessTransport::new("geogig");
//! let lines = transport
//!     .execute(Path::new("/data/parks"), &["rev-parse".to_string(), "HEAD".to_string()])
//!     .unwrap();
//! println!("HEAD is {}", lines[0]);
//! ```

pub mod gateway;
pub mod mock;
pub mod process;

pub use gateway::{GatewaySession, GatewayTransport};
pub use mock::MockTransport;
pub use process::ProcessTransport;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::core::config::Config;

/// Errors from the command channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The engine ran and reported failure.
    #[error("engine exited with status {status:?}")]
    Engine {
        /// Exit status, if the realization knows it
        status: Option<i32>,
        /// Everything the engine printed, in order
        output: Vec<String>,
    },

    /// The engine could not be started or reached.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The gateway answered with something unexpected.
    #[error("gateway protocol error: {0}")]
    Protocol(String),
}

/// Runs engine commands against a repository location.
///
/// A zero exit status is success even when nothing was printed. Output line
/// order is preserved.
pub trait Transport: Send + Sync {
    /// Name of this realization (for logs).
    fn name(&self) -> &'static str;

    /// Run `args` with `location` as the working repository.
    fn execute(&self, location: &Path, args: &[String]) -> Result<Vec<String>, TransportError>;
}

/// Available transport realizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Spawn the engine executable for every call
    Process,
    /// Submit calls over a persistent gateway session
    Gateway,
}

impl TransportKind {
    pub fn all() -> &'static [TransportKind] {
        &[TransportKind::Process, TransportKind::Gateway]
    }

    /// The name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            TransportKind::Process => "process",
            TransportKind::Gateway => "gateway",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(|k| k.name()).collect()
    }

    /// Parse a transport name.
    ///
    /// ```
    /// use geogig_porcelain::transport::TransportKind;
    ///
    /// assert_eq!(TransportKind::parse("Gateway"), Some(TransportKind::Gateway));
    /// assert_eq!(TransportKind::parse("rpc"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "process" => Some(TransportKind::Process),
            "gateway" => Some(TransportKind::Gateway),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Create the transport selected by `config`.
///
/// The gateway session is opened here; a process transport needs no setup.
/// The result can be shared by several repositories.
pub fn create_transport(config: &Config) -> Result<Arc<dyn Transport>, TransportError> {
    match config.transport_kind() {
        TransportKind::Process => Ok(Arc::new(ProcessTransport::new(config.engine()))),
        TransportKind::Gateway => {
            let transport = GatewayTransport::connect(config.gateway_host(), config.gateway_port())?;
            Ok(Arc::new(transport))
        }
    }
}

/// Appended to every engine command, whatever the transport.
pub(crate) const NO_COLOR: [&str; 2] = ["--color", "never"];

/// Render a command line for logging with passwords masked.
///
/// ```
/// use geogig_porcelain::transport::redact;
///
/// let args: Vec<String> = ["clone", "http://x", "--password", "s3cret"]
///     .iter().map(|s| s.to_string()).collect();
/// assert_eq!(redact(&args), "clone http://x --password ****");
/// ```
pub fn redact(args: &[String]) -> String {
    let mut out = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            out.push("****");
            mask_next = false;
        } else {
            mask_next = arg == "--password";
            out.push(arg.as_str());
        }
    }
    out.join(" ")
}

/// Split a block of engine text into lines, keeping interior blank lines.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in TransportKind::all() {
            assert_eq!(TransportKind::parse(kind.name()), Some(*kind));
        }
    }

    #[test]
    fn redact_only_touches_passwords() {
        let args: Vec<String> = ["remote", "add", "-u", "ana", "--password", "pw", "origin", "url"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            redact(&args),
            "remote add -u ana --password **** origin url"
        );
    }

    #[test]
    fn redact_trailing_flag() {
        let args = vec!["--password".to_string()];
        assert_eq!(redact(&args), "--password");
    }

    #[test]
    fn split_keeps_blank_separators() {
        assert_eq!(split_lines("a\n\nb\r\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn process_is_the_default() {
        let transport = create_transport(&Config::default()).unwrap();
        assert_eq!(transport.name(), "process");
    }
}
