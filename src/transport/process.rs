//! transport::process
//!
//! One engine process per call.
//!
//! The engine is run with the repository as its working directory and
//! colored output disabled. The call blocks until the process exits.
//! Standard output lines come first, followed by standard error lines;
//! the two streams cannot be interleaved after the fact.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::{redact, split_lines, Transport, TransportError, NO_COLOR};

/// Spawns the engine executable for every command.
#[derive(Debug, Clone)]
pub struct ProcessTransport {
    engine: PathBuf,
}

impl ProcessTransport {
    /// Create a transport that runs `engine` (a path or a name on `PATH`).
    pub fn new(engine: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
        }
    }

    pub fn engine(&self) -> &Path {
        &self.engine
    }
}

impl Transport for ProcessTransport {
    fn name(&self) -> &'static str {
        "process"
    }

    fn execute(&self, location: &Path, args: &[String]) -> Result<Vec<String>, TransportError> {
        debug!(
            engine = %self.engine.display(),
            location = %location.display(),
            command = %redact(args),
            "running engine command"
        );

        let output = Command::new(&self.engine)
            .args(args)
            .args(NO_COLOR)
            .current_dir(location)
            .output()
            .map_err(|e| {
                TransportError::Unavailable(format!(
                    "cannot run '{}': {}",
                    self.engine.display(),
                    e
                ))
            })?;

        let mut lines = split_lines(&String::from_utf8_lossy(&output.stdout));
        lines.extend(split_lines(&String::from_utf8_lossy(&output.stderr)));

        if output.status.success() {
            Ok(lines)
        } else {
            warn!(
                command = %redact(args),
                status = ?output.status.code(),
                output = %lines.join("\n"),
                "engine command failed"
            );
            Err(TransportError::Engine {
                status: output.status.code(),
                output: lines,
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// A shell script standing in for the engine, run through `sh` so the
    /// test never execs a file it just wrote.
    struct FakeEngine {
        script: PathBuf,
    }

    impl FakeEngine {
        fn new(dir: &Path, body: &str) -> Self {
            let script = dir.join("fake-engine.sh");
            fs::write(&script, format!("{body}\n")).unwrap();
            Self { script }
        }

        fn run(&self, location: &Path, args: &[&str]) -> Result<Vec<String>, TransportError> {
            let mut argv = vec![self.script.display().to_string()];
            argv.extend(args.iter().map(|s| s.to_string()));
            ProcessTransport::new("sh").execute(location, &argv)
        }
    }

    #[test]
    fn success_returns_lines_in_order() {
        let temp = TempDir::new().unwrap();
        let engine = FakeEngine::new(temp.path(), "echo first\necho\necho \"$@\"");

        let lines = engine.run(temp.path(), &["rev-parse", "HEAD"]).unwrap();
        assert_eq!(lines, vec!["first", "", "rev-parse HEAD --color never"]);
    }

    #[test]
    fn empty_output_is_still_success() {
        let temp = TempDir::new().unwrap();
        let engine = FakeEngine::new(temp.path(), "exit 0");
        assert!(engine.run(temp.path(), &["add"]).unwrap().is_empty());
    }

    #[test]
    fn failure_captures_both_streams() {
        let temp = TempDir::new().unwrap();
        let engine = FakeEngine::new(temp.path(), "echo out\necho err >&2\nexit 3");
        let err = engine.run(temp.path(), &["merge", "b"]).unwrap_err();
        assert_eq!(
            err,
            TransportError::Engine {
                status: Some(3),
                output: vec!["out".to_string(), "err".to_string()],
            }
        );
    }

    #[test]
    fn runs_in_repository_directory() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("repo");
        fs::create_dir(&repo).unwrap();
        let engine = FakeEngine::new(temp.path(), "basename \"$(pwd)\"");
        assert_eq!(engine.run(&repo, &["status"]).unwrap(), vec!["repo"]);
    }

    #[test]
    fn missing_engine_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let err = ProcessTransport::new(temp.path().join("nope"))
            .execute(temp.path(), &["log".to_string()])
            .unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
    }
}
