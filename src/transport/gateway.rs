//! transport::gateway
//!
//! Calls submitted over one long-lived engine session.
//!
//! # Protocol
//!
//! Newline-delimited JSON over TCP. A command is submitted with
//!
//! ```text
//! {"method":"run","repo":"/data/parks","args":["log"]}   ->  {"status":0}
//! ```
//!
//! after which the output buffer is drained page by page until the engine
//! answers with a null page:
//!
//! ```text
//! {"method":"next_page"}   ->  {"page":"commit 4f1c..."}
//! {"method":"next_page"}   ->  {"page":null}
//! ```
//!
//! A response carrying `"error"` is a protocol failure, not an engine one.
//!
//! # Lifecycle
//!
//! A [`GatewaySession`] is opened and closed explicitly and owned by the
//! transports that use it. Nothing is started lazily.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{redact, split_lines, Transport, TransportError, NO_COLOR};

#[derive(Debug, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum Request<'a> {
    Run { repo: String, args: &'a [String] },
    NextPage,
}

#[derive(Debug, Default, Deserialize)]
struct Response {
    #[serde(default)]
    status: Option<i32>,
    #[serde(default)]
    page: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug)]
struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

/// A connection to a running engine gateway.
#[derive(Debug)]
pub struct GatewaySession {
    addr: String,
    conn: Option<Connection>,
}

impl GatewaySession {
    /// Describe a session; call [`open`](Self::open) before use.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            conn: None,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Connect to the gateway. Opening an open session does nothing.
    pub fn open(&mut self) -> Result<(), TransportError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let writer = TcpStream::connect(&self.addr).map_err(|e| {
            TransportError::Unavailable(format!("cannot connect to gateway at {}: {}", self.addr, e))
        })?;
        let reader = writer
            .try_clone()
            .map(BufReader::new)
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        info!(addr = %self.addr, "gateway session opened");
        self.conn = Some(Connection { reader, writer });
        Ok(())
    }

    /// Drop the connection. Closing a closed session does nothing.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.writer.shutdown(std::net::Shutdown::Both);
            info!(addr = %self.addr, "gateway session closed");
        }
    }

    /// Run one command and drain its output.
    pub fn run(&mut self, repo: &Path, args: &[String]) -> Result<Vec<String>, TransportError> {
        let response = self.call(&Request::Run {
            repo: repo.display().to_string(),
            args,
        })?;
        let status = response
            .status
            .ok_or_else(|| TransportError::Protocol("run response without status".into()))?;

        let mut text = String::new();
        loop {
            match self.call(&Request::NextPage)?.page {
                Some(page) => text.push_str(&page),
                None => break,
            }
        }
        let lines = split_lines(&text);

        if status == 0 {
            Ok(lines)
        } else {
            Err(TransportError::Engine {
                status: Some(status),
                output: lines,
            })
        }
    }

    fn call(&mut self, request: &Request<'_>) -> Result<Response, TransportError> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| TransportError::Unavailable("gateway session is not open".into()))?;

        let mut payload =
            serde_json::to_vec(request).map_err(|e| TransportError::Protocol(e.to_string()))?;
        payload.push(b'\n');
        conn.writer
            .write_all(&payload)
            .and_then(|_| conn.writer.flush())
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        let mut line = String::new();
        let read = conn
            .reader
            .read_line(&mut line)
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        if read == 0 {
            self.conn = None;
            return Err(TransportError::Unavailable(
                "gateway closed the connection".into(),
            ));
        }

        let response: Response = serde_json::from_str(line.trim_end())
            .map_err(|e| TransportError::Protocol(format!("malformed response: {e}")))?;
        match response.error {
            Some(error) => Err(TransportError::Protocol(error)),
            None => Ok(response),
        }
    }
}

impl Drop for GatewaySession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Transport backed by a shared [`GatewaySession`].
///
/// Calls are serialized on the session lock, so several repositories may
/// share one session.
#[derive(Debug, Clone)]
pub struct GatewayTransport {
    session: Arc<Mutex<GatewaySession>>,
}

impl GatewayTransport {
    pub fn new(session: Arc<Mutex<GatewaySession>>) -> Self {
        Self { session }
    }

    /// Open a fresh session to `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let mut session = GatewaySession::new(host, port);
        session.open()?;
        Ok(Self::new(Arc::new(Mutex::new(session))))
    }

    /// The session this transport submits to.
    pub fn session(&self) -> Arc<Mutex<GatewaySession>> {
        Arc::clone(&self.session)
    }
}

impl Transport for GatewayTransport {
    fn name(&self) -> &'static str {
        "gateway"
    }

    fn execute(&self, location: &Path, args: &[String]) -> Result<Vec<String>, TransportError> {
        debug!(
            location = %location.display(),
            command = %redact(args),
            "submitting engine command"
        );
        let mut session = self
            .session
            .lock()
            .map_err(|_| TransportError::Protocol("gateway session lock poisoned".into()))?;
        let mut argv = args.to_vec();
        argv.extend(NO_COLOR.iter().map(|s| s.to_string()));
        let result = session.run(location, &argv);
        if let Err(TransportError::Engine { output, .. }) = &result {
            warn!(command = %redact(args), output = %output.join("\n"), "engine command failed");
        }
        result
    }
}
