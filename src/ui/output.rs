//! ui::output
//!
//! Everything `ggp` prints goes through here.
//!
//! Results go to stdout and diagnostics to stderr. `--quiet` hides all but
//! errors and JSON. Debug chatter is a `tracing` event, so it shares the
//! subscriber's filter and formatting with the library's own logs.

use std::fmt::Display;

use serde::Serialize;
use tracing::level_filters::LevelFilter;

/// How much the binary says, least to most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    /// `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        }
    }

    /// Most detailed log level the subscriber lets through.
    pub fn log_level(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::ERROR,
            Verbosity::Normal => LevelFilter::WARN,
            Verbosity::Debug => LevelFilter::DEBUG,
        }
    }

    fn shows(self, needed: Verbosity) -> bool {
        self >= needed
    }
}

pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows(Verbosity::Normal) {
        println!("{message}");
    }
}

/// Confirmation that a command did what it was asked.
pub fn success(message: impl Display, verbosity: Verbosity) {
    print(message, verbosity);
}

pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows(Verbosity::Normal) {
        eprintln!("warning: {message}");
    }
}

pub fn error(message: impl Display) {
    eprintln!("error: {message}");
}

/// Shown with `--debug` only.
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows(Verbosity::Debug) {
        tracing::debug!(target: "ggp", "{message}");
    }
}

/// Print a value as pretty JSON. Always shown; scripts asked for it.
pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One item per line, each behind `prefix`.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    let lines: Vec<String> = items.iter().map(|item| format!("{prefix}{item}")).collect();
    lines.join("\n")
}

/// Left-align `label` in a column of `width`, for two-column listings.
pub fn format_pair(label: &str, value: impl Display, width: usize) -> String {
    format!("{label:<width$} {value}")
}
