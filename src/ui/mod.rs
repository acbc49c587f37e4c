//! ui
//!
//! Terminal output for the `ggp` binary.
//!
//! All command output goes through [`output`] so that `--quiet` and
//! `--json` are honored in one place.

pub mod output;
