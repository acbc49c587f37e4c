//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository (or, for `init` and `clone`, creates it)
//! 2. Calls one or a few [`Repository`](crate::repo::Repository) methods
//! 3. Formats and displays output through [`crate::ui::output`]
//!
//! Library errors are wrapped with `anyhow` context naming the command.

mod history;
mod interchange;
mod recovery;
mod setup;
mod working;

pub use history::{blame, diff, log, ls, show, status, versions};
pub use interchange::{export, import};
pub use recovery::{abort, cherry_pick, conflicts, continue_op, merge, pull, push, rebase, resolve};
pub use setup::{clone, config, init, remote};
pub use working::{add, branch, checkout, commit, reset, tag};

use anyhow::Result;

use super::args::{reset_mode, Command};
use super::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        // Setup
        Command::Init { params } => setup::init(ctx, &params),
        Command::Clone {
            url,
            dest,
            username,
            password,
        } => setup::clone(ctx, &url, &dest, username.as_deref().zip(password.as_deref())),
        Command::Config { action } => setup::config(ctx, action),
        Command::Remote { action } => setup::remote(ctx, action),

        // Read-only
        Command::Log {
            reference,
            since_commit,
            since,
            until,
            paths,
            limit,
        } => history::log(
            ctx,
            history::LogArgs {
                reference,
                since_commit,
                since,
                until,
                paths,
                limit,
            },
        ),
        Command::Status => history::status(ctx),
        Command::Diff {
            old,
            new,
            path,
            stat,
            attributes,
            describe,
        } => {
            let mode = if stat {
                history::DiffMode::Stat
            } else if attributes {
                history::DiffMode::Attributes
            } else if describe {
                history::DiffMode::Describe
            } else {
                history::DiffMode::Paths
            };
            history::diff(ctx, old.as_deref(), new.as_deref(), path.as_deref(), mode)
        }
        Command::Show { reference } => history::show(ctx, &reference),
        Command::Ls {
            path,
            reference,
            recursive,
        } => history::ls(ctx, &reference, path.as_deref().unwrap_or(""), recursive),
        Command::Blame { path } => history::blame(ctx, &path),
        Command::Versions { path } => history::versions(ctx, &path),

        // Working tree
        Command::Add { paths } => working::add(ctx, &paths),
        Command::Commit { message, all, paths } => working::commit(ctx, &message, all, &paths),
        Command::Checkout {
            reference,
            paths,
            force,
        } => working::checkout(ctx, &reference, &paths, force),
        Command::Reset {
            reference,
            soft,
            mixed,
            path,
        } => working::reset(ctx, &reference, reset_mode(soft, mixed), path.as_deref()),
        Command::Branch {
            name,
            start,
            checkout,
            force,
            delete,
        } => working::branch(ctx, name.as_deref(), &start, checkout, force, delete),
        Command::Tag {
            name,
            reference,
            message,
            delete,
        } => working::tag(ctx, name.as_deref(), &reference, &message, delete),

        // Versioning operations
        Command::Merge {
            reference,
            no_commit,
            message,
        } => recovery::merge(ctx, &reference, no_commit, message.as_deref()),
        Command::Rebase { reference } => recovery::rebase(ctx, &reference),
        Command::CherryPick { reference } => recovery::cherry_pick(ctx, &reference),
        Command::Pull {
            remote,
            branch,
            rebase,
        } => recovery::pull(ctx, remote.as_deref(), branch.as_deref(), rebase),
        Command::Push { remote, branch, all } => recovery::push(ctx, remote.as_deref(), branch.as_deref(), all),
        Command::Conflicts => recovery::conflicts(ctx),
        Command::Resolve { paths, side } => recovery::resolve(ctx, &paths, side.side()),
        Command::Continue => recovery::continue_op(ctx),
        Command::Abort => recovery::abort(ctx),

        // Interchange
        Command::Import { format } => interchange::import(ctx, format),
        Command::Export { format } => interchange::export(ctx, format),
    }
}

/// Borrow a list of owned strings as `&str`s.
pub(crate) fn as_strs(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}
