//! merge, rebase, cherry-pick, pull and push, plus the commands that
//! recover from a stopped operation: conflicts, resolve, continue, abort.
//!
//! A stopped operation is reported as an error so the exit status is
//! non-zero, after listing the conflicted paths and what to do next.

use anyhow::{bail, Context as _, Result};

use super::as_strs;
use crate::cli::Context;
use crate::core::types::ConflictSide;
use crate::error::Error;
use crate::repo::Repository;
use crate::ui::output;

/// Print the conflicted paths and next steps after an operation stopped.
fn report_stopped(repo: &Repository, ctx: &Context, operation: &str) {
    match repo.conflicts() {
        Ok(conflicts) if !conflicts.is_empty() => {
            let paths: Vec<&str> = conflicts.iter().map(|c| c.path.as_str()).collect();
            output::print(format!("Conflicted paths:\n{}", output::format_list(&paths, "    ")), ctx.verbosity);
        }
        Ok(_) => {}
        Err(e) => output::debug(format!("could not list conflicts: {}", e), ctx.verbosity),
    }
    let next = if operation == "rebase" || operation == "pull --rebase" {
        "ggp continue"
    } else {
        "ggp commit"
    };
    output::print(
        format!(
            "Resolve with 'ggp resolve <path> --ours|--theirs', then run '{}', or 'ggp abort' to give up.",
            next
        ),
        ctx.verbosity,
    );
}

/// Run an operation that may stop on conflicts.
fn interruptible(ctx: &Context, operation: &str, run: impl FnOnce(&Repository) -> crate::Result<()>) -> Result<()> {
    let repo = ctx.open_repo()?;
    match run(&repo) {
        Ok(()) => Ok(()),
        Err(e) if e.is_interrupted_operation() => {
            report_stopped(&repo, ctx, operation);
            Err(e).with_context(|| format!("{} stopped with conflicts", operation))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to {}", operation)),
    }
}

pub fn merge(ctx: &Context, reference: &str, no_commit: bool, message: Option<&str>) -> Result<()> {
    interruptible(ctx, "merge", |repo| repo.merge(reference, no_commit, message))?;
    output::success(format!("Merged {}", reference), ctx.verbosity);
    Ok(())
}

pub fn rebase(ctx: &Context, reference: &str) -> Result<()> {
    interruptible(ctx, "rebase", |repo| repo.rebase(reference))?;
    output::success(format!("Rebased onto {}", reference), ctx.verbosity);
    Ok(())
}

pub fn cherry_pick(ctx: &Context, reference: &str) -> Result<()> {
    interruptible(ctx, "cherry-pick", |repo| repo.cherry_pick(reference))?;
    output::success(format!("Applied {}", reference), ctx.verbosity);
    Ok(())
}

pub fn pull(ctx: &Context, remote: Option<&str>, branch: Option<&str>, rebase: bool) -> Result<()> {
    let operation = if rebase { "pull --rebase" } else { "pull" };
    interruptible(ctx, operation, |repo| repo.pull(remote, branch, rebase))
}

pub fn push(ctx: &Context, remote: Option<&str>, branch: Option<&str>, all: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    match repo.push(remote, branch, all) {
        Err(Error::DetachedHead) => bail!("HEAD is detached; name the branch to push"),
        other => other.context("Failed to push"),
    }
}

pub fn conflicts(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let state = repo.state().context("Failed to read repository state")?;
    let conflicts = repo.conflicts().context("Failed to list conflicts")?;

    if ctx.json {
        let listed: Vec<_> = conflicts
            .iter()
            .map(|c| {
                serde_json::json!({
                    "path": c.path,
                    "base": c.base.reference(),
                    "ours": c.ours.reference(),
                    "theirs": c.theirs.reference(),
                })
            })
            .collect();
        return Ok(output::json(&listed)?);
    }

    if !state.is_in_progress() {
        output::print("No merge or rebase in progress", ctx.verbosity);
        return Ok(());
    }
    output::print(format!("Stopped {}", state), ctx.verbosity);
    for conflict in &conflicts {
        println!("{}", conflict.path);
    }
    Ok(())
}

pub fn resolve(ctx: &Context, paths: &[String], side: ConflictSide) -> Result<()> {
    let repo = ctx.open_repo()?;
    repo.solve_conflicts(&as_strs(paths), side)
        .with_context(|| format!("Failed to resolve {} path(s) to {}", paths.len(), side))?;
    output::success(format!("Resolved {} path(s) using {}", paths.len(), side), ctx.verbosity);
    Ok(())
}

/// Continue a stopped rebase.
pub fn continue_op(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    if !repo.is_rebasing()? {
        bail!("No rebase in progress");
    }
    match repo.continue_operation() {
        Ok(()) => {
            output::success("Rebase complete", ctx.verbosity);
            Ok(())
        }
        Err(e @ (Error::RebaseIncomplete | Error::Conflict { .. })) => {
            report_stopped(&repo, ctx, "rebase");
            Err(e).context("Rebase stopped again")
        }
        Err(e) => Err(e).context("Failed to continue"),
    }
}

pub fn abort(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let state = repo.state().context("Failed to read repository state")?;
    if !state.is_in_progress() {
        bail!("No operation in progress");
    }
    repo.abort().with_context(|| format!("Failed to abort {}", state))?;
    output::success(format!("Aborted {}", state.description()), ctx.verbosity);
    Ok(())
}
