//! add, commit, checkout, reset, branch and tag commands

use anyhow::{Context as _, Result};

use super::as_strs;
use crate::cli::Context;
use crate::core::types::ResetMode;
use crate::error::Error;
use crate::ui::output;

pub fn add(ctx: &Context, paths: &[String]) -> Result<()> {
    let repo = ctx.open_repo()?;
    repo.add(&as_strs(paths)).context("Failed to stage changes")?;
    output::debug(format!("staged {} path(s)", paths.len().max(1)), ctx.verbosity);
    Ok(())
}

pub fn commit(ctx: &Context, message: &str, all: bool, paths: &[String]) -> Result<()> {
    let repo = ctx.open_repo()?;
    let paths = as_strs(paths);
    let result = if all {
        repo.add_and_commit(message, &paths)
    } else {
        repo.commit(message, &paths)
    };

    match result {
        Ok(()) => {}
        Err(e @ Error::UnconfiguredIdentity { .. }) => {
            output::warn("set an identity with 'ggp config set user.name ...' and 'ggp config set user.email ...'", ctx.verbosity);
            return Err(e).context("Failed to commit");
        }
        Err(e) => return Err(e).context("Failed to commit"),
    }

    let head = repo.find_commit("HEAD").context("Failed to read the new commit")?;
    output::success(head, ctx.verbosity);
    Ok(())
}

pub fn checkout(ctx: &Context, reference: &str, paths: &[String], force: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    repo.checkout(reference, &as_strs(paths), force)
        .with_context(|| format!("Failed to check out {}", reference))?;
    if paths.is_empty() {
        output::success(format!("Switched to {}", reference), ctx.verbosity);
    }
    Ok(())
}

pub fn reset(ctx: &Context, reference: &str, mode: ResetMode, path: Option<&str>) -> Result<()> {
    let repo = ctx.open_repo()?;
    match path {
        Some(path) => repo
            .reset_path(reference, path)
            .with_context(|| format!("Failed to reset {} to {}", path, reference))?,
        None => repo
            .reset(reference, mode)
            .with_context(|| format!("Failed to reset to {}", reference))?,
    }
    Ok(())
}

pub fn branch(
    ctx: &Context,
    name: Option<&str>,
    start: &str,
    checkout: bool,
    force: bool,
    delete: bool,
) -> Result<()> {
    let repo = ctx.open_repo()?;
    let Some(name) = name else {
        let branches = repo.branches().context("Failed to list branches")?;
        if ctx.json {
            return Ok(output::json(&branches)?);
        }
        let current = repo.head_name().ok();
        for (branch, id) in &branches {
            let marker = if current.as_deref() == Some(branch.as_str()) { "*" } else { " " };
            println!("{} {} {}", marker, branch, id.short(7));
        }
        return Ok(());
    };

    if delete {
        repo.delete_branch(name)
            .with_context(|| format!("Failed to delete branch '{}'", name))?;
        output::success(format!("Deleted branch '{}'", name), ctx.verbosity);
        return Ok(());
    }

    let created = repo
        .create_branch(start, name, force, checkout)
        .with_context(|| format!("Failed to create branch '{}'", name))?;
    let id = created.id().context("Failed to resolve the new branch")?;
    output::success(format!("Created branch '{}' at {}", name, id.short(7)), ctx.verbosity);
    Ok(())
}

pub fn tag(ctx: &Context, name: Option<&str>, reference: &str, message: &str, delete: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    let Some(name) = name else {
        let tags = repo.tags().context("Failed to list tags")?;
        if ctx.json {
            let listed: Vec<_> = tags
                .values()
                .map(|t| serde_json::json!({ "name": t.name(), "id": t.id() }))
                .collect();
            return Ok(output::json(&listed)?);
        }
        let names: Vec<&str> = tags.keys().map(String::as_str).collect();
        if !names.is_empty() {
            println!("{}", output::format_list(&names, ""));
        }
        return Ok(());
    };

    if delete {
        repo.delete_tag(name)
            .with_context(|| format!("Failed to delete tag '{}'", name))?;
        output::success(format!("Deleted tag '{}'", name), ctx.verbosity);
    } else {
        repo.create_tag(reference, name, message)
            .with_context(|| format!("Failed to tag {}", reference))?;
        output::success(format!("Tagged {} as '{}'", reference, name), ctx.verbosity);
    }
    Ok(())
}
