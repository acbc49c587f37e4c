//! log, status, diff, show, ls, blame and versions commands
//!
//! Read-only. None of these change engine state.

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::cli::Context;
use crate::core::types;
use crate::core::value::Value;
use crate::model::{AttributeDelta, Commit, DiffEntry, Node};
use crate::repo::{LogQuery, Repository};
use crate::ui::output;

/// Options of the `log` command.
#[derive(Debug, Default)]
pub struct LogArgs {
    pub reference: Option<String>,
    pub since_commit: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub paths: Vec<String>,
    pub limit: Option<usize>,
}

impl LogArgs {
    fn query(self) -> LogQuery {
        let mut query = LogQuery::new();
        if let Some(tip) = self.reference {
            query = query.tip(tip);
        }
        if let Some(commit) = self.since_commit {
            query = query.since_commit(commit);
        }
        if let Some(date) = self.since {
            query = query.since(date);
        }
        if let Some(date) = self.until {
            query = query.until(date);
        }
        for path in self.paths {
            query = query.path(path);
        }
        if let Some(n) = self.limit {
            query = query.limit(n);
        }
        query
    }
}

pub fn log(ctx: &Context, args: LogArgs) -> Result<()> {
    let repo = ctx.open_repo()?;
    let commits = repo.log(&args.query()).context("Failed to read history")?;

    if ctx.json {
        output::json(commits.as_slice())?;
        return Ok(());
    }
    let blocks: Vec<String> = commits.iter().map(format_commit).collect();
    if !blocks.is_empty() {
        println!("{}", blocks.join("\n\n"));
    }
    Ok(())
}

fn format_commit(commit: &Commit) -> String {
    let mut out = format!("commit {}", commit.id());
    if commit.is_merge() {
        let parents: Vec<&str> = commit.parents().iter().map(|p| p.short(7)).collect();
        out.push_str(&format!("\nMerge:  {}", parents.join(" ")));
    }
    let author = commit.author();
    out.push_str(&format!("\nAuthor: {} <{}>", author.name, author.email));
    out.push_str(&format!("\nDate:   {}", author.when.format("%Y-%m-%d %H:%M:%S UTC")));
    out.push('\n');
    for line in commit.message().lines() {
        out.push_str(&format!("\n    {}", line));
    }
    out
}

#[derive(Serialize)]
struct StatusReport {
    head: String,
    state: String,
    conflicts: Vec<String>,
    staged: Vec<DiffEntry>,
    unstaged: Vec<DiffEntry>,
    /// Commits ahead of and behind the remote branch, when known.
    synced: Option<(usize, usize)>,
}

pub fn status(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let report = status_report(&repo, ctx)?;

    if ctx.json {
        output::json(&report)?;
        return Ok(());
    }

    if report.head.len() == types::ObjectId::LEN {
        println!("HEAD detached at {}", &report.head[..7]);
    } else {
        println!("On branch {}", report.head);
    }
    if let Some((ahead, behind)) = report.synced {
        if ahead > 0 || behind > 0 {
            println!("Ahead of the remote by {} commit(s), behind by {}", ahead, behind);
        }
    }
    if report.state != "clean" {
        println!("\nYou are in the middle of a {}.", report.state);
        if !report.conflicts.is_empty() {
            println!("Conflicted paths:\n{}", output::format_list(&report.conflicts, "    "));
        }
    }
    for (title, entries) in [
        ("Changes to be committed", &report.staged),
        ("Changes not staged for commit", &report.unstaged),
    ] {
        if !entries.is_empty() {
            println!("\n{}:\n{}", title, output::format_list(entries, "    "));
        }
    }
    if report.staged.is_empty() && report.unstaged.is_empty() && report.conflicts.is_empty() {
        output::print("\nNothing to commit, working tree clean", ctx.verbosity);
    }
    Ok(())
}

fn status_report(repo: &Repository, ctx: &Context) -> Result<StatusReport> {
    let head = repo.head_name().context("Failed to read HEAD")?;
    let state = repo.state().context("Failed to read repository state")?;
    let conflicts = if state.is_in_progress() {
        repo.conflicts()
            .context("Failed to list conflicts")?
            .into_iter()
            .map(|c| c.path)
            .collect()
    } else {
        Vec::new()
    };

    let synced = if repo.remotes().map(|r| r.is_empty()).unwrap_or(true) || repo.is_detached()? {
        None
    } else {
        match repo.synced(None) {
            Ok(counts) => Some(counts),
            Err(e) => {
                output::debug(format!("remote comparison skipped: {}", e), ctx.verbosity);
                None
            }
        }
    };

    Ok(StatusReport {
        head,
        state: state.to_string(),
        conflicts,
        staged: repo.staged().context("Failed to diff the index")?,
        unstaged: repo.unstaged().context("Failed to diff the working tree")?,
        synced,
    })
}

/// What `diff` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    Paths,
    Stat,
    Attributes,
    Describe,
}

pub fn diff(ctx: &Context, old: Option<&str>, new: Option<&str>, path: Option<&str>, mode: DiffMode) -> Result<()> {
    let repo = ctx.open_repo()?;
    let old = old.unwrap_or(types::HEAD);
    let new = new.unwrap_or(types::WORK_HEAD);
    let failed = || format!("Failed to diff {} and {}", old, new);

    match (mode, path) {
        (DiffMode::Stat, _) => {
            let stats = repo.tree_stats(old, new).with_context(failed)?;
            if ctx.json {
                return Ok(output::json(&stats)?);
            }
            for s in &stats {
                println!("{} +{} -{} ~{}", s.path, s.added, s.removed, s.modified);
            }
        }
        (DiffMode::Attributes, Some(path)) => {
            let changes = repo.feature_diff(old, new, path).with_context(failed)?;
            if ctx.json {
                return Ok(output::json(&changes)?);
            }
            for change in changes.iter() {
                println!(
                    "{}: {} -> {}",
                    change.name,
                    display_optional(change.old.as_ref()),
                    display_optional(change.new.as_ref())
                );
            }
        }
        (DiffMode::Describe, Some(path)) => {
            let described = repo.tree_diff(path, old, new).with_context(failed)?;
            if ctx.json {
                return Ok(output::json(&described)?);
            }
            for feature in &described.features {
                println!("{}", feature.path);
                for (name, delta) in &feature.changes {
                    println!("  {} {}: {}", delta.marker(), name, describe_delta(delta));
                }
            }
        }
        _ => {
            let entries = repo.diff(old, new, path).with_context(failed)?;
            if ctx.json {
                return Ok(output::json(&entries)?);
            }
            if !entries.is_empty() {
                println!("{}", output::format_list(&entries, ""));
            }
        }
    }
    Ok(())
}

fn display_optional(value: Option<&Value>) -> String {
    value.map_or_else(|| "(absent)".to_string(), Value::to_string)
}

fn describe_delta(delta: &AttributeDelta) -> String {
    match delta {
        AttributeDelta::Modified { old, new } => format!("{} -> {}", old, new),
        AttributeDelta::Added(v) | AttributeDelta::Removed(v) | AttributeDelta::Unchanged(v) => v.to_string(),
    }
}

pub fn show(ctx: &Context, reference: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let text = repo.show(reference).with_context(|| format!("Failed to show {}", reference))?;
    println!("{}", text);
    Ok(())
}

#[derive(Serialize)]
struct ListedNode<'a> {
    path: &'a str,
    kind: &'static str,
    /// Feature count, for trees.
    size: Option<u64>,
}

pub fn ls(ctx: &Context, reference: &str, path: &str, recursive: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    let nodes = repo
        .children(reference, path, recursive)
        .with_context(|| format!("Failed to list {}", types::refspec(reference, path)))?;

    let listed: Vec<ListedNode<'_>> = nodes
        .iter()
        .map(|node| match node {
            Node::Tree(t) => ListedNode {
                path: t.path(),
                kind: "tree",
                size: t.size(),
            },
            Node::Feature(f) => ListedNode {
                path: f.path(),
                kind: "feature",
                size: None,
            },
        })
        .collect();

    if ctx.json {
        return Ok(output::json(&listed)?);
    }
    for node in &listed {
        match node.size {
            Some(size) => println!("{}/ ({})", node.path, size),
            None if node.kind == "tree" => println!("{}/", node.path),
            None => println!("{}", node.path),
        }
    }
    Ok(())
}

pub fn blame(ctx: &Context, path: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let entries = repo.blame(path).with_context(|| format!("Failed to blame {}", path))?;

    if ctx.json {
        return Ok(output::json(&entries)?);
    }
    let width = entries.iter().map(|e| e.attribute.len()).max().unwrap_or(0);
    for entry in &entries {
        println!(
            "{} {} {}",
            output::format_pair(&entry.attribute, &entry.value, width),
            entry.commit.short(7),
            entry.author
        );
    }
    Ok(())
}

pub fn versions(ctx: &Context, path: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let versions = repo.versions(path).with_context(|| format!("Failed to read versions of {}", path))?;

    if ctx.json {
        let listed: Vec<_> = versions
            .iter()
            .map(|(commit, data)| serde_json::json!({ "commit": commit.id(), "data": data }))
            .collect();
        return Ok(output::json(&listed)?);
    }
    for (commit, data) in &versions {
        println!("{}", commit);
        for attribute in data.iter() {
            println!("    {} = {}", attribute.name, attribute.value);
        }
    }
    Ok(())
}
