//! init, clone, config and remote commands

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use tracing::debug;

use crate::cli::args::{ConfigAction, RemoteAction};
use crate::cli::{discover, Context};
use crate::core::config::Config;
use crate::repo::Repository;
use crate::ui::output;

/// Split `key=value` init parameters.
fn parse_params(params: &[String]) -> Result<Vec<(&str, &str)>> {
    params
        .iter()
        .map(|p| match p.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k, v)),
            _ => bail!("Init parameter '{}' is not of the form key=value", p),
        })
        .collect()
}

/// Create a repository in the working directory.
pub fn init(ctx: &Context, params: &[String]) -> Result<()> {
    let location = ctx.workdir()?;
    let params = parse_params(params)?;

    let config = Config::load(Some(&location)).context("Failed to load config")?.config;
    let transport = config.transport().context("Failed to reach the engine")?;
    let repo = Repository::init(&location, transport, config.settings(), &params)
        .with_context(|| format!("Failed to initialize repository at {}", location.display()))?;

    output::success(
        format!("Initialized empty repository in {}", repo.location().display()),
        ctx.verbosity,
    );
    Ok(())
}

/// Clone `url` into `dest`, relative to the working directory.
pub fn clone(ctx: &Context, url: &str, dest: &Path, credentials: Option<(&str, &str)>) -> Result<()> {
    let dest = ctx.workdir()?.join(dest);
    let config = Config::load(None).context("Failed to load config")?.config;
    let transport = config.transport().context("Failed to reach the engine")?;

    let repo = Repository::clone_from(url, &dest, transport, config.settings(), credentials)
        .with_context(|| format!("Failed to clone {}", url))?;

    output::success(format!("Cloned into {}", repo.location().display()), ctx.verbosity);
    Ok(())
}

pub fn config(ctx: &Context, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let repo = ctx.open_repo()?;
            if let Some(value) = repo.get_config(&key).context("Failed to read config")? {
                println!("{}", value);
            }
            Ok(())
        }
        ConfigAction::Set { key, value, global } => {
            let repo = ctx.open_repo()?;
            repo.config(&key, &value, global)
                .with_context(|| format!("Failed to set {}", key))?;
            output::debug(format!("{} = {}", key, value), ctx.verbosity);
            Ok(())
        }
        ConfigAction::Show => show_settings(ctx),
    }
}

/// Print the porcelain's effective settings.
fn show_settings(ctx: &Context) -> Result<()> {
    let workdir = ctx.workdir()?;
    let root = discover(&workdir);
    let config = Config::load(root.as_deref()).context("Failed to load config")?.config;
    debug!(global = ?config.global_config_loaded_from(), repo = ?config.repo_config_loaded_from(), "loaded config");

    let sources = |path: Option<&Path>| path.map(|p| p.display().to_string());
    if ctx.json {
        output::json(&serde_json::json!({
            "engine": config.engine(),
            "transport": config.transport_kind().name(),
            "gateway": format!("{}:{}", config.gateway_host(), config.gateway_port()),
            "timestamps": config.timestamps().name(),
            "remote": config.remote(),
            "global_config": sources(config.global_config_loaded_from()),
            "repo_config": sources(config.repo_config_loaded_from()),
        }))?;
        return Ok(());
    }

    let rows = [
        ("engine", config.engine().to_string()),
        ("transport", config.transport_kind().name().to_string()),
        ("gateway", format!("{}:{}", config.gateway_host(), config.gateway_port())),
        ("timestamps", config.timestamps().name().to_string()),
        ("remote", config.remote().to_string()),
        (
            "global config",
            sources(config.global_config_loaded_from()).unwrap_or_else(|| "(none)".into()),
        ),
        (
            "repo config",
            sources(config.repo_config_loaded_from()).unwrap_or_else(|| "(none)".into()),
        ),
    ];
    for (label, value) in rows {
        println!("{}", output::format_pair(label, value, 14));
    }
    Ok(())
}

pub fn remote(ctx: &Context, action: Option<RemoteAction>) -> Result<()> {
    let repo = ctx.open_repo()?;
    match action.unwrap_or(RemoteAction::List) {
        RemoteAction::List => {
            let remotes = repo.remotes().context("Failed to list remotes")?;
            if ctx.json {
                output::json(&remotes)?;
            } else {
                let width = remotes.keys().map(String::len).max().unwrap_or(0);
                for (name, url) in &remotes {
                    println!("{}", output::format_pair(name, url, width));
                }
            }
        }
        RemoteAction::Add {
            name,
            url,
            username,
            password,
        } => {
            repo.add_remote(&name, &url, username.as_deref().zip(password.as_deref()))
                .with_context(|| format!("Failed to add remote '{}'", name))?;
            output::success(format!("Added remote '{}'", name), ctx.verbosity);
        }
        RemoteAction::Remove { name } => {
            repo.remove_remote(&name)
                .with_context(|| format!("Failed to remove remote '{}'", name))?;
            output::success(format!("Removed remote '{}'", name), ctx.verbosity);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_split_on_first_equals() {
        let params = vec!["storage=rocksdb".to_string(), "url=a=b".to_string()];
        assert_eq!(
            parse_params(&params).unwrap(),
            vec![("storage", "rocksdb"), ("url", "a=b")]
        );
    }

    #[test]
    fn params_without_key_rejected() {
        assert!(parse_params(&["rocksdb".to_string()]).is_err());
        assert!(parse_params(&["=x".to_string()]).is_err());
    }
}
