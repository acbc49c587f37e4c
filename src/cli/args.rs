//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Print listings as JSON

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::{ConflictSide, ResetMode};

/// ggp - porcelain for GeoGig versioned feature repositories
#[derive(Parser, Debug)]
#[command(name = "ggp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if ggp was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging (engine command lines are logged)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print listings as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    // ========== Setup ==========
    /// Create a new repository
    #[command(
        name = "init",
        long_about = "Create a new repository in the current directory (or --cwd).\n\n\
            Init parameters are passed to the engine unchanged and select things \
            like the storage backend.",
        after_help = "\
WORKFLOW EXAMPLES:
    # New repository here
    ggp init

    # New repository elsewhere, with an explicit storage backend
    ggp --cwd /data/parks init -p storage=rocksdb"
    )]
    Init {
        /// Init parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Clone a repository
    #[command(name = "clone")]
    Clone {
        /// Repository URL (or local path)
        url: String,

        /// Destination directory
        dest: PathBuf,

        /// User name for the remote
        #[arg(long, requires = "password")]
        username: Option<String>,

        /// Password for the remote
        #[arg(long, requires = "username")]
        password: Option<String>,
    },

    /// Get or set engine configuration, or show porcelain settings
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List, add or remove remotes
    #[command(name = "remote")]
    Remote {
        #[command(subcommand)]
        action: Option<RemoteAction>,
    },

    // ========== Read-Only Commands ==========
    /// Show commit history
    #[command(
        name = "log",
        long_about = "Show commit history, newest first.\n\n\
            Without options this lists everything reachable from HEAD. Paths, \
            dates and a starting commit narrow the listing.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Full history
    ggp log

    # Last five commits touching the parks tree
    ggp log --path parks -n 5

    # What happened on a branch since it left master
    ggp log topic --since-commit master"
    )]
    Log {
        /// Tip to list from (default HEAD)
        reference: Option<String>,

        /// Exclude commits reachable from this one
        #[arg(long)]
        since_commit: Option<String>,

        /// Only commits after this date
        #[arg(long)]
        since: Option<String>,

        /// Only commits before this date
        #[arg(long)]
        until: Option<String>,

        /// Only commits touching this path (repeatable)
        #[arg(long = "path")]
        paths: Vec<String>,

        /// Maximum number of commits
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show branch, operation state and pending changes
    #[command(name = "status")]
    Status,

    /// Show changes between two references
    #[command(
        name = "diff",
        long_about = "Show changes between two references.\n\n\
            By default compares HEAD with the working tree. --stat prints \
            per-tree counts, and --attributes prints attribute-level changes \
            for the single feature named by --path.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Uncommitted changes
    ggp diff

    # What the last commit changed
    ggp diff HEAD~1 HEAD

    # Attribute changes of one feature
    ggp diff HEAD~1 HEAD --path parks/5 --attributes

    # Every changed feature under a tree, with attribute markers
    ggp diff HEAD~1 HEAD --path parks --describe"
    )]
    Diff {
        /// Old side (default HEAD)
        old: Option<String>,

        /// New side (default WORK_HEAD)
        new: Option<String>,

        /// Restrict to this path
        #[arg(long)]
        path: Option<String>,

        /// Per-tree change counts
        #[arg(long, conflicts_with_all = ["attributes", "describe"])]
        stat: bool,

        /// Attribute changes of the feature at --path
        #[arg(long, requires = "path", conflicts_with = "describe")]
        attributes: bool,

        /// Describe every changed feature under the tree at --path
        #[arg(long, requires = "path")]
        describe: bool,
    },

    /// Describe an object
    #[command(name = "show")]
    Show {
        /// Reference or ref:path
        reference: String,
    },

    /// List the contents of a tree
    #[command(name = "ls")]
    Ls {
        /// Tree path (default root)
        path: Option<String>,

        /// Reference to list (default HEAD)
        #[arg(long = "ref", default_value = "HEAD")]
        reference: String,

        /// Descend into subtrees
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show who last changed each attribute of a feature
    #[command(name = "blame")]
    Blame {
        /// Feature path
        path: String,
    },

    /// Show every committed version of a feature
    #[command(name = "versions")]
    Versions {
        /// Feature path
        path: String,
    },

    // ========== Working Tree Commands ==========
    /// Stage changes
    #[command(name = "add")]
    Add {
        /// Paths to stage (default everything)
        paths: Vec<String>,
    },

    /// Record staged changes
    #[command(name = "commit")]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Stage everything before committing
        #[arg(short, long)]
        all: bool,

        /// Restrict the commit to these paths
        paths: Vec<String>,
    },

    /// Switch branches or restore paths
    #[command(name = "checkout")]
    Checkout {
        /// Branch, tag or commit
        reference: String,

        /// Restore only these paths
        #[arg(short, long = "path")]
        paths: Vec<String>,

        /// Discard local changes
        #[arg(short, long)]
        force: bool,
    },

    /// Move HEAD, or restore one path from a reference
    #[command(name = "reset")]
    Reset {
        /// Target (default HEAD)
        #[arg(default_value = "HEAD")]
        reference: String,

        /// Move the branch only
        #[arg(long, conflicts_with_all = ["mixed", "path"])]
        soft: bool,

        /// Move the branch and the index
        #[arg(long, conflicts_with = "path")]
        mixed: bool,

        /// Reset only this path
        #[arg(long)]
        path: Option<String>,
    },

    // ========== Branches and Tags ==========
    /// List, create or delete branches
    #[command(
        name = "branch",
        after_help = "\
WORKFLOW EXAMPLES:
    # List branches
    ggp branch

    # New branch from HEAD, switching to it
    ggp branch topic -c

    # New branch from a tag
    ggp branch hotfix --start v1.0

    # Delete
    ggp branch topic -d"
    )]
    Branch {
        /// Branch name (omit to list)
        name: Option<String>,

        /// Start point (default HEAD)
        #[arg(long, default_value = "HEAD")]
        start: String,

        /// Switch to the new branch
        #[arg(short, long, requires = "name")]
        checkout: bool,

        /// Overwrite an existing branch
        #[arg(short, long, requires = "name")]
        force: bool,

        /// Delete the branch
        #[arg(short, long, requires = "name", conflicts_with_all = ["checkout", "force"])]
        delete: bool,
    },

    /// List, create or delete tags
    #[command(name = "tag")]
    Tag {
        /// Tag name (omit to list)
        name: Option<String>,

        /// Commit to tag (default HEAD)
        #[arg(default_value = "HEAD")]
        reference: String,

        /// Tag message
        #[arg(short, long, default_value = "")]
        message: String,

        /// Delete the tag
        #[arg(short, long, requires = "name")]
        delete: bool,
    },

    // ========== Versioning Operations ==========
    /// Merge a branch into HEAD
    #[command(
        name = "merge",
        long_about = "Merge a branch or commit into HEAD.\n\n\
            If the merge stops on conflicts the repository is left merging. \
            Inspect with 'ggp conflicts', resolve with 'ggp resolve', then \
            commit, or give up with 'ggp abort'.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Merge a topic branch
    ggp merge topic

    # Merge without committing, to inspect the result first
    ggp merge topic --no-commit

CONFLICTS:
    ggp conflicts                    # list conflicted paths
    ggp resolve parks/5 --theirs     # take the incoming version
    ggp commit -m \"merge topic\"      # finish
    ggp abort                        # or give up"
    )]
    Merge {
        /// Branch or commit to merge
        reference: String,

        /// Stop before committing
        #[arg(long)]
        no_commit: bool,

        /// Merge commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Replay HEAD's commits onto another reference
    #[command(name = "rebase")]
    Rebase {
        /// New base
        reference: String,
    },

    /// Apply the changes of one commit onto HEAD
    #[command(name = "cherry-pick")]
    CherryPick {
        /// Commit to apply
        reference: String,
    },

    /// Fetch and integrate a remote branch
    #[command(name = "pull")]
    Pull {
        /// Remote (default from config)
        remote: Option<String>,

        /// Branch (default the current one)
        branch: Option<String>,

        /// Rebase instead of merging
        #[arg(long)]
        rebase: bool,
    },

    /// Send local commits to a remote
    #[command(name = "push")]
    Push {
        /// Remote (default from config)
        remote: Option<String>,

        /// Branch (default the current one)
        branch: Option<String>,

        /// Push every branch
        #[arg(long, conflicts_with = "branch")]
        all: bool,
    },

    /// List conflicted paths of a stopped merge or rebase
    #[command(name = "conflicts")]
    Conflicts,

    /// Resolve conflicted paths to one side
    #[command(name = "resolve")]
    Resolve {
        /// Conflicted paths
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        side: SideArgs,
    },

    /// Continue a stopped rebase after resolving conflicts
    #[command(name = "continue")]
    Continue,

    /// Abort a stopped merge or rebase
    #[command(name = "abort")]
    Abort,

    // ========== Interchange ==========
    /// Import features from an external format
    #[command(name = "import")]
    Import {
        #[command(subcommand)]
        format: ImportFormat,
    },

    /// Export features to an external format
    #[command(name = "export")]
    Export {
        #[command(subcommand)]
        format: ExportFormat,
    },
}

/// Which side `resolve` keeps.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SideArgs {
    /// Keep the current branch's version
    #[arg(long)]
    pub ours: bool,

    /// Keep the incoming version
    #[arg(long)]
    pub theirs: bool,
}

impl SideArgs {
    pub fn side(&self) -> ConflictSide {
        if self.ours {
            ConflictSide::Ours
        } else {
            ConflictSide::Theirs
        }
    }
}

/// Reset mode from the `--soft` / `--mixed` flags; hard otherwise.
pub fn reset_mode(soft: bool, mixed: bool) -> ResetMode {
    if soft {
        ResetMode::Soft
    } else if mixed {
        ResetMode::Mixed
    } else {
        ResetMode::Hard
    }
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get an engine configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set an engine configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
        /// Write to the user's global engine config
        #[arg(long)]
        global: bool,
    },
    /// Show the porcelain's own settings and where they came from
    Show,
}

/// Remote subcommands. Listing is the default.
#[derive(Subcommand, Debug)]
pub enum RemoteAction {
    /// List remotes
    List,
    /// Add a remote
    Add {
        name: String,
        url: String,
        #[arg(long, requires = "password")]
        username: Option<String>,
        #[arg(long, requires = "username")]
        password: Option<String>,
    },
    /// Remove a remote
    Remove { name: String },
}

/// Options shared by every import format.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Destination tree
    #[arg(long)]
    pub dest: Option<String>,

    /// Add to existing trees instead of replacing them
    #[arg(long)]
    pub add: bool,

    /// Attribute to use as feature id
    #[arg(long)]
    pub fid_attribute: Option<String>,

    /// Use the destination's feature type for every imported feature
    #[arg(long)]
    pub force_feature_type: bool,
}

#[derive(Subcommand, Debug)]
pub enum ImportFormat {
    /// Import a shapefile
    Shp {
        file: PathBuf,
        #[command(flatten)]
        options: ImportArgs,
    },
    /// Import a GeoJSON file
    Geojson {
        file: PathBuf,
        #[command(flatten)]
        options: ImportArgs,
        /// Name of the geometry attribute
        #[arg(long)]
        geom_name: Option<String>,
    },
    /// Import a SpatiaLite table
    Sl {
        database: PathBuf,
        table: String,
        #[command(flatten)]
        options: ImportArgs,
    },
    /// Import OSM data
    Osm {
        file: PathBuf,
        /// Add to existing data
        #[arg(long)]
        add: bool,
        /// JSON mapping file
        #[arg(long)]
        mapping: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExportFormat {
    /// Export a tree to a shapefile
    Shp {
        /// Tree path
        path: String,
        /// Output file
        file: PathBuf,
        /// Reference to export (default HEAD)
        #[arg(long = "ref", default_value = "HEAD")]
        reference: String,
    },
    /// Export the changes of a tree between two references to a shapefile
    ShpDiff {
        old: String,
        new: String,
        path: String,
        file: PathBuf,
        /// Export the old version of changed features
        #[arg(long)]
        old_version: bool,
        #[arg(long)]
        overwrite: bool,
    },
    /// Export to an OSM file
    Osm {
        file: PathBuf,
        /// Reference to export (default HEAD)
        #[arg(long = "ref")]
        reference: Option<String>,
        /// Bounding box as minx,miny,maxx,maxy
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        bbox: Option<Vec<f64>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("ggp").chain(args.iter().copied()))
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["log", "--debug", "--cwd", "/data/parks"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.cwd, Some(PathBuf::from("/data/parks")));
    }

    #[test]
    fn diff_attributes_require_path() {
        assert!(parse(&["diff", "HEAD~1", "HEAD", "--attributes"]).is_err());
        assert!(parse(&["diff", "HEAD~1", "HEAD", "--attributes", "--path", "parks/5"]).is_ok());
    }

    #[test]
    fn resolve_needs_one_side() {
        assert!(parse(&["resolve", "parks/5"]).is_err());
        assert!(parse(&["resolve", "parks/5", "--ours", "--theirs"]).is_err());
        let cli = parse(&["resolve", "parks/5", "--theirs"]).unwrap();
        match cli.command {
            Command::Resolve { side, .. } => assert_eq!(side.side(), ConflictSide::Theirs),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reset_defaults_to_hard() {
        assert_eq!(reset_mode(false, false), ResetMode::Hard);
        assert_eq!(reset_mode(true, false), ResetMode::Soft);
        assert_eq!(reset_mode(false, true), ResetMode::Mixed);
    }

    #[test]
    fn bbox_takes_four_numbers() {
        let cli = parse(&["export", "osm", "out.xml", "--bbox=-1.5,40,2,41"]).unwrap();
        match cli.command {
            Command::Export {
                format: ExportFormat::Osm { bbox, .. },
            } => assert_eq!(bbox, Some(vec![-1.5, 40.0, 2.0, 41.0])),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bbox_count_checked_later() {
        let cli = parse(&["export", "osm", "out.xml", "--bbox", "0,0,1"]).unwrap();
        match cli.command {
            Command::Export {
                format: ExportFormat::Osm { bbox, .. },
            } => assert_eq!(bbox.map(|b| b.len()), Some(3)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn remote_without_action_lists() {
        let cli = parse(&["remote"]).unwrap();
        assert!(matches!(cli.command, Command::Remote { action: None }));
    }
}
