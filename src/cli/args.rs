//! CLI argument definitions using clap derive

use crate::cleanup::{BuildRole, NestedKind};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// hoard - content-addressed build output cache
///
/// Stores build outputs by content key in a directory shared between
/// processes and cleans out entries that have not been used for a while.
#[derive(Parser, Debug)]
#[command(name = "hoard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "HOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache store directory (overrides cache.dir)
    #[arg(long, global = true, env = "HOARD_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a file in the cache
    Put(PutArgs),

    /// Copy an entry out of the cache
    Get(GetArgs),

    /// Remove an entry from the cache
    Invalidate(InvalidateArgs),

    /// Print a one-line summary of the cache store
    Status(StatusArgs),

    /// Run end-of-build cache maintenance
    Gc(GcArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the put command
#[derive(Parser, Debug)]
pub struct PutArgs {
    /// File whose bytes become the entry
    pub file: PathBuf,

    /// Key to store under (default: derived from the file contents)
    #[arg(short, long)]
    pub key: Option<String>,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Entry key
    pub key: String,

    /// Write the entry to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the invalidate command
#[derive(Parser, Debug)]
pub struct InvalidateArgs {
    /// Entry key
    pub key: String,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the gc command
#[derive(Parser, Debug)]
pub struct GcArgs {
    /// Additional store directories known to this build
    #[arg(long = "store", value_name = "DIR")]
    pub stores: Vec<PathBuf>,

    /// Position of this build in the invocation hierarchy
    /// (default: nested when HOARD_PARENT_BUILD is set, otherwise root)
    #[arg(long, value_enum)]
    pub role: Option<RoleArg>,

    /// Scan even if the cleanup interval has not elapsed
    #[arg(long)]
    pub force: bool,
}

/// Build role accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Top-level build
    Root,
    /// Build started by a task of another build
    Nested,
    /// Build included in a composite build
    Included,
    /// A project's build-logic build
    BuildLogic,
}

impl From<RoleArg> for BuildRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Root => BuildRole::Root,
            RoleArg::Nested => BuildRole::Nested(NestedKind::BuildWithinBuild),
            RoleArg::Included => BuildRole::Nested(NestedKind::IncludedBuild),
            RoleArg::BuildLogic => BuildRole::Nested(NestedKind::BuildLogic),
        }
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
