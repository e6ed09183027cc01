use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use declarative::{BumpStrategy, LifecycleState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Converge an event catalog to the state described by an API document", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Catalog API base URL
    #[arg(long, env = "CATALOG_SYNC_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Catalog API token
    #[arg(long, env = "CATALOG_SYNC_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or version catalog resources to match a document
    Sync(SyncArgs),

    /// Compare two documents channel by channel
    Diff(DiffArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Sync
// ============================================================================

#[derive(Parser)]
pub struct SyncArgs {
    /// Document to synchronize (JSON)
    pub document: PathBuf,

    /// Application domain, when the document does not name one
    #[arg(long)]
    pub domain: Option<String>,

    /// How changed versioned resources advance
    #[arg(long, value_enum)]
    pub bump: Option<BumpArg>,

    /// Lifecycle state new versions are moved to
    #[arg(long, value_enum)]
    pub state: Option<StateArg>,

    /// Dry run - show what would be done
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Extra attempts per resource after a transient failure
    #[arg(long)]
    pub retries: Option<u32>,

    /// Show the differences behind updates
    #[arg(long)]
    pub show_diff: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BumpArg {
    Minor,
    Patch,
}

impl From<BumpArg> for BumpStrategy {
    fn from(arg: BumpArg) -> Self {
        match arg {
            BumpArg::Minor => Self::Minor,
            BumpArg::Patch => Self::Patch,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Draft,
    Released,
    Deprecated,
    Retired,
}

impl From<StateArg> for LifecycleState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Draft => Self::Draft,
            StateArg::Released => Self::Released,
            StateArg::Deprecated => Self::Deprecated,
            StateArg::Retired => Self::Retired,
        }
    }
}

// ============================================================================
// Diff
// ============================================================================

#[derive(Parser)]
pub struct DiffArgs {
    /// Document describing the current state
    pub existing: PathBuf,

    /// Document describing the new state
    pub new: PathBuf,

    /// Print the change list as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_args() {
        let cli = Cli::try_parse_from([
            "catalog-sync",
            "sync",
            "api.json",
            "--bump",
            "patch",
            "--state",
            "released",
            "-d",
        ])
        .unwrap();

        match cli.command {
            Command::Sync(args) => {
                assert_eq!(args.document, PathBuf::from("api.json"));
                assert_eq!(args.bump.map(BumpStrategy::from), Some(BumpStrategy::Patch));
                assert_eq!(
                    args.state.map(LifecycleState::from),
                    Some(LifecycleState::Released)
                );
                assert!(args.dry_run);
                assert!(!args.yes);
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn test_diff_args() {
        let cli = Cli::try_parse_from(["catalog-sync", "diff", "old.json", "new.json", "--json"])
            .unwrap();
        match cli.command {
            Command::Diff(args) => {
                assert_eq!(args.new, PathBuf::from("new.json"));
                assert!(args.json);
            }
            _ => panic!("expected diff"),
        }
    }
}
