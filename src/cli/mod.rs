//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// Mine agent session logs for recurring workflows worth turning into skills
#[derive(Parser, Debug)]
#[command(name = "skillmine")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON on stdout for machine consumption
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/skillmine/config.toml)
    #[arg(long, global = true, env = "SKILLMINE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank recurring tool sequences and shell command families
    Patterns(commands::patterns::PatternsArgs),

    /// Cluster user prompts by meaning across projects
    Cluster(commands::cluster::ClusterArgs),

    /// Inspect or reset the prompt embedding cache
    Cache(commands::cache::CacheArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["skillmine", "patterns", "/tmp/x", "--robot", "-vv"]).unwrap();
        assert!(cli.robot);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Patterns(_)));
    }

    #[test]
    fn cache_requires_action() {
        assert!(Cli::try_parse_from(["skillmine", "cache"]).is_err());
        let cli = Cli::try_parse_from(["skillmine", "cache", "stats"]).unwrap();
        assert!(matches!(cli.command, Commands::Cache(_)));
    }
}
