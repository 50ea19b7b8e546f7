//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function that picks human or robot output

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod cache;
pub mod cluster;
pub mod patterns;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Patterns(args) => patterns::run(ctx, args),
        Commands::Cluster(args) => cluster::run(ctx, args),
        Commands::Cache(args) => cache::run(ctx, args),
    }
}
