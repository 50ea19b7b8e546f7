//! skillmine cache - Prompt embedding cache maintenance

use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::embeddings::{CacheStats, PromptEmbeddingCache, build_provider};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show entry counts for the current model version
    Stats,
    /// Remove every cached embedding
    Clear,
}

#[derive(Serialize)]
struct ClearReport {
    path: String,
    removed: usize,
}

pub fn run(ctx: &AppContext, args: &CacheArgs) -> Result<()> {
    let provider = build_provider(&ctx.config.embedding)?;
    let mut cache = PromptEmbeddingCache::load(ctx.config.cache_path()?, provider.model_version());

    match args.action {
        CacheAction::Stats => {
            let stats = cache.stats();
            if ctx.robot_mode {
                emit_json(&robot_ok(stats))
            } else {
                print_stats(&stats);
                Ok(())
            }
        }
        CacheAction::Clear => {
            let report = ClearReport {
                path: cache.path().display().to_string(),
                removed: cache.len(),
            };
            cache.clear();
            cache.save()?;
            if ctx.robot_mode {
                emit_json(&robot_ok(report))
            } else {
                println!(
                    "{} {} entries from {}",
                    "Cleared".green().bold(),
                    report.removed,
                    report.path
                );
                Ok(())
            }
        }
    }
}

fn print_stats(stats: &CacheStats) {
    println!("{}", "Embedding Cache".bold());
    println!("  Path: {}", stats.path.display().to_string().cyan());
    println!("  Model: {}", stats.model_version.cyan());
    println!("  Entries: {}", stats.total_entries);
    println!("  Valid: {}", stats.valid_entries.to_string().green());
    if stats.stale_entries > 0 {
        println!(
            "  Stale: {} {}",
            stats.stale_entries.to_string().yellow(),
            "(other model versions)".dimmed()
        );
    }
}
