//! skillmine cluster - Group user prompts into cross-project topics

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use itertools::Itertools;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::clustering::{ClusterOptions, ClusterResult, cluster_prompts, group_by_project};
use crate::embeddings::{PromptEmbeddingCache, build_provider};
use crate::error::{MineError, Result};
use crate::sessions::{collect_prompts, discover_sessions};
use crate::utils::format::truncate_string;

#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Session log root, one directory per project
    pub root: PathBuf,

    /// Fixed DBSCAN radius (cosine distance); chosen per project when unset
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Projects with fewer prompts are skipped
    #[arg(long)]
    pub min_prompts: Option<usize>,

    /// Maximum number of clusters to report
    #[arg(long)]
    pub max_clusters: Option<usize>,

    /// Keep embeddings in memory only
    #[arg(long)]
    pub no_cache: bool,
}

impl ClusterArgs {
    fn cluster_options(&self, ctx: &AppContext) -> ClusterOptions {
        let mut options = ctx.config.cluster_options();
        if self.epsilon.is_some() {
            options.epsilon = self.epsilon;
        }
        if let Some(min) = self.min_prompts {
            options.min_prompts_per_project = min;
        }
        if let Some(max) = self.max_clusters {
            options.max_clusters = max;
        }
        options
    }
}

pub fn run(ctx: &AppContext, args: &ClusterArgs) -> Result<()> {
    let options = args.cluster_options(ctx);
    if let Some(epsilon) = options.epsilon {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(MineError::Config(format!(
                "--epsilon must be a positive number, got {epsilon}"
            )));
        }
    }

    let sessions = discover_sessions(&args.root)?;
    let grouped = group_by_project(sessions.iter().flat_map(collect_prompts));
    debug!(projects = grouped.len(), "collected prompts");

    let provider = build_provider(&ctx.config.embedding)?;
    let mut cache = if ctx.config.cache.enabled && !args.no_cache {
        PromptEmbeddingCache::load(ctx.config.cache_path()?, provider.model_version())
    } else {
        PromptEmbeddingCache::in_memory(provider.model_version())
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(cluster_prompts(
        &grouped,
        provider.as_ref(),
        &mut cache,
        Some(&options),
    ))?;

    if ctx.robot_mode {
        run_robot(&result, &options)
    } else {
        run_human(&result);
        Ok(())
    }
}

fn run_human(result: &ClusterResult) {
    let stats = &result.stats;
    println!(
        "{} ({} projects, {} prompts embedded, {} from cache)",
        "Prompt Clusters".bold(),
        stats.projects_clustered,
        stats.prompts_embedded,
        stats.cache_hits
    );
    if !result.skipped_projects.is_empty() {
        println!(
            "{} {}",
            "Skipped (too few prompts):".yellow(),
            result.skipped_projects.iter().join(", ")
        );
    }

    if result.clusters.is_empty() {
        println!();
        println!("{}", "No clusters found.".dimmed());
        return;
    }

    for (idx, cluster) in result.clusters.iter().enumerate() {
        println!();
        println!(
            "{:>3}. {}",
            idx + 1,
            truncate_string(&cluster.label, 80).cyan().bold()
        );
        println!(
            "     {} prompts from {}",
            cluster.member_count,
            cluster.project_slugs.iter().join(", ").dimmed()
        );
        for example in &cluster.example_prompts {
            println!("     {} {}", ">".dimmed(), truncate_string(example, 96));
        }
    }

    if stats.merges > 0 || stats.noise_prompts > 0 {
        println!();
        println!(
            "{}",
            format!(
                "{} cross-project merges, {} unclustered prompts",
                stats.merges, stats.noise_prompts
            )
            .dimmed()
        );
    }
}

fn run_robot(result: &ClusterResult, options: &ClusterOptions) -> Result<()> {
    let warnings = if result.skipped_projects.is_empty() {
        Vec::new()
    } else {
        vec![format!(
            "{} project(s) skipped with fewer than {} prompts",
            result.skipped_projects.len(),
            options.min_prompts_per_project
        )]
    };
    emit_json(&robot_ok(result).with_warnings(warnings))
}
