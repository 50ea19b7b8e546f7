//! skillmine patterns - Rank recurring tool workflows

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use itertools::Itertools;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::Result;
use crate::patterns::RankingOptions;
use crate::pipeline::{MiningReport, mine_patterns};
use crate::sessions::discover_sessions;
use crate::utils::format::{format_age_days, truncate_string};

#[derive(Args, Debug)]
pub struct PatternsArgs {
    /// Session log root, one directory per project
    pub root: PathBuf,

    /// Maximum number of candidates to show
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Drop patterns seen fewer times than this
    #[arg(long)]
    pub min_occurrences: Option<usize>,
}

impl PatternsArgs {
    fn ranking_options(&self, ctx: &AppContext) -> RankingOptions {
        let mut options = ctx.config.ranking_options();
        if let Some(limit) = self.limit {
            options.limit = limit;
        }
        if let Some(min) = self.min_occurrences {
            options.min_occurrences = min;
        }
        options
    }
}

pub fn run(ctx: &AppContext, args: &PatternsArgs) -> Result<()> {
    let sessions = discover_sessions(&args.root)?;
    let report = mine_patterns(&sessions, Utc::now(), &args.ranking_options(ctx))?;

    if ctx.robot_mode {
        run_robot(&report)
    } else {
        run_human(&report);
        Ok(())
    }
}

fn run_human(report: &MiningReport) {
    println!(
        "{} ({} of {} patterns, {} sessions, {} projects)",
        "Pattern Candidates".bold(),
        report.candidates.len(),
        report.distinct_patterns,
        report.total_sessions,
        report.total_projects
    );

    if report.candidates.is_empty() {
        println!();
        println!("{}", "No recurring patterns found.".dimmed());
        return;
    }

    let now = Utc::now();
    for (rank, candidate) in report.candidates.iter().enumerate() {
        let evidence = &candidate.evidence;
        println!();
        println!(
            "{:>3}. {}  {}",
            rank + 1,
            candidate.name.cyan().bold(),
            format!("{:.3}", candidate.score).green()
        );
        println!(
            "     {}  [{}]",
            candidate.label,
            candidate.kind.as_str().dimmed()
        );
        println!("     {}", candidate.description);

        let seen = evidence
            .last_seen
            .map(|ts| format!(", last seen {}", format_age_days((now - ts).num_days())))
            .unwrap_or_default();
        println!(
            "     {} occurrences in {} sessions across {} projects{seen}",
            evidence.occurrence_count,
            evidence.sessions.len(),
            evidence.projects.len()
        );
        println!("     projects: {}", evidence.projects.iter().join(", ").dimmed());
        for example in &evidence.examples {
            println!("     {} {}", "$".dimmed(), truncate_string(example, 96));
        }
    }
}

fn run_robot(report: &MiningReport) -> Result<()> {
    emit_json(&robot_ok(report))
}
