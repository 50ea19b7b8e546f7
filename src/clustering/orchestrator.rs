//! Prompt clustering across projects
//!
//! Each project is embedded and clustered on its own. Clusters from different
//! projects whose centroids point the same way are then merged, so a theme
//! that recurs across projects surfaces as one cluster.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embeddings::{EmbeddingProvider, EmbeddingResult, PromptEmbeddingCache};
use crate::error::{MineError, Result};
use crate::utils::format::{truncate_string, truncate_words};

use super::dbscan::dbscan;
use super::distance::{centroid, cosine_distance, cosine_similarity};
use super::epsilon::auto_epsilon;

pub const MAX_LABEL_CHARS: usize = 100;
pub const MAX_EXAMPLE_PROMPTS: usize = 3;

/// A user prompt eligible for clustering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedPrompt {
    pub text: String,
    pub session_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub project_slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptions {
    /// Projects with fewer prompts are skipped entirely.
    pub min_prompts_per_project: usize,
    /// Prompts are cut to this many words before embedding.
    pub max_words: usize,
    /// Cache misses sent to the provider per call.
    pub batch_size: usize,
    pub min_pts: usize,
    /// Fixed DBSCAN radius; tuned per project when `None`.
    pub epsilon: Option<f64>,
    /// Minimum centroid cosine similarity for a cross-project merge.
    pub merge_threshold: f64,
    pub max_clusters: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_prompts_per_project: 10,
            max_words: 200,
            batch_size: 64,
            min_pts: 3,
            epsilon: None,
            merge_threshold: 0.8,
            max_clusters: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptCluster {
    pub label: String,
    pub example_prompts: Vec<String>,
    pub centroid: Vec<f32>,
    pub member_count: usize,
    pub project_slugs: BTreeSet<String>,
    pub timestamps: Vec<DateTime<Utc>>,
}

/// Run counters, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub projects_clustered: usize,
    pub prompts_embedded: usize,
    pub cache_hits: usize,
    pub noise_prompts: usize,
    pub merges: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub clusters: Vec<PromptCluster>,
    pub skipped_projects: Vec<String>,
    pub stats: ClusterStats,
}

/// Group prompts by project, preserving their order within each project.
pub fn group_by_project(
    prompts: impl IntoIterator<Item = CollectedPrompt>,
) -> BTreeMap<String, Vec<CollectedPrompt>> {
    let mut grouped: BTreeMap<String, Vec<CollectedPrompt>> = BTreeMap::new();
    for prompt in prompts {
        grouped
            .entry(prompt.project_slug.clone())
            .or_default()
            .push(prompt);
    }
    grouped
}

#[derive(Debug, Clone)]
struct Member {
    text: String,
    embedding: Vec<f32>,
    project_slug: String,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct ClusterDraft {
    members: Vec<Member>,
    centroid: Vec<f32>,
    projects: BTreeSet<String>,
}

impl ClusterDraft {
    fn new(members: Vec<Member>) -> Self {
        let mut draft = Self {
            members,
            centroid: Vec::new(),
            projects: BTreeSet::new(),
        };
        draft.refresh();
        draft
    }

    fn refresh(&mut self) {
        let vectors: Vec<&[f32]> = self.members.iter().map(|m| m.embedding.as_slice()).collect();
        self.centroid = centroid(&vectors);
        self.projects = self.members.iter().map(|m| m.project_slug.clone()).collect();
    }

    fn absorb(&mut self, other: Self) {
        self.members.extend(other.members);
        self.refresh();
    }

    /// Members ordered by closeness to the centroid, ties by text.
    fn by_centrality(&self) -> Vec<&Member> {
        let mut ranked: Vec<(&Member, f64)> = self
            .members
            .iter()
            .map(|m| (m, cosine_distance(&m.embedding, &self.centroid)))
            .collect();
        ranked.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.text.cmp(&b.0.text))
        });
        ranked.into_iter().map(|(m, _)| m).collect()
    }

    fn into_cluster(self) -> PromptCluster {
        let central = self.by_centrality();
        let label = central
            .first()
            .map(|m| truncate_string(&m.text, MAX_LABEL_CHARS))
            .unwrap_or_default();

        let mut example_prompts: Vec<String> = Vec::new();
        for member in &central {
            if example_prompts.len() == MAX_EXAMPLE_PROMPTS {
                break;
            }
            if !example_prompts.contains(&member.text) {
                example_prompts.push(member.text.clone());
            }
        }

        let mut timestamps: Vec<DateTime<Utc>> =
            self.members.iter().filter_map(|m| m.timestamp).collect();
        timestamps.sort_unstable();

        PromptCluster {
            label,
            example_prompts,
            member_count: self.members.len(),
            centroid: self.centroid,
            project_slugs: self.projects,
            timestamps,
        }
    }
}

/// Cluster prompts per project, merge across projects, and rank.
///
/// `cache` must be keyed by the provider's model version.
///
/// # Errors
///
/// Provider failures and result-count mismatches abort the run with
/// [`MineError::Embedding`]; batches saved to the cache before the failure
/// stay saved. Cache save failures are only logged.
pub async fn cluster_prompts(
    prompts_by_project: &BTreeMap<String, Vec<CollectedPrompt>>,
    provider: &dyn EmbeddingProvider,
    cache: &mut PromptEmbeddingCache,
    options: Option<&ClusterOptions>,
) -> Result<ClusterResult> {
    let defaults = ClusterOptions::default();
    let options = options.unwrap_or(&defaults);

    if cache.model_version() != provider.model_version() {
        return Err(MineError::Config(format!(
            "embedding cache is keyed by model `{}` but the provider is `{}`",
            cache.model_version(),
            provider.model_version()
        )));
    }

    let mut result = ClusterResult::default();
    let mut drafts: Vec<ClusterDraft> = Vec::new();

    // Map order keeps `skipped_projects` sorted.
    for (project, prompts) in prompts_by_project {
        if prompts.len() < options.min_prompts_per_project {
            debug!(
                project = %project,
                prompts = prompts.len(),
                min = options.min_prompts_per_project,
                "skipping project with too few prompts"
            );
            result.skipped_projects.push(project.clone());
            continue;
        }

        let embeddings = embed_prompts(prompts, provider, cache, options, &mut result.stats).await?;
        let epsilon = options
            .epsilon
            .unwrap_or_else(|| auto_epsilon(&embeddings, options.min_pts, cosine_distance));
        let found = dbscan(&embeddings, epsilon, options.min_pts, cosine_distance);

        info!(
            project = %project,
            prompts = prompts.len(),
            epsilon,
            clusters = found.clusters.len(),
            noise = found.noise.len(),
            "clustered project prompts"
        );
        result.stats.projects_clustered += 1;
        result.stats.noise_prompts += found.noise.len();

        for indices in found.clusters {
            let members = indices
                .into_iter()
                .map(|idx| Member {
                    text: prompts[idx].text.clone(),
                    embedding: embeddings[idx].clone(),
                    project_slug: project.clone(),
                    timestamp: prompts[idx].timestamp,
                })
                .collect();
            drafts.push(ClusterDraft::new(members));
        }
    }

    result.stats.merges = merge_across_projects(&mut drafts, options.merge_threshold);

    let mut clusters: Vec<PromptCluster> =
        drafts.into_iter().map(ClusterDraft::into_cluster).collect();
    clusters.sort_by(|a, b| {
        b.member_count
            .cmp(&a.member_count)
            .then_with(|| a.label.cmp(&b.label))
    });
    clusters.truncate(options.max_clusters);
    result.clusters = clusters;
    Ok(result)
}

/// Embed one project's prompts, serving hits from `cache` and sending misses
/// to `provider` in sequential batches.
async fn embed_prompts(
    prompts: &[CollectedPrompt],
    provider: &dyn EmbeddingProvider,
    cache: &mut PromptEmbeddingCache,
    options: &ClusterOptions,
    stats: &mut ClusterStats,
) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = prompts
        .iter()
        .map(|p| truncate_words(&p.text, options.max_words))
        .collect();
    let mut resolved: Vec<Option<EmbeddingResult>> = cache
        .get_all(&texts)
        .into_iter()
        .map(|hit| hit.map(EmbeddingResult::cached))
        .collect();

    let misses: Vec<usize> = resolved
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_none())
        .map(|(idx, _)| idx)
        .collect();
    stats.cache_hits += resolved.iter().flatten().filter(|r| r.from_cache).count();

    for batch in misses.chunks(options.batch_size.max(1)) {
        let batch_texts: Vec<String> = batch.iter().map(|&idx| texts[idx].clone()).collect();
        let results = provider.embed_batch(&batch_texts).await?;
        if results.len() != batch_texts.len() {
            return Err(MineError::Embedding(format!(
                "provider returned {} embeddings for {} texts",
                results.len(),
                batch_texts.len()
            )));
        }

        cache.set_batch(
            batch_texts
                .iter()
                .zip(&results)
                .map(|(text, r)| (text, r.embedding.clone())),
        );
        for (&idx, result) in batch.iter().zip(results) {
            resolved[idx] = Some(result);
        }
        stats.prompts_embedded += batch.len();

        if let Err(err) = cache.save() {
            warn!(path = %cache.path().display(), "failed to save embedding cache: {err}");
        }
    }

    resolved
        .into_iter()
        .map(|r| {
            r.map(|r| r.embedding)
                .ok_or_else(|| MineError::Embedding("prompt left without an embedding".into()))
        })
        .collect()
}

/// Merge clusters with disjoint project sets whose centroids are at least
/// `threshold` similar, until no pair qualifies. Returns the merge count.
fn merge_across_projects(drafts: &mut Vec<ClusterDraft>, threshold: f64) -> usize {
    let mut merges = 0;
    loop {
        let pair = (0..drafts.len()).find_map(|i| {
            (i + 1..drafts.len())
                .find(|&j| {
                    drafts[i].projects.is_disjoint(&drafts[j].projects)
                        && cosine_similarity(&drafts[i].centroid, &drafts[j].centroid) >= threshold
                })
                .map(|j| (i, j))
        });
        let Some((i, j)) = pair else {
            break;
        };
        let other = drafts.remove(j);
        debug!(
            into = ?drafts[i].projects,
            from = ?other.projects,
            "merging cross-project clusters"
        );
        drafts[i].absorb(other);
        merges += 1;
    }
    merges
}
