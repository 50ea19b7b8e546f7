use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use skillmine::clustering::{ClusterOptions, CollectedPrompt, cluster_prompts, group_by_project};
use skillmine::embeddings::{
    EmbeddingMethod, EmbeddingProvider, EmbeddingResult, PromptEmbeddingCache,
};
use skillmine::error::{MineError, Result};
use skillmine::test_utils::logging::TestLogger;

/// Maps prompts to fixed topic axes by keyword.
struct TopicProvider {
    calls: AtomicUsize,
    texts_seen: AtomicUsize,
    drop_last: bool,
    fail_on_call: Option<usize>,
}

impl TopicProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            texts_seen: AtomicUsize::new(0),
            drop_last: false,
            fail_on_call: None,
        }
    }

    /// Errors on the `call`th batch (1-based).
    fn failing_on_call(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new()
        }
    }

    fn short_batches() -> Self {
        Self {
            drop_last: true,
            ..Self::new()
        }
    }

    fn topic(text: &str) -> Vec<f32> {
        if text.contains("auth") || text.contains("login") {
            vec![1.0, 0.0, 0.0]
        } else if text.contains("docs") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TopicProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResult>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(MineError::Embedding(format!("backend down on batch {call}")));
        }
        self.texts_seen.fetch_add(texts.len(), Ordering::SeqCst);
        let mut results: Vec<EmbeddingResult> = texts
            .iter()
            .map(|t| EmbeddingResult::computed(Self::topic(t), EmbeddingMethod::Model))
            .collect();
        if self.drop_last {
            results.pop();
        }
        Ok(results)
    }

    fn model_version(&self) -> &str {
        "topic-v1"
    }
}

fn prompts(project: &str, template: &str, count: usize) -> Vec<CollectedPrompt> {
    (0..count)
        .map(|i| CollectedPrompt {
            text: format!("{template} #{i}"),
            session_id: format!("{project}-s{}", i % 3),
            timestamp: None,
            project_slug: project.to_string(),
        })
        .collect()
}

fn cache() -> PromptEmbeddingCache {
    PromptEmbeddingCache::in_memory("topic-v1")
}

#[tokio::test]
async fn similar_topics_merge_across_projects() {
    let log = TestLogger::new("similar_topics_merge_across_projects");

    let grouped = group_by_project(
        prompts("api", "fix auth token refresh", 15)
            .into_iter()
            .chain(prompts("web", "login form broken", 15)),
    );
    log.log_input("projects", &grouped.keys().collect::<Vec<_>>());

    let provider = TopicProvider::new();
    let mut cache = cache();
    let result = cluster_prompts(&grouped, &provider, &mut cache, None)
        .await
        .unwrap();
    log.log_actual(&result.stats);

    assert!(result.skipped_projects.is_empty());
    assert_eq!(result.clusters.len(), 1);
    let cluster = &result.clusters[0];
    assert_eq!(cluster.member_count, 30);
    assert_eq!(
        cluster.project_slugs.iter().collect::<Vec<_>>(),
        vec!["api", "web"]
    );
    assert_eq!(cluster.example_prompts.len(), 3);
    assert_eq!(result.stats.merges, 1);
    assert_eq!(result.stats.projects_clustered, 2);
    log.pass();
}

#[tokio::test]
async fn distinct_topics_stay_apart_and_sort_by_size() {
    let grouped = group_by_project(
        prompts("api", "fix auth token refresh", 12)
            .into_iter()
            .chain(prompts("api", "write docs for the endpoint", 5))
            .chain(prompts("api", "misc chore", 2)),
    );

    let provider = TopicProvider::new();
    let result = cluster_prompts(&grouped, &provider, &mut cache(), None)
        .await
        .unwrap();

    let sizes: Vec<usize> = result.clusters.iter().map(|c| c.member_count).collect();
    assert_eq!(sizes, vec![12, 5]);
    // Two `misc` prompts are below min_pts.
    assert_eq!(result.stats.noise_prompts, 2);
    assert_eq!(result.stats.merges, 0);
}

#[tokio::test]
async fn project_threshold_is_inclusive() {
    let provider = TopicProvider::new();

    let nine = group_by_project(prompts("project-x", "auth bug", 9));
    let result = cluster_prompts(&nine, &provider, &mut cache(), None)
        .await
        .unwrap();
    assert_eq!(result.skipped_projects, vec!["project-x"]);
    assert!(result.clusters.is_empty());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

    let ten = group_by_project(prompts("project-x", "auth bug", 10));
    let result = cluster_prompts(&ten, &provider, &mut cache(), None)
        .await
        .unwrap();
    assert!(result.skipped_projects.is_empty());
    assert_eq!(result.clusters[0].member_count, 10);
}

#[tokio::test]
async fn misses_are_batched() {
    let grouped = group_by_project(prompts("api", "auth flow", 10));
    let options = ClusterOptions {
        batch_size: 4,
        ..ClusterOptions::default()
    };

    let provider = TopicProvider::new();
    cluster_prompts(&grouped, &provider, &mut cache(), Some(&options))
        .await
        .unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert_eq!(provider.texts_seen.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn second_run_is_served_from_disk_cache() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("embeddings.json");
    let grouped = group_by_project(prompts("api", "auth flow", 12));

    let first = TopicProvider::new();
    let mut cache = PromptEmbeddingCache::load(&path, "topic-v1");
    let result = cluster_prompts(&grouped, &first, &mut cache, None)
        .await
        .unwrap();
    assert_eq!(result.stats.prompts_embedded, 12);
    assert!(path.exists());

    let second = TopicProvider::new();
    let mut reloaded = PromptEmbeddingCache::load(&path, "topic-v1");
    assert_eq!(reloaded.len(), 12);
    let result = cluster_prompts(&grouped, &second, &mut reloaded, None)
        .await
        .unwrap();
    assert_eq!(result.stats.cache_hits, 12);
    assert_eq!(result.stats.prompts_embedded, 0);
    assert_eq!(second.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cache_model_mismatch_is_rejected() {
    let grouped = group_by_project(prompts("api", "auth flow", 12));
    let mut stale = PromptEmbeddingCache::in_memory("other-model");

    let err = cluster_prompts(&grouped, &TopicProvider::new(), &mut stale, None)
        .await
        .unwrap_err();
    assert!(matches!(err, MineError::Config(_)), "{err}");
}

#[tokio::test]
async fn short_provider_batch_fails_the_run() {
    let grouped = group_by_project(prompts("api", "auth flow", 12));

    let err = cluster_prompts(&grouped, &TopicProvider::short_batches(), &mut cache(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MineError::Embedding(_)), "{err}");
}

#[tokio::test]
async fn batches_saved_before_a_failure_stay_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("embeddings.json");
    let grouped = group_by_project(prompts("api", "auth flow", 10));
    let options = ClusterOptions {
        batch_size: 4,
        ..ClusterOptions::default()
    };

    let provider = TopicProvider::failing_on_call(2);
    let mut cache = PromptEmbeddingCache::load(&path, "topic-v1");
    let err = cluster_prompts(&grouped, &provider, &mut cache, Some(&options))
        .await
        .unwrap_err();
    assert!(matches!(err, MineError::Embedding(_)), "{err}");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    let reloaded = PromptEmbeddingCache::load(&path, "topic-v1");
    assert_eq!(reloaded.len(), 4);
}

#[tokio::test]
async fn empty_project_is_skipped() {
    let mut grouped = group_by_project(prompts("api", "auth flow", 10));
    grouped.insert("empty".to_string(), Vec::new());

    let result = cluster_prompts(&grouped, &TopicProvider::new(), &mut cache(), None)
        .await
        .unwrap();
    assert_eq!(result.skipped_projects, vec!["empty"]);
    assert_eq!(result.clusters.len(), 1);
}

#[tokio::test]
async fn no_projects_no_clusters() {
    let grouped: BTreeMap<String, Vec<CollectedPrompt>> = BTreeMap::new();
    let result = cluster_prompts(&grouped, &TopicProvider::new(), &mut cache(), None)
        .await
        .unwrap();
    assert!(result.clusters.is_empty());
    assert!(result.skipped_projects.is_empty());
}
