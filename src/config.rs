use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clustering::ClusterOptions;
use crate::embeddings::cache::default_cache_path;
use crate::error::{MineError, Result};
use crate::patterns::{RankingOptions, ScoringWeights};

pub const CONFIG_ENV: &str = "SKILLMINE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mining: MiningConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from `explicit_path`, `$SKILLMINE_CONFIG`, or the
    /// user config directory, then apply `SKILLMINE_*` overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit_path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with an injectable environment lookup.
    pub fn load_with<F>(explicit_path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env(CONFIG_ENV).map(PathBuf::from));

        let patch = match explicit {
            Some(path) => Self::load_patch(&path, true)?,
            None => Self::load_global()?,
        };
        if let Some(patch) = patch {
            config.merge_patch(patch);
        }

        config.apply_env_overrides(&env)?;
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            debug!("no user config directory; using defaults");
            return Ok(None);
        };
        Self::load_patch(&dir.join("skillmine").join("config.toml"), false)
    }

    /// Read one TOML patch. An explicitly named file must exist.
    fn load_patch(path: &Path, required: bool) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            if required {
                return Err(MineError::MissingConfig(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| MineError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| MineError::Config(format!("parse config {}: {err}", path.display())))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.mining {
            self.mining.merge(patch);
        }
        if let Some(patch) = patch.clustering {
            self.clustering.merge(patch);
        }
        if let Some(patch) = patch.embedding {
            self.embedding.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
    }

    fn apply_env_overrides<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env_parse(env, "SKILLMINE_MIN_OCCURRENCES")? {
            self.mining.min_occurrences = value;
        }
        if let Some(value) = env_parse(env, "SKILLMINE_LIMIT")? {
            self.mining.limit = value;
        }
        if let Some(value) = env_parse(env, "SKILLMINE_MIN_PROMPTS")? {
            self.clustering.min_prompts_per_project = value;
        }
        if let Some(value) = env_parse(env, "SKILLMINE_MAX_CLUSTERS")? {
            self.clustering.max_clusters = value;
        }
        if let Some(value) = env_parse(env, "SKILLMINE_EPSILON")? {
            self.clustering.epsilon = Some(value);
        }
        if let Some(value) = env_parse(env, "SKILLMINE_MERGE_THRESHOLD")? {
            self.clustering.merge_threshold = value;
        }
        if let Some(value) = env_parse(env, "SKILLMINE_BATCH_SIZE")? {
            self.embedding.batch_size = value;
        }
        if let Some(value) = env("SKILLMINE_EMBEDDING_BACKEND") {
            self.embedding.backend = value;
        }
        if let Some(value) = env_parse(env, "SKILLMINE_EMBEDDING_DIMS")? {
            self.embedding.dims = value;
        }
        if let Some(value) = env("SKILLMINE_CACHE_PATH") {
            self.cache.path = Some(PathBuf::from(value));
        }
        if env_bool(env, "SKILLMINE_CACHE_DISABLED").unwrap_or(false) {
            self.cache.enabled = false;
        }
        Ok(())
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<()> {
        self.mining.weights.validate()?;
        if self.embedding.dims == 0 {
            return Err(MineError::Config("embedding.dims must be greater than 0".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(MineError::Config(
                "embedding.batch_size must be greater than 0".into(),
            ));
        }
        if self.clustering.min_pts == 0 {
            return Err(MineError::Config("clustering.min_pts must be greater than 0".into()));
        }
        if !(-1.0..=1.0).contains(&self.clustering.merge_threshold) {
            return Err(MineError::Config(format!(
                "clustering.merge_threshold must be within [-1, 1], got {}",
                self.clustering.merge_threshold
            )));
        }
        if let Some(epsilon) = self.clustering.epsilon {
            if !epsilon.is_finite() || epsilon <= 0.0 {
                return Err(MineError::Config(format!(
                    "clustering.epsilon must be a positive number, got {epsilon}"
                )));
            }
        }
        Ok(())
    }

    pub fn ranking_options(&self) -> RankingOptions {
        RankingOptions {
            min_occurrences: self.mining.min_occurrences,
            limit: self.mining.limit,
            weights: self.mining.weights,
        }
    }

    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            min_prompts_per_project: self.clustering.min_prompts_per_project,
            max_words: self.clustering.max_words,
            batch_size: self.embedding.batch_size,
            min_pts: self.clustering.min_pts,
            epsilon: self.clustering.epsilon,
            merge_threshold: self.clustering.merge_threshold,
            max_clusters: self.clustering.max_clusters,
        }
    }

    /// Where the prompt embedding cache lives.
    pub fn cache_path(&self) -> Result<PathBuf> {
        self.cache
            .path
            .clone()
            .or_else(default_cache_path)
            .ok_or_else(|| {
                MineError::MissingConfig(
                    "no user cache directory; set cache.path or SKILLMINE_CACHE_PATH".into(),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    #[serde(default)]
    pub min_occurrences: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub weights: ScoringWeights,
}

impl Default for MiningConfig {
    fn default() -> Self {
        let ranking = RankingOptions::default();
        Self {
            min_occurrences: ranking.min_occurrences,
            limit: ranking.limit,
            weights: ranking.weights,
        }
    }
}

impl MiningConfig {
    fn merge(&mut self, patch: MiningPatch) {
        if let Some(value) = patch.min_occurrences {
            self.min_occurrences = value;
        }
        if let Some(value) = patch.limit {
            self.limit = value;
        }
        if let Some(weights) = patch.weights {
            if let Some(value) = weights.frequency {
                self.weights.frequency = value;
            }
            if let Some(value) = weights.cross_project {
                self.weights.cross_project = value;
            }
            if let Some(value) = weights.recency {
                self.weights.recency = value;
            }
            if let Some(value) = weights.consistency {
                self.weights.consistency = value;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default)]
    pub min_prompts_per_project: usize,
    #[serde(default)]
    pub max_words: usize,
    #[serde(default)]
    pub min_pts: usize,
    #[serde(default)]
    pub epsilon: Option<f64>,
    #[serde(default)]
    pub merge_threshold: f64,
    #[serde(default)]
    pub max_clusters: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        let options = ClusterOptions::default();
        Self {
            min_prompts_per_project: options.min_prompts_per_project,
            max_words: options.max_words,
            min_pts: options.min_pts,
            epsilon: options.epsilon,
            merge_threshold: options.merge_threshold,
            max_clusters: options.max_clusters,
        }
    }
}

impl ClusteringConfig {
    fn merge(&mut self, patch: ClusteringPatch) {
        if let Some(value) = patch.min_prompts_per_project {
            self.min_prompts_per_project = value;
        }
        if let Some(value) = patch.max_words {
            self.max_words = value;
        }
        if let Some(value) = patch.min_pts {
            self.min_pts = value;
        }
        if let Some(value) = patch.epsilon {
            self.epsilon = Some(value);
        }
        if let Some(value) = patch.merge_threshold {
            self.merge_threshold = value;
        }
        if let Some(value) = patch.max_clusters {
            self.max_clusters = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub dims: usize,
    #[serde(default)]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "hash".to_string(),
            dims: crate::embeddings::hash::DEFAULT_DIMS,
            batch_size: ClusterOptions::default().batch_size,
        }
    }
}

impl EmbeddingConfig {
    fn merge(&mut self, patch: EmbeddingPatch) {
        if let Some(value) = patch.backend {
            self.backend = value;
        }
        if let Some(value) = patch.dims {
            self.dims = value;
        }
        if let Some(value) = patch.batch_size {
            self.batch_size = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.path {
            self.path = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    pub mining: Option<MiningPatch>,
    pub clustering: Option<ClusteringPatch>,
    pub embedding: Option<EmbeddingPatch>,
    pub cache: Option<CachePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MiningPatch {
    pub min_occurrences: Option<usize>,
    pub limit: Option<usize>,
    pub weights: Option<WeightsPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeightsPatch {
    pub frequency: Option<f64>,
    pub cross_project: Option<f64>,
    pub recency: Option<f64>,
    pub consistency: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusteringPatch {
    pub min_prompts_per_project: Option<usize>,
    pub max_words: Option<usize>,
    pub min_pts: Option<usize>,
    pub epsilon: Option<f64>,
    pub merge_threshold: Option<f64>,
    pub max_clusters: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmbeddingPatch {
    pub backend: Option<String>,
    pub dims: Option<usize>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CachePatch {
    pub enabled: Option<bool>,
    pub path: Option<PathBuf>,
}

fn env_bool<F>(env: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    env(key).map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_parse<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match env(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| MineError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}
