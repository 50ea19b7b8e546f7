//! Prompt clustering: distance metrics, DBSCAN, radius tuning, and the
//! per-project / cross-project orchestration on top of them.

pub mod dbscan;
pub mod distance;
pub mod epsilon;
pub mod orchestrator;

pub use dbscan::{DbscanResult, PointState, dbscan};
pub use distance::{centroid, cosine_distance, cosine_similarity, euclidean_distance};
pub use epsilon::auto_epsilon;
pub use orchestrator::{
    ClusterOptions, ClusterResult, ClusterStats, CollectedPrompt, PromptCluster, cluster_prompts,
    group_by_project,
};
