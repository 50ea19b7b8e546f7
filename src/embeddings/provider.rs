//! Embedding provider boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How an embedding was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMethod {
    /// Deterministic feature hashing.
    Hash,
    /// A learned model, local or remote.
    Model,
    /// Served from the prompt embedding cache.
    Cache,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub embedding: Vec<f32>,
    pub from_cache: bool,
    pub method: EmbeddingMethod,
}

impl EmbeddingResult {
    pub const fn computed(embedding: Vec<f32>, method: EmbeddingMethod) -> Self {
        Self {
            embedding,
            from_cache: false,
            method,
        }
    }

    /// A vector served from the prompt embedding cache.
    pub const fn cached(embedding: Vec<f32>) -> Self {
        Self {
            embedding,
            from_cache: true,
            method: EmbeddingMethod::Cache,
        }
    }
}

/// Trait for turning text batches into vectors.
///
/// Implementations must return exactly one result per input text, in input
/// order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResult>>;

    /// Identifier stored alongside cached vectors; a change invalidates them.
    fn model_version(&self) -> &str;
}
