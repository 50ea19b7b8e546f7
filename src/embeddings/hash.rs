//! Hash embeddings
//!
//! FNV-1a feature hashing over lower-cased unigrams and bigrams. No model
//! weights: the same text always maps to the same unit vector.

use async_trait::async_trait;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::error::{MineError, Result};

use super::provider::{EmbeddingMethod, EmbeddingProvider, EmbeddingResult};

pub const DEFAULT_DIMS: usize = 384;

const BIGRAM_WEIGHT: f32 = 0.5;

/// Build the provider named by `config.backend`.
pub fn build_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let backend = config.backend.trim().to_lowercase();
    if config.dims == 0 {
        return Err(MineError::Config(
            "embedding.dims must be greater than 0".to_string(),
        ));
    }

    match backend.as_str() {
        "" | "hash" => Ok(Box::new(HashEmbedder::new(config.dims))),
        other => Err(MineError::UnknownBackend(other.to_string())),
    }
}

/// Deterministic embedder using FNV-1a feature hashing.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dims: usize,
    model_version: String,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMS)
    }
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            model_version: format!("hash-v1-{dims}"),
        }
    }

    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Embed one text. Text with no usable tokens maps to the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dims];
        if self.dims == 0 {
            return embedding;
        }

        let tokens = tokenize(text);
        for token in &tokens {
            accumulate(&mut embedding, token, 1.0);
        }
        for pair in tokens.windows(2) {
            accumulate(&mut embedding, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResult>> {
        debug!(model = %self.model_version, count = texts.len(), "hash embedding batch");
        Ok(texts
            .iter()
            .map(|text| EmbeddingResult::computed(self.embed(text), EmbeddingMethod::Hash))
            .collect())
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

fn accumulate(embedding: &mut [f32], feature: &str, weight: f32) {
    let len = embedding.len() as u64;
    let feature_hash = fnv1a(feature.as_bytes());
    for salt in 0..len {
        let hash = fnv1a_salted(feature_hash, salt);
        let sign = if hash & 1 == 0 { weight } else { -weight };
        #[allow(clippy::cast_possible_truncation)]
        let dim = ((hash >> 1) % len) as usize;
        embedding[dim] += sign;
    }
}

fn fnv1a_salted(seed: u64, salt: u64) -> u64 {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..].copy_from_slice(&salt.to_le_bytes());
    fnv1a(&bytes)
}

fn fnv1a(data: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    data.iter().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

fn l2_normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vec.iter_mut() {
            *value /= norm;
        }
    }
}
