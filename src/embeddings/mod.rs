//! Prompt embeddings: the provider boundary, a deterministic reference
//! backend, and the disk cache that sits in front of both.

pub mod cache;
pub mod hash;
pub mod provider;

pub use cache::{
    CacheStats, PersistState, PromptCacheEntry, PromptEmbeddingCache, content_hash,
    default_cache_path,
};
pub use hash::{HashEmbedder, build_provider};
pub use provider::{EmbeddingMethod, EmbeddingProvider, EmbeddingResult};
