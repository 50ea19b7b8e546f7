pub mod app;
pub mod cli;
pub mod clustering;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod patterns;
pub mod pipeline;
pub mod sessions;
pub mod test_utils;
pub mod utils;

pub use error::{MineError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
