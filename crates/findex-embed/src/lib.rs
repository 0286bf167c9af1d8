#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Embedding backends.
//!
//! Two implementations of the [`Embedder`] seam: a transformer model run
//! through candle (the real thing) and a deterministic token-hashing
//! embedder (model-less operation and tests). Both map empty or
//! whitespace-only text to the zero vector so degenerate input never blocks
//! indexing.

mod hash;
mod model;
mod pooling;

pub use hash::HashEmbedder;
pub use model::ModelEmbedder;

use findex_core::config::EmbeddingConfig;
use findex_core::error::{Error, Result};
use findex_core::traits::Embedder;

/// Build the embedder named by configuration.
///
/// `FINDEX_USE_HASH_EMBEDDER=1` forces the hashing backend regardless of
/// config, which keeps tests and model-less hosts working.
pub fn embedder_from_config(cfg: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    let force_hash = std::env::var("FINDEX_USE_HASH_EMBEDDER")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if force_hash {
        tracing::info!("hash embedder forced via FINDEX_USE_HASH_EMBEDDER");
        return Ok(Box::new(HashEmbedder::new(cfg.dim)));
    }
    match cfg.backend.as_str() {
        "hash" => Ok(Box::new(HashEmbedder::new(cfg.dim))),
        "model" => Ok(Box::new(ModelEmbedder::load(cfg.model_dir.as_deref())?)),
        other => Err(Error::InvalidConfig(format!(
            "unknown embedding backend '{other}' (expected \"model\" or \"hash\")"
        ))),
    }
}
