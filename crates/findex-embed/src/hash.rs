use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

use findex_core::error::Result;
use findex_core::traits::Embedder;

/// Deterministic token-bucket embedder.
///
/// Each lower-cased whitespace token is hashed into one of `dim` buckets
/// with a position-dependent nudge, then the vector is L2-normalized.
/// Texts sharing tokens land near each other; identical input always
/// produces the identical vector. No model files, no I/O.
pub struct HashEmbedder {
    dim: usize,
    version: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            version: format!("xxhash-{dim}-v1"),
        }
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn model_version(&self) -> &str {
        &self.version
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        if text.trim().is_empty() {
            return Ok(v);
        }
        let lowered = text.to_lowercase();
        for (i, token) in lowered.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}
