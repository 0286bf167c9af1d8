use std::path::Path;

use crate::error::{ExtractError, Result};
use crate::types::ScanEntry;

/// Text-to-vector conversion. Implementations must be deterministic for a
/// fixed input and model version, and must map empty or whitespace-only
/// text to the zero vector instead of failing.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn model_version(&self) -> &str;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Order-preserving batch variant. Batching is an optimization, never a
    /// semantic change: results must equal per-item `embed` calls.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Pluggable label assignment; rule-based and model-based classifiers are
/// interchangeable behind this seam.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> String;
    fn classify_name(&self, filename: &str) -> String;
}

/// Per-format text extraction collaborator.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> std::result::Result<String, ExtractError>;
}

/// File-system scanner collaborator: enumerates candidate files with their
/// metadata. The engine treats the feed as read-only, one call per run.
pub trait FileScanner: Send + Sync {
    fn scan(&self, root: &Path) -> Result<Vec<ScanEntry>>;
}
