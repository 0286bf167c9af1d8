//! Domain types shared by the embedding, index and engine crates.

use serde::{Deserialize, Serialize};

pub type DocumentId = String;

/// Derive the stable identifier for a file path.
///
/// Ids survive renames of nothing: they are a pure function of the path
/// string, so a moved file is a remove-plus-add on rescan.
pub fn document_id_for_path(path: &str) -> DocumentId {
    blake3::hash(path.as_bytes()).to_hex()[..32].to_string()
}

/// One file as seen by the indexing pipeline.
///
/// - `id`: stable identity derived from `path`
/// - `content_hash`: blake3 of the raw file bytes; drives change detection
/// - `modified_time`: unix seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub path: String,
    pub size: u64,
    pub modified_time: i64,
    pub content_hash: String,
}

/// Indexing lifecycle of a single document.
///
/// `Indexed` and `Failed` are terminal; a changed content hash re-enters the
/// pipeline at `Extracted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocStatus {
    Discovered,
    Extracted,
    Embedded,
    Indexed,
    Failed,
}

/// Derived, non-authoritative context for a document. Recomputed whenever
/// the source text changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub document_id: DocumentId,
    pub topic: String,
    pub category: String,
    pub preview: String,
    pub last_modified: i64,
}

/// A single nearest-neighbor match out of the vector index.
///
/// `score` is cosine similarity; higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocumentId,
    pub score: f32,
}

/// One ranked answer to a query. Ephemeral: built per query, not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub document_id: DocumentId,
    pub path: String,
    pub similarity_score: f32,
    pub composite_score: f32,
    pub context: ContextRecord,
}

/// One record of the scanner feed: a candidate file with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub path: String,
    pub size: u64,
    pub modified_time: i64,
}

/// Weighting of the ranking signals.
///
/// Weights are not required to sum to one; composite scores are only
/// comparable within one fixed weight set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankWeights {
    pub similarity_weight: f32,
    pub recency_weight: f32,
    pub topic_weight: f32,
    pub category_weight: f32,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            similarity_weight: 0.6,
            recency_weight: 0.2,
            topic_weight: 0.1,
            category_weight: 0.1,
        }
    }
}

impl RankWeights {
    /// All weights must be non-negative.
    pub fn validate(&self) -> crate::error::Result<()> {
        let ws = [
            ("similarity_weight", self.similarity_weight),
            ("recency_weight", self.recency_weight),
            ("topic_weight", self.topic_weight),
            ("category_weight", self.category_weight),
        ];
        for (name, w) in ws {
            if !w.is_finite() || w < 0.0 {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {w}"
                )));
            }
        }
        Ok(())
    }
}
