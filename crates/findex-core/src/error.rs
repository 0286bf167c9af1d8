use thiserror::Error;

/// Engine-level failure taxonomy.
///
/// Per-document problems (`Extraction`, `Embedding`) are recovered by the
/// indexing pipeline: the document is marked failed and the batch goes on.
/// Everything else affects the integrity of a whole index or query and is
/// surfaced to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("extraction failed for {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index corrupted: {0}")]
    IndexCorrupted(String),

    #[error("index is empty")]
    EmptyIndex,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of the per-format extraction collaborator.
///
/// The indexing pipeline maps any of these to a per-document failed state;
/// they never abort a batch.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("corrupt file: {0}")]
    CorruptFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
