#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! The retrieval engine: document store, ranking, and the indexing and
//! query orchestrators, wired around a vector index and an embedder.
//!
//! Mutation follows single-writer discipline: only the indexing driver
//! task writes to the index and store, while queries take read guards and
//! run concurrently.

pub mod indexer;
pub mod query;
pub mod rank;
pub mod store;

pub use indexer::{CancelFlag, IndexReport};
pub use query::{QueryResponse, QueryStatus};

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use findex_context::ContextBuilder;
use findex_core::config::EngineConfig;
use findex_core::error::{Error, Result};
use findex_core::traits::Embedder;
use findex_core::types::DocStatus;
use findex_vector::VectorIndex;

use crate::store::DocumentStore;

pub const VECTORS_FILE: &str = "vectors.json";
pub const DOCUMENTS_FILE: &str = "documents.json";

/// Explicitly-constructed engine state: no ambient globals, everything the
/// orchestrators touch is owned here or passed in.
pub struct SemanticEngine {
    embedder: Arc<dyn Embedder>,
    builder: Arc<ContextBuilder>,
    config: EngineConfig,
    index: RwLock<VectorIndex>,
    store: RwLock<DocumentStore>,
}

impl std::fmt::Debug for SemanticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub documents: usize,
    pub indexed: usize,
    pub failed: usize,
    pub vectors: usize,
    pub dim: usize,
    pub model_version: String,
}

impl SemanticEngine {
    /// A fresh engine with an empty index sized to the embedder.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        builder: Arc<ContextBuilder>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let index = VectorIndex::new(embedder.dim(), embedder.model_version())?;
        Ok(Self {
            embedder,
            builder,
            config,
            index: RwLock::new(index),
            store: RwLock::new(DocumentStore::new()),
        })
    }

    /// Restore the persisted artifact pair from `config.index_dir`.
    ///
    /// Both artifacts load independently, then the pair is cross-checked:
    /// matching id sets, matching format versions, and a model version
    /// matching the active embedder. Any inconsistency is `IndexCorrupted`
    /// and the caller answers with a rebuild, never a silent partial load.
    pub fn open(
        embedder: Arc<dyn Embedder>,
        builder: Arc<ContextBuilder>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let vectors_path = config.index_dir.join(VECTORS_FILE);
        let documents_path = config.index_dir.join(DOCUMENTS_FILE);
        match (vectors_path.exists(), documents_path.exists()) {
            (false, false) => Self::new(embedder, builder, config),
            (true, true) => {
                let index = VectorIndex::load(&vectors_path)?;
                let store = DocumentStore::load(&documents_path)?;
                if index.dim() != embedder.dim() {
                    return Err(Error::IndexCorrupted(format!(
                        "stored dimension {} does not match embedder dimension {}",
                        index.dim(),
                        embedder.dim()
                    )));
                }
                if index.model_version() != embedder.model_version() {
                    return Err(Error::IndexCorrupted(format!(
                        "stored model version '{}' does not match active '{}'",
                        index.model_version(),
                        embedder.model_version()
                    )));
                }
                store.cross_check(&index.ids())?;
                Ok(Self {
                    embedder,
                    builder,
                    config,
                    index: RwLock::new(index),
                    store: RwLock::new(store),
                })
            }
            _ => Err(Error::IndexCorrupted(
                "artifact pair incomplete: one of vectors/documents is missing".into(),
            )),
        }
    }

    /// `open`, but a corrupted artifact pair falls back to a fresh engine
    /// with the bad artifacts cleared. Returns whether a rebuild is needed.
    pub fn open_or_fresh(
        embedder: Arc<dyn Embedder>,
        builder: Arc<ContextBuilder>,
        config: EngineConfig,
    ) -> Result<(Self, bool)> {
        match Self::open(Arc::clone(&embedder), Arc::clone(&builder), config.clone()) {
            Ok(engine) => Ok((engine, false)),
            Err(Error::IndexCorrupted(reason)) => {
                tracing::warn!(%reason, "persisted index unusable, starting fresh");
                let engine = Self::new(embedder, builder, config)?;
                engine.clear()?;
                Ok((engine, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Persist both artifacts.
    pub fn save(&self) -> Result<()> {
        self.index_read().save(&self.vectors_path())?;
        self.store_read().save(&self.documents_path())
    }

    /// Drop all indexed state, in memory and on disk.
    pub fn clear(&self) -> Result<()> {
        *self.index_write() = VectorIndex::new(self.embedder.dim(), self.embedder.model_version())?;
        *self.store_write() = DocumentStore::new();
        for path in [self.vectors_path(), self.documents_path()] {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> EngineStats {
        let index = self.index_read();
        let store = self.store_read();
        EngineStats {
            documents: store.len(),
            indexed: store.count_with_status(DocStatus::Indexed),
            failed: store.count_with_status(DocStatus::Failed),
            vectors: index.len(),
            dim: index.dim(),
            model_version: index.model_version().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index_read().is_empty()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub(crate) fn builder(&self) -> &ContextBuilder {
        self.builder.as_ref()
    }

    fn vectors_path(&self) -> PathBuf {
        self.config.index_dir.join(VECTORS_FILE)
    }

    fn documents_path(&self) -> PathBuf {
        self.config.index_dir.join(DOCUMENTS_FILE)
    }

    pub(crate) fn index_read(&self) -> RwLockReadGuard<'_, VectorIndex> {
        self.index.read().expect("vector index lock poisoned")
    }

    pub(crate) fn index_write(&self) -> RwLockWriteGuard<'_, VectorIndex> {
        self.index.write().expect("vector index lock poisoned")
    }

    pub(crate) fn store_read(&self) -> RwLockReadGuard<'_, DocumentStore> {
        self.store.read().expect("document store lock poisoned")
    }

    pub(crate) fn store_write(&self) -> RwLockWriteGuard<'_, DocumentStore> {
        self.store.write().expect("document store lock poisoned")
    }
}
