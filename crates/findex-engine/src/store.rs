//! Persistent per-document store: lifecycle bookkeeping plus the derived
//! context record. The sibling artifact is the vector index; both carry the
//! same format version and their id sets are cross-checked on load.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use findex_core::error::{Error, Result};
use findex_core::types::{ContextRecord, DocStatus, Document, DocumentId};
use findex_vector::INDEX_FORMAT_VERSION;

/// One tracked document: file identity, pipeline status and, once the
/// pipeline got far enough, its context record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRow {
    pub document: Document,
    pub status: DocStatus,
    pub context: Option<ContextRecord>,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    rows: BTreeMap<DocumentId, DocumentRow>,
}

#[derive(Serialize, Deserialize)]
struct PersistedStore {
    format_version: u32,
    rows: Vec<DocumentRow>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DocumentRow> {
        self.rows.get(id)
    }

    pub fn context(&self, id: &str) -> Option<&ContextRecord> {
        self.rows.get(id).and_then(|r| r.context.as_ref())
    }

    pub fn upsert(&mut self, row: DocumentRow) {
        self.rows.insert(row.document.id.clone(), row);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.rows.remove(id).is_some()
    }

    pub fn set_status(&mut self, id: &str, status: DocStatus) {
        if let Some(row) = self.rows.get_mut(id) {
            row.status = status;
        }
    }

    pub fn ids(&self) -> Vec<DocumentId> {
        self.rows.keys().cloned().collect()
    }

    /// Ids whose documents reached the `Indexed` terminal state; exactly
    /// these must exist in the vector index.
    pub fn indexed_ids(&self) -> Vec<DocumentId> {
        self.rows
            .iter()
            .filter(|(_, r)| r.status == DocStatus::Indexed)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocumentId, &DocumentRow)> {
        self.rows.iter()
    }

    pub fn count_with_status(&self, status: DocStatus) -> usize {
        self.rows.values().filter(|r| r.status == status).count()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let persisted = PersistedStore {
            format_version: INDEX_FORMAT_VERSION,
            rows: self.rows.values().cloned().collect(),
        };
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &persisted)
            .map_err(|e| Error::IndexCorrupted(format!("failed to write {}: {e}", path.display())))?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let persisted: PersistedStore = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::IndexCorrupted(format!("unreadable {}: {e}", path.display())))?;
        if persisted.format_version != INDEX_FORMAT_VERSION {
            return Err(Error::IndexCorrupted(format!(
                "unsupported document store format version {}",
                persisted.format_version
            )));
        }
        let mut store = Self::new();
        for row in persisted.rows {
            if store.rows.contains_key(&row.document.id) {
                return Err(Error::IndexCorrupted(format!(
                    "duplicate document id {}",
                    row.document.id
                )));
            }
            store.upsert(row);
        }
        Ok(store)
    }

    /// The id-set consistency check run after loading the artifact pair:
    /// every `Indexed` row must have a vector and vice versa. A mismatch
    /// means the pair is corrupt and the caller should rebuild.
    pub fn cross_check(&self, index_ids: &[DocumentId]) -> Result<()> {
        let indexed = self.indexed_ids();
        if indexed != index_ids {
            return Err(Error::IndexCorrupted(format!(
                "id sets diverge: {} indexed documents vs {} vectors",
                indexed.len(),
                index_ids.len()
            )));
        }
        Ok(())
    }
}
