#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Flat cosine-similarity vector index.
//!
//! Vectors are L2-normalized at insertion, so cosine similarity is a plain
//! dot product at query time. Storage is a slot array with tombstoned
//! removals; once tombstones pass a threshold the slot array is compacted.
//! Search order is total: strictly descending score, ties broken by
//! ascending document id.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use findex_core::error::{Error, Result};
use findex_core::types::{DocumentId, SearchHit};

/// Bumped when the persisted artifact layout changes. The document store
/// artifact carries the same version so the pair stays in lockstep.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Compact once tombstones exceed this share of slots.
const COMPACT_TOMBSTONE_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot {
    id: DocumentId,
    vector: Vec<f32>,
}

/// In-memory nearest-neighbor index over fixed-dimension embeddings.
///
/// Exclusively owns its vector storage; callers interact only through ids.
#[derive(Debug)]
pub struct VectorIndex {
    dim: usize,
    model_version: String,
    slots: Vec<Option<Slot>>,
    by_id: BTreeMap<DocumentId, usize>,
    tombstones: usize,
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    format_version: u32,
    dim: usize,
    model_version: String,
    entries: Vec<Slot>,
}

impl VectorIndex {
    pub fn new(dim: usize, model_version: impl Into<String>) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("vector dimension must be nonzero".into()));
        }
        Ok(Self {
            dim,
            model_version: model_version.into(),
            slots: Vec::new(),
            by_id: BTreeMap::new(),
            tombstones: 0,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Live ids in ascending order. Used for the id-set consistency check
    /// against the context store on load.
    pub fn ids(&self) -> Vec<DocumentId> {
        self.by_id.keys().cloned().collect()
    }

    /// Insert or replace the vector for an id. Idempotent.
    pub fn upsert(&mut self, id: DocumentId, mut vector: Vec<f32>) -> Result<()> {
        self.check_dim(&vector)?;
        normalize(&mut vector);
        match self.by_id.get(&id).copied() {
            Some(slot_idx) => {
                self.slots[slot_idx] = Some(Slot { id, vector });
            }
            None => {
                self.slots.push(Some(Slot { id: id.clone(), vector }));
                self.by_id.insert(id, self.slots.len() - 1);
            }
        }
        Ok(())
    }

    /// Delete an id's vector. No-op if absent; returns whether an entry
    /// was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(slot_idx) = self.by_id.remove(id) else {
            return false;
        };
        self.slots[slot_idx] = None;
        self.tombstones += 1;
        if self.tombstones as f64 > self.slots.len() as f64 * COMPACT_TOMBSTONE_RATIO {
            self.compact();
        }
        true
    }

    /// Nearest neighbors by cosine similarity: at most `k` hits, strictly
    /// descending score, ties by ascending id. An empty index yields an
    /// empty result, never an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.check_dim(query)?;
        if self.by_id.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let mut q = query.to_vec();
        normalize(&mut q);

        let mut hits: Vec<SearchHit> = self
            .slots
            .iter()
            .flatten()
            .map(|slot| SearchHit {
                id: slot.id.clone(),
                score: dot(&slot.vector, &q),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Drop tombstoned slots, preserving insertion order of the survivors.
    /// Search results are unchanged beyond floating-point identity.
    pub fn compact(&mut self) {
        let live = self.slots.len() - self.tombstones;
        tracing::debug!(live, tombstones = self.tombstones, "compacting vector index");
        let mut slots = Vec::with_capacity(live);
        let mut by_id = BTreeMap::new();
        for slot in self.slots.drain(..).flatten() {
            by_id.insert(slot.id.clone(), slots.len());
            slots.push(Some(slot));
        }
        self.slots = slots;
        self.by_id = by_id;
        self.tombstones = 0;
    }

    /// Persist the full index as a version-stamped artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let persisted = PersistedIndex {
            format_version: INDEX_FORMAT_VERSION,
            dim: self.dim,
            model_version: self.model_version.clone(),
            entries: self.slots.iter().flatten().cloned().collect(),
        };
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &persisted)
            .map_err(|e| Error::IndexCorrupted(format!("failed to write {}: {e}", path.display())))?;
        writer.flush()?;
        Ok(())
    }

    /// Restore a persisted index. A round-trip reproduces identical search
    /// results for identical queries.
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let persisted: PersistedIndex = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::IndexCorrupted(format!("unreadable {}: {e}", path.display())))?;
        if persisted.format_version != INDEX_FORMAT_VERSION {
            return Err(Error::IndexCorrupted(format!(
                "unsupported index format version {}",
                persisted.format_version
            )));
        }
        if persisted.dim == 0 {
            return Err(Error::IndexCorrupted("persisted dimension is zero".into()));
        }

        let mut index = Self::new(persisted.dim, persisted.model_version)?;
        for slot in persisted.entries {
            if slot.vector.len() != persisted.dim {
                return Err(Error::IndexCorrupted(format!(
                    "entry {} has dimension {}, index dimension is {}",
                    slot.id,
                    slot.vector.len(),
                    persisted.dim
                )));
            }
            if index.by_id.contains_key(&slot.id) {
                return Err(Error::IndexCorrupted(format!("duplicate entry id {}", slot.id)));
            }
            index.by_id.insert(slot.id.clone(), index.slots.len());
            index.slots.push(Some(slot));
        }
        Ok(index)
    }

    fn check_dim(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2-normalize in place. The zero vector (blank-text sentinel) is left as
/// is: it scores zero against everything.
fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
