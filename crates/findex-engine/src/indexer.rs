//! The batch indexing pipeline.
//!
//! Per document: `Discovered → Extracted → Embedded → Indexed`, or
//! `Failed` at any step. Extraction and embedding run on a bounded worker
//! pool; all index and store mutations happen on the driver task as worker
//! results arrive. One bad document never aborts the batch; an unavailable
//! embedding model aborts the whole run.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use findex_context::ContextBuilder;
use findex_core::error::{Error, Result};
use findex_core::traits::{Embedder, TextExtractor};
use findex_core::types::{
    document_id_for_path, ContextRecord, DocStatus, Document, DocumentId, ScanEntry,
};

use crate::store::DocumentRow;
use crate::SemanticEngine;

/// Cooperative cancellation, checked between documents (never mid-document).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a run did, per terminal outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub removed: usize,
    pub cancelled: bool,
}

struct ProcessedDoc {
    document: Document,
    context: ContextRecord,
    vector: Vec<f32>,
}

enum WorkOutcome {
    Indexed(Box<ProcessedDoc>),
    Unchanged(DocumentId),
    Failed { document: Document, reason: String },
    Fatal(Error),
}

impl SemanticEngine {
    /// Drive one indexing run over a scanner feed.
    ///
    /// Documents whose content hash is unchanged and already `Indexed` are
    /// skipped without any state change, so re-running over an unchanged
    /// folder is a no-op. Documents missing from the feed are removed from
    /// the index and the store. Both artifacts are persisted at the end of
    /// the run.
    pub async fn index_scan(
        &self,
        entries: &[ScanEntry],
        extractor: Arc<dyn TextExtractor>,
        cancel: &CancelFlag,
    ) -> Result<IndexReport> {
        let mut report = IndexReport::default();

        let live_ids: HashSet<DocumentId> = entries
            .iter()
            .map(|e| document_id_for_path(&e.path))
            .collect();
        {
            let mut index = self.index_write();
            let mut store = self.store_write();
            for id in store.ids() {
                if !live_ids.contains(&id) {
                    index.remove(&id);
                    store.remove(&id);
                    report.removed += 1;
                    tracing::debug!(%id, "removed document missing from rescan");
                }
            }
        }

        let prior: HashMap<DocumentId, (String, DocStatus)> = self
            .store_read()
            .iter()
            .map(|(id, row)| (id.clone(), (row.document.content_hash.clone(), row.status)))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config().concurrency));
        let per_doc = Duration::from_secs(self.config().doc_timeout_secs);
        let mut join_set: JoinSet<WorkOutcome> = JoinSet::new();
        let mut deferred: Vec<ScanEntry> = Vec::new();

        for entry in entries {
            if cancel.is_cancelled() {
                report.cancelled = true;
                deferred.push(entry.clone());
                continue;
            }
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("worker pool semaphore never closes");

            let work_entry = entry.clone();
            let entry_on_error = entry.clone();
            let prior_state = prior.get(&document_id_for_path(&entry.path)).cloned();
            let extractor = Arc::clone(&extractor);
            let embedder = Arc::clone(&self.embedder);
            let builder = Arc::clone(&self.builder);
            let max_text_len = self.config().max_text_len;

            join_set.spawn(async move {
                let _permit = permit;
                let worker = tokio::task::spawn_blocking(move || {
                    process_entry(
                        &work_entry,
                        prior_state,
                        extractor.as_ref(),
                        embedder.as_ref(),
                        builder.as_ref(),
                        max_text_len,
                    )
                });
                match timeout(per_doc, worker).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(join_err)) => WorkOutcome::Failed {
                        document: scan_document(&entry_on_error, String::new()),
                        reason: format!("worker crashed: {join_err}"),
                    },
                    Err(_) => WorkOutcome::Failed {
                        document: scan_document(&entry_on_error, String::new()),
                        reason: format!("timed out after {}s", per_doc.as_secs()),
                    },
                }
            });
        }

        let mut run_error: Option<Error> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    if run_error.is_none() {
                        if let Err(e) = self.apply_outcome(outcome, &mut report) {
                            join_set.abort_all();
                            run_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    if !e.is_cancelled() {
                        tracing::warn!("indexing worker join error: {e}");
                    }
                }
            }
        }
        if let Some(e) = run_error {
            return Err(e);
        }

        // A cancelled run leaves finished documents intact and parks the
        // rest as Discovered for the next run.
        if !deferred.is_empty() {
            let mut store = self.store_write();
            for entry in &deferred {
                let id = document_id_for_path(&entry.path);
                match store.get(&id).map(|r| r.status) {
                    Some(DocStatus::Indexed) => {}
                    Some(_) => store.set_status(&id, DocStatus::Discovered),
                    None => store.upsert(DocumentRow {
                        document: scan_document(entry, String::new()),
                        status: DocStatus::Discovered,
                        context: None,
                    }),
                }
            }
        }

        self.save()?;
        tracing::info!(
            indexed = report.indexed,
            failed = report.failed,
            skipped = report.skipped,
            removed = report.removed,
            cancelled = report.cancelled,
            "indexing run finished"
        );
        Ok(report)
    }

    /// Single-writer application of one worker result.
    fn apply_outcome(&self, outcome: WorkOutcome, report: &mut IndexReport) -> Result<()> {
        match outcome {
            WorkOutcome::Fatal(e) => return Err(e),
            WorkOutcome::Unchanged(id) => {
                tracing::debug!(%id, "content unchanged, skipping");
                report.skipped += 1;
            }
            WorkOutcome::Indexed(done) => {
                let ProcessedDoc {
                    document,
                    context,
                    vector,
                } = *done;
                if let Err(e) = self.index_write().upsert(document.id.clone(), vector) {
                    // DimensionMismatch is fatal for this insert only.
                    tracing::warn!(path = %document.path, "vector rejected: {e}");
                    self.store_write().upsert(DocumentRow {
                        document,
                        status: DocStatus::Failed,
                        context: None,
                    });
                    report.failed += 1;
                    return Ok(());
                }
                self.store_write().upsert(DocumentRow {
                    document,
                    status: DocStatus::Indexed,
                    context: Some(context),
                });
                report.indexed += 1;
            }
            WorkOutcome::Failed { document, reason } => {
                tracing::warn!(path = %document.path, %reason, "document failed");
                // A previously indexed vector for this id is now stale.
                self.index_write().remove(&document.id);
                self.store_write().upsert(DocumentRow {
                    document,
                    status: DocStatus::Failed,
                    context: None,
                });
                report.failed += 1;
            }
        }
        Ok(())
    }
}

fn scan_document(entry: &ScanEntry, content_hash: String) -> Document {
    Document {
        id: document_id_for_path(&entry.path),
        path: entry.path.clone(),
        size: entry.size,
        modified_time: entry.modified_time,
        content_hash,
    }
}

/// The per-document worker: read, hash, extract, embed, build context.
/// Runs off the driver task; returns a terminal outcome and touches no
/// shared state.
fn process_entry(
    entry: &ScanEntry,
    prior: Option<(String, DocStatus)>,
    extractor: &dyn TextExtractor,
    embedder: &dyn Embedder,
    builder: &ContextBuilder,
    max_text_len: usize,
) -> WorkOutcome {
    let bytes = match std::fs::read(&entry.path) {
        Ok(b) => b,
        Err(e) => {
            return WorkOutcome::Failed {
                document: scan_document(entry, String::new()),
                reason: format!("read failed: {e}"),
            }
        }
    };
    let content_hash = blake3::hash(&bytes).to_hex().to_string();
    drop(bytes);

    let document = scan_document(entry, content_hash);
    if let Some((prior_hash, DocStatus::Indexed)) = prior {
        if prior_hash == document.content_hash {
            return WorkOutcome::Unchanged(document.id);
        }
    }

    let text = match extractor.extract(Path::new(&entry.path)) {
        Ok(t) => t,
        Err(e) => {
            return WorkOutcome::Failed {
                document,
                reason: e.to_string(),
            }
        }
    };
    tracing::debug!(id = %document.id, "extracted");

    let text = truncate_chars(text, max_text_len);
    let vector = match embedder.embed(&text) {
        Ok(v) => v,
        Err(e @ Error::ModelUnavailable(_)) => return WorkOutcome::Fatal(e),
        Err(e) => {
            return WorkOutcome::Failed {
                document,
                reason: e.to_string(),
            }
        }
    };
    tracing::debug!(id = %document.id, "embedded");

    let context = builder.build(&document, &text);
    WorkOutcome::Indexed(Box::new(ProcessedDoc {
        document,
        context,
        vector,
    }))
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    text.chars().take(max_chars).collect()
}
