use std::path::Path;
use std::sync::Arc;

use findex_context::ContextBuilder;
use findex_core::config::EngineConfig;
use findex_core::error::{Error, ExtractError};
use findex_core::traits::{Embedder, TextExtractor};
use findex_core::types::ScanEntry;
use findex_embed::HashEmbedder;
use findex_engine::{CancelFlag, QueryStatus, SemanticEngine};

struct TxtExtractor;

impl TextExtractor for TxtExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes).map_err(|_| ExtractError::CorruptFile("not valid UTF-8".into()))
    }
}

fn extractor() -> Arc<dyn TextExtractor> {
    Arc::new(TxtExtractor)
}

fn engine_at(index_dir: &Path) -> SemanticEngine {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(256));
    let builder = Arc::new(ContextBuilder::with_default_rules());
    let config = EngineConfig {
        index_dir: index_dir.to_path_buf(),
        concurrency: 2,
        ..EngineConfig::default()
    };
    SemanticEngine::new(embedder, builder, config).expect("engine")
}

fn open_engine_at(index_dir: &Path) -> findex_core::error::Result<SemanticEngine> {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(256));
    let builder = Arc::new(ContextBuilder::with_default_rules());
    let config = EngineConfig {
        index_dir: index_dir.to_path_buf(),
        concurrency: 2,
        ..EngineConfig::default()
    };
    SemanticEngine::open(embedder, builder, config)
}

fn entry_for(path: &Path, modified_time: i64) -> ScanEntry {
    ScanEntry {
        path: path.to_string_lossy().to_string(),
        size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
        modified_time,
    }
}

fn write_files(dir: &Path, files: &[(&str, &str)]) -> Vec<ScanEntry> {
    files
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            std::fs::write(&path, content).expect("write");
            entry_for(&path, 1_700_000_000)
        })
        .collect()
}

#[tokio::test]
async fn own_text_is_the_top_hit() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let entries = write_files(
        tmp.path(),
        &[
            ("a.txt", "neural network training with python code"),
            ("b.txt", "database systems and storage engines"),
            ("c.txt", "holiday recipes for winter evenings"),
        ],
    );
    let engine = engine_at(&tmp.path().join("index"));
    let report = engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("index");
    assert_eq!(report.indexed, 3);

    let response = engine
        .query("neural network training with python code", 3, None)
        .expect("query");
    assert_eq!(response.status, QueryStatus::Ok);
    let top = &response.results[0];
    assert!(top.path.ends_with("a.txt"));
    assert!(
        top.similarity_score > 0.95,
        "self-match similarity should be near 1.0, got {}",
        top.similarity_score
    );
}

#[tokio::test]
async fn related_content_outranks_unrelated() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let entries = write_files(
        tmp.path(),
        &[
            (
                "ml_notes.txt",
                "notes on machine learning and neural network training",
            ),
            ("db.txt", "database systems with transactional storage"),
        ],
    );
    let engine = engine_at(&tmp.path().join("index"));
    engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("index");

    let response = engine.query("machine learning notes", 2, None).expect("query");
    assert_eq!(response.results.len(), 2);
    assert!(response.results[0].path.ends_with("ml_notes.txt"));
    assert!(response.results[1].path.ends_with("db.txt"));
}

#[tokio::test]
async fn empty_folder_yields_labeled_empty_result() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let engine = engine_at(&tmp.path().join("index"));
    let report = engine
        .index_scan(&[], extractor(), &CancelFlag::new())
        .await
        .expect("index");
    assert_eq!(report.indexed, 0);

    let response = engine.query("anything at all", 5, None).expect("query");
    assert_eq!(response.status, QueryStatus::EmptyIndex);
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn corrupt_file_fails_alone_and_valid_files_stay_searchable() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut entries = write_files(
        tmp.path(),
        &[
            ("good_one.txt", "tax invoice and payment records"),
            ("good_two.txt", "lecture notes for the university exam"),
        ],
    );
    let bad = tmp.path().join("broken.txt");
    std::fs::write(&bad, [0xff_u8, 0xfe, 0x00, 0x9f, 0x92]).expect("write");
    entries.push(entry_for(&bad, 1_700_000_000));

    let engine = engine_at(&tmp.path().join("index"));
    let report = engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("indexing completes despite the corrupt file");
    assert_eq!(report.indexed, 2);
    assert_eq!(report.failed, 1);

    let stats = engine.stats();
    assert_eq!(stats.indexed, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.vectors, 2);

    let response = engine.query("tax invoice", 5, None).expect("query");
    assert!(response.results.iter().any(|r| r.path.ends_with("good_one.txt")));
    assert!(response.results.iter().all(|r| !r.path.ends_with("broken.txt")));
}

#[tokio::test]
async fn reindexing_unchanged_folder_is_a_noop() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let entries = write_files(
        tmp.path(),
        &[
            ("a.txt", "alpha bravo charlie"),
            ("b.txt", "delta echo foxtrot"),
        ],
    );
    let engine = engine_at(&tmp.path().join("index"));
    let first = engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("first run");
    assert_eq!(first.indexed, 2);

    let second = engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("second run");
    assert_eq!(second.indexed, 0, "nothing re-embedded");
    assert_eq!(second.skipped, 2);
    assert_eq!(second.removed, 0);
    assert_eq!(engine.stats().indexed, 2);
}

#[tokio::test]
async fn changed_content_is_reprocessed() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut entries = write_files(
        tmp.path(),
        &[("a.txt", "alpha bravo"), ("b.txt", "charlie delta")],
    );
    let engine = engine_at(&tmp.path().join("index"));
    engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("first run");

    std::fs::write(tmp.path().join("a.txt"), "completely new words here").expect("rewrite");
    entries[0] = entry_for(&tmp.path().join("a.txt"), 1_700_000_500);

    let report = engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("second run");
    assert_eq!(report.indexed, 1);
    assert_eq!(report.skipped, 1);

    let response = engine.query("completely new words here", 1, None).expect("query");
    assert!(response.results[0].path.ends_with("a.txt"));
}

#[tokio::test]
async fn vanished_files_are_removed_on_rescan() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let entries = write_files(
        tmp.path(),
        &[("keep.txt", "alpha bravo"), ("gone.txt", "charlie delta")],
    );
    let engine = engine_at(&tmp.path().join("index"));
    engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("first run");

    let report = engine
        .index_scan(&entries[..1], extractor(), &CancelFlag::new())
        .await
        .expect("rescan");
    assert_eq!(report.removed, 1);

    let response = engine.query("charlie delta", 5, None).expect("query");
    assert!(response.results.iter().all(|r| !r.path.ends_with("gone.txt")));
    assert_eq!(engine.stats().vectors, 1);
}

#[tokio::test]
async fn persisted_state_reproduces_query_results() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let index_dir = tmp.path().join("index");
    let entries = write_files(
        tmp.path(),
        &[
            ("a.txt", "neural network training notes"),
            ("b.txt", "database systems overview"),
            ("c.txt", "bank payment and tax invoice"),
        ],
    );
    let now = 1_700_100_000;

    let engine = engine_at(&index_dir);
    engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("index");
    let before = engine
        .query_at("neural network notes", 3, None, now)
        .expect("query");
    drop(engine);

    let reloaded = open_engine_at(&index_dir).expect("open persisted engine");
    let after = reloaded
        .query_at("neural network notes", 3, None, now)
        .expect("query");

    assert_eq!(before.results.len(), after.results.len());
    for (x, y) in before.results.iter().zip(after.results.iter()) {
        assert_eq!(x.document_id, y.document_id);
        assert!((x.similarity_score - y.similarity_score).abs() < 1e-6);
        assert!((x.composite_score - y.composite_score).abs() < 1e-6);
    }
}

#[tokio::test]
async fn corrupted_artifacts_are_detected_and_rebuildable() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let index_dir = tmp.path().join("index");
    let entries = write_files(tmp.path(), &[("a.txt", "alpha bravo")]);
    let engine = engine_at(&index_dir);
    engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("index");
    drop(engine);

    std::fs::write(index_dir.join("vectors.json"), b"{ mangled").expect("corrupt");
    let err = open_engine_at(&index_dir).expect_err("corrupt pair must not load");
    assert!(matches!(err, Error::IndexCorrupted(_)));

    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(256));
    let builder = Arc::new(ContextBuilder::with_default_rules());
    let config = EngineConfig {
        index_dir: index_dir.clone(),
        ..EngineConfig::default()
    };
    let (fresh, rebuilt) =
        SemanticEngine::open_or_fresh(embedder, builder, config).expect("fallback");
    assert!(rebuilt);
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn half_missing_artifact_pair_is_corrupt() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let index_dir = tmp.path().join("index");
    let entries = write_files(tmp.path(), &[("a.txt", "alpha bravo")]);
    let engine = engine_at(&index_dir);
    engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("index");
    drop(engine);

    std::fs::remove_file(index_dir.join("documents.json")).expect("remove");
    let err = open_engine_at(&index_dir).expect_err("half a pair must not load");
    assert!(matches!(err, Error::IndexCorrupted(_)));
}

#[tokio::test]
async fn pre_cancelled_run_defers_everything_for_retry() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let entries = write_files(
        tmp.path(),
        &[("a.txt", "alpha bravo"), ("b.txt", "charlie delta")],
    );
    let engine = engine_at(&tmp.path().join("index"));

    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = engine
        .index_scan(&entries, extractor(), &cancel)
        .await
        .expect("cancelled run still returns");
    assert!(report.cancelled);
    assert_eq!(report.indexed, 0);

    let stats = engine.stats();
    assert_eq!(stats.documents, 2, "deferred documents are tracked");
    assert_eq!(stats.indexed, 0);

    let report = engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("retry");
    assert_eq!(report.indexed, 2);
}

#[tokio::test]
async fn cancellation_leaves_already_indexed_documents_intact() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let entries = write_files(tmp.path(), &[("a.txt", "alpha bravo")]);
    let engine = engine_at(&tmp.path().join("index"));
    engine
        .index_scan(&entries, extractor(), &CancelFlag::new())
        .await
        .expect("first run");

    let cancel = CancelFlag::new();
    cancel.cancel();
    engine
        .index_scan(&entries, extractor(), &cancel)
        .await
        .expect("cancelled rescan");

    assert_eq!(engine.stats().indexed, 1, "indexed document untouched");
    let response = engine.query("alpha bravo", 1, None).expect("query");
    assert_eq!(response.results.len(), 1);
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let engine = engine_at(&tmp.path().join("index"));
    let err = engine.query("   \n ", 5, None).expect_err("blank query");
    assert!(matches!(err, Error::InvalidQuery(_)));
}
