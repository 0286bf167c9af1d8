use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use findex_cli::extract::PlainTextExtractor;
use findex_cli::scanner::WalkdirScanner;
use findex_context::ContextBuilder;
use findex_core::config::{expand_path, Config};
use findex_core::traits::{Embedder, FileScanner};
use findex_embed::embedder_from_config;
use findex_engine::{CancelFlag, SemanticEngine};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let engine_config = config.engine()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut data_dir: Option<PathBuf> = None;
    let mut clear_first = false;
    for arg in &args {
        match arg.as_str() {
            "--clear" => clear_first = true,
            other if !other.starts_with('-') => data_dir = Some(expand_path(other)),
            other => eprintln!("Ignoring unknown flag {other}"),
        }
    }
    let data_dir = data_dir.unwrap_or_else(|| {
        let dir: String = config
            .get("data.folder")
            .unwrap_or_else(|_| "data/docs".to_string());
        expand_path(dir)
    });

    println!("findex indexer");
    println!("==============");
    println!("Data directory:  {}", data_dir.display());
    println!("Index directory: {}", engine_config.index_dir.display());

    let embedder: Arc<dyn Embedder> = Arc::from(embedder_from_config(&engine_config.embedding)?);
    let builder = Arc::new(ContextBuilder::with_default_rules());
    let (engine, rebuilt) = SemanticEngine::open_or_fresh(embedder, builder, engine_config)?;
    if rebuilt {
        println!("Persisted index was unusable; rebuilding from scratch");
    }
    if clear_first {
        engine.clear()?;
        println!("Cleared existing index");
    }

    let scanner = WalkdirScanner::with_default_extensions();
    let entries = scanner.scan(&data_dir)?;
    println!("Found {} candidate files", entries.len());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Indexing...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let cancel = CancelFlag::new();
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let on_ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling after in-flight documents...");
                on_ctrl_c.cancel();
            }
        });
        engine
            .index_scan(&entries, Arc::new(PlainTextExtractor), &cancel)
            .await
    })?;
    pb.finish_and_clear();

    println!(
        "Indexed: {}  Skipped: {}  Failed: {}  Removed: {}",
        report.indexed, report.skipped, report.failed, report.removed
    );
    if report.cancelled {
        println!("Run was cancelled; re-run to pick up deferred documents");
    }
    let stats = engine.stats();
    println!(
        "Index now holds {} vectors (dim {}, model {})",
        stats.vectors, stats.dim, stats.model_version
    );
    Ok(())
}
