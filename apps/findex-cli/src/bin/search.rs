use std::sync::Arc;

use findex_context::ContextBuilder;
use findex_core::config::Config;
use findex_core::error::Error;
use findex_core::traits::Embedder;
use findex_embed::embedder_from_config;
use findex_engine::{QueryStatus, SemanticEngine};

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
    let mut top_k = 5usize;
    let mut query_parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-k" | "--top-k" => {
                if let Some(n) = args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                    top_k = n;
                    i += 1;
                } else {
                    eprintln!("Error: {} requires a number", args[i]);
                    std::process::exit(1);
                }
            }
            other => query_parts.push(other.to_string()),
        }
        i += 1;
    }
    let query = query_parts.join(" ");
    if query.trim().is_empty() {
        eprintln!("Usage: findex-search [-k N] <query text>");
        std::process::exit(1);
    }

    let embedder: Arc<dyn Embedder> = Arc::from(embedder_from_config(&engine_config.embedding)?);
    let builder = Arc::new(ContextBuilder::with_default_rules());
    let engine = match SemanticEngine::open(embedder, builder, engine_config) {
        Ok(engine) => engine,
        Err(e @ Error::IndexCorrupted(_)) => {
            eprintln!("Index unusable ({e}); run findex-indexer to rebuild it");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let response = engine.query(&query, top_k, None)?;
    if response.status == QueryStatus::EmptyIndex {
        println!("Index is empty; run findex-indexer over a folder first.");
        return Ok(());
    }

    println!("Results for '{}':", response.query);
    for (position, result) in response.results.iter().enumerate() {
        println!(
            "{:>2}. {:.3} (sim {:.3})  {}",
            position + 1,
            result.composite_score,
            result.similarity_score,
            result.path
        );
        println!(
            "      [{} / {}] {}",
            result.context.topic, result.context.category, result.context.preview
        );
    }
    if response.results.is_empty() {
        println!("No matches.");
    }
    Ok(())
}
