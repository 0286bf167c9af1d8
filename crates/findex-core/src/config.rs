//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `FINDEX_*`
//! env vars. The orchestrators never read configuration ambiently: they
//! receive an [`EngineConfig`] at construction.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::RankWeights;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("FINDEX_").split("__"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("failed to get '{key}': {e}")))
    }

    /// The engine section, or defaults when the config carries none.
    pub fn engine(&self) -> Result<EngineConfig> {
        match self.figment.find_value("engine") {
            Ok(_) => self
                .figment
                .extract_inner("engine")
                .map_err(|e| Error::InvalidConfig(format!("invalid [engine] section: {e}"))),
            Err(_) => Ok(EngineConfig::default()),
        }
    }
}

/// Everything the indexing and query orchestrators need, passed in
/// explicitly at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the persisted index artifacts live.
    pub index_dir: PathBuf,
    /// Worker-pool bound for per-document extraction + embedding.
    pub concurrency: usize,
    /// Per-document processing timeout; a document over budget is failed
    /// and the batch continues.
    pub doc_timeout_secs: u64,
    /// Over-fetch factor for the candidate set handed to re-ranking.
    pub candidate_multiplier: usize,
    /// Over-fetch floor, so small `top_k` still re-ranks a real pool.
    pub min_candidates: usize,
    /// Extracted text beyond this length is truncated before embedding.
    pub max_text_len: usize,
    pub weights: RankWeights,
    pub embedding: EmbeddingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("data/index"),
            concurrency: 4,
            doc_timeout_secs: 30,
            candidate_multiplier: 4,
            min_candidates: 32,
            max_text_len: 50_000,
            weights: RankWeights::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.candidate_multiplier == 0 {
            return Err(Error::InvalidConfig(
                "candidate_multiplier must be at least 1".into(),
            ));
        }
        self.weights.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "model" for the transformer backend, "hash" for the deterministic
    /// hashing backend.
    pub backend: String,
    /// Model directory override; falls back to well-known locations.
    pub model_dir: Option<String>,
    /// Vector dimension used by the hashing backend. The model backend
    /// derives its dimension from the loaded weights.
    pub dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "model".to_string(),
            model_dir: None,
            dim: 384,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after
/// expansion. Absolute paths are returned as-is.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
