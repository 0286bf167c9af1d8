//! The online query pipeline: normalize → embed → candidate search →
//! context enrichment → rank → truncate. Read-only and fully concurrent
//! across requests.

use serde::{Deserialize, Serialize};

use findex_core::error::{Error, Result};
use findex_core::types::{QueryResult, RankWeights};

use crate::rank::{rank, QueryLabels};
use crate::SemanticEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Ok,
    /// The index has zero entries. Recoverable and reportable: callers get
    /// an empty result list with this reason attached, not an error.
    EmptyIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub status: QueryStatus,
    pub results: Vec<QueryResult>,
}

impl SemanticEngine {
    /// Answer a query with at most `top_k` ranked results. `weights`
    /// overrides the configured defaults for this call only.
    pub fn query(
        &self,
        query_text: &str,
        top_k: usize,
        weights: Option<&RankWeights>,
    ) -> Result<QueryResponse> {
        self.query_at(query_text, top_k, weights, chrono::Utc::now().timestamp())
    }

    /// As [`query`](Self::query) with an injected clock, which keeps
    /// recency scoring deterministic under test.
    pub fn query_at(
        &self,
        query_text: &str,
        top_k: usize,
        weights: Option<&RankWeights>,
        now: i64,
    ) -> Result<QueryResponse> {
        let normalized = normalize_query(query_text);
        if normalized.is_empty() {
            return Err(Error::InvalidQuery("query text is empty".into()));
        }
        let weights = weights.unwrap_or(&self.config().weights);
        weights.validate()?;

        if self.index_read().is_empty() {
            tracing::debug!("query against empty index");
            return Ok(QueryResponse {
                query: normalized,
                status: QueryStatus::EmptyIndex,
                results: Vec::new(),
            });
        }

        let query_vector = self.embedder().embed(&normalized)?;
        // Over-fetch so re-ranking has room to reorder beyond top_k.
        let k_candidates = (top_k * self.config().candidate_multiplier)
            .max(self.config().min_candidates);
        let hits = self.index_read().search(&query_vector, k_candidates)?;

        let classifier = self.builder().classifier();
        let labels = QueryLabels {
            topic: classifier.classify(&normalized),
            category: classifier.classify_name(&normalized),
        };
        let store = self.store_read();
        let mut results = rank(&hits, &store, &labels, weights, now);
        results.truncate(top_k);
        tracing::debug!(
            query = %normalized,
            candidates = hits.len(),
            returned = results.len(),
            "query answered"
        );
        Ok(QueryResponse {
            query: normalized,
            status: QueryStatus::Ok,
            results,
        })
    }
}

/// Trim and collapse runs of whitespace to single spaces.
fn normalize_query(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
