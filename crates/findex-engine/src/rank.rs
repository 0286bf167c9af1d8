//! Context-aware re-ranking of vector-index candidates.

use std::cmp::Ordering;

use findex_core::types::{QueryResult, RankWeights, SearchHit};

use crate::store::DocumentStore;

/// Recency decays with a 30-day half-life.
pub const RECENCY_HALF_LIFE_DAYS: f64 = 30.0;

/// Labels inferred from the query text, matched against each candidate's
/// topic and category for the bonus signals.
#[derive(Debug, Clone)]
pub struct QueryLabels {
    pub topic: String,
    pub category: String,
}

/// Cosine similarity mapped onto [0, 1], monotonically.
pub fn normalized_similarity(cosine: f32) -> f32 {
    (cosine + 1.0) / 2.0
}

/// Monotonically decreasing boost in [0, 1] for document age. Timestamps
/// in the future clamp to age zero.
pub fn recency_boost(last_modified: i64, now: i64) -> f32 {
    let age_secs = (now - last_modified).max(0) as f64;
    let age_days = age_secs / 86_400.0;
    0.5f64.powf(age_days / RECENCY_HALF_LIFE_DAYS) as f32
}

/// Fuse similarity with the context signals into one total order.
///
/// Candidates without a context row are dropped: they have no business in
/// the index and the load-time cross-check makes this unreachable outside
/// of races with a concurrent rebuild.
///
/// Ties in composite score break by higher raw similarity, then ascending
/// document id, so the output order is deterministic.
pub fn rank(
    hits: &[SearchHit],
    store: &DocumentStore,
    labels: &QueryLabels,
    weights: &RankWeights,
    now: i64,
) -> Vec<QueryResult> {
    let mut results: Vec<QueryResult> = hits
        .iter()
        .filter_map(|hit| {
            let row = store.get(&hit.id)?;
            let context = row.context.as_ref()?;
            let similarity = normalized_similarity(hit.score);
            let recency = recency_boost(context.last_modified, now);
            let topic_bonus = if context.topic == labels.topic { 1.0 } else { 0.0 };
            let category_bonus = if context.category == labels.category { 1.0 } else { 0.0 };
            let composite = weights.similarity_weight * similarity
                + weights.recency_weight * recency
                + weights.topic_weight * topic_bonus
                + weights.category_weight * category_bonus;
            Some(QueryResult {
                document_id: hit.id.clone(),
                path: row.document.path.clone(),
                similarity_score: hit.score,
                composite_score: composite,
                context: context.clone(),
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.similarity_score
                    .partial_cmp(&a.similarity_score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    results
}
