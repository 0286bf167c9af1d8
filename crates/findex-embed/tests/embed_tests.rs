use findex_core::config::EmbeddingConfig;
use findex_core::traits::Embedder;
use findex_embed::{embedder_from_config, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[test]
fn hash_embedder_shape_and_determinism() {
    let embedder = HashEmbedder::new(384);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn batch_equals_individual_calls() {
    let embedder = HashEmbedder::new(64);
    let texts = vec![
        "tax invoice for march".to_string(),
        "lecture notes on algorithms".to_string(),
        "".to_string(),
    ];

    let batched = embedder.embed_batch(&texts).expect("batch");
    assert_eq!(batched.len(), texts.len(), "order and length preserved");
    for (text, from_batch) in texts.iter().zip(batched.iter()) {
        let single = embedder.embed(text).expect("embed");
        assert_eq!(&single, from_batch);
    }
}

#[test]
fn blank_text_yields_zero_vector() {
    let embedder = HashEmbedder::new(32);
    for text in ["", "   ", "\n\t  \n"] {
        let v = embedder.embed(text).expect("embed");
        assert!(v.iter().all(|x| *x == 0.0), "blank input maps to the zero sentinel");
    }
}

#[test]
fn shared_tokens_score_higher_than_disjoint() {
    let embedder = HashEmbedder::new(384);
    let query = embedder.embed("machine learning notes").expect("embed");
    let related = embedder
        .embed("notes on machine learning models")
        .expect("embed");
    let unrelated = embedder
        .embed("grocery list apples bananas")
        .expect("embed");

    assert!(
        cosine(&query, &related) > cosine(&query, &unrelated),
        "token overlap must dominate"
    );
}

#[test]
fn casing_does_not_change_the_vector() {
    let embedder = HashEmbedder::new(128);
    let a = embedder.embed("Machine Learning").expect("embed");
    let b = embedder.embed("machine learning").expect("embed");
    assert_eq!(a, b);
}

#[test]
fn config_selects_hash_backend() {
    let cfg = EmbeddingConfig {
        backend: "hash".to_string(),
        model_dir: None,
        dim: 96,
    };
    let embedder = embedder_from_config(&cfg).expect("embedder");
    assert_eq!(embedder.dim(), 96);
    assert!(embedder.model_version().starts_with("xxhash-"));
}

#[test]
fn unknown_backend_is_rejected() {
    let cfg = EmbeddingConfig {
        backend: "quantum".to_string(),
        model_dir: None,
        dim: 16,
    };
    assert!(embedder_from_config(&cfg).is_err());
}
