//! Similarity Ranker: scores candidates against a query by cosine similarity.
//!
//! Algorithm:
//! 1. Embed the query once and all candidates in a single batch call
//! 2. Score each candidate: dot(q, c) / (|q| * |c|), or 0.0 when either norm is zero
//! 3. Stable sort descending, so equal scores keep their input order
//!
//! Ranking never drops or adds candidates: the output has one entry per input.

use serde::Serialize;

use crate::embedding::{Embedder, EmbeddingError};
use crate::errors::AppError;
use crate::models::document::Project;

/// Anything that can be ranked: exposes the text that gets embedded.
pub trait Rankable {
    fn rank_text(&self) -> &str;
}

impl Rankable for String {
    fn rank_text(&self) -> &str {
        self
    }
}

/// Projects are ranked on their description; name and keywords ride along.
impl Rankable for Project {
    fn rank_text(&self) -> &str {
        &self.description
    }
}

/// A candidate paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate<T> {
    pub score: f64,
    /// Position in the input sequence.
    pub index: usize,
    pub candidate: T,
}

/// Candidates sorted by score descending, ties in input order.
pub type RankedList<T> = Vec<ScoredCandidate<T>>;

/// Ranks `candidates` by similarity to `query`.
///
/// Embedder failures are returned as-is (wrapped in `AppError::Embedding`),
/// never retried.
pub async fn rank<T: Rankable>(
    query: &str,
    candidates: Vec<T>,
    embedder: &dyn Embedder,
) -> Result<RankedList<T>, AppError> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput("query text cannot be empty".to_string()));
    }
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = candidates
        .iter()
        .map(|c| c.rank_text().to_string())
        .collect();

    let (query_vector, candidate_vectors) =
        tokio::try_join!(embedder.embed(query), embedder.embed_batch(&texts))?;

    if candidate_vectors.len() != candidates.len() {
        return Err(EmbeddingError::Malformed(format!(
            "{} vectors returned for {} candidates",
            candidate_vectors.len(),
            candidates.len()
        ))
        .into());
    }

    let mut ranked = Vec::with_capacity(candidates.len());
    for (index, (candidate, vector)) in candidates.into_iter().zip(candidate_vectors).enumerate() {
        if vector.len() != query_vector.len() {
            return Err(EmbeddingError::Malformed(format!(
                "candidate {index} has dimension {}, query has {}",
                vector.len(),
                query_vector.len()
            ))
            .into());
        }
        ranked.push(ScoredCandidate {
            score: cosine_similarity(&query_vector, &vector),
            index,
            candidate,
        });
    }

    // `sort_by` is stable: equal scores keep input order.
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(ranked)
}

/// Cosine similarity of two equal-length vectors, in [-1, 1].
///
/// Zero-norm vectors are unrelated to everything and score 0.0, as does any
/// non-finite result.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    let score = dot / denom;
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_support::StubEmbedder;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cosine_identical_vectors_is_one() {
        let score = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((score - 1.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_cosine_opposite_vectors_is_minus_one() {
        let score = cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]);
        assert!((score + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_nan_input_is_zero() {
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_rank_orders_by_score_descending() {
        let embedder = StubEmbedder::new()
            .with_query("q")
            .with_similarity("low", 0.2)
            .with_similarity("high", 0.9)
            .with_similarity("mid", 0.5);

        let ranked = rank("q", strings(&["low", "high", "mid"]), &embedder)
            .await
            .unwrap();

        let order: Vec<&str> = ranked.iter().map(|s| s.candidate.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranked[0].index, 1);
    }

    #[tokio::test]
    async fn test_rank_preserves_cardinality() {
        let embedder = StubEmbedder::new()
            .with_query("q")
            .with_similarity("a", 0.1)
            .with_similarity("b", 0.1)
            .with_similarity("c", 0.3);
        let ranked = rank("q", strings(&["a", "b", "c", "a"]), &embedder)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 4);
    }

    #[tokio::test]
    async fn test_rank_empty_candidates_is_empty() {
        let embedder = StubEmbedder::new().with_query("q");
        let ranked = rank("q", Vec::<String>::new(), &embedder).await.unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_rank_ties_keep_input_order() {
        // Distinct texts, identical vectors.
        let embedder = StubEmbedder::new()
            .with_query("q")
            .with("first", vec![0.6, 0.8])
            .with("better", vec![1.0, 0.0])
            .with("second", vec![0.6, 0.8]);

        let ranked = rank("q", strings(&["first", "better", "second"]), &embedder)
            .await
            .unwrap();

        let order: Vec<&str> = ranked.iter().map(|s| s.candidate.as_str()).collect();
        assert_eq!(order, vec!["better", "first", "second"]);
        assert_eq!(ranked[1].score, ranked[2].score);
    }

    #[tokio::test]
    async fn test_rank_zero_vector_scores_zero() {
        let embedder = StubEmbedder::new()
            .with_query("q")
            .with("blank", vec![0.0, 0.0])
            .with_similarity("opposed", -0.5);

        let ranked = rank("q", strings(&["opposed", "blank"]), &embedder)
            .await
            .unwrap();

        assert_eq!(ranked[0].candidate, "blank");
        assert_eq!(ranked[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_rank_is_deterministic() {
        let embedder = StubEmbedder::new()
            .with_query("q")
            .with_similarity("a", 0.4)
            .with_similarity("b", 0.7)
            .with_similarity("c", 0.4);
        let input = strings(&["a", "b", "c"]);

        let first = rank("q", input.clone(), &embedder).await.unwrap();
        let second = rank("q", input, &embedder).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rank_uses_one_batch_call() {
        let embedder = StubEmbedder::new()
            .with_query("q")
            .with_similarity("a", 0.4)
            .with_similarity("b", 0.7);
        rank("q", strings(&["a", "b"]), &embedder).await.unwrap();
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rank_empty_query_is_invalid_input() {
        let embedder = StubEmbedder::new();
        let err = rank("   ", strings(&["a"]), &embedder).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rank_surfaces_embedder_failure() {
        let embedder = StubEmbedder::failing();
        let err = rank("q", strings(&["a"]), &embedder).await.unwrap_err();
        assert!(
            matches!(err, AppError::Embedding(EmbeddingError::Api { status: 503, .. })),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_rank_dimension_mismatch_is_malformed() {
        let embedder = StubEmbedder::new()
            .with_query("q")
            .with("short", vec![1.0]);
        let err = rank("q", strings(&["short"]), &embedder).await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(EmbeddingError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_projects_rank_on_description() {
        let embedder = StubEmbedder::new()
            .with_query("q")
            .with_similarity("weak match", 0.1)
            .with_similarity("strong match", 0.8);
        let projects = vec![
            Project {
                project_name: "strong match".to_string(),
                description: "weak match".to_string(),
                keywords: vec![],
            },
            Project {
                project_name: "other".to_string(),
                description: "strong match".to_string(),
                keywords: vec!["Rust".to_string()],
            },
        ];

        let ranked = rank("q", projects, &embedder).await.unwrap();
        assert_eq!(ranked[0].candidate.project_name, "other");
        assert_eq!(ranked[0].candidate.keywords, vec!["Rust"]);
    }
}
