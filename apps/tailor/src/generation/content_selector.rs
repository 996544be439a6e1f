//! Content Selector: picks the top-N most relevant candidates per résumé section.
//!
//! Each section (one employer's achievements, the project pool) is ranked on its
//! own against the job description. No LLM calls here.

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::embedding::Embedder;
use crate::errors::AppError;
use crate::generation::similarity::{rank, Rankable};

/// Bullets kept per section unless the caller asks for another limit.
pub const DEFAULT_SECTION_LIMIT: usize = 5;

/// A named group of candidates that share one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section<T> {
    pub name: String,
    pub candidates: Vec<T>,
}

impl<T> Section<T> {
    pub fn new(name: impl Into<String>, candidates: Vec<T>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }
}

/// Returns the `limit` candidates most similar to `query`, best first.
///
/// The result has exactly `min(limit, candidates.len())` items and is a prefix
/// of the full ranking. `limit == 0` means "exclude this section" and returns
/// nothing without embedding anything.
pub async fn select_top<T: Rankable>(
    query: &str,
    candidates: Vec<T>,
    limit: usize,
    embedder: &dyn Embedder,
) -> Result<Vec<T>, AppError> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let total = candidates.len();
    let ranked = rank(query, candidates, embedder).await?;
    let selected: Vec<T> = ranked
        .into_iter()
        .take(limit)
        .map(|scored| scored.candidate)
        .collect();

    debug!(
        "Selected {} of {} candidates ({} excluded by limit {})",
        selected.len(),
        total,
        total - selected.len(),
        limit
    );
    Ok(selected)
}

/// Runs `select_top` over every section concurrently.
///
/// All sections must succeed: the first failure fails the whole call, since a
/// résumé missing a section is worse than none. Output order matches input order.
pub async fn select_sections<T: Rankable>(
    query: &str,
    sections: Vec<Section<T>>,
    limit: usize,
    embedder: &dyn Embedder,
) -> Result<Vec<Section<T>>, AppError> {
    try_join_all(sections.into_iter().map(|section| async move {
        let candidates = select_top(query, section.candidates, limit, embedder).await?;
        Ok::<_, AppError>(Section {
            name: section.name,
            candidates,
        })
    }))
    .await
}
