//! Stubs for the external boundaries, shared by unit tests across modules.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::embedding::{Embedder, EmbeddingError};
use crate::llm_client::{LlmError, TextGenerator};

/// Deterministic embedder backed by a fixed text → vector table.
#[derive(Default)]
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fail: bool,
    pub single_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Registers `query` as the unit x-axis vector.
    pub fn with_query(self, query: &str) -> Self {
        self.with(query, vec![1.0, 0.0])
    }

    /// Registers `text` so its cosine similarity to a `with_query` query is `score`.
    pub fn with_similarity(self, text: &str, score: f32) -> Self {
        let y = (1.0 - score * score).max(0.0).sqrt();
        self.with(text, vec![score, y])
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn lookup(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.fail {
            return Err(EmbeddingError::Api {
                status: 503,
                message: "stub embedder unavailable".to_string(),
            });
        }
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::Malformed(format!("no stub vector for {text:?}")))
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|t| self.lookup(t)).collect()
    }
}

/// Generator that replays canned responses in order and records every prompt.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    pub prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            ..Self::default()
        }
    }

    pub fn then_fail(self, error: LlmError) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompt(&self, index: usize) -> String {
        self.prompts.lock().expect("prompts lock")[index].clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}
