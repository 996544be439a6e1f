// Tailoring engine: semantic ranking, two generation passes, re-ranking.
// All LLM calls go through llm_client and all embeddings through the Embedder seam.

pub mod content_selector;
pub mod generator;
pub mod handlers;
pub mod posting;
pub mod prompts;
pub mod similarity;
pub mod validation;
