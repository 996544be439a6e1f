use std::sync::Arc;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::generation::generator::TailorSettings;
use crate::llm_client::TextGenerator;
use crate::render::Assembler;

/// Shared application state: the external collaborators plus settings.
/// Injected into route handlers via Axum extractors and used directly by the CLI.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn TextGenerator>,
    /// Pluggable embedder. Default backend chosen by EMBEDDING_BACKEND.
    pub embedder: Arc<dyn Embedder>,
    pub assembler: Arc<dyn Assembler>,
    pub settings: TailorSettings,
    pub config: Config,
}
