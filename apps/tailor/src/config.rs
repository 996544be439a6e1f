use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Which embedder backs the ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    OpenAi,
    Local,
}

impl EmbeddingBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(EmbeddingBackend::OpenAi),
            "local" => Ok(EmbeddingBackend::Local),
            other => anyhow::bail!("EMBEDDING_BACKEND must be 'openai' or 'local', got '{other}'"),
        }
    }

    fn default_for_build() -> Self {
        if cfg!(feature = "local-embeddings") {
            EmbeddingBackend::Local
        } else {
            EmbeddingBackend::OpenAi
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_base_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub resume_path: PathBuf,
    pub output_yaml: PathBuf,
    pub output_pdf: PathBuf,
    pub archive_dir: PathBuf,
    pub latex_program: String,
    pub stage_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let embedding_backend = match optional_env("EMBEDDING_BACKEND") {
            Some(value) => EmbeddingBackend::parse(&value)?,
            None => EmbeddingBackend::default_for_build(),
        };

        Ok(Config {
            llm_api_key: require_env("GROQ_API_KEY")?,
            llm_base_url: env_or("LLM_BASE_URL", "https://api.groq.com/openai/v1"),
            llm_model: env_or("LLM_MODEL", "llama-3.3-70b-versatile"),
            embedding_backend,
            embedding_base_url: env_or("EMBEDDING_BASE_URL", "https://api.openai.com/v1"),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            resume_path: env_or("RESUME_PATH", "Resume.yaml").into(),
            output_yaml: env_or("OUTPUT_YAML", "output.yaml").into(),
            output_pdf: env_or("OUTPUT_PDF", "output.pdf").into(),
            archive_dir: env_or("ARCHIVE_DIR", ".").into(),
            latex_program: env_or("LATEX_PROGRAM", "pdflatex"),
            stage_timeout: Duration::from_secs(
                env_or("STAGE_TIMEOUT_SECS", "120")
                    .parse::<u64>()
                    .context("STAGE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}
