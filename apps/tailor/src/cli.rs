//! Interactive mode: tailor the base résumé on disk to a job description pasted
//! into the terminal, then render and archive the result.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::archive::archive_application;
use crate::generation::generator::{TailoringRequest, TailoringRun};
use crate::generation::posting::{extract_posting, resolve_posting, MissingFieldResolver};
use crate::models::document::TailoredDocument;
use crate::models::resume::BaseResume;
use crate::state::AppState;

/// Where raw generator output goes when it fails to parse.
pub const RAW_OUTPUT_FILE: &str = "llm_raw_output.txt";

/// Line-oriented terminal input, shared by the job description reader and the
/// missing-field prompts so no buffered input is lost between them.
pub struct Terminal<R> {
    lines: Mutex<Lines<R>>,
}

impl Terminal<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Terminal<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Reads lines until a blank line or end of input.
    pub async fn read_until_blank(&self) -> Result<String> {
        let mut lines = self.lines.lock().await;
        let mut collected = Vec::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                break;
            }
            collected.push(line);
        }
        Ok(collected.join("\n").trim().to_string())
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> MissingFieldResolver for Terminal<R> {
    async fn resolve_missing(&self, field_name: &str) -> Result<String> {
        println!("Enter the {field_name} name manually:");
        let mut lines = self.lines.lock().await;
        let answer = lines
            .next_line()
            .await?
            .with_context(|| format!("input closed while asking for {field_name}"))?;
        Ok(answer.trim().to_string())
    }
}

pub async fn load_base_resume(path: &Path) -> Result<BaseResume> {
    info!("Loading base résumé from '{}'", path.display());
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Base résumé not found at '{}'", path.display()))?;
    Ok(BaseResume::from_yaml(&text)?)
}

/// Full interactive run: tailor, write YAML, render PDF, archive.
pub async fn run_interactive(state: &AppState) -> Result<()> {
    let config = &state.config;
    let base = load_base_resume(&config.resume_path).await?;

    let terminal = Terminal::stdin();
    println!("Paste the job description below. End with an empty line (just press Enter).");
    let job_description = terminal.read_until_blank().await?;
    if job_description.is_empty() {
        warn!("Job description is empty. Exiting.");
        return Ok(());
    }

    let run = TailoringRun::new(state.embedder.as_ref(), state.llm.as_ref(), &state.settings);
    info!("Starting tailoring run {}", run.run_id());
    let request = TailoringRequest {
        base: base.clone(),
        job_description: job_description.clone(),
    };
    let output = match run.execute(request).await {
        Ok(output) => output,
        Err(failure) => {
            if let Some(raw) = failure.error.raw_output() {
                let raw_path = sibling(&config.output_yaml, RAW_OUTPUT_FILE);
                tokio::fs::write(&raw_path, raw).await?;
                error!("Raw generator output saved to {}", raw_path.display());
            }
            return Err(failure.into());
        }
    };

    info!("Saving tailored YAML to '{}'", config.output_yaml.display());
    tokio::fs::write(&config.output_yaml, &output.yaml)
        .await
        .with_context(|| format!("Failed to write {}", config.output_yaml.display()))?;

    state
        .assembler
        .assemble(&base, &output.document, &config.output_pdf)
        .await
        .with_context(|| {
            format!(
                "Rendering failed; the tailored YAML is saved at {} and can be re-rendered with `tailor render`",
                config.output_yaml.display()
            )
        })?;

    let posting = extract_posting(&job_description, state.llm.as_ref()).await;
    let archived = match resolve_posting(posting, &terminal).await {
        Ok(resolved) => {
            archive_application(
                &config.archive_dir,
                &resolved,
                &config.output_pdf,
                &job_description,
                Local::now().date_naive(),
            )
            .await
        }
        Err(e) => Err(e),
    };
    match archived {
        Ok(path) => println!("Resume saved as: {}", path.display()),
        Err(e) => warn!("Could not archive this application: {e:#}"),
    }

    Ok(())
}

/// Re-renders the PDF from a previously saved tailored YAML.
pub async fn run_render(state: &AppState) -> Result<()> {
    let config = &state.config;
    let base = load_base_resume(&config.resume_path).await?;
    let text = tokio::fs::read_to_string(&config.output_yaml)
        .await
        .with_context(|| format!("Tailored YAML not found at '{}'", config.output_yaml.display()))?;
    let document: TailoredDocument = serde_yaml::from_str(&text)
        .with_context(|| format!("'{}' is not a tailored document", config.output_yaml.display()))?;

    state
        .assembler
        .assemble(&base, &document, &config.output_pdf)
        .await?;
    Ok(())
}

fn sibling(path: &Path, file_name: &str) -> std::path::PathBuf {
    match path.parent() {
        Some(parent) => parent.join(file_name),
        None => file_name.into(),
    }
}
