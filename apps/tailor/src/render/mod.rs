//! Document Assembler: turns a finished document into a PDF.
//!
//! The default backend renders LaTeX source and compiles it with an external
//! LaTeX program in a scratch directory. Assembly never mutates the document,
//! so a failed render can be retried with the same input.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::models::document::TailoredDocument;
use crate::models::resume::BaseResume;

pub mod latex;

/// Lines of compiler output kept in an error.
const LOG_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}:\n{log_tail}")]
    Compiler {
        program: String,
        status: std::process::ExitStatus,
        log_tail: String,
    },

    #[error("compiler finished but produced no PDF at {0}")]
    MissingOutput(PathBuf),
}

#[async_trait]
pub trait Assembler: Send + Sync {
    async fn assemble(
        &self,
        base: &BaseResume,
        document: &TailoredDocument,
        output: &Path,
    ) -> Result<(), AssemblyError>;
}

#[derive(Debug, Clone)]
pub struct LatexAssembler {
    program: String,
}

impl LatexAssembler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Assembler for LatexAssembler {
    async fn assemble(
        &self,
        base: &BaseResume,
        document: &TailoredDocument,
        output: &Path,
    ) -> Result<(), AssemblyError> {
        let workdir = tempfile::tempdir()?;
        let source_path = workdir.path().join("resume.tex");
        tokio::fs::write(&source_path, latex::render_source(base, document)).await?;
        debug!("LaTeX source written to {}", source_path.display());

        let result = Command::new(&self.program)
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg("resume.tex")
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AssemblyError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(AssemblyError::Compiler {
                program: self.program.clone(),
                status: result.status,
                log_tail: log_tail(&String::from_utf8_lossy(&result.stdout)),
            });
        }

        let pdf_path = workdir.path().join("resume.pdf");
        if !tokio::fs::try_exists(&pdf_path).await? {
            return Err(AssemblyError::MissingOutput(pdf_path));
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&pdf_path, output).await?;
        info!("Résumé PDF written to {}", output.display());
        Ok(())
    }
}

/// Last `LOG_TAIL_LINES` lines of compiler output.
fn log_tail(log: &str) -> String {
    let lines: Vec<&str> = log.lines().collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    lines[start..].join("\n")
}
