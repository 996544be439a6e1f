//! Tailoring Orchestrator: runs one résumé through ranking, two generation
//! passes and a final project re-rank.
//!
//! Flow: INIT → SECTIONS_RANKED → GENERATED → PROJECTS_RANKED → DONE,
//! with FAILED reachable from every step. Any failure ends the run; no partial
//! document ever leaves this module.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::errors::{AppError, RunFailure};
use crate::generation::content_selector::{
    select_sections, select_top, Section, DEFAULT_SECTION_LIMIT,
};
use crate::generation::prompts::{
    fill_template, EXPERIENCE_PROMPT_TEMPLATE, PROJECTS_PROMPT_TEMPLATE,
};
use crate::generation::validation::report_impact_gaps;
use crate::llm_client::prompts::YAML_ONLY_INSTRUCTION;
use crate::llm_client::TextGenerator;
use crate::models::document::{GeneratedProjects, Project, TailoredDocument};
use crate::models::resume::BaseResume;

/// Final project list size after the merged re-rank.
pub const FINAL_PROJECT_LIMIT: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Init,
    SectionsRanked,
    Generated,
    ProjectsRanked,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "INIT",
            RunState::SectionsRanked => "SECTIONS_RANKED",
            RunState::Generated => "GENERATED",
            RunState::ProjectsRanked => "PROJECTS_RANKED",
            RunState::Done => "DONE",
            RunState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct TailorSettings {
    /// Bullets kept per employer and projects kept from the base pool.
    pub section_limit: usize,
    /// Projects kept after merging generated and original projects.
    pub project_limit: usize,
    /// Upper bound on every external step.
    pub stage_timeout: Duration,
}

impl Default for TailorSettings {
    fn default() -> Self {
        Self {
            section_limit: DEFAULT_SECTION_LIMIT,
            project_limit: FINAL_PROJECT_LIMIT,
            stage_timeout: Duration::from_secs(120),
        }
    }
}

impl TailorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stage_timeout: config.stage_timeout,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct TailoringRequest {
    pub base: BaseResume,
    pub job_description: String,
}

/// A run that reached DONE.
#[derive(Debug, Clone, Serialize)]
pub struct TailoredOutput {
    pub run_id: Uuid,
    pub document: TailoredDocument,
    /// `document` serialized to YAML.
    pub yaml: String,
}

/// Output of INIT → SECTIONS_RANKED.
#[derive(Debug, Clone)]
struct RankedSections {
    employers: Vec<Section<String>>,
    projects: Vec<Project>,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// One tailoring run. Owns its state exclusively; nothing is shared across runs.
pub struct TailoringRun<'a> {
    run_id: Uuid,
    state: RunState,
    embedder: &'a dyn Embedder,
    generator: &'a dyn TextGenerator,
    settings: &'a TailorSettings,
}

impl<'a> TailoringRun<'a> {
    pub fn new(
        embedder: &'a dyn Embedder,
        generator: &'a dyn TextGenerator,
        settings: &'a TailorSettings,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::Init,
            embedder,
            generator,
            settings,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Drives the run to DONE, or returns the state it failed in.
    pub async fn execute(self, request: TailoringRequest) -> Result<TailoredOutput, RunFailure> {
        let span = info_span!("tailoring_run", run_id = %self.run_id);
        self.drive(request).instrument(span).await
    }

    async fn drive(mut self, request: TailoringRequest) -> Result<TailoredOutput, RunFailure> {
        let TailoringRequest {
            base,
            job_description,
        } = request;
        let query = job_description.trim();
        let timeout = self.settings.stage_timeout;

        // Fail fast, before any external call.
        if query.is_empty() {
            return Err(self.fail(AppError::InvalidInput(
                "job description cannot be empty".to_string(),
            )));
        }
        base.validate().map_err(|e| self.fail(e))?;

        // INIT → SECTIONS_RANKED
        let ranked = within(
            "section ranking",
            timeout,
            rank_sections(&base, query, self.settings, self.embedder),
        )
        .await
        .map_err(|e| self.fail(e))?;
        self.transition(RunState::SectionsRanked);

        // SECTIONS_RANKED → GENERATED
        let prompt = build_experience_prompt(&ranked.employers, query);
        let raw = within("experience generation", timeout, generate(self.generator, &prompt))
            .await
            .map_err(|e| self.fail(e))?;
        let mut document = TailoredDocument::parse(&raw)
            .and_then(|mut doc| {
                doc.anchor_to_employers(&base.professional_experience, &raw)?;
                Ok(doc)
            })
            .map_err(|e| self.fail(e))?;
        let gaps = report_impact_gaps(&document);
        if gaps > 0 {
            info!("{gaps} generated bullets lack a quantified result");
        }
        self.transition(RunState::Generated);

        // GENERATED → PROJECTS_RANKED
        let prompt = build_projects_prompt(&document, &ranked.projects, query)
            .map_err(|e| self.fail(e))?;
        let raw = within("project generation", timeout, generate(self.generator, &prompt))
            .await
            .map_err(|e| self.fail(e))?;
        let generated = GeneratedProjects::parse(&raw).map_err(|e| self.fail(e))?;
        info!(
            "Re-ranking {} generated with {} original projects",
            generated.len(),
            ranked.projects.len()
        );

        // Generated first, originals second; the stable re-rank decides the rest.
        let mut pool = generated;
        pool.extend(ranked.projects);
        document.projects = within(
            "project re-ranking",
            timeout,
            select_top(query, pool, self.settings.project_limit, self.embedder),
        )
        .await
        .map_err(|e| self.fail(e))?;
        self.transition(RunState::ProjectsRanked);

        // PROJECTS_RANKED → DONE
        let yaml = document.to_yaml().map_err(|e| self.fail(e))?;
        self.transition(RunState::Done);

        Ok(TailoredOutput {
            run_id: self.run_id,
            document,
            yaml,
        })
    }

    fn transition(&mut self, next: RunState) {
        info!("Run {}: {} → {}", self.run_id, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: AppError) -> RunFailure {
        let stage = self.state;
        error!("Run {} failed in {stage}: {error}", self.run_id);
        self.state = RunState::Failed;
        RunFailure { stage, error }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Steps
// ────────────────────────────────────────────────────────────────────────────

/// Ranks every employer's achievements and the project pool concurrently.
async fn rank_sections(
    base: &BaseResume,
    query: &str,
    settings: &TailorSettings,
    embedder: &dyn Embedder,
) -> Result<RankedSections, AppError> {
    let employer_sections: Vec<Section<String>> = base
        .professional_experience
        .iter()
        .map(|employer| Section::new(employer.company.clone(), employer.achievements.clone()))
        .collect();

    let (employers, projects) = tokio::try_join!(
        select_sections(query, employer_sections, settings.section_limit, embedder),
        select_top(query, base.project_pool(), settings.section_limit, embedder),
    )?;

    Ok(RankedSections {
        employers,
        projects,
    })
}

async fn generate(generator: &dyn TextGenerator, prompt: &str) -> Result<String, AppError> {
    Ok(generator.generate(prompt).await?)
}

/// Bounds an external step by `limit`; expiry becomes `AppError::Timeout`.
async fn within<T>(
    stage: &'static str,
    limit: Duration,
    step: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    tokio::time::timeout(limit, step)
        .await
        .map_err(|_| AppError::Timeout {
            stage,
            after: limit,
        })?
}

fn build_experience_prompt(employers: &[Section<String>], job_description: &str) -> String {
    let experience = employers
        .iter()
        .map(|section| {
            let bullets = section
                .candidates
                .iter()
                .map(|bullet| format!("  - {bullet}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}:\n{}", section.name, bullets)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    fill_template(
        EXPERIENCE_PROMPT_TEMPLATE,
        &[
            ("company_count", &employers.len().to_string()),
            ("experience", &experience),
            ("job_description", job_description),
            ("yaml_instruction", YAML_ONLY_INSTRUCTION),
        ],
    )
}

fn build_projects_prompt(
    document: &TailoredDocument,
    projects: &[Project],
    job_description: &str,
) -> Result<String, AppError> {
    let resume = document.to_yaml()?;
    let projects = serde_yaml::to_string(projects)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize projects: {e}")))?;

    Ok(fill_template(
        PROJECTS_PROMPT_TEMPLATE,
        &[
            ("resume", &resume),
            ("projects", &projects),
            ("job_description", job_description),
            ("yaml_instruction", YAML_ONLY_INSTRUCTION),
        ],
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
