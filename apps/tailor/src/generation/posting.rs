//! Job posting details: company and position names used to file the finished résumé.
//!
//! Extraction is best-effort: anything the generator cannot name is asked of a
//! `MissingFieldResolver` (the terminal, in interactive mode).

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::generation::prompts::{fill_template, POSTING_PROMPT_TEMPLATE};
use crate::llm_client::prompts::YAML_ONLY_INSTRUCTION;
use crate::llm_client::TextGenerator;
use crate::models::document::parse_generated;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, deserialize_with = "first_text")]
    pub company: Option<String>,
    #[serde(default, alias = "position_name", deserialize_with = "first_text")]
    pub position: Option<String>,
}

/// Company and position once every gap has been filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPosting {
    pub company: String,
    pub position: String,
}

/// Supplies a value the job posting did not state.
#[async_trait]
pub trait MissingFieldResolver: Send + Sync {
    async fn resolve_missing(&self, field_name: &str) -> anyhow::Result<String>;
}

/// Asks the generator for company and position. Failures degrade to an empty
/// posting so the resolver fills in everything.
pub async fn extract_posting(job_description: &str, llm: &dyn TextGenerator) -> JobPosting {
    let prompt = fill_template(
        POSTING_PROMPT_TEMPLATE,
        &[
            ("job_description", job_description),
            ("yaml_instruction", YAML_ONLY_INSTRUCTION),
        ],
    );

    let raw = match llm.generate(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Posting extraction call failed: {e}");
            return JobPosting::default();
        }
    };

    match parse_generated::<JobPosting>(&raw, "job posting") {
        Ok(posting) => {
            info!(
                "Extracted posting: company={:?} position={:?}",
                posting.company, posting.position
            );
            posting
        }
        Err(e) => {
            warn!("{e}; raw output: {raw:?}");
            JobPosting::default()
        }
    }
}

/// Fills missing company/position through the resolver.
pub async fn resolve_posting(
    posting: JobPosting,
    resolver: &dyn MissingFieldResolver,
) -> anyhow::Result<ResolvedPosting> {
    let company = match posting.company {
        Some(company) => company,
        None => resolver.resolve_missing("company").await?,
    };
    let position = match posting.position {
        Some(position) => position,
        None => resolver.resolve_missing("position").await?,
    };
    Ok(ResolvedPosting { company, position })
}

/// Accepts `null`, a string, or a list of strings (first non-blank entry wins).
fn first_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<Option<String>>),
    }

    let value = Option::<OneOrMany>::deserialize(deserializer)?;
    let text = match value {
        None => None,
        Some(OneOrMany::One(s)) => Some(s),
        Some(OneOrMany::Many(items)) => items.into_iter().flatten().find(|s| !s.trim().is_empty()),
    };
    Ok(text
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null")))
}
