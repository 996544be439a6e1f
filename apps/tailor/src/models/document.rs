//! Tailored document schema: what the generator produces and the assembler consumes.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::resume::Employer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub title: String,
    pub company: String,
    pub dates: String,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_name: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredDocument {
    pub summary: String,
    pub skills: Vec<SkillGroup>,
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// Envelope of the second generation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedProjects {
    pub projects: Vec<Project>,
}

impl TailoredDocument {
    /// Parses the first-pass generation output. The raw text is kept on failure.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let document: TailoredDocument = parse_generated(raw, "tailored résumé")?;

        if document.summary.trim().is_empty() {
            return Err(AppError::DocumentParse {
                context: "tailored résumé",
                message: "summary is empty".to_string(),
                raw: raw.to_string(),
            });
        }

        Ok(document)
    }

    /// Pins each generated experience entry to its base employer.
    ///
    /// The generator only rewrites achievements: company always comes from the
    /// base résumé, and title/dates do too when the base résumé has them.
    pub fn anchor_to_employers(&mut self, employers: &[Employer], raw: &str) -> Result<(), AppError> {
        if self.work_experience.len() != employers.len() {
            return Err(AppError::DocumentParse {
                context: "tailored résumé",
                message: format!(
                    "expected {} work_experience entries, got {}",
                    employers.len(),
                    self.work_experience.len()
                ),
                raw: raw.to_string(),
            });
        }

        for (entry, employer) in self.work_experience.iter_mut().zip(employers) {
            entry.company = employer.company.clone();
            if let Some(title) = &employer.title {
                entry.title = title.clone();
            }
            if let Some(dates) = &employer.dates {
                entry.dates = dates.clone();
            }
        }

        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, AppError> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize document: {e}")))
    }
}

impl GeneratedProjects {
    pub fn parse(raw: &str) -> Result<Vec<Project>, AppError> {
        let generated: GeneratedProjects = parse_generated(raw, "generated projects")?;
        Ok(generated.projects)
    }
}

/// Parses generator output as YAML after stripping any code fences around it.
pub fn parse_generated<T: DeserializeOwned>(raw: &str, context: &'static str) -> Result<T, AppError> {
    serde_yaml::from_str(strip_code_fences(raw)).map_err(|e| AppError::DocumentParse {
        context,
        message: e.to_string(),
        raw: raw.to_string(),
    })
}

/// Strips ```yaml ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (`yaml`, `yml`, ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(body.trim())
}
