//! Base résumé schema: the source document every tailoring run starts from.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::document::Project;

/// Contact header printed at the top of the rendered résumé.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

/// One employer and the full pool of achievement bullets written for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employer {
    pub company: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub dates: Option<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default)]
    pub dates: Option<String>,
}

/// A project in the base résumé: either a one-line description or a full entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectEntry {
    Detailed(Project),
    Plain(String),
}

impl ProjectEntry {
    pub fn into_project(self) -> Project {
        match self {
            ProjectEntry::Detailed(project) => project,
            ProjectEntry::Plain(description) => Project {
                project_name: String::new(),
                description,
                keywords: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResume {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(alias = "Professional Experience")]
    pub professional_experience: Vec<Employer>,
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub education: Vec<Education>,
}

impl BaseResume {
    /// Parses and validates a base résumé from YAML.
    ///
    /// Both syntax errors and missing sections surface as `InvalidInput`, before
    /// any external call is made.
    pub fn from_yaml(text: &str) -> Result<Self, AppError> {
        let resume: BaseResume = serde_yaml::from_str(text).map_err(|e| {
            AppError::InvalidInput(format!("base résumé is not valid YAML for the schema: {e}"))
        })?;
        resume.validate()?;
        Ok(resume)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.professional_experience.is_empty() {
            return Err(AppError::InvalidInput(
                "base résumé has no professional_experience entries".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for employer in &self.professional_experience {
            let company = employer.company.trim();
            if company.is_empty() {
                return Err(AppError::InvalidInput(
                    "professional_experience entry has a blank company name".to_string(),
                ));
            }
            if !seen.insert(company.to_lowercase()) {
                return Err(AppError::InvalidInput(format!(
                    "company '{company}' appears more than once in professional_experience"
                )));
            }
        }

        Ok(())
    }

    /// Project pool in document order, with plain entries lifted into `Project`.
    pub fn project_pool(&self) -> Vec<Project> {
        self.projects
            .iter()
            .cloned()
            .map(ProjectEntry::into_project)
            .collect()
    }
}
