//! Application archive: files each finished résumé next to the job description
//! it was tailored for.
//!
//! Layout: `{archive_dir}/{YYYY-MM-DD}_{company}/{position}_Resume.pdf` plus
//! `job_description.txt` in the same folder.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::generation::posting::ResolvedPosting;

pub const JOB_DESCRIPTION_FILE: &str = "job_description.txt";

/// Makes a name safe to use as a single path component.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn application_dir(archive_dir: &Path, date: NaiveDate, company: &str) -> PathBuf {
    archive_dir.join(format!("{}_{}", date.format("%Y-%m-%d"), sanitize_component(company)))
}

/// Copies the rendered PDF and saves the job description into the archive.
/// Returns the archived PDF path.
pub async fn archive_application(
    archive_dir: &Path,
    posting: &ResolvedPosting,
    pdf: &Path,
    job_description: &str,
    date: NaiveDate,
) -> Result<PathBuf> {
    let dir = application_dir(archive_dir, date, &posting.company);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create archive folder {}", dir.display()))?;

    let pdf_target = dir.join(format!("{}_Resume.pdf", sanitize_component(&posting.position)));
    tokio::fs::copy(pdf, &pdf_target)
        .await
        .with_context(|| format!("Failed to copy {} into the archive", pdf.display()))?;

    tokio::fs::write(dir.join(JOB_DESCRIPTION_FILE), job_description)
        .await
        .context("Failed to save job description")?;

    info!("Application archived in {}", dir.display());
    Ok(pdf_target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_component("Data Engineer / Analyst"), "Data Engineer _ Analyst");
        assert_eq!(sanitize_component(r"a\b:c"), "a_b_c");
        assert_eq!(sanitize_component("  "), "unknown");
        assert_eq!(sanitize_component(".."), "unknown");
    }

    #[test]
    fn test_application_dir_is_dated() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let dir = application_dir(Path::new("apps"), date, "Acme/EU");
        assert_eq!(dir, PathBuf::from("apps").join("2026-10-16_Acme_EU"));
    }

    #[tokio::test]
    async fn test_archive_copies_pdf_and_saves_description() {
        let root = tempfile::tempdir().unwrap();
        let pdf = root.path().join("output.pdf");
        tokio::fs::write(&pdf, b"%PDF-1.5 fake").await.unwrap();

        let posting = ResolvedPosting {
            company: "Acme".to_string(),
            position: "BI/Data Analyst".to_string(),
        };
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();

        let archived = archive_application(root.path(), &posting, &pdf, "We need SQL.", date)
            .await
            .unwrap();

        assert_eq!(
            archived,
            root.path().join("2026-01-02_Acme").join("BI_Data Analyst_Resume.pdf")
        );
        assert_eq!(std::fs::read(&archived).unwrap(), b"%PDF-1.5 fake");
        let saved = std::fs::read_to_string(
            root.path().join("2026-01-02_Acme").join(JOB_DESCRIPTION_FILE),
        )
        .unwrap();
        assert_eq!(saved, "We need SQL.");
    }

    #[tokio::test]
    async fn test_archive_missing_pdf_is_error() {
        let root = tempfile::tempdir().unwrap();
        let posting = ResolvedPosting {
            company: "Acme".to_string(),
            position: "Analyst".to_string(),
        };
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let result =
            archive_application(root.path(), &posting, &root.path().join("nope.pdf"), "jd", date)
                .await;
        assert!(result.is_err());
    }
}
