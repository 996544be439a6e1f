//! Impact check for generated achievements.
//!
//! The experience prompt asks for quantified results; this flags bullets that
//! came back without any. Findings are diagnostics only and never fail a run.

use serde::Serialize;
use tracing::warn;

use crate::models::document::TailoredDocument;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactGap {
    pub company: String,
    pub bullet: String,
    pub reason: String,
}

const VAGUE_VERBS: &[&str] = &[
    "improved",
    "enhanced",
    "helped",
    "worked on",
    "assisted",
    "supported",
    "participated",
    "involved",
];

/// A bullet is quantified if it carries a number, a percentage or a currency sign.
pub fn is_quantified(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        || text.contains('%')
        || text.contains('$')
        || text.contains('€')
        || text.contains('£')
}

/// Lists every generated achievement that lacks a quantified result.
pub fn find_impact_gaps(document: &TailoredDocument) -> Vec<ImpactGap> {
    document
        .work_experience
        .iter()
        .flat_map(|entry| {
            entry
                .achievements
                .iter()
                .filter(|bullet| !is_quantified(bullet))
                .map(|bullet| {
                    let lower = bullet.to_lowercase();
                    let reason = match VAGUE_VERBS.iter().find(|v| lower.contains(*v)) {
                        Some(verb) => format!("vague verb '{verb}' without a metric"),
                        None => "no quantified result".to_string(),
                    };
                    ImpactGap {
                        company: entry.company.clone(),
                        bullet: bullet.clone(),
                        reason,
                    }
                })
        })
        .collect()
}

/// Logs impact gaps as warnings and returns how many were found.
pub fn report_impact_gaps(document: &TailoredDocument) -> usize {
    let gaps = find_impact_gaps(document);
    for gap in &gaps {
        warn!(
            company = %gap.company,
            "Generated bullet has {}: {:?}",
            gap.reason,
            gap.bullet.chars().take(60).collect::<String>()
        );
    }
    gaps.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::WorkExperience;

    fn document(achievements: &[&str]) -> TailoredDocument {
        TailoredDocument {
            summary: "s".to_string(),
            skills: vec![],
            work_experience: vec![WorkExperience {
                title: "Analyst".to_string(),
                company: "Northwind".to_string(),
                dates: "2020".to_string(),
                achievements: achievements.iter().map(|s| s.to_string()).collect(),
            }],
            projects: vec![],
        }
    }

    #[test]
    fn test_digits_percent_and_currency_count_as_quantified() {
        assert!(is_quantified("Managed a team of 5"));
        assert!(is_quantified("Cut costs by a tenth, saving $"));
        assert!(is_quantified("Raised accuracy by ten %"));
        assert!(!is_quantified("Built dashboards for the team"));
    }

    #[test]
    fn test_vague_verb_is_named_in_reason() {
        let gaps = find_impact_gaps(&document(&["Helped the finance team with reports"]));
        assert_eq!(gaps.len(), 1);
        assert!(gaps[0].reason.contains("helped"));
        assert_eq!(gaps[0].company, "Northwind");
    }

    #[test]
    fn test_quantified_bullets_produce_no_gaps() {
        let doc = document(&["Reduced lead time by 12%", "Saved 10 hours a week"]);
        assert!(find_impact_gaps(&doc).is_empty());
        assert_eq!(report_impact_gaps(&doc), 0);
    }

    #[test]
    fn test_unquantified_without_vague_verb() {
        let gaps = find_impact_gaps(&document(&["Designed supplier scorecards"]));
        assert_eq!(gaps[0].reason, "no quantified result");
    }
}
