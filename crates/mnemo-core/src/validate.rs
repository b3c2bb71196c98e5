//! Structural lint for skill notes.
//!
//! Errors mark notes that do not meet the catalog's publishing rules;
//! warnings are advisory. Dangling related-skill links are only ever a
//! warning.

use crate::config::ValidationConfig;
use crate::document::{DocPath, SkillDocument};
use crate::extract::{is_fence, scan_headings};
use crate::store::Corpus;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const FAILED_ATTEMPTS: &str = "Failed Attempts";

/// Sections every note should have, besides "Failed Attempts".
const RECOMMENDED_SECTIONS: &[&str] = &["Overview", "When to Use", "Verified Workflow", "Results"];

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub path: DocPath,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl ValidationSummary {
    pub fn of(reports: &[ValidationReport]) -> Self {
        let passed = reports.iter().filter(|r| r.is_valid()).count();
        Self {
            total: reports.len(),
            passed,
            failed: reports.len() - passed,
        }
    }
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9-]+$").unwrap())
}

/// Reports for every note, in path order.
pub fn validate_corpus(corpus: &Corpus, config: &ValidationConfig) -> Vec<ValidationReport> {
    corpus
        .documents()
        .map(|doc| validate_document(doc, corpus, config))
        .collect()
}

pub fn validate_document(
    doc: &SkillDocument,
    corpus: &Corpus,
    config: &ValidationConfig,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match &doc.header {
        None => errors.push("missing header block (note must start with ---)".to_string()),
        Some(header) => {
            if let Some(name) = &header.name {
                if !name_re().is_match(name) {
                    errors.push(format!(
                        "invalid name format '{name}' (use lowercase, numbers, hyphens)"
                    ));
                }
            }
            if let Some(date) = &header.date {
                if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                    errors.push(format!("invalid date '{date}' (use YYYY-MM-DD)"));
                }
            }
        }
    }

    match doc.description() {
        None => errors.push("missing description".to_string()),
        Some(desc) => {
            let len = desc.chars().count();
            if len < config.min_description_len {
                errors.push(format!(
                    "description too short ({len} chars, min {})",
                    config.min_description_len
                ));
            }
        }
    }

    if doc.category.is_empty() {
        errors.push(
            "no category (set one in the header or place the note under plugins/<category>/)"
                .to_string(),
        );
    } else if !config.is_known_category(&doc.category) {
        errors.push(format!(
            "invalid category '{}'; valid: {}",
            doc.category,
            sorted(&config.categories).join(", ")
        ));
    }

    if doc.has_heading(FAILED_ATTEMPTS) {
        if !section_has_table(&doc.body, FAILED_ATTEMPTS) {
            warnings.push("Failed Attempts section should contain a table".to_string());
        }
    } else {
        errors.push("missing Failed Attempts section".to_string());
    }

    for section in RECOMMENDED_SECTIONS {
        if !doc.has_heading(section) {
            warnings.push(format!("missing {section} section"));
        }
    }

    if doc.tags.is_empty() {
        warnings.push("no tags (reduces searchability)".to_string());
    }

    for link in &doc.links {
        if corpus.resolve_link(link).is_none() {
            warnings.push(format!("related skill '{link}' is not in the catalog"));
        }
    }

    ValidationReport {
        path: doc.path.clone(),
        errors,
        warnings,
    }
}

fn sorted(items: &[String]) -> Vec<&str> {
    let mut v: Vec<&str> = items.iter().map(String::as_str).collect();
    v.sort_unstable();
    v
}

/// Whether the `## <section>` block contains a markdown table row. The
/// section runs to the next real heading; fenced code does not count.
fn section_has_table(body: &str, section: &str) -> bool {
    let needle = section.to_lowercase();
    let headings = scan_headings(body);
    let Some(pos) = headings
        .iter()
        .position(|h| h.text.to_lowercase().starts_with(&needle))
    else {
        return false;
    };
    let start = headings[pos].line + 1;
    let end = headings.get(pos + 1).map_or(usize::MAX, |h| h.line);

    let mut in_fence = false;
    for line in body.lines().take(end).skip(start) {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence && line.trim_start().starts_with('|') {
            return true;
        }
    }
    false
}
