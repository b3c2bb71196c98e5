//! Ranked search over a [`Corpus`].
//!
//! Each whitespace-separated query term matches a note when the index
//! lookup finds it (tag, category, source, or word) or when the note's
//! lowercased body contains it. Notes are ranked by the number of distinct
//! terms they match, ties broken by ascending path. "No results" is an empty
//! vector, never an error.

use crate::document::{DocPath, SkillDocument};
use crate::store::Corpus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_project: Option<String>,
}

impl SearchFilters {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn source_project(mut self, source: impl Into<String>) -> Self {
        self.source_project = Some(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.tag.is_none() && self.source_project.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub document: &'a SkillDocument,
    /// Distinct query terms the note matched; zero for filter-only queries.
    pub matched_terms: usize,
}

/// Best match first.
pub fn search<'a>(corpus: &'a Corpus, query: &str, filters: &SearchFilters) -> Vec<&'a SkillDocument> {
    search_ranked(corpus, query, filters)
        .into_iter()
        .map(|hit| hit.document)
        .collect()
}

pub fn search_ranked<'a>(
    corpus: &'a Corpus,
    query: &str,
    filters: &SearchFilters,
) -> Vec<SearchHit<'a>> {
    let Some(allowed) = filtered(corpus, filters) else {
        return Vec::new();
    };
    let admits = |path: &DocPath| allowed.as_ref().is_none_or(|set| set.contains(path));

    let terms = terms(query);
    if terms.is_empty() {
        // Filter-only: everything admitted, in path order.
        return corpus
            .documents()
            .filter(|d| admits(&d.path))
            .map(|d| SearchHit {
                document: d.as_ref(),
                matched_terms: 0,
            })
            .collect();
    }

    let index = corpus.index();
    let mut counts: BTreeMap<DocPath, usize> = BTreeMap::new();
    for term in &terms {
        let mut matched = index.lookup(term);
        matched.extend(index.body_contains(term));
        for path in matched {
            if admits(&path) {
                *counts.entry(path).or_default() += 1;
            }
        }
    }

    let mut hits: Vec<SearchHit<'a>> = counts
        .into_iter()
        .filter_map(|(path, n)| {
            corpus.get(&path).map(|d| SearchHit {
                document: d.as_ref(),
                matched_terms: n,
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        b.matched_terms
            .cmp(&a.matched_terms)
            .then_with(|| a.document.path.cmp(&b.document.path))
    });
    hits
}

/// Lowercased, de-duplicated query terms in first-seen order.
fn terms(query: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// `None` when a filter rules out everything, `Some(None)` when no filter
/// is set, `Some(Some(set))` for the admitted paths.
fn filtered(corpus: &Corpus, filters: &SearchFilters) -> Option<Option<BTreeSet<DocPath>>> {
    let index = corpus.index();
    let mut allowed: Option<BTreeSet<DocPath>> = None;

    let constraints = [
        filters.category.as_deref().map(|c| index.in_category(c)),
        filters.tag.as_deref().map(|t| index.with_tag(t)),
        filters
            .source_project
            .as_deref()
            .map(|s| index.from_source(s)),
    ];
    for set in constraints.into_iter().flatten() {
        let next = match allowed {
            None => set,
            Some(prev) => prev.intersection(&set).cloned().collect(),
        };
        if next.is_empty() {
            return None;
        }
        allowed = Some(next);
    }
    Some(allowed)
}
