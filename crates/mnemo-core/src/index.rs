//! In-memory inverted index over a set of notes.
//!
//! Built in one pass from immutable documents and never patched: a reload
//! builds a fresh [`Index`] next to the new document set.

use crate::document::{DocPath, SkillDocument};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum length of a word token. Shorter tokens are still reachable
/// through body substring matching.
const MIN_WORD_LEN: usize = 2;

type Postings = BTreeMap<String, BTreeSet<DocPath>>;

/// One token and the notes that carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry<'a> {
    pub token: &'a str,
    pub paths: &'a BTreeSet<DocPath>,
}

#[derive(Debug, Clone, Default)]
pub struct Index {
    tags: Postings,
    categories: Postings,
    sources: Postings,
    words: Postings,
    /// Lowercased body per note, for substring matching.
    bodies: BTreeMap<DocPath, String>,
}

impl Index {
    pub fn build<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a SkillDocument>,
    {
        let mut index = Index::default();
        for doc in documents {
            for tag in &doc.tags {
                post(&mut index.tags, tag, &doc.path);
            }
            post(&mut index.categories, &doc.category, &doc.path);
            if let Some(source) = &doc.source_project {
                post(&mut index.sources, source, &doc.path);
            }
            for word in tokenize(&doc.title).chain(tokenize(&doc.body)) {
                post(&mut index.words, &word, &doc.path);
            }
            index
                .bodies
                .insert(doc.path.clone(), doc.body.to_lowercase());
        }
        index
    }

    /// Notes whose tag, category, source project or a word token equals
    /// `term`, ignoring case. Empty when nothing matches.
    pub fn lookup(&self, term: &str) -> BTreeSet<DocPath> {
        let key = normalize(term);
        if key.is_empty() {
            return BTreeSet::new();
        }
        [&self.tags, &self.categories, &self.sources, &self.words]
            .into_iter()
            .filter_map(|postings| postings.get(&key))
            .flatten()
            .cloned()
            .collect()
    }

    /// Notes whose lowercased body contains `term`.
    pub fn body_contains(&self, term: &str) -> BTreeSet<DocPath> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return BTreeSet::new();
        }
        self.bodies
            .iter()
            .filter(|(_, body)| body.contains(&needle))
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn with_tag(&self, tag: &str) -> BTreeSet<DocPath> {
        exact(&self.tags, tag)
    }

    pub fn in_category(&self, category: &str) -> BTreeSet<DocPath> {
        exact(&self.categories, category)
    }

    pub fn from_source(&self, source: &str) -> BTreeSet<DocPath> {
        exact(&self.sources, source)
    }

    /// Tag entries in token order.
    pub fn tags(&self) -> impl Iterator<Item = IndexEntry<'_>> {
        entries(&self.tags)
    }

    /// Category entries in token order.
    pub fn categories(&self) -> impl Iterator<Item = IndexEntry<'_>> {
        entries(&self.categories)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

fn post(postings: &mut Postings, token: &str, path: &DocPath) {
    let key = normalize(token);
    if key.is_empty() {
        return;
    }
    postings.entry(key).or_default().insert(path.clone());
}

fn exact(postings: &Postings, token: &str) -> BTreeSet<DocPath> {
    postings.get(&normalize(token)).cloned().unwrap_or_default()
}

fn entries(postings: &Postings) -> impl Iterator<Item = IndexEntry<'_>> {
    postings.iter().map(|(token, paths)| IndexEntry {
        token: token.as_str(),
        paths,
    })
}

/// Lowercased word tokens. Hyphens and underscores stay inside a token so
/// skill names such as `race-condition` index as one word.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .map(|w| w.trim_matches(|c| c == '-' || c == '_'))
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .map(str::to_lowercase)
}
