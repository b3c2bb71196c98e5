//! Skill-note records.
//!
//! A [`SkillDocument`] is built once per load pass by the extractor and never
//! mutated afterwards. Everything derived from the file (title, category,
//! tags, links) is fixed at construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path};

// ---------------------------------------------------------------------------
// DocPath
// ---------------------------------------------------------------------------

/// Root-relative identifier of a note: its path segments with the file
/// extension removed from the last one (`plugins/debugging/x.md` becomes
/// `plugins/debugging/x`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DocPath(Vec<String>);

/// File stems that name a container rather than the skill itself.
const GENERIC_STEMS: &[&str] = &["skill", "readme", "index"];

impl DocPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        )
    }

    /// Build from a path relative to the notes root. Only normal components
    /// are kept.
    pub fn from_relative(rel: &Path) -> Self {
        let mut segments: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if let Some(last) = segments.last_mut() {
            if let Some(stem) = Path::new(last.as_str()).file_stem() {
                *last = stem.to_string_lossy().into_owned();
            }
        }
        Self::new(segments)
    }

    /// Parse a `/`-separated identifier as printed by `Display`.
    pub fn parse(s: &str) -> Self {
        Self::new(s.split('/').map(str::trim))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Second segment: the category slot in `plugins/<category>/...`.
    pub fn category_segment(&self) -> Option<&str> {
        // the second segment is only a directory when something follows it
        if self.0.len() < 3 {
            return None;
        }
        self.0.get(1).map(String::as_str)
    }

    /// Name of the skill this note describes: the last segment, or the
    /// enclosing directory when the file is a generic `SKILL.md`/`README.md`.
    pub fn skill_name(&self) -> &str {
        let n = self.0.len();
        match self.0.last() {
            Some(last) if n > 1 && GENERIC_STEMS.contains(&last.to_ascii_lowercase().as_str()) => {
                &self.0[n - 2]
            }
            Some(last) => last,
            None => "",
        }
    }

    /// Everything but the last segment, `/`-joined.
    pub fn parent(&self) -> String {
        match self.0.split_last() {
            Some((_, head)) => head.join("/"),
            None => String::new(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl From<String> for DocPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for DocPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<DocPath> for String {
    fn from(p: DocPath) -> Self {
        p.to_string()
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Recognized keys of a note's leading `---` block. Every field is optional;
/// unrecognized keys are dropped during extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// SkillDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDocument {
    pub path: DocPath,
    /// Empty when neither the header nor a heading provides one.
    pub title: String,
    /// Empty when neither the header nor the directory position provides one.
    pub category: String,
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_project: Option<String>,
    /// `None` when the file has no leading header block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    /// Heading texts in document order, markers stripped.
    #[serde(default)]
    pub headings: Vec<String>,
    /// Skill names from "Related Skills" sections, in order. May name
    /// skills that are not in the store.
    #[serde(default)]
    pub links: Vec<String>,
    pub body: String,
}

impl SkillDocument {
    pub fn description(&self) -> Option<&str> {
        self.header.as_ref()?.description.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.header.as_ref()?.date.as_deref()
    }

    /// Header `name` if set, otherwise the name implied by the path.
    pub fn skill_name(&self) -> &str {
        self.header
            .as_ref()
            .and_then(|h| h.name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.path.skill_name())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn has_heading(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.headings
            .iter()
            .any(|h| h.to_lowercase().starts_with(&needle))
    }
}

// ---------------------------------------------------------------------------
// ParseWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnterminatedHeader,
    MalformedHeader,
    MissingTitle,
    Unreadable,
    TimedOut,
    DuplicatePath,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::UnterminatedHeader => "unterminated_header",
            WarningKind::MalformedHeader => "malformed_header",
            WarningKind::MissingTitle => "missing_title",
            WarningKind::Unreadable => "unreadable",
            WarningKind::TimedOut => "timed_out",
            WarningKind::DuplicatePath => "duplicate_path",
        }
    }

    /// Whether the note was dropped from the load pass.
    pub fn skips_document(self) -> bool {
        matches!(
            self,
            WarningKind::Unreadable | WarningKind::TimedOut | WarningKind::DuplicatePath
        )
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable per-note problem. Never aborts a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub path: DocPath,
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.kind)
    }
}
