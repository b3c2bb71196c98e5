//! Metadata extraction: raw markdown to [`SkillDocument`].
//!
//! Extraction never fails. Anything that cannot be determined is left empty
//! and reported as a [`ParseWarning`]; the note itself is always kept.

use crate::document::{DocPath, Header, ParseWarning, SkillDocument, WarningKind};
use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Heading text (case-insensitive prefix match) that introduces link lists.
const RELATED_SECTION: &str = "related skills";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: SkillDocument,
    pub warnings: Vec<ParseWarning>,
}

/// Result of looking for a leading `---` block.
#[derive(Debug, PartialEq, Eq)]
enum HeaderBlock<'a> {
    Absent,
    /// Opened with `---` but never closed; the whole text is treated as body.
    Unterminated,
    Present { yaml: &'a str, body: &'a str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Heading {
    pub(crate) level: usize,
    pub(crate) text: String,
    pub(crate) line: usize,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Extract a document, logging any warnings.
pub fn extract(raw: &str, path: DocPath) -> SkillDocument {
    let Extraction { document, warnings } = extract_with_warnings(raw, path);
    for w in &warnings {
        tracing::warn!(path = %w.path, kind = %w.kind, "{}", w.message);
    }
    document
}

/// Extract a document and return the warnings to the caller instead of
/// logging them.
pub fn extract_with_warnings(raw: &str, path: DocPath) -> Extraction {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut warnings = Vec::new();

    let (header, body) = match split_header(raw) {
        HeaderBlock::Absent => (None, raw),
        HeaderBlock::Unterminated => {
            warnings.push(ParseWarning {
                path: path.clone(),
                kind: WarningKind::UnterminatedHeader,
                message: "header block opened with '---' but never closed".to_string(),
            });
            (None, raw)
        }
        HeaderBlock::Present { yaml, body } => match parse_header(yaml) {
            Ok(h) => (Some(h), body),
            Err(e) => {
                warnings.push(ParseWarning {
                    path: path.clone(),
                    kind: WarningKind::MalformedHeader,
                    message: format!("header block is not valid YAML: {e}"),
                });
                (Some(Header::default()), body)
            }
        },
    };

    let headings = scan_headings(body);

    let title = header
        .as_ref()
        .and_then(|h| h.name.clone())
        .or_else(|| headings.first().map(|h| h.text.clone()))
        .unwrap_or_default();
    if title.is_empty() {
        warnings.push(ParseWarning {
            path: path.clone(),
            kind: WarningKind::MissingTitle,
            message: "no header name and no heading line".to_string(),
        });
    }

    let category = header
        .as_ref()
        .and_then(|h| h.category.clone())
        .or_else(|| path.category_segment().map(str::to_string))
        .unwrap_or_default();

    let links = related_skills(body, &headings);

    let mut tags: BTreeSet<String> = links.iter().cloned().collect();
    if let Some(h) = &header {
        tags.extend(h.tags.iter().cloned());
    }

    let source_project = header.as_ref().and_then(|h| h.source.clone());

    Extraction {
        document: SkillDocument {
            path,
            title,
            category,
            tags,
            source_project,
            header,
            headings: headings.into_iter().map(|h| h.text).collect(),
            links,
            body: body.to_string(),
        },
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Header block
// ---------------------------------------------------------------------------

fn split_header(raw: &str) -> HeaderBlock<'_> {
    let Some(rest) = raw.strip_prefix("---") else {
        return HeaderBlock::Absent;
    };
    let rest = if let Some(r) = rest.strip_prefix('\n') {
        r
    } else if let Some(r) = rest.strip_prefix("\r\n") {
        r
    } else {
        // `----` or `--- text` is a rule or prose, not a header
        return HeaderBlock::Absent;
    };

    // The first line that is exactly `---` closes the block; it may be the
    // very first one (`---\n---\n`).
    let mut start = 0;
    loop {
        if let Some(body) = closing_fence(&rest[start..]) {
            let block = &rest[..start];
            return HeaderBlock::Present {
                yaml: block.strip_suffix('\n').unwrap_or(block),
                body,
            };
        }
        match rest[start..].find('\n') {
            Some(i) => start += i + 1,
            None => return HeaderBlock::Unterminated,
        }
    }
}

/// If `s` starts with a `---` line, return the text after it.
fn closing_fence(s: &str) -> Option<&str> {
    let rest = s.strip_prefix("---")?;
    if rest.is_empty() {
        return Some(rest);
    }
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .or_else(|| rest.is_empty().then_some(rest))
}

/// Parse the header YAML into the recognized-key record. Values of the
/// wrong shape are dropped rather than failing the whole block.
fn parse_header(yaml: &str) -> Result<Header, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(Header::default());
    }
    let value: Value = serde_yaml::from_str(yaml)?;
    let Value::Mapping(map) = value else {
        return Ok(Header::default());
    };

    let field = |key: &str| map.get(key).and_then(scalar_string);

    let tags = match map.get("tags") {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(Header {
        name: field("name"),
        description: field("description"),
        category: field("category"),
        source: field("source"),
        date: field("date"),
        tags,
    })
}

fn scalar_string(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

// ---------------------------------------------------------------------------
// Headings and sections
// ---------------------------------------------------------------------------

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").unwrap())
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.+)$").unwrap())
}

pub(crate) fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// ATX headings outside fenced code blocks. Shell comments inside code
/// samples look like headings and must not count.
pub(crate) fn scan_headings(body: &str) -> Vec<Heading> {
    let re = heading_re();
    let mut in_fence = false;
    let mut out = Vec::new();
    for (i, line) in body.lines().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = re.captures(line) {
            let text = caps[2].trim();
            if text.is_empty() {
                continue;
            }
            out.push(Heading {
                level: caps[1].len(),
                text: text.to_string(),
                line: i,
            });
        }
    }
    out
}

/// Skill names listed under every "Related Skills" heading, first
/// occurrence wins.
fn related_skills(body: &str, headings: &[Heading]) -> Vec<String> {
    let lines: Vec<&str> = body.lines().collect();
    let mut names: Vec<String> = Vec::new();

    for (i, h) in headings.iter().enumerate() {
        if !h.text.to_lowercase().starts_with(RELATED_SECTION) {
            continue;
        }
        let end = headings[i + 1..]
            .iter()
            .find(|next| next.level <= h.level)
            .map_or(lines.len(), |next| next.line);

        let mut in_fence = false;
        for line in &lines[h.line + 1..end] {
            if is_fence(line) {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            let Some(caps) = list_item_re().captures(line) else {
                continue;
            };
            if let Some(name) = skill_name_from_item(&caps[1]) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}

/// Pull the skill name out of a list item such as
/// `` `docker-tty` - fixes TTY allocation`` or `[[pytest-config]]`.
fn skill_name_from_item(item: &str) -> Option<String> {
    let item = item.trim();
    let delimited = |open: &str, close: &str| {
        item.strip_prefix(open)
            .and_then(|rest| rest.find(close).map(|end| rest[..end].to_string()))
    };

    let name = delimited("`", "`")
        .or_else(|| delimited("[[", "]]"))
        .or_else(|| delimited("[", "]"))
        .or_else(|| delimited("**", "**"))
        .unwrap_or_else(|| {
            let cut = [" - ", " – ", " — ", ": ", " ("]
                .iter()
                .filter_map(|sep| item.find(sep))
                .min()
                .unwrap_or(item.len());
            item[..cut].to_string()
        });

    let name = name.trim().trim_matches('`').trim();
    (!name.is_empty()).then(|| name.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
