use crate::config::{MarketplaceConfig, OwnerConfig};
use crate::document::{DocPath, SkillDocument};
use crate::error::Result;
use crate::paths::PLUGINS_DIR;
use crate::store::Corpus;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const DEFAULT_ENTRY_VERSION: &str = "1.0.0";
const UNKNOWN_CATEGORY: &str = "unknown";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Marketplace {
    pub name: String,
    #[serde(skip_serializing_if = "is_empty_owner")]
    pub owner: OwnerConfig,
    pub description: String,
    pub version: String,
    pub plugins: Vec<MarketplaceEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MarketplaceEntry {
    pub name: String,
    pub description: String,
    pub version: String,
    /// Plugin directory (or the note's own directory) relative to the
    /// catalog root, `./`-prefixed.
    pub source: String,
    pub category: String,
    pub tags: Vec<String>,
}

fn is_empty_owner(owner: &OwnerConfig) -> bool {
    owner.name.is_none() && owner.url.is_none()
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// One entry per plugin directory (`plugins/<category>/<plugin>/...`) and
/// one per note outside any plugin, sorted by category then name.
pub fn generate(corpus: &Corpus, config: &MarketplaceConfig) -> Marketplace {
    let mut grouped: BTreeMap<String, Vec<&SkillDocument>> = BTreeMap::new();
    let mut plugins = Vec::new();
    for doc in corpus.documents() {
        match plugin_dir(&doc.path) {
            Some(dir) => grouped.entry(dir).or_default().push(doc.as_ref()),
            None => plugins.push(note_entry(doc)),
        }
    }
    plugins.extend(
        grouped
            .into_iter()
            .filter_map(|(dir, docs)| plugin_entry(dir, &docs)),
    );
    plugins.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));

    Marketplace {
        name: config.name.clone(),
        owner: config.owner.clone(),
        description: config.description.clone(),
        version: config.version.clone(),
        plugins,
    }
}

/// `plugins/<category>/<plugin>` when the note lives inside a plugin
/// directory rather than directly under its category.
fn plugin_dir(path: &DocPath) -> Option<String> {
    match path.segments() {
        [root, category, plugin, _, ..] if root == PLUGINS_DIR => {
            Some(format!("{root}/{category}/{plugin}"))
        }
        _ => None,
    }
}

fn plugin_entry(dir: String, docs: &[&SkillDocument]) -> Option<MarketplaceEntry> {
    let first = *docs.first()?;
    let name = dir.rsplit('/').next().unwrap_or_default().to_string();
    // The plugin's own same-named skill speaks for it.
    let lead = docs
        .iter()
        .copied()
        .find(|d| d.skill_name() == name)
        .unwrap_or(first);
    let description = lead
        .description()
        .or_else(|| docs.iter().find_map(|d| d.description()))
        .unwrap_or_default();
    let tags: BTreeSet<&String> = docs.iter().flat_map(|d| d.tags.iter()).collect();

    Some(MarketplaceEntry {
        name,
        description: description.to_string(),
        version: DEFAULT_ENTRY_VERSION.to_string(),
        source: format!("./{dir}"),
        category: category_or_unknown(lead),
        tags: tags.into_iter().cloned().collect(),
    })
}

fn note_entry(doc: &SkillDocument) -> MarketplaceEntry {
    MarketplaceEntry {
        name: doc.skill_name().to_string(),
        description: doc.description().unwrap_or_default().to_string(),
        version: DEFAULT_ENTRY_VERSION.to_string(),
        source: format!("./{}", doc.path.parent()),
        category: category_or_unknown(doc),
        tags: doc.tags.iter().cloned().collect(),
    }
}

fn category_or_unknown(doc: &SkillDocument) -> String {
    if doc.category.is_empty() {
        UNKNOWN_CATEGORY.to_string()
    } else {
        doc.category.clone()
    }
}

/// Write pretty JSON to `path`, atomically. `false` when the file on disk
/// already matched.
pub fn write(marketplace: &Marketplace, path: &Path) -> Result<bool> {
    crate::io::write_json_pretty(path, marketplace)
}
