use crate::output::{print_fields, print_json};
use mnemo_core::{DocPath, MnemoError, SkillDocument};
use std::path::Path;
use std::sync::Arc;

pub fn run(root: &Path, path: &str, verbose: bool, json: bool) -> anyhow::Result<()> {
    let store = super::load(root, verbose)?;
    let corpus = store.snapshot();

    let doc = find(&store, path).ok_or_else(|| MnemoError::DocumentNotFound(path.to_string()))?;
    let links: Vec<(&str, Option<&DocPath>)> = doc
        .links
        .iter()
        .map(|name| (name.as_str(), corpus.resolve_link(name).map(|d| &d.path)))
        .collect();

    if json {
        let related: Vec<_> = links
            .iter()
            .map(|(name, target)| serde_json::json!({ "name": name, "path": target }))
            .collect();
        return print_json(&serde_json::json!({
            "path": doc.path,
            "name": doc.skill_name(),
            "title": doc.title,
            "category": doc.category,
            "description": doc.description(),
            "date": doc.date(),
            "source_project": doc.source_project,
            "tags": doc.tags,
            "headings": doc.headings,
            "related": related,
        }));
    }

    let tags: Vec<&str> = doc.tags.iter().map(String::as_str).collect();
    print_fields(&[
        ("Path", Some(doc.path.to_string())),
        ("Name", Some(doc.skill_name().to_string())),
        ("Title", Some(doc.title.clone())),
        ("Category", Some(doc.category.clone())),
        ("Description", Some(doc.description().unwrap_or_default().to_string())),
        ("Source", Some(doc.source_project.clone().unwrap_or_default())),
        ("Date", doc.date().map(str::to_string)),
        ("Tags", (!tags.is_empty()).then(|| tags.join(", "))),
    ])?;
    if !links.is_empty() {
        println!("\nRelated skills:");
        for (name, target) in &links {
            match target {
                Some(p) => println!("  {name} -> {p}"),
                None => println!("  {name} (not in catalog)"),
            }
        }
    }
    Ok(())
}

/// Accept the printed identifier or a relative file path with extension.
fn find(store: &mnemo_core::DocumentStore, raw: &str) -> Option<Arc<SkillDocument>> {
    let as_id = DocPath::parse(raw.trim_start_matches("./"));
    if let Some(doc) = store.get(&as_id) {
        return Some(doc);
    }
    let file = Path::new(raw);
    if store.config().is_note_file(file) {
        return store.get(&DocPath::from_relative(file));
    }
    None
}
