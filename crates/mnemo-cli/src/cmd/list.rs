use crate::output::{print_json, Table};
use std::path::Path;

pub fn run(root: &Path, category: Option<&str>, verbose: bool, json: bool) -> anyhow::Result<()> {
    let store = super::load(root, verbose)?;
    let all = store.all();
    let docs: Vec<_> = all
        .iter()
        .filter(|d| category.is_none_or(|c| d.category.eq_ignore_ascii_case(c)))
        .collect();

    if json {
        let out: Vec<_> = docs
            .iter()
            .map(|d| {
                serde_json::json!({
                    "path": d.path,
                    "name": d.skill_name(),
                    "title": d.title,
                    "category": d.category,
                    "tags": d.tags,
                })
            })
            .collect();
        return print_json(&out);
    }

    if docs.is_empty() {
        println!("No notes.");
        return Ok(());
    }

    let mut table = Table::new(&["PATH", "TITLE", "CATEGORY", "TAGS"]);
    for d in &docs {
        table.row([
            d.path.to_string(),
            d.title.clone(),
            d.category.clone(),
            d.tags.len().to_string(),
        ]);
    }
    table.print()
}
