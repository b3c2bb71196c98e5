use crate::output::{print_json, Table};
use std::path::Path;

pub fn run(root: &Path, verbose: bool, json: bool) -> anyhow::Result<()> {
    let store = super::load(root, verbose)?;
    let corpus = store.snapshot();
    let entries: Vec<(&str, usize)> = corpus
        .index()
        .tags()
        .map(|e| (e.token, e.paths.len()))
        .collect();

    if json {
        let out: Vec<_> = entries
            .iter()
            .map(|(tag, count)| serde_json::json!({ "tag": tag, "notes": count }))
            .collect();
        return print_json(&out);
    }

    if entries.is_empty() {
        println!("No tags.");
        return Ok(());
    }

    let mut table = Table::new(&["TAG", "NOTES"]);
    for (tag, count) in &entries {
        table.row([tag.to_string(), count.to_string()]);
    }
    table.print()
}
