use crate::output::{print_json, Table};
use mnemo_core::SearchFilters;
use std::path::Path;

pub struct SearchArgs {
    pub query: String,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub source: Option<String>,
    pub limit: Option<usize>,
}

impl SearchArgs {
    fn filters(&self) -> SearchFilters {
        SearchFilters {
            category: self.category.clone(),
            tag: self.tag.clone(),
            source_project: self.source.clone(),
        }
    }
}

pub fn run(root: &Path, args: SearchArgs, verbose: bool, json: bool) -> anyhow::Result<()> {
    let store = super::load(root, verbose)?;
    let corpus = store.snapshot();

    let mut hits = corpus.search_ranked(&args.query, &args.filters());
    if let Some(limit) = args.limit {
        hits.truncate(limit);
    }

    if json {
        let out: Vec<_> = hits
            .iter()
            .map(|h| {
                let d = h.document;
                serde_json::json!({
                    "path": d.path,
                    "title": d.title,
                    "category": d.category,
                    "tags": d.tags,
                    "source_project": d.source_project,
                    "matched_terms": h.matched_terms,
                })
            })
            .collect();
        return print_json(&out);
    }

    if hits.is_empty() {
        println!("No matching notes.");
        return Ok(());
    }

    let mut table = Table::new(&["PATH", "TITLE", "CATEGORY"]);
    for h in &hits {
        let d = h.document;
        table.row([d.path.to_string(), d.title.clone(), d.category.clone()]);
    }
    table.print()
}
