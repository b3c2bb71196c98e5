use crate::output::print_json;
use anyhow::Context;
use mnemo_core::{marketplace, paths};
use std::path::Path;

pub fn run(root: &Path, output: Option<&Path>, verbose: bool, json: bool) -> anyhow::Result<()> {
    let store = super::load(root, verbose)?;
    let corpus = store.snapshot();
    let market = marketplace::generate(&corpus, &store.config().marketplace);

    let target = match output {
        Some(p) => p.to_path_buf(),
        None => paths::marketplace_path(root),
    };
    let written = marketplace::write(&market, &target)
        .with_context(|| format!("failed to write {}", target.display()))?;

    if json {
        return print_json(&serde_json::json!({
            "output": target,
            "plugins": market.plugins.len(),
            "written": written,
        }));
    }
    let verb = if written { "Wrote" } else { "Unchanged:" };
    println!(
        "{verb} {} entries in {}",
        market.plugins.len(),
        target.display()
    );
    Ok(())
}
