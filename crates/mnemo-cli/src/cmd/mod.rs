pub mod list;
pub mod marketplace;
pub mod search;
pub mod show;
pub mod tags;
pub mod validate;

use anyhow::Context;
use mnemo_core::{config::WarnLevel, global, DocumentStore};
use std::path::Path;
use std::sync::Arc;

/// Load the notes under `root` into the process-wide store and report the
/// warning count on stderr.
pub fn load(root: &Path, verbose: bool) -> anyhow::Result<Arc<DocumentStore>> {
    let store = global::init(root)
        .with_context(|| format!("failed to load notes from {}", root.display()))?;

    for w in store.config().validate() {
        let level = match w.level {
            WarnLevel::Error => "error",
            WarnLevel::Warning => "warning",
        };
        eprintln!("config {level}: {}", w.message);
    }

    let corpus = store.snapshot();
    let warnings = corpus.warnings().len();
    if warnings > 0 || verbose {
        eprintln!("loaded {} notes ({} warnings)", corpus.len(), warnings);
    }
    if verbose {
        for w in corpus.warnings() {
            eprintln!("  {w}");
        }
    }
    Ok(store)
}
