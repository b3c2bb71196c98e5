use crate::output::print_json;
use mnemo_core::validate::{validate_corpus, ValidationSummary};
use std::path::Path;

pub fn run(root: &Path, verbose: bool, json: bool) -> anyhow::Result<()> {
    let store = super::load(root, verbose)?;
    let corpus = store.snapshot();
    let reports = validate_corpus(&corpus, &store.config().validation);
    let summary = ValidationSummary::of(&reports);

    if json {
        print_json(&serde_json::json!({
            "summary": summary,
            "reports": reports,
        }))?;
    } else {
        for r in &reports {
            let status = if r.is_valid() { "PASS" } else { "FAIL" };
            println!("{status} {}", r.path);
            for e in &r.errors {
                println!("  error: {e}");
            }
            for w in &r.warnings {
                println!("  warning: {w}");
            }
        }
        println!(
            "\n{} notes: {} passed, {} failed",
            summary.total, summary.passed, summary.failed
        );
    }

    if summary.failed > 0 {
        anyhow::bail!("{} of {} notes failed validation", summary.failed, summary.total);
    }
    Ok(())
}
