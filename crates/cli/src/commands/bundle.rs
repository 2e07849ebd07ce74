//! `tickerlens bundle` — Assemble and print the context bundle for a snapshot.

use super::{CliError, load_snapshot};
use std::path::Path;
use tickerlens_bundle::{Bundle, BundleAssembler};
use tickerlens_config::AppConfig;

/// One-line size report, written to stderr so stdout stays pipeable.
pub fn size_line(bundle: &Bundle) -> String {
    let mut line = format!(
        "Bundle: {} chars (~{} tokens) of {} char budget; news {} kept",
        bundle.chars, bundle.approx_tokens, bundle.budget_chars, bundle.news_included
    );
    if bundle.news_trimmed > 0 {
        line.push_str(&format!(", {} trimmed", bundle.news_trimmed));
    }
    line.push_str(&format!("; social {} kept", bundle.social_included));
    if bundle.social_trimmed > 0 {
        line.push_str(&format!(", {} trimmed", bundle.social_trimmed));
    }
    if bundle.exceeds_budget() {
        line.push_str(" (over budget)");
    }
    line
}

pub fn run(config: &AppConfig, snapshot_path: &Path) -> Result<(), CliError> {
    let snapshot = load_snapshot(snapshot_path)?;
    let bundle = BundleAssembler::new(config.bundle.clone()).assemble_snapshot(snapshot);

    println!("{}", bundle.text);
    eprintln!("{}", size_line(&bundle));
    Ok(())
}
