//! `tickerlens analyze` — Assemble the bundle, invoke the model, emit JSON.

use super::bundle::size_line;
use super::{CliError, load_snapshot};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tickerlens_bundle::BundleAssembler;
use tickerlens_config::AppConfig;
use tickerlens_providers::{AnthropicProvider, InvocationResult, ModelInvoker, missing_keys};
use tracing::{info, warn};

pub async fn run(
    config: &AppConfig,
    snapshot_path: &Path,
    out: Option<&Path>,
) -> Result<(), CliError> {
    let snapshot = load_snapshot(snapshot_path)?;
    let api_key = config.require_api_key()?;
    let provider = AnthropicProvider::from_config(api_key, &config.llm)?;

    let symbol = snapshot.symbol.clone();
    let bundle = BundleAssembler::new(config.bundle.clone()).assemble_snapshot(snapshot);
    info!(symbol = %symbol, "{}", size_line(&bundle));
    if bundle.was_trimmed() {
        warn!(
            symbol = %symbol,
            news_trimmed = bundle.news_trimmed,
            social_trimmed = bundle.social_trimmed,
            "Bundle trimmed to fit the context budget"
        );
    }

    let report = ModelInvoker::new(Arc::new(provider), config.llm.clone())
        .invoke(&bundle.text)
        .await?;

    if let InvocationResult::Parsed(map) = &report.result {
        let missing = missing_keys(map);
        if !missing.is_empty() {
            warn!(symbol = %symbol, ?missing, "Analysis is missing expected keys");
        }
    }
    if report.result.parse_failed() {
        warn!(
            symbol = %symbol,
            attempts = report.attempts,
            "Model reply could not be parsed; output holds the raw response"
        );
        eprintln!("⚠️  Model reply was not valid JSON; writing raw response with _parse_error = true");
    }
    if let Some(usage) = report.usage {
        info!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Token usage"
        );
    }

    let json = serde_json::to_string_pretty(&Value::Object(report.result.into_mapping()))
        .map_err(|e| CliError::io("Failed to serialize analysis", e.into()))?;

    match out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .map_err(|e| CliError::io(format!("Failed to write {}", path.display()), e))?;
            println!("✅ Analysis written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
