//! End-to-end tests for the TickerLens pipeline.
//!
//! Snapshot JSON → bundle assembly → model invocation against a scripted
//! provider, plus the `tickerlens` binary's exit codes.

use std::io::Write;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tickerlens_bundle::BundleAssembler;
use tickerlens_config::{BundleConfig, LlmConfig};
use tickerlens_core::error::{InvokeError, ProviderError};
use tickerlens_core::market::MarketSnapshot;
use tickerlens_core::message::Message;
use tickerlens_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use tickerlens_providers::{InvocationState, ModelInvoker, Sleeper};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted replies in sequence.
struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<&str, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let replies = self.replies.lock().unwrap();
        let index = requests.len();
        if index >= replies.len() {
            panic!(
                "ScriptedProvider exhausted: call #{index}, have {}",
                replies.len()
            );
        }
        requests.push(request);
        replies[index].clone().map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "e2e-model".into(),
            stop_reason: Some("end_turn".into()),
        })
    }
}

/// Records backoff waits instead of sleeping.
#[derive(Default)]
struct NoWait {
    waits: Mutex<Vec<Duration>>,
}

#[async_trait::async_trait]
impl Sleeper for NoWait {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn snapshot_json(news_count: usize) -> String {
    let news: Vec<serde_json::Value> = (0..news_count)
        .map(|i| {
            serde_json::json!({
                "title": format!("Story {i}: quarterly update"),
                "summary": "x".repeat(300),
                "source": "Reuters",
                "published_at": format!("2026-02-{:02}T12:00:00Z", 1 + i % 28),
                "provider": "finnhub"
            })
        })
        .collect();

    serde_json::json!({
        "symbol": "AAPL",
        "instrument": {
            "symbol": "AAPL",
            "company_name": "Apple Inc.",
            "currency": "USD",
            "current_price": 241.53,
            "day_change": 2.66,
            "day_change_percent": 1.11,
            "bars": [
                {"date": "2026-02-02", "open": 238.0, "high": 242.0, "low": 237.5, "close": 241.5, "volume": 51000000}
            ]
        },
        "news": news,
        "social": {
            "posts": [
                {"title": "AAPL DD", "body": "Long thesis", "score": 120, "num_comments": 30,
                 "created_utc": 1769904000, "channel": "stocks",
                 "top_comments": [{"body": "Solid <analysis>", "score": 12}]}
            ]
        },
        "filings": {"filings": [], "is_us_listed": true},
        "earnings": {"next_earnings_date": "2026-04-30", "days_until_next": 30}
    })
    .to_string()
}

fn snapshot(news_count: usize) -> MarketSnapshot {
    serde_json::from_str(&snapshot_json(news_count)).unwrap()
}

fn fast_llm() -> LlmConfig {
    LlmConfig {
        model: "e2e-model".into(),
        ..LlmConfig::default()
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_to_parsed_analysis() {
    let bundle = BundleAssembler::new(BundleConfig::default()).assemble_snapshot(snapshot(5));
    assert_eq!(bundle.news_trimmed, 0);
    assert!(bundle.text.contains("Solid &lt;analysis&gt;"));

    let provider = ScriptedProvider::new(vec![Ok(
        "Here is my analysis:\n```json\n{\"verdict\": \"Momentum with caveats\", \"bull_case\": [\"services\"]}\n```",
    )]);
    let report = ModelInvoker::new(provider.clone(), fast_llm())
        .invoke(&bundle.text)
        .await
        .unwrap();

    assert_eq!(report.final_state, InvocationState::ParseSuccess);
    assert_eq!(report.attempts, 1);
    assert_eq!(report.usage.map(|u| u.total_tokens), Some(15));
    let mapping = report.result.into_mapping();
    assert_eq!(mapping["verdict"], "Momentum with caveats");

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].messages[0].content, bundle.text);
    assert!(requests[0].system.as_deref().unwrap().contains("overall_sentiment"));
}

#[tokio::test]
async fn tight_budget_sends_trimmed_bundle() {
    let bundle =
        BundleAssembler::new(BundleConfig::with_tokens(1_500)).assemble_snapshot(snapshot(30));
    assert!(bundle.news_trimmed > 0);
    assert!(!bundle.exceeds_budget());
    assert!(bundle.text.contains(&format!("trimmed=\"{}\"", bundle.news_trimmed)));

    let provider = ScriptedProvider::new(vec![Ok("{\"verdict\": \"ok\"}")]);
    ModelInvoker::new(provider.clone(), fast_llm())
        .invoke(&bundle.text)
        .await
        .unwrap();
    let requests = provider.requests.lock().unwrap();
    assert!(requests[0].messages[0].content.contains("trimmed="));
}

#[tokio::test]
async fn unparsable_replies_degrade_to_fallback() {
    let bundle = BundleAssembler::new(BundleConfig::default()).assemble_snapshot(snapshot(2));
    let provider = ScriptedProvider::new(vec![
        Ok("I'm sorry, I can't"),
        Ok("Still prose"),
        Ok("Final prose"),
    ]);
    let sleeper = Arc::new(NoWait::default());
    let report = ModelInvoker::new(provider.clone(), fast_llm())
        .with_sleeper(sleeper.clone())
        .invoke(&bundle.text)
        .await
        .unwrap();

    assert_eq!(report.final_state, InvocationState::ParseFailureExhausted);
    assert!(report.result.parse_failed());
    let mapping = report.result.into_mapping();
    assert_eq!(mapping["raw_response"], "Final prose");
    assert_eq!(mapping["_parse_error"], true);
    assert_eq!(provider.calls(), 3);
    assert!(sleeper.waits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rate_limits_recover_with_backoff() {
    let bundle = BundleAssembler::new(BundleConfig::default()).assemble_snapshot(snapshot(1));
    let provider = ScriptedProvider::new(vec![
        Err(ProviderError::RateLimited { retry_after_secs: 5 }),
        Err(ProviderError::Timeout("300s".into())),
        Ok("{\"verdict\": \"recovered\"}"),
    ]);
    let sleeper = Arc::new(NoWait::default());
    let report = ModelInvoker::new(provider.clone(), fast_llm())
        .with_sleeper(sleeper.clone())
        .invoke(&bundle.text)
        .await
        .unwrap();

    assert_eq!(report.attempts, 3);
    assert_eq!(
        *sleeper.waits.lock().unwrap(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn auth_failure_is_fatal() {
    let bundle = BundleAssembler::new(BundleConfig::default()).assemble_snapshot(snapshot(1));
    let provider = ScriptedProvider::new(vec![Err(ProviderError::AuthenticationFailed(
        "Invalid Anthropic API key".into(),
    ))]);
    let err = ModelInvoker::new(provider.clone(), fast_llm())
        .invoke(&bundle.text)
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Rejected { attempt: 1, .. }));
    assert_eq!(provider.calls(), 1);
}

// ── Binary ───────────────────────────────────────────────────────────────

fn write_snapshot(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("snapshot.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn tickerlens(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tickerlens"));
    cmd.env("HOME", home.path())
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("TICKERLENS_API_KEY")
        .env_remove("TICKERLENS_CONTEXT_TOKENS")
        .env_remove("TICKERLENS_CONFIG")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn bundle_command_prints_sections() {
    let home = tempfile::tempdir().unwrap();
    let path = write_snapshot(&home, &snapshot_json(3));
    let output = tickerlens(&home).arg("bundle").arg(&path).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("<ticker_info>"));
    assert!(stdout.contains("<news_articles count=\"3\">"));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Bundle: "));
}

#[test]
fn empty_snapshot_exits_with_no_data() {
    let home = tempfile::tempdir().unwrap();
    let path = write_snapshot(&home, r#"{"symbol": "ZZZZ"}"#);
    let output = tickerlens(&home).arg("bundle").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn analyze_without_api_key_is_a_config_error() {
    let home = tempfile::tempdir().unwrap();
    let path = write_snapshot(&home, &snapshot_json(1));
    let output = tickerlens(&home).arg("analyze").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("ANTHROPIC_API_KEY"));
}

#[test]
fn config_init_then_show() {
    let home = tempfile::tempdir().unwrap();
    let init = tickerlens(&home).args(["config", "init"]).output().unwrap();
    assert!(init.status.success());
    assert!(home.path().join(".tickerlens/config.toml").exists());

    let show = tickerlens(&home).args(["config", "show"]).output().unwrap();
    assert!(show.status.success());
    let stdout = String::from_utf8(show.stdout).unwrap();
    assert!(stdout.contains("max_attempts = 3"));
}
