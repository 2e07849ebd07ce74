//! Resilient model invocation.
//!
//! One bundle, up to `max_attempts` sequential requests. Each attempt moves
//! through [`InvocationState`]s:
//!
//! ```text
//! Sending → AwaitingResponse ─┬─ text coerces ─────────────→ ParseSuccess
//!                             ├─ text unparsable, tries left → ParseFailureRetry → Sending (no wait)
//!                             ├─ text unparsable, last try ──→ ParseFailureExhausted (fallback)
//!                             ├─ retryable fault, tries left → RetryableError → Sending (after backoff)
//!                             └─ client fault / last try ────→ FatalError
//! ```
//!
//! Rate limits, connection failures and server faults back off for
//! `base * 2^(attempt-1)` seconds. Client faults abort on the spot.

use crate::coerce::coerce;
use crate::prompt::SYSTEM_PROMPT;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tickerlens_config::LlmConfig;
use tickerlens_core::error::{InvokeError, ProviderError};
use tickerlens_core::provider::{Provider, ProviderRequest, Usage};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Fallback mapping key holding the unparsed reply.
pub const RAW_RESPONSE_KEY: &str = "raw_response";
/// Fallback mapping key flagging that the reply did not parse.
pub const PARSE_ERROR_KEY: &str = "_parse_error";

/// Waits between attempts. Swapped out in tests to record instead of sleep.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Where an invocation is in its retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvocationState {
    Sending,
    AwaitingResponse,
    ParseSuccess,
    ParseFailureRetry,
    ParseFailureExhausted,
    RetryableError,
    FatalError,
}

impl InvocationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ParseSuccess | Self::ParseFailureExhausted | Self::FatalError
        )
    }
}

/// What a non-fatal invocation yields.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// The reply coerced to a JSON object.
    Parsed(Map<String, Value>),
    /// Every attempt's reply was unparsable; this is the last one.
    Fallback { raw_response: String },
}

impl InvocationResult {
    /// Callers must check this before trusting the mapping's schema.
    pub fn parse_failed(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// The result as one mapping. A fallback carries the raw text under
    /// [`RAW_RESPONSE_KEY`] and `true` under [`PARSE_ERROR_KEY`].
    pub fn into_mapping(self) -> Map<String, Value> {
        match self {
            Self::Parsed(map) => map,
            Self::Fallback { raw_response } => {
                let mut map = Map::new();
                map.insert(RAW_RESPONSE_KEY.into(), Value::String(raw_response));
                map.insert(PARSE_ERROR_KEY.into(), Value::Bool(true));
                map
            }
        }
    }
}

/// A completed invocation: its result plus how it got there.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub result: InvocationResult,
    /// Requests sent, including the final one.
    pub attempts: u32,
    /// `ParseSuccess` or `ParseFailureExhausted`.
    pub final_state: InvocationState,
    /// Token usage of the last response, when the provider reports it.
    pub usage: Option<Usage>,
}

/// Sends a bundle to the model with retry, backoff and response coercion.
pub struct ModelInvoker {
    provider: Arc<dyn Provider>,
    config: LlmConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn Provider>, config: LlmConfig) -> Self {
        Self {
            provider,
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn request(&self, bundle: &str) -> ProviderRequest {
        let mut request =
            ProviderRequest::single_turn(&self.config.model, SYSTEM_PROMPT, bundle);
        request.temperature = self.config.temperature;
        request.max_tokens = Some(self.config.max_tokens);
        request
    }

    fn enter(&self, id: &Uuid, attempt: u32, state: InvocationState) -> InvocationState {
        debug!(
            invocation = %id,
            attempt,
            ?state,
            terminal = state.is_terminal(),
            "Invocation state"
        );
        state
    }

    /// Run the invocation to a terminal state.
    ///
    /// `Ok` for `ParseSuccess` and `ParseFailureExhausted`; `Err` for the two
    /// fatal paths, which [`InvokeError`] keeps distinct.
    pub async fn invoke(&self, bundle: &str) -> Result<InvocationReport, InvokeError> {
        let id = Uuid::new_v4();
        let max_attempts = self.config.max_attempts.max(1);
        info!(
            invocation = %id,
            provider = self.provider.name(),
            model = %self.config.model,
            bundle_chars = bundle.chars().count(),
            max_attempts,
            "Invoking model"
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.enter(&id, attempt, InvocationState::Sending);
            let request = self.request(bundle);
            self.enter(&id, attempt, InvocationState::AwaitingResponse);

            match self.provider.complete(request).await {
                Ok(response) => {
                    debug!(
                        invocation = %id,
                        attempt,
                        chars = response.text().len(),
                        "Model replied"
                    );
                    if let Some(map) = coerce(response.text()) {
                        let final_state = self.enter(&id, attempt, InvocationState::ParseSuccess);
                        info!(invocation = %id, attempt, "Model reply parsed");
                        return Ok(InvocationReport {
                            result: InvocationResult::Parsed(map),
                            attempts: attempt,
                            final_state,
                            usage: response.usage,
                        });
                    }

                    if attempt < max_attempts {
                        self.enter(&id, attempt, InvocationState::ParseFailureRetry);
                        warn!(invocation = %id, attempt, "Model reply did not parse; retrying");
                        continue;
                    }

                    let final_state =
                        self.enter(&id, attempt, InvocationState::ParseFailureExhausted);
                    warn!(
                        invocation = %id,
                        attempts = attempt,
                        "Model reply did not parse on any attempt; returning raw text"
                    );
                    return Ok(InvocationReport {
                        result: InvocationResult::Fallback {
                            raw_response: response.message.content,
                        },
                        attempts: attempt,
                        final_state,
                        usage: response.usage,
                    });
                }
                Err(err) if !err.is_retryable() => {
                    self.enter(&id, attempt, InvocationState::FatalError);
                    error!(invocation = %id, attempt, error = %err, "Request rejected");
                    return Err(InvokeError::Rejected {
                        attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    if attempt >= max_attempts {
                        self.enter(&id, attempt, InvocationState::FatalError);
                        error!(invocation = %id, attempts = attempt, error = %err, "Retries exhausted");
                        return Err(InvokeError::RetriesExhausted {
                            attempts: attempt,
                            source: err,
                        });
                    }

                    self.enter(&id, attempt, InvocationState::RetryableError);
                    let wait = self.config.backoff_for(attempt);
                    log_retry(&id, attempt, &err, wait);
                    self.sleeper.sleep(wait).await;
                }
            }
        }
    }
}

fn log_retry(id: &Uuid, attempt: u32, err: &ProviderError, wait: Duration) {
    warn!(
        invocation = %id,
        attempt,
        class = ?err.class(),
        error = %err,
        wait_secs = wait.as_secs_f64(),
        "Retryable fault; backing off"
    );
}
