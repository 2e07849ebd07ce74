//! Model invocation for TickerLens.
//!
//! The Anthropic client implements `tickerlens_core::Provider`; the invoker
//! drives any provider through retry, backoff and response coercion.

pub mod anthropic;
pub mod coerce;
pub mod invoker;
pub mod prompt;

pub use anthropic::AnthropicProvider;
pub use coerce::coerce;
pub use invoker::{
    InvocationReport, InvocationResult, InvocationState, ModelInvoker, Sleeper, TokioSleeper,
};
pub use prompt::{RESPONSE_KEYS, SYSTEM_PROMPT, missing_keys};
