//! # TickerLens Core
//!
//! Domain types, traits, and error definitions for the TickerLens research
//! pipeline. This crate has **no I/O** — it defines the records that the
//! fetchers produce, the bundle assembler consumes, and the model invoker
//! sends across the wire.
//!
//! ## Design Philosophy
//!
//! - Every market data domain is an explicit typed record. A missing value is
//!   `None`, never an omitted key, so renderers can say "unavailable" instead
//!   of guessing.
//! - The model backend is a trait (`Provider`) so the invoker can be exercised
//!   against scripted mocks.
//! - Fatal conditions are values (`InvokeError`), not process exits.

pub mod error;
pub mod market;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{FaultClass, InvokeError, ProviderError};
pub use market::{
    Comment, EarningsOutcome, EarningsSummary, FilingItem, FilingsReport, InstrumentSnapshot,
    MarketSnapshot, NewsItem, PriceBar, QuarterResult, SocialFeed, SocialPost, SocialStats,
};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
