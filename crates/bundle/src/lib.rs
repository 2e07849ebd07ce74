//! # TickerLens Bundle
//!
//! Budget-constrained context bundle assembly.
//!
//! Renders each market data domain into a delimited text section and fits
//! the result into a character budget derived from a token budget.
//!
//! | Section | Marker | Trim strategy |
//! |---------|--------|---------------|
//! | Instrument | `ticker_info` | Never trimmed |
//! | Price history | `price_data` | Never trimmed |
//! | News | `news_articles` | Oldest dropped first |
//! | Social | `social_posts` | Lowest score dropped first |
//! | Filings | `sec_filings` | Never trimmed |
//! | Earnings | `earnings` | Never trimmed |

pub mod assembler;
pub mod estimate;
pub mod format;
pub mod price;
pub mod sections;
pub mod trim;

pub use assembler::{Bundle, BundleAssembler};
pub use estimate::{SizeEstimate, estimate_collection};
pub use price::{PriceSummary, Trend};
pub use trim::trim;
