//! Bundle assembly: fixed sections, budget split, trimming, concatenation.
//!
//! # Algorithm
//!
//! 1. Render the four fixed sections (instrument, price, filings, earnings).
//! 2. Render the news and social sections with no items and every item
//!    trimmed to get their largest shells.
//! 3. Remaining budget = character budget minus fixed sections, shells and
//!    separators, split evenly between news and social.
//! 4. Trim each collection from the tail against its half.
//! 5. Render and join all six sections in fixed order.
//!
//! Assembly is deterministic: identical inputs produce identical bundles.
//! When the fixed sections alone exceed the budget both collections are
//! emptied and the bundle is allowed to overshoot.

use crate::estimate::estimate_collection;
use crate::sections;
use crate::trim::trim;
use serde::Serialize;
use tickerlens_config::BundleConfig;
use tickerlens_core::market::{
    EarningsSummary, FilingsReport, InstrumentSnapshot, MarketSnapshot, NewsItem, SocialFeed,
    SocialStats,
};
use tracing::{debug, info, warn};

/// Separator between sections.
pub const SECTION_SEPARATOR: &str = "\n\n";

const SECTION_COUNT: usize = 6;

/// The assembled payload plus size and degradation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bundle {
    pub text: String,
    /// Length of `text` in characters.
    pub chars: usize,
    pub approx_tokens: usize,
    /// Character budget the bundle was assembled against.
    pub budget_chars: usize,
    pub news_included: usize,
    pub news_trimmed: usize,
    pub social_included: usize,
    pub social_trimmed: usize,
}

impl Bundle {
    pub fn exceeds_budget(&self) -> bool {
        self.chars > self.budget_chars
    }

    pub fn was_trimmed(&self) -> bool {
        self.news_trimmed > 0 || self.social_trimmed > 0
    }
}

/// Assembles bundles against a fixed character budget. Stateless; reuse freely.
pub struct BundleAssembler {
    config: BundleConfig,
}

impl BundleAssembler {
    pub fn new(config: BundleConfig) -> Self {
        Self { config }
    }

    pub fn budget_chars(&self) -> usize {
        self.config.max_chars()
    }

    /// Assemble a bundle. `news` must be newest first and `social.posts` by
    /// descending score; only their tails are dropped.
    pub fn assemble(
        &self,
        instrument: &InstrumentSnapshot,
        news: Vec<NewsItem>,
        social: SocialFeed,
        filings: &FilingsReport,
        earnings: &EarningsSummary,
    ) -> Bundle {
        let budget = self.budget_chars();
        let stats = social
            .stats
            .unwrap_or_else(|| SocialStats::from_posts(&social.posts));

        let instrument_text = sections::instrument_section(instrument);
        let price_text = sections::price_section(instrument);
        let filings_text = sections::filings_section(filings);
        let earnings_text = sections::earnings_section(earnings);

        let fixed_chars = [
            &instrument_text,
            &price_text,
            &filings_text,
            &earnings_text,
            &sections::news_section(&[], news.len()),
            &sections::social_section(&[], &stats, social.posts.len()),
        ]
        .iter()
        .map(|s| s.chars().count())
        .sum::<usize>()
            + SECTION_SEPARATOR.len() * (SECTION_COUNT - 1);

        let remaining = budget.saturating_sub(fixed_chars);
        let half = remaining / 2;
        debug!(budget, fixed_chars, half, "Bundle budget split");

        let news_estimate = estimate_collection(&news);
        let social_estimate = estimate_collection(&social.posts);
        let (news, news_trimmed) = trim(news, half);
        let (posts, social_trimmed) = trim(social.posts, half);

        if news_trimmed > 0 || social_trimmed > 0 {
            info!(
                news_estimate,
                news_trimmed,
                social_estimate,
                social_trimmed,
                half,
                "Trimmed variable sections to fit context budget"
            );
        }

        let text = [
            instrument_text,
            price_text,
            sections::news_section(&news, news_trimmed),
            sections::social_section(&posts, &stats, social_trimmed),
            filings_text,
            earnings_text,
        ]
        .join(SECTION_SEPARATOR);

        let chars = text.chars().count();
        let approx_tokens = self.config.approx_tokens(chars);
        debug!(chars, approx_tokens, "Bundle assembled");
        if chars > budget {
            warn!(
                chars,
                budget, "Fixed sections exceed the context budget; bundle overshoots"
            );
        }

        Bundle {
            text,
            chars,
            approx_tokens,
            budget_chars: budget,
            news_included: news.len(),
            news_trimmed,
            social_included: posts.len(),
            social_trimmed,
        }
    }

    /// Assemble from a resolved snapshot. Absent domains render as empty
    /// sections; the trimmer's ordering precondition is established first.
    pub fn assemble_snapshot(&self, mut snapshot: MarketSnapshot) -> Bundle {
        snapshot.normalize_order();
        let instrument = snapshot
            .instrument
            .unwrap_or_else(|| InstrumentSnapshot::unavailable(snapshot.symbol.as_str()));

        self.assemble(
            &instrument,
            snapshot.news.unwrap_or_default(),
            snapshot.social.unwrap_or_default(),
            &snapshot.filings.unwrap_or_default(),
            &snapshot.earnings.unwrap_or_default(),
        )
    }
}
