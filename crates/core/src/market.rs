//! Market data records produced by the fetchers.
//!
//! Every record is constructed once per run, consumed read-only by the
//! section builders, and discarded after the bundle is produced. The only
//! mutation anywhere is list truncation of news items and social posts.
//!
//! Optional fields are `Option`s so "not reported" can never be confused with
//! a zero value downstream.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Relative EPS surprise at or below which a quarter counts as in-line.
pub const IN_LINE_THRESHOLD: f64 = 0.02;

// ── Instrument & price ────────────────────────────────────────────────────

/// Identity, quote and valuation data for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub symbol: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    /// ISO currency code (e.g. "USD", "CAD"). Treated as USD when absent.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub day_change: Option<f64>,
    #[serde(default)]
    pub day_change_percent: Option<f64>,
    #[serde(default)]
    pub week_52_high: Option<f64>,
    #[serde(default)]
    pub week_52_low: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<u64>,
    #[serde(default)]
    pub volume_10day_avg: Option<u64>,
    #[serde(default)]
    pub volume_3month_avg: Option<u64>,
    #[serde(default)]
    pub pe_trailing: Option<f64>,
    #[serde(default)]
    pub pe_forward: Option<f64>,
    #[serde(default)]
    pub eps_trailing: Option<f64>,
    /// Dividend yield as a fraction (0.0044 = 0.44%).
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    /// Daily OHLCV bars, oldest first.
    #[serde(default)]
    pub bars: Vec<PriceBar>,
}

impl InstrumentSnapshot {
    /// A snapshot for a symbol whose price fetch produced nothing.
    pub fn unavailable(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Currency code, defaulting to USD.
    pub fn currency_code(&self) -> &str {
        self.currency.as_deref().unwrap_or("USD")
    }
}

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<u64>,
}

// ── News ──────────────────────────────────────────────────────────────────

/// A single news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Which upstream API produced the item (e.g. "finnhub").
    #[serde(default)]
    pub provider: Option<String>,
}

// ── Social ────────────────────────────────────────────────────────────────

/// A top comment attached to a social post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub body: String,
    #[serde(default)]
    pub score: i64,
}

/// A social discussion post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    /// Unix seconds.
    #[serde(default)]
    pub created_utc: Option<i64>,
    /// Originating channel (subreddit, forum, ...).
    pub channel: String,
    /// Highest scored comments, best first.
    #[serde(default)]
    pub top_comments: Vec<Comment>,
}

/// Aggregate figures over the full (untrimmed) set of posts found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialStats {
    pub total_posts: usize,
    pub avg_score: f64,
    pub total_comments: u64,
    /// Posts per channel.
    #[serde(default)]
    pub channel_breakdown: BTreeMap<String, usize>,
}

impl SocialStats {
    /// Compute stats from a list of posts. Average score is rounded to one decimal.
    pub fn from_posts(posts: &[SocialPost]) -> Self {
        if posts.is_empty() {
            return Self::default();
        }

        let total_score: i64 = posts.iter().map(|p| p.score).sum();
        let total_comments = posts.iter().map(|p| p.num_comments).sum();
        let mut channel_breakdown = BTreeMap::new();
        for post in posts {
            *channel_breakdown.entry(post.channel.clone()).or_insert(0) += 1;
        }

        let avg = total_score as f64 / posts.len() as f64;
        Self {
            total_posts: posts.len(),
            avg_score: (avg * 10.0).round() / 10.0,
            total_comments,
            channel_breakdown,
        }
    }

    /// The channel with the most posts. Ties resolve to the alphabetically first.
    pub fn most_active(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (name, &count) in &self.channel_breakdown {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((name.as_str(), count));
            }
        }
        best
    }
}

/// Social posts plus their aggregate stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialFeed {
    #[serde(default)]
    pub posts: Vec<SocialPost>,
    /// Supplied by the fetcher; computed from `posts` when absent.
    #[serde(default)]
    pub stats: Option<SocialStats>,
}

// ── Filings ───────────────────────────────────────────────────────────────

/// A single regulatory filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingItem {
    pub form_type: String,
    #[serde(default)]
    pub filing_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Extracted text for filings whose body was downloaded (e.g. 8-K).
    #[serde(default)]
    pub content: Option<String>,
}

/// Filings result for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingsReport {
    #[serde(default)]
    pub filings: Vec<FilingItem>,
    /// Filings are only searched for instruments with a US listing.
    #[serde(default = "default_true")]
    pub is_us_listed: bool,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for FilingsReport {
    fn default() -> Self {
        Self {
            filings: Vec::new(),
            is_us_listed: true,
            note: None,
        }
    }
}

// ── Earnings ──────────────────────────────────────────────────────────────

/// Result of the last reported quarter relative to consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarningsOutcome {
    Beat,
    Miss,
    #[serde(rename = "In-line")]
    InLine,
}

impl EarningsOutcome {
    /// Classify from a pre-computed surprise percentage, or from raw EPS
    /// figures when no surprise is reported.
    pub fn classify(
        eps_estimate: Option<f64>,
        eps_actual: Option<f64>,
        surprise_pct: Option<f64>,
    ) -> Option<Self> {
        let relative = match (surprise_pct, eps_estimate, eps_actual) {
            (Some(pct), _, _) => pct / 100.0,
            (None, Some(est), Some(act)) if est != 0.0 => (act - est) / est.abs(),
            _ => return None,
        };

        Some(if relative.abs() <= IN_LINE_THRESHOLD {
            Self::InLine
        } else if relative > 0.0 {
            Self::Beat
        } else {
            Self::Miss
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Beat => "Beat",
            Self::Miss => "Miss",
            Self::InLine => "In-line",
        }
    }
}

/// The most recently reported quarter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterResult {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub eps_estimate: Option<f64>,
    #[serde(default)]
    pub eps_actual: Option<f64>,
    #[serde(default)]
    pub eps_surprise_pct: Option<f64>,
    #[serde(default)]
    pub beat_or_miss: Option<EarningsOutcome>,
}

impl QuarterResult {
    /// The reported outcome, or one classified from the EPS figures.
    pub fn outcome(&self) -> Option<EarningsOutcome> {
        self.beat_or_miss.or_else(|| {
            EarningsOutcome::classify(self.eps_estimate, self.eps_actual, self.eps_surprise_pct)
        })
    }
}

/// Earnings calendar and last result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsSummary {
    #[serde(default)]
    pub next_earnings_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_until_next: Option<i64>,
    #[serde(default)]
    pub last_quarter: Option<QuarterResult>,
}

// ── Snapshot ──────────────────────────────────────────────────────────────

/// Everything the fetchers resolved for one run. A `None` domain means the
/// fetcher failed or was skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    #[serde(default)]
    pub instrument: Option<InstrumentSnapshot>,
    #[serde(default)]
    pub news: Option<Vec<NewsItem>>,
    #[serde(default)]
    pub social: Option<SocialFeed>,
    #[serde(default)]
    pub filings: Option<FilingsReport>,
    #[serde(default)]
    pub earnings: Option<EarningsSummary>,
}

impl MarketSnapshot {
    /// Names of the domains that resolved to data.
    pub fn available_domains(&self) -> Vec<&'static str> {
        let mut found = Vec::new();
        if self.instrument.is_some() {
            found.push("price");
        }
        if self.news.is_some() {
            found.push("news");
        }
        if self.social.is_some() {
            found.push("social");
        }
        if self.filings.is_some() {
            found.push("filings");
        }
        if self.earnings.is_some() {
            found.push("earnings");
        }
        found
    }

    /// Establish the ordering the trimmer relies on: news newest first
    /// (undated last), posts by descending score. Both sorts are stable.
    pub fn normalize_order(&mut self) {
        if let Some(news) = self.news.as_mut() {
            news.sort_by_key(|item| Reverse(item.published_at));
        }
        if let Some(social) = self.social.as_mut() {
            social.posts.sort_by_key(|post| Reverse(post.score));
        }
    }
}
