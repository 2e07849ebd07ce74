//! Section builders: one pure renderer per data domain.
//!
//! Every section is framed by a named opening and closing marker. Absent
//! fields render as [`UNAVAILABLE`] and empty domains render a sentinel line
//! instead of being omitted. Untrusted text is escaped before embedding.

use crate::format::{self, UNAVAILABLE, escape, escape_or_unavailable, open_tag};
use crate::price::{PriceSummary, TABLE_BARS, table_window};
use tickerlens_core::market::{
    EarningsSummary, FilingItem, FilingsReport, InstrumentSnapshot, NewsItem, SocialPost,
    SocialStats,
};

/// Post bodies longer than this are cut and suffixed with `...`.
pub const MAX_POST_BODY_CHARS: usize = 500;
/// Comment bodies are cut to this many characters.
pub const MAX_COMMENT_CHARS: usize = 200;
/// Comments rendered per post.
pub const MAX_COMMENTS_PER_POST: usize = 3;

pub const INSTRUMENT_TAG: &str = "ticker_info";
pub const PRICE_TAG: &str = "price_data";
pub const NEWS_TAG: &str = "news_articles";
pub const SOCIAL_TAG: &str = "social_posts";
pub const FILINGS_TAG: &str = "sec_filings";
pub const EARNINGS_TAG: &str = "earnings";

const NO_PRICE_DATA: &str = "No OHLCV data available.";
const NO_NEWS: &str = "No news articles found for this period.";
const NO_SOCIAL: &str = "No social posts found for this ticker.";
const SOCIAL_ALL_TRIMMED: &str = "No social posts fit within the context budget.";
const NO_FILINGS_NON_US: &str = "No SEC filings (non-US listed security).";
const NO_FILINGS: &str = "No recent SEC filings found.";

fn frame(open: String, body: &str, name: &str) -> String {
    format!("{open}\n{body}\n</{name}>")
}

fn trimmed_attr(attrs: &mut Vec<(&str, String)>, trimmed: usize) {
    if trimmed > 0 {
        attrs.push(("trimmed", trimmed.to_string()));
    }
}

// ── Instrument ────────────────────────────────────────────────────────────

pub fn instrument_section(info: &InstrumentSnapshot) -> String {
    let ccy = info.currency_code();
    let range = if info.week_52_low.is_none() && info.week_52_high.is_none() {
        UNAVAILABLE.to_string()
    } else {
        format!(
            "{} - {}",
            format::price(info.week_52_low, ccy),
            format::price(info.week_52_high, ccy)
        )
    };

    let lines = [
        format!("Symbol: {}", escape(&info.symbol)),
        format!("Company: {}", escape_or_unavailable(info.company_name.as_deref())),
        format!("Sector: {}", escape_or_unavailable(info.sector.as_deref())),
        format!("Industry: {}", escape_or_unavailable(info.industry.as_deref())),
        format!("Currency: {}", escape_or_unavailable(info.currency.as_deref())),
        format!("Current Price: {}", format::price(info.current_price, ccy)),
        format!(
            "Day Change: {}",
            format::change(info.day_change, info.day_change_percent)
        ),
        format!("Previous Close: {}", format::price(info.previous_close, ccy)),
        format!("52-Week Range: {range}"),
        format!("Market Cap: {}", format::large_amount(info.market_cap, ccy)),
        format!("Avg Volume (10d): {}", format::volume(info.volume_10day_avg)),
        format!("Avg Volume (3mo): {}", format::volume(info.volume_3month_avg)),
        format!("P/E (trailing): {}", format::decimal(info.pe_trailing, 2)),
        format!("P/E (forward): {}", format::decimal(info.pe_forward, 2)),
        format!("EPS (trailing): {}", format::decimal(info.eps_trailing, 2)),
        format!("Dividend Yield: {}", format::ratio_pct(info.dividend_yield)),
        format!("Beta: {}", format::decimal(info.beta, 2)),
    ];

    frame(open_tag(INSTRUMENT_TAG, &[]), &lines.join("\n"), INSTRUMENT_TAG)
}

// ── Price history ─────────────────────────────────────────────────────────

fn bar_cell(value: Option<f64>) -> String {
    value.map_or_else(|| UNAVAILABLE.into(), |v| format!("{v:.2}"))
}

fn table_row(cells: [&str; 6]) -> String {
    let [date, open, high, low, close, volume] = cells;
    format!("{date:<12} {open:>9} {high:>9} {low:>9} {close:>9} {volume:>14}")
        .trim_end()
        .to_string()
}

pub fn price_section(info: &InstrumentSnapshot) -> String {
    let Some(summary) = PriceSummary::from_bars(&info.bars) else {
        return frame(open_tag(PRICE_TAG, &[]), NO_PRICE_DATA, PRICE_TAG);
    };
    let ccy = info.currency_code();

    let period_change = match summary.period_change_pct {
        Some(pct) => format!(
            "{} (open {} to close {})",
            format::signed_pct(Some(pct)),
            format::price(summary.first_open, ccy),
            format::price(summary.last_close, ccy)
        ),
        None => UNAVAILABLE.into(),
    };
    let trend = summary
        .trend
        .map_or_else(|| format!("{UNAVAILABLE} (fewer than 10 closes)"), |t| t.describe().into());

    let mut lines = vec![
        format!(
            "Period: {} to {} ({} trading days)",
            summary.period_start, summary.period_end, summary.trading_days
        ),
        format!("Period High: {}", format::price(summary.period_high, ccy)),
        format!("Period Low: {}", format::price(summary.period_low, ccy)),
        format!(
            "Average Volume: {}",
            summary
                .avg_volume
                .map_or_else(|| UNAVAILABLE.into(), format::grouped_int)
        ),
        format!("Period Change: {period_change}"),
        format!("Trend: {trend}"),
        String::new(),
        format!("Recent daily bars (last {TABLE_BARS}):"),
        table_row(["Date", "Open", "High", "Low", "Close", "Volume"]),
    ];

    for bar in table_window(&info.bars) {
        let date = bar.date.to_string();
        let volume = bar
            .volume
            .map_or_else(|| UNAVAILABLE.into(), format::grouped_int);
        lines.push(table_row([
            &date,
            &bar_cell(bar.open),
            &bar_cell(bar.high),
            &bar_cell(bar.low),
            &bar_cell(bar.close),
            &volume,
        ]));
    }

    frame(open_tag(PRICE_TAG, &[]), &lines.join("\n"), PRICE_TAG)
}

// ── News ──────────────────────────────────────────────────────────────────

fn news_item(index: usize, item: &NewsItem) -> String {
    let published = item.published_at.map_or_else(
        || UNAVAILABLE.into(),
        |ts| ts.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    format!(
        "[{index}] {}\nSource: {} | Provider: {} | Published: {published}\nSummary: {}",
        escape(&item.title),
        escape_or_unavailable(item.source.as_deref()),
        escape_or_unavailable(item.provider.as_deref()),
        escape_or_unavailable(item.summary.as_deref()),
    )
}

/// Render the news section. `items` is what survived trimming.
pub fn news_section(items: &[NewsItem], trimmed: usize) -> String {
    let mut attrs = vec![("count", items.len().to_string())];
    trimmed_attr(&mut attrs, trimmed);

    let body = if items.is_empty() {
        NO_NEWS.to_string()
    } else {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| news_item(i + 1, item))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    frame(open_tag(NEWS_TAG, &attrs), &body, NEWS_TAG)
}

// ── Social ────────────────────────────────────────────────────────────────

/// Escaped post body capped at [`MAX_POST_BODY_CHARS`].
pub(crate) fn post_body(body: Option<&str>) -> String {
    let escaped = escape_or_unavailable(body);
    match format::truncate_chars(&escaped, MAX_POST_BODY_CHARS) {
        (head, true) => format!("{head}..."),
        (whole, false) => whole.to_string(),
    }
}

fn social_post(index: usize, post: &SocialPost) -> String {
    let mut comments = String::new();
    for comment in post.top_comments.iter().take(MAX_COMMENTS_PER_POST) {
        let escaped = escape(&comment.body);
        let (text, _) = format::truncate_chars(&escaped, MAX_COMMENT_CHARS);
        comments.push_str(&format!("\n  - ({}) {text}", comment.score));
    }
    if comments.is_empty() {
        comments.push_str(" none");
    }

    format!(
        "[{index}] {}\nChannel: {} | Score: {} | Comments: {} | Posted: {}\nBody: {}\nTop comments:{comments}",
        escape(&post.title),
        escape(&post.channel),
        post.score,
        post.num_comments,
        format::unix_date(post.created_utc),
        post_body(post.body.as_deref()),
    )
}

fn social_summary(stats: &SocialStats, included: usize) -> String {
    let most_active = stats.most_active().map_or_else(
        || UNAVAILABLE.to_string(),
        |(channel, count)| format!("{} ({count} posts)", escape(channel)),
    );
    [
        "<summary>".to_string(),
        format!("Total posts found: {}", stats.total_posts),
        format!("Posts included: {included}"),
        format!("Average score: {:.1}", stats.avg_score),
        format!("Total comments: {}", stats.total_comments),
        format!("Most active channel: {most_active}"),
        "</summary>".to_string(),
    ]
    .join("\n")
}

/// Render the social section. `stats` describe the untrimmed feed.
pub fn social_section(posts: &[SocialPost], stats: &SocialStats, trimmed: usize) -> String {
    let channels = stats
        .channel_breakdown
        .keys()
        .map(|c| escape(c).into_owned())
        .collect::<Vec<_>>()
        .join(",");

    let mut attrs = vec![("count", posts.len().to_string())];
    if !channels.is_empty() {
        attrs.push(("channels", channels));
    }
    trimmed_attr(&mut attrs, trimmed);

    let listing = if !posts.is_empty() {
        posts
            .iter()
            .enumerate()
            .map(|(i, post)| social_post(i + 1, post))
            .collect::<Vec<_>>()
            .join("\n\n")
    } else if stats.total_posts > 0 {
        SOCIAL_ALL_TRIMMED.to_string()
    } else {
        NO_SOCIAL.to_string()
    };

    let body = format!("{}\n\n{listing}", social_summary(stats, posts.len()));
    frame(open_tag(SOCIAL_TAG, &attrs), &body, SOCIAL_TAG)
}

// ── Filings ───────────────────────────────────────────────────────────────

fn filing(index: usize, item: &FilingItem) -> String {
    let mut block = format!(
        "[{index}] {} filed {}\nDescription: {}\nURL: {}",
        escape(&item.form_type),
        format::date(item.filing_date),
        escape_or_unavailable(item.description.as_deref()),
        escape_or_unavailable(item.url.as_deref()),
    );
    if let Some(content) = item.content.as_deref().filter(|c| !c.trim().is_empty()) {
        block.push_str(&format!("\nContent: {}", escape(content.trim())));
    }
    block
}

pub fn filings_section(report: &FilingsReport) -> String {
    let attrs = [
        ("count", report.filings.len().to_string()),
        ("us_listed", report.is_us_listed.to_string()),
    ];
    let note = report
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(escape);

    let body = if !report.is_us_listed {
        note.map_or_else(|| NO_FILINGS_NON_US.to_string(), |n| n.into_owned())
    } else if report.filings.is_empty() {
        note.map_or_else(|| NO_FILINGS.to_string(), |n| n.into_owned())
    } else {
        let mut blocks = Vec::with_capacity(report.filings.len() + 1);
        if let Some(n) = note {
            blocks.push(format!("Note: {n}"));
        }
        blocks.extend(
            report
                .filings
                .iter()
                .enumerate()
                .map(|(i, item)| filing(i + 1, item)),
        );
        blocks.join("\n\n")
    };

    frame(open_tag(FILINGS_TAG, &attrs), &body, FILINGS_TAG)
}

// ── Earnings ──────────────────────────────────────────────────────────────

pub fn earnings_section(summary: &EarningsSummary) -> String {
    let next = match (summary.next_earnings_date, summary.days_until_next) {
        (Some(date), Some(days)) => format!("{} ({days} days away)", format::long_date(date)),
        (Some(date), None) => format::long_date(date),
        (None, _) => UNAVAILABLE.into(),
    };

    let mut lines = vec![format!("Next Earnings Date: {next}")];
    match &summary.last_quarter {
        Some(q) => {
            let outcome = q.outcome().map_or(UNAVAILABLE, |o| o.label());
            lines.push(format!(
                "Most Recent Quarter: {}",
                escape_or_unavailable(q.period.as_deref())
            ));
            lines.push(format!("Result: {outcome}"));
            lines.push(format!("EPS Estimate: {}", format::decimal(q.eps_estimate, 2)));
            lines.push(format!("EPS Actual: {}", format::decimal(q.eps_actual, 2)));
            lines.push(format!("EPS Surprise: {}", format::signed_pct(q.eps_surprise_pct)));
        }
        None => lines.push(format!("Most Recent Quarter: {UNAVAILABLE}")),
    }

    frame(open_tag(EARNINGS_TAG, &[]), &lines.join("\n"), EARNINGS_TAG)
}
