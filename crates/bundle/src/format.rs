//! Locale-fixed text and number formatting for bundle sections.
//!
//! Every formatter takes an `Option` and renders [`UNAVAILABLE`] for `None`
//! so a missing value never reads as zero.

use chrono::{DateTime, NaiveDate};
use std::borrow::Cow;

/// Marker rendered in place of any absent value.
pub const UNAVAILABLE: &str = "N/A";

/// Currency marker for an ISO code. Unknown codes fall back to `$`.
pub fn currency_marker(code: &str) -> &'static str {
    match code {
        "CAD" => "C$",
        "AUD" => "A$",
        "HKD" => "HK",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        _ => "$",
    }
}

/// Insert `,` separators into a run of ASCII digits.
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format with a fixed number of decimals and thousands separators.
pub fn grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let sign = if value < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{}.{frac}", group_digits(int_part)),
        None => format!("{sign}{}", group_digits(int_part)),
    }
}

/// Integer with thousands separators.
pub fn grouped_int(value: u64) -> String {
    group_digits(&value.to_string())
}

/// `+` for non-negative values, nothing otherwise (the `-` comes from the number).
fn sign_prefix(value: f64) -> &'static str {
    if value >= 0.0 { "+" } else { "" }
}

/// Price with currency marker, e.g. `$1,234.56`.
pub fn price(value: Option<f64>, currency: &str) -> String {
    match value {
        Some(v) if v < 0.0 => format!("-{}{}", currency_marker(currency), grouped(-v, 2)),
        Some(v) => format!("{}{}", currency_marker(currency), grouped(v, 2)),
        None => UNAVAILABLE.into(),
    }
}

/// Signed amount, e.g. `+2.66`.
pub fn signed(value: f64, decimals: usize) -> String {
    format!("{}{}", sign_prefix(value), grouped(value, decimals))
}

/// Signed percentage with two decimals, e.g. `+1.11%`.
pub fn signed_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}{:.2}%", sign_prefix(v), v),
        None => UNAVAILABLE.into(),
    }
}

/// Day change as `+2.66 / +1.11%`, either half omitted when absent.
pub fn change(amount: Option<f64>, pct: Option<f64>) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(a) = amount {
        parts.push(signed(a, 2));
    }
    if pct.is_some() {
        parts.push(signed_pct(pct));
    }
    if parts.is_empty() {
        UNAVAILABLE.into()
    } else {
        parts.join(" / ")
    }
}

/// Large currency amount with T/B/M suffix, e.g. `$3.60T`.
pub fn large_amount(value: Option<u64>, currency: &str) -> String {
    let Some(v) = value else {
        return UNAVAILABLE.into();
    };
    let marker = currency_marker(currency);
    let v_f = v as f64;
    if v >= 1_000_000_000_000 {
        format!("{marker}{:.2}T", v_f / 1e12)
    } else if v >= 1_000_000_000 {
        format!("{marker}{:.2}B", v_f / 1e9)
    } else if v >= 1_000_000 {
        format!("{marker}{:.2}M", v_f / 1e6)
    } else {
        format!("{marker}{}", grouped_int(v))
    }
}

/// Share volume with M/K suffix, e.g. `55.0M`.
pub fn volume(value: Option<u64>) -> String {
    match value {
        None => UNAVAILABLE.into(),
        Some(v) if v >= 1_000_000 => format!("{:.1}M", v as f64 / 1e6),
        Some(v) if v >= 1_000 => format!("{:.1}K", v as f64 / 1e3),
        Some(v) => v.to_string(),
    }
}

/// Plain fixed-precision number.
pub fn decimal(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => UNAVAILABLE.into(),
    }
}

/// A fraction rendered as a percentage, e.g. `0.0044` → `0.44%`.
pub fn ratio_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => UNAVAILABLE.into(),
    }
}

/// ISO date or the unavailable marker.
pub fn date(value: Option<NaiveDate>) -> String {
    value.map_or_else(|| UNAVAILABLE.into(), |d| d.format("%Y-%m-%d").to_string())
}

/// Unix seconds as an ISO date.
pub fn unix_date(timestamp: Option<i64>) -> String {
    date(timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)).map(|dt| dt.date_naive()))
}

/// Long-form date, e.g. `February 5, 2026`.
pub fn long_date(value: NaiveDate) -> String {
    value.format("%B %-d, %Y").to_string()
}

/// Escape the two characters that could be read as section markup.
pub fn escape(text: &str) -> Cow<'_, str> {
    if text.contains(['<', '>']) {
        Cow::Owned(text.replace('<', "&lt;").replace('>', "&gt;"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Character length of `text` after [`escape`], without allocating.
pub fn escaped_len(text: &str) -> usize {
    text.chars()
        .map(|c| if c == '<' || c == '>' { 4 } else { 1 })
        .sum()
}

/// Escaped text or the unavailable marker; blank strings count as absent.
pub fn escape_or_unavailable(text: Option<&str>) -> Cow<'_, str> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => escape(t),
        None => Cow::Borrowed(UNAVAILABLE),
    }
}

/// First `max_chars` characters of `text`, and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Opening marker with `key="value"` attributes.
pub fn open_tag(name: &str, attrs: &[(&str, String)]) -> String {
    let mut tag = format!("<{name}");
    for (key, value) in attrs {
        tag.push_str(&format!(" {key}=\"{value}\""));
    }
    tag.push('>');
    tag
}
