//! Aggregate statistics over an OHLCV series.

use chrono::NaiveDate;
use serde::Serialize;
use tickerlens_core::market::PriceBar;

/// Closes per trend window; the classification compares two adjacent windows.
pub const TREND_WINDOW: usize = 5;

/// Relative difference between window means beyond which a trend is declared.
pub const TREND_THRESHOLD: f64 = 0.02;

/// Number of most recent bars shown in the price table.
pub const TABLE_BARS: usize = 10;

/// Direction of the most recent closes relative to the window before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Upward,
    Downward,
    Sideways,
}

impl Trend {
    /// Classify from closing prices, oldest first. Needs two full windows.
    pub fn classify(closes: &[f64]) -> Option<Self> {
        let n = closes.len();
        if n < TREND_WINDOW * 2 {
            return None;
        }

        let mean = |window: &[f64]| window.iter().sum::<f64>() / window.len() as f64;
        let recent = mean(&closes[n - TREND_WINDOW..]);
        let prior = mean(&closes[n - TREND_WINDOW * 2..n - TREND_WINDOW]);

        Some(if recent > prior * (1.0 + TREND_THRESHOLD) {
            Self::Upward
        } else if recent < prior * (1.0 - TREND_THRESHOLD) {
            Self::Downward
        } else {
            Self::Sideways
        })
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Upward => "Upward (last 5 days avg above prior 5 days)",
            Self::Downward => "Downward (last 5 days avg below prior 5 days)",
            Self::Sideways => "Sideways (last 5 days avg near prior 5 days)",
        }
    }
}

/// Summary of a non-empty bar series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub trading_days: usize,
    pub period_high: Option<f64>,
    pub period_low: Option<f64>,
    pub avg_volume: Option<u64>,
    pub trend: Option<Trend>,
    pub first_open: Option<f64>,
    pub last_close: Option<f64>,
    /// Percentage change from the first open to the last close.
    pub period_change_pct: Option<f64>,
}

impl PriceSummary {
    /// Summarize `bars` (oldest first). `None` for an empty series.
    pub fn from_bars(bars: &[PriceBar]) -> Option<Self> {
        let first = bars.first()?;
        let last = bars.last()?;

        let highs = bars.iter().filter_map(|b| b.high);
        let lows = bars.iter().filter_map(|b| b.low);
        let closes: Vec<f64> = bars.iter().filter_map(|b| b.close).collect();
        let volumes: Vec<u64> = bars.iter().filter_map(|b| b.volume).collect();

        let avg_volume = if volumes.is_empty() {
            None
        } else {
            Some(volumes.iter().sum::<u64>() / volumes.len() as u64)
        };

        let period_change_pct = match (first.open, last.close) {
            (Some(open), Some(close)) if open != 0.0 => Some((close - open) / open * 100.0),
            _ => None,
        };

        Some(Self {
            period_start: first.date,
            period_end: last.date,
            trading_days: bars.len(),
            period_high: highs.reduce(f64::max),
            period_low: lows.reduce(f64::min),
            avg_volume,
            trend: Trend::classify(&closes),
            first_open: first.open,
            last_close: last.close,
            period_change_pct,
        })
    }
}

/// The bars shown in the table: the last [`TABLE_BARS`] of the series.
pub fn table_window(bars: &[PriceBar]) -> &[PriceBar] {
    &bars[bars.len().saturating_sub(TABLE_BARS)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64, volume: u64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            open: Some(close - 1.0),
            high: Some(close + 2.0),
            low: Some(close - 2.0),
            close: Some(close),
            volume: Some(volume),
        }
    }

    fn series(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i as u32 + 1, c, 1_000))
            .collect()
    }

    #[test]
    fn trend_needs_ten_closes() {
        assert_eq!(Trend::classify(&[1.0; 9]), None);
        assert_eq!(Trend::classify(&[1.0; 10]), Some(Trend::Sideways));
    }

    #[test]
    fn trend_upward_above_two_percent() {
        let mut closes = vec![100.0; 5];
        closes.extend([103.0; 5]);
        assert_eq!(Trend::classify(&closes), Some(Trend::Upward));
    }

    #[test]
    fn trend_downward_below_two_percent() {
        let mut closes = vec![100.0; 5];
        closes.extend([97.0; 5]);
        assert_eq!(Trend::classify(&closes), Some(Trend::Downward));
    }

    #[test]
    fn trend_sideways_within_band() {
        let mut closes = vec![100.0; 5];
        closes.extend([101.5; 5]);
        assert_eq!(Trend::classify(&closes), Some(Trend::Sideways));
    }

    #[test]
    fn trend_uses_only_last_two_windows() {
        // Old history far below; last ten closes flat.
        let mut closes = vec![10.0; 20];
        closes.extend([100.0; 10]);
        assert_eq!(Trend::classify(&closes), Some(Trend::Sideways));
    }

    #[test]
    fn summary_of_empty_series_is_none() {
        assert!(PriceSummary::from_bars(&[]).is_none());
    }

    #[test]
    fn summary_statistics() {
        let bars = series(&[10.0, 12.0, 11.0]);
        let summary = PriceSummary::from_bars(&bars).unwrap();
        assert_eq!(summary.trading_days, 3);
        assert_eq!(summary.period_start, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(summary.period_end, NaiveDate::from_ymd_opt(2026, 1, 3).unwrap());
        assert_eq!(summary.period_high, Some(14.0));
        assert_eq!(summary.period_low, Some(8.0));
        assert_eq!(summary.avg_volume, Some(1_000));
        assert_eq!(summary.trend, None);
        // first open 9.0 → last close 11.0
        let pct = summary.period_change_pct.unwrap();
        assert!((pct - 22.2222).abs() < 1e-3);
    }

    #[test]
    fn zero_open_has_no_period_change() {
        let mut bars = series(&[10.0, 11.0]);
        bars[0].open = Some(0.0);
        assert_eq!(PriceSummary::from_bars(&bars).unwrap().period_change_pct, None);
    }

    #[test]
    fn missing_fields_are_skipped_in_aggregates() {
        let mut bars = series(&[10.0, 11.0]);
        bars[1].high = None;
        bars[1].volume = None;
        let summary = PriceSummary::from_bars(&bars).unwrap();
        assert_eq!(summary.period_high, Some(12.0));
        assert_eq!(summary.avg_volume, Some(1_000));
    }

    #[test]
    fn table_window_keeps_last_ten() {
        let bars = series(&[1.0; 25]);
        let window = table_window(&bars);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].date, bars[15].date);
        assert_eq!(table_window(&bars[..3]).len(), 3);
    }
}
