//! Size estimation for the variable-length sections.
//!
//! Estimates are a fast proxy for the rendered length: the variable fields
//! (escaped, and capped exactly as the section builders cap them) plus a fixed
//! per-item overhead for labels and markup. The overheads are chosen so an
//! item's estimate never falls below its rendered length, and every estimate
//! is non-negative, so dropping an item never increases a collection's total.

use crate::format::{UNAVAILABLE, escaped_len};
use crate::sections::{MAX_COMMENT_CHARS, MAX_COMMENTS_PER_POST, MAX_POST_BODY_CHARS};
use tickerlens_core::market::{Comment, NewsItem, SocialPost};

/// Labels, index, timestamp and separators around one news item.
pub const NEWS_ITEM_OVERHEAD: usize = 80;
/// Labels, counters, dates and separators around one social post.
pub const POST_OVERHEAD: usize = 150;
/// Bullet, score and indentation around one comment.
pub const COMMENT_OVERHEAD: usize = 20;

/// Approximate rendered size in characters.
pub trait SizeEstimate {
    fn estimated_chars(&self) -> usize;
}

/// Rendered length of an optional field, which is never shorter than the marker.
fn optional_len(text: Option<&str>) -> usize {
    text.map_or(0, escaped_len).max(UNAVAILABLE.len())
}

impl SizeEstimate for NewsItem {
    fn estimated_chars(&self) -> usize {
        escaped_len(&self.title)
            + optional_len(self.summary.as_deref())
            + optional_len(self.source.as_deref())
            + optional_len(self.provider.as_deref())
            + NEWS_ITEM_OVERHEAD
    }
}

impl SizeEstimate for Comment {
    fn estimated_chars(&self) -> usize {
        escaped_len(&self.body).min(MAX_COMMENT_CHARS) + COMMENT_OVERHEAD
    }
}

impl SizeEstimate for SocialPost {
    fn estimated_chars(&self) -> usize {
        let comments: usize = self
            .top_comments
            .iter()
            .take(MAX_COMMENTS_PER_POST)
            .map(SizeEstimate::estimated_chars)
            .sum();

        escaped_len(&self.title)
            + escaped_len(&self.channel)
            + optional_len(self.body.as_deref()).min(MAX_POST_BODY_CHARS)
            + comments
            + POST_OVERHEAD
    }
}

/// Total estimate for a collection.
pub fn estimate_collection<T: SizeEstimate>(items: &[T]) -> usize {
    items.iter().map(SizeEstimate::estimated_chars).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{news_section, social_section};
    use tickerlens_core::market::SocialStats;

    fn news(title: &str, summary: Option<&str>) -> NewsItem {
        NewsItem {
            title: title.into(),
            summary: summary.map(str::to_string),
            source: Some("Bloomberg".into()),
            published_at: Some(chrono::Utc::now()),
            provider: Some("finnhub".into()),
        }
    }

    fn post(body: Option<String>, comments: usize) -> SocialPost {
        SocialPost {
            title: "Thoughts on earnings?".into(),
            body,
            score: 1_234,
            num_comments: 56_789,
            created_utc: Some(1_769_904_000),
            channel: "investing".into(),
            top_comments: (0..comments)
                .map(|i| Comment {
                    body: "c".repeat(50 * (i + 1)),
                    score: -12,
                })
                .collect(),
        }
    }

    #[test]
    fn news_estimate_counts_fields_and_overhead() {
        let item = news("abcd", Some("12345"));
        // 4 + 5 + 9 ("Bloomberg") + 7 ("finnhub") + overhead
        assert_eq!(item.estimated_chars(), 25 + NEWS_ITEM_OVERHEAD);
    }

    #[test]
    fn absent_fields_count_as_marker() {
        let mut item = news("abcd", None);
        item.source = None;
        item.provider = None;
        assert_eq!(item.estimated_chars(), 4 + 9 + NEWS_ITEM_OVERHEAD);
    }

    #[test]
    fn escaping_grows_estimate() {
        let plain = news("a b", None).estimated_chars();
        let marked = news("a<b", None).estimated_chars();
        assert_eq!(marked, plain + 3);
    }

    #[test]
    fn post_estimate_caps_body_and_comments() {
        let long = post(Some("x".repeat(5_000)), 5);
        let capped_body = MAX_POST_BODY_CHARS;
        let comments = (50 + 20) + (100 + 20) + (150 + 20);
        assert_eq!(
            long.estimated_chars(),
            21 + 9 + capped_body + comments + POST_OVERHEAD
        );
    }

    #[test]
    fn collection_estimate_is_monotonic() {
        let items: Vec<NewsItem> = (0..6)
            .map(|i| news(&format!("headline {i}"), Some("summary")))
            .collect();
        for n in 1..=items.len() {
            assert!(estimate_collection(&items[..n - 1]) <= estimate_collection(&items[..n]));
        }
        assert_eq!(estimate_collection::<NewsItem>(&[]), 0);
    }

    #[test]
    fn news_estimate_bounds_rendered_section() {
        let items: Vec<NewsItem> = (0..12)
            .map(|i| news(&format!("Headline <{i}>"), Some("A long enough summary.")))
            .collect();
        let shell = news_section(&[], 0).chars().count();
        let rendered = news_section(&items, 3).chars().count();
        assert!(rendered <= shell + estimate_collection(&items));
    }

    #[test]
    fn social_estimate_bounds_rendered_section() {
        let posts = vec![
            post(Some("y".repeat(900)), 4),
            post(None, 0),
            post(Some("<short>".into()), 1),
        ];
        let stats = SocialStats::from_posts(&posts);
        let shell = social_section(&[], &stats, 0).chars().count();
        let rendered = social_section(&posts, &stats, 2).chars().count();
        assert!(rendered <= shell + estimate_collection(&posts));
    }
}
