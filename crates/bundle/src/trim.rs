//! Tail-first trimming of a pre-ordered collection against a size budget.

use crate::estimate::{SizeEstimate, estimate_collection};

/// Drop items from the end of `items` until its estimate fits `budget`.
///
/// The collection must already be ordered most-valuable first (news newest
/// first, posts by descending score); this function never reorders.
/// Returns the surviving items and how many were removed.
pub fn trim<T: SizeEstimate>(mut items: Vec<T>, budget: usize) -> (Vec<T>, usize) {
    let mut removed = 0;
    while !items.is_empty() && estimate_collection(&items) > budget {
        items.pop();
        removed += 1;
    }
    (items, removed)
}
