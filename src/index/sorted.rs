//! Page-blocked sorted index.
//!
//! Keys live in one sorted array; lookups narrow to a page-sized window
//! using endpoint comparisons before binary-searching inside the window, so
//! a range probe touches a handful of cache lines instead of striding across
//! the whole array. A clustered index stores nothing at all: the primary
//! column's base array *is* the key array, so every operation reads through
//! the base slice passed by the caller. An unclustered index owns its
//! `(key, position)` pairs, sorted lexicographically.

use crate::error::{BasaltError, BasaltResult};
use serde::{Deserialize, Serialize};

/// Keys per search page (one 4 KB page of `i32`).
pub const SORTED_PAGE_KEYS: usize = 1024;

/// A sorted index over a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SortedIndex {
    /// Reads through the primary column's base array; owns no data.
    Clustered,
    /// Owned `(key, position)` pairs sorted by `(key, position)`.
    Unclustered {
        keys: Vec<i32>,
        positions: Vec<usize>,
    },
}

impl SortedIndex {
    pub fn new_clustered() -> Self {
        Self::Clustered
    }

    pub fn new_unclustered() -> Self {
        Self::Unclustered {
            keys: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Builds an unclustered index from existing base data.
    pub fn build_unclustered(base: &[i32]) -> Self {
        let mut pairs: Vec<(i32, usize)> =
            base.iter().copied().zip(0..base.len()).collect();
        pairs.sort_unstable();
        Self::Unclustered {
            keys: pairs.iter().map(|&(k, _)| k).collect(),
            positions: pairs.iter().map(|&(_, p)| p).collect(),
        }
    }

    pub fn is_clustered(&self) -> bool {
        matches!(self, Self::Clustered)
    }

    /// Returns all positions whose key lies in `[low, high)`.
    ///
    /// Clustered results are the contiguous base-index range; unclustered
    /// results come back in `(key, position)` order.
    pub fn get_range(&self, base: &[i32], low: i64, high: i64) -> Vec<usize> {
        if low >= high {
            return Vec::new();
        }
        match self {
            Self::Clustered => {
                let lo = lower_bound_paged(base, low);
                let hi = lower_bound_paged(base, high);
                (lo..hi).collect()
            }
            Self::Unclustered { keys, positions } => {
                let lo = lower_bound_paged(keys, low);
                let hi = lower_bound_paged(keys, high);
                positions[lo..hi].to_vec()
            }
        }
    }

    /// Inserts `(key, pos)` into an unclustered index, bumping stored
    /// positions at or after `pos` to reflect the base-array insertion.
    ///
    /// A clustered index reads through the base array; inserting into it
    /// directly would desynchronise it from the primary column.
    pub fn insert(&mut self, key: i32, pos: usize) -> BasaltResult<()> {
        match self {
            Self::Clustered => Err(BasaltError::InvariantViolation {
                reason: "insert into a clustered sorted index".to_string(),
            }),
            Self::Unclustered { keys, positions } => {
                // The new row displaces every existing row at or after pos,
                // unless it is appended past the current end.
                if pos < keys.len() {
                    for p in positions.iter_mut() {
                        if *p >= pos {
                            *p += 1;
                        }
                    }
                }
                let mut at = lower_bound_paged(keys, key as i64);
                while at < keys.len() && keys[at] == key && positions[at] < pos {
                    at += 1;
                }
                keys.insert(at, key);
                positions.insert(at, pos);
                Ok(())
            }
        }
    }

    /// Number of indexed entries (unclustered only; a clustered index is as
    /// long as its base array).
    pub fn len(&self) -> usize {
        match self {
            Self::Clustered => 0,
            Self::Unclustered { keys, .. } => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first key `>=` value in a base slice; used by the
    /// clustered-primary insert path to place a new row.
    pub fn find_insert_position(base: &[i32], value: i32) -> usize {
        lower_bound_paged(base, value as i64)
    }
}

/// First index whose key is `>=` value, found page-blocked.
///
/// The outer loop compares only page-boundary keys to decide which page can
/// hold the answer; the inner search is a plain binary search confined to
/// one page.
pub fn lower_bound_paged(keys: &[i32], value: i64) -> usize {
    let mut lo = 0usize;
    let mut hi = keys.len();
    while hi - lo > SORTED_PAGE_KEYS {
        let mid = lo + (hi - lo) / 2;
        let page_lo = mid - (mid % SORTED_PAGE_KEYS);
        let page_hi = (page_lo + SORTED_PAGE_KEYS).min(hi);
        if (keys[page_lo] as i64) >= value {
            // answer is at or before the page start
            hi = page_lo;
        } else if ((keys[page_hi - 1]) as i64) < value {
            // answer is past the page end
            lo = page_hi;
        } else {
            lo = page_lo;
            hi = page_hi;
            break;
        }
    }
    lo + keys[lo..hi].partition_point(|&k| (k as i64) < value)
}
