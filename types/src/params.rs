//! Ledger parameters — the global tunables every crate agrees on.

use serde::{Deserialize, Serialize};

/// Global ledger parameters.
///
/// `default_max_slices` bounds the number of distinct expiration buckets a
/// (owner, token) shelf can accumulate; the shrink fields tune when prune
/// physically releases backing storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerParams {
    /// Slice-count bound used for expiration bucketing when a token type
    /// has no per-token override. Must be >= 1.
    pub default_max_slices: u32,

    /// Shelves shorter than this are never physically shrunk; truncation
    /// alone is cheap enough.
    pub shrink_min_len: usize,

    /// Shrink the backing storage when the surviving slice count falls
    /// below this fraction of the prior length (basis points, 5000 = 50%).
    pub shrink_ratio_bps: u32,
}

impl LedgerParams {
    /// Canonical defaults: 30 buckets, shrink below 50% past 10 entries.
    pub fn canonical() -> Self {
        Self {
            default_max_slices: 30,
            shrink_min_len: 10,
            shrink_ratio_bps: 5000,
        }
    }
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self::canonical()
    }
}
