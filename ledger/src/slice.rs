//! A single balance slice.

use ember_types::{Amount, Expiry, Timestamp};
use serde::{Deserialize, Serialize};

/// One amount+expiration record within a shelf.
///
/// A slice with `amount == 0` is logically absent and removed by the
/// next prune.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub amount: Amount,
    pub expires_at: Expiry,
}

impl Slice {
    pub fn new(amount: Amount, expires_at: Expiry) -> Self {
        Self { amount, expires_at }
    }

    /// Whether this slice still carries usable balance at `now`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        !self.amount.is_zero() && !self.expires_at.is_expired_at(now)
    }
}
