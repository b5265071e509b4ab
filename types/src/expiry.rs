//! Expiration instant with a "never expires" sentinel.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The instant at which a balance slice stops being usable.
///
/// `Expiry::NEVER` (`u64::MAX`) means the slice is permanent. The expiry
/// boundary is strict: a slice is live only while `expires_at > now`, so
/// a slice expiring exactly at `now` contributes nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Expiry(u64);

impl Expiry {
    /// Sentinel for "never expires".
    pub const NEVER: Self = Self(u64::MAX);

    pub fn at(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn is_never(&self) -> bool {
        self.0 == u64::MAX
    }

    /// Whether this expiry has passed at `now`. `NEVER` never expires.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        !self.is_never() && self.0 <= now.as_secs()
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            write!(f, "never")
        } else {
            write!(f, "{}s", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_strict() {
        let e = Expiry::at(100);
        assert!(e.is_expired_at(Timestamp::new(100)));
        assert!(e.is_expired_at(Timestamp::new(101)));
        assert!(!e.is_expired_at(Timestamp::new(99)));
    }

    #[test]
    fn never_does_not_expire() {
        assert!(!Expiry::NEVER.is_expired_at(Timestamp::new(u64::MAX)));
        assert!(Expiry::NEVER.is_never());
    }
}
