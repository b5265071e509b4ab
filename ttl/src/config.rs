//! TTL configuration state for a single token type.

use serde::{Deserialize, Serialize};

/// Lifetime configuration of one token type.
///
/// A tagged variant rather than a bool+value pair: "explicitly configured
/// as zero" (permanent balances) and "never configured" are different
/// states with different behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtlConfig {
    /// No TTL has been set for this token type yet.
    Unconfigured,
    /// TTL has been set. `ttl_secs == 0` means balances never expire.
    Configured {
        /// Lifetime in seconds granted to each credited amount.
        ttl_secs: u64,
    },
}

impl TtlConfig {
    pub fn is_configured(&self) -> bool {
        matches!(self, TtlConfig::Configured { .. })
    }

    /// The configured TTL, if any.
    pub fn ttl_secs(&self) -> Option<u64> {
        match self {
            TtlConfig::Unconfigured => None,
            TtlConfig::Configured { ttl_secs } => Some(*ttl_secs),
        }
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        TtlConfig::Unconfigured
    }
}
