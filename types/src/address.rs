//! Owner address type with `embr_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EMBER owner address, always prefixed with `embr_`.
///
/// The ledger treats addresses as opaque keys; how they are derived
/// (public keys, contract accounts, …) is the caller's concern.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerAddress(String);

impl OwnerAddress {
    /// The standard prefix for all EMBER owner addresses.
    pub const PREFIX: &'static str = "embr_";

    /// Create a new owner address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `embr_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with embr_");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for OwnerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
