//! Token type identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a token type (class), not an individual token instance.
///
/// Wide enough to hold multi-token-standard identifiers; the ledger only
/// ever compares and hashes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(u128);

impl TokenId {
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token#{}", self.0)
    }
}
