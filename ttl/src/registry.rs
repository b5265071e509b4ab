//! The TTL registry — per-token configuration with set-once semantics.

use std::collections::HashMap;

use ember_types::TokenId;
use serde::{Deserialize, Serialize};

use crate::config::TtlConfig;
use crate::error::TtlError;

/// Per-token TTL and slice-bound configuration.
///
/// `set_ttl` fires at most once per token type; any later attempt is
/// rejected with `AlreadySet`. The slice bound may be overridden per
/// token only while the token is still unconfigured, because the bucket
/// size derived from `(ttl, max_slices)` must stay fixed for the life of
/// every slice minted under it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TtlRegistry {
    ttls: HashMap<TokenId, TtlConfig>,
    max_slices_overrides: HashMap<TokenId, u32>,
    /// Bound used for tokens without an override. Must be >= 1.
    default_max_slices: u32,
}

impl TtlRegistry {
    pub fn new(default_max_slices: u32) -> Result<Self, TtlError> {
        if default_max_slices == 0 {
            return Err(TtlError::ZeroMaxSlices);
        }
        Ok(Self {
            ttls: HashMap::new(),
            max_slices_overrides: HashMap::new(),
            default_max_slices,
        })
    }

    /// Configure the TTL for a token type. `ttl_secs == 0` means the
    /// token's balances never expire.
    pub fn set_ttl(&mut self, token: TokenId, ttl_secs: u64) -> Result<(), TtlError> {
        match self.ttls.get(&token) {
            Some(TtlConfig::Configured { .. }) => Err(TtlError::AlreadySet(token)),
            _ => {
                self.ttls.insert(token, TtlConfig::Configured { ttl_secs });
                Ok(())
            }
        }
    }

    /// The configured TTL for a token type, or `NotSet`.
    pub fn ttl(&self, token: TokenId) -> Result<u64, TtlError> {
        match self.ttls.get(&token) {
            Some(TtlConfig::Configured { ttl_secs }) => Ok(*ttl_secs),
            _ => Err(TtlError::NotSet(token)),
        }
    }

    /// The raw configuration state for a token type.
    pub fn config(&self, token: TokenId) -> TtlConfig {
        self.ttls.get(&token).copied().unwrap_or_default()
    }

    /// Override the slice bound for a token type. Only permitted while
    /// the token's TTL is still unconfigured.
    pub fn set_max_slices(&mut self, token: TokenId, max_slices: u32) -> Result<(), TtlError> {
        if max_slices == 0 {
            return Err(TtlError::ZeroMaxSlices);
        }
        if self.config(token).is_configured() {
            return Err(TtlError::MaxSlicesLocked(token));
        }
        self.max_slices_overrides.insert(token, max_slices);
        Ok(())
    }

    /// The slice bound for a token type (override or global default).
    pub fn max_slices(&self, token: TokenId) -> u32 {
        self.max_slices_overrides
            .get(&token)
            .copied()
            .unwrap_or(self.default_max_slices)
    }
}
