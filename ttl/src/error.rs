//! TTL configuration errors.

use ember_types::TokenId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TtlError {
    #[error("TTL not set for {0}")]
    NotSet(TokenId),

    #[error("TTL already set for {0}")]
    AlreadySet(TokenId),

    #[error("max slices for {0} is locked: TTL already configured")]
    MaxSlicesLocked(TokenId),

    #[error("max slices must be >= 1")]
    ZeroMaxSlices,
}
