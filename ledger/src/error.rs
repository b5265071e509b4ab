//! Ledger errors.
//!
//! Every error is terminal for the operation that raised it: nothing is
//! retried or partially committed.

use ember_ttl::TtlError;
use ember_types::{Amount, OwnerAddress, TokenId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error(
        "insufficient balance for {account} on {token}: requested {requested}, available {available}"
    )]
    InsufficientBalance {
        account: OwnerAddress,
        token: TokenId,
        available: Amount,
        requested: Amount,
    },

    #[error("balance overflow for {account} on {token}: slice amount would exceed capacity")]
    AmountOverflow {
        account: OwnerAddress,
        token: TokenId,
    },

    #[error(transparent)]
    Ttl(#[from] TtlError),
}
