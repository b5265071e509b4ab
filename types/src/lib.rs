//! Fundamental types for the EMBER ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: owner addresses, token identifiers, amounts, timestamps,
//! expiration instants, and the global ledger parameters.

pub mod address;
pub mod amount;
pub mod expiry;
pub mod params;
pub mod time;
pub mod token;

pub use address::OwnerAddress;
pub use amount::Amount;
pub use expiry::Expiry;
pub use params::LedgerParams;
pub use time::Timestamp;
pub use token::TokenId;
