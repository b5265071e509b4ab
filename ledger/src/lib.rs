//! Time-bucketed expiring balance ledger.
//!
//! Each (owner, token) pair holds a shelf of balance slices, each slice
//! carrying its own expiration instant. Credits land in coarse time
//! buckets so a shelf never accumulates more than a bounded number of
//! distinct expirations; debits consume the soonest-expiring balance
//! first; transfers preserve the remaining lifetime of what they move.
//! Expiration is evaluated lazily against the `now` passed into every
//! operation — there is no background sweep.

pub mod bucket;
pub mod error;
pub mod ledger;
pub mod shelf;
pub mod slice;

pub use bucket::bucketed_expiry;
pub use error::LedgerError;
pub use ledger::{EphemeralLedger, LedgerSummary};
pub use shelf::SliceShelf;
pub use slice::Slice;
