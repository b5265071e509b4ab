//! Nullable infrastructure — deterministic substitutes for ambient
//! effects. The ledger itself never reads wall-clock time; tests drive
//! it with a `NullClock` and pass `now` explicitly.

pub mod clock;

pub use clock::NullClock;
