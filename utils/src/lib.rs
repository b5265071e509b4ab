//! Shared utilities for the EMBER ledger.

pub mod logging;

pub use logging::init_tracing;
