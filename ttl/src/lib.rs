//! Per-token TTL configuration.
//!
//! Each token type carries a tri-state lifetime: unconfigured, or
//! configured with a time-to-live in seconds (`0` = never expires).
//! Configuration is set-once — the bucketing math in the ledger assumes
//! the TTL and slice bound of a token never change after the first slice
//! could have been written under them.

pub mod config;
pub mod error;
pub mod registry;

pub use config::TtlConfig;
pub use error::TtlError;
pub use registry::TtlRegistry;
