//! Structured logging initialization via `tracing`.

/// Install the tracing subscriber with sensible defaults.
///
/// Respects the `RUST_LOG` environment variable for filtering — set it
/// to `ember_ledger=debug` to surface shelf maintenance events. Safe to
/// call more than once: later calls are no-ops, so tests can install it
/// ad hoc without coordinating.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
