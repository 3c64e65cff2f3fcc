//! Sortes Testing Infrastructure
//!
//! Fakes for the ledger collaborators and deterministic fixtures, shared by
//! the integration tests of every workspace crate.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! sortes-testkit = { path = "../sortes-testkit" }
//! ```

pub mod broadcast;
pub mod chain;
pub mod keys;

pub use broadcast::RecordingBroadcaster;
pub use chain::MockChain;
pub use keys::{account, KeyTestFixture};

/// Install a test-writer subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
