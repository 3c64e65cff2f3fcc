//! # Sortes Witness
//!
//! Node-side half of the commit-reveal protocol: decides when each locally
//! controlled witness commits and reveals, builds and signs the transactions,
//! and hands them to a broadcaster without blocking block application.
//!
//! - **config**: `WitnessNodeConfig`, loaded through `SortesConfig`
//! - **keyring**: cached witness signing keys
//! - **transaction**: bincode-encoded, ed25519-signed transactions
//! - **broadcast**: synchronous submission and the queued async adapter
//! - **schedule**: per-epoch offset drawing
//! - **scheduler**: `WitnessScheduler`, driven by block-applied events

#![forbid(unsafe_code)]

pub mod broadcast;
pub mod config;
pub mod errors;
pub mod keyring;
pub mod schedule;
pub mod scheduler;
pub mod transaction;

pub use broadcast::{spawn_submission_task, QueuedBroadcaster, TransactionBroadcaster, TransactionSink};
pub use config::{SigningKeyEntry, WitnessNodeConfig, DEFAULT_REVEAL_BIAS};
pub use errors::{BroadcastError, SchedulerError};
pub use keyring::WitnessKeyring;
pub use schedule::{EpochSchedule, ScheduleEntry};
pub use scheduler::WitnessScheduler;
pub use transaction::{SignedTransaction, Transaction, TX_EXPIRATION_SECS};
