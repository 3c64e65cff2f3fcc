//! # Sortes Core
//!
//! Shared vocabulary for the witness commit-reveal randomness protocol.
//!
//! ## Contents
//!
//! - **identifiers**: `AccountId`, `TxId`
//! - **crypto**: SHA-2 digests and witness public keys
//! - **time**: block-time `Timestamp`
//! - **params**: `ChainParameters` (maintenance/block intervals, skip slots)
//! - **chain**: collaborator traits implemented by the surrounding ledger
//!   (`ChainState`, `WitnessRegistry`) and the `AppliedBlock` notification
//! - **config**: layered file + environment configuration
//! - **errors**: the unified `SortesError`

#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod identifiers;
pub mod params;
pub mod time;

pub use chain::{AppliedBlock, ChainState, ProtocolVersion, WitnessRegistry};
pub use config::SortesConfig;
pub use crypto::{sha256, sha512, Digest256, Digest512, PublicKey};
pub use errors::{Result, SortesError};
pub use identifiers::{AccountId, TxId};
pub use params::ChainParameters;
pub use time::Timestamp;
