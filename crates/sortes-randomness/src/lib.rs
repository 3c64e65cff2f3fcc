//! # Sortes Randomness
//!
//! Commit-reveal randomness for a witness-produced chain. Each maintenance
//! epoch is split in two halves: witnesses publish a hash of a secret during
//! the first and open it during the second. The wrapping sum of the opened
//! secrets is the epoch's seed.
//!
//! This crate is pure: it reads chain state through
//! [`sortes_core::ChainState`] and never performs I/O. The scheduling side
//! lives in `sortes-witness`.

#![forbid(unsafe_code)]

pub mod epoch;
pub mod errors;
pub mod evaluator;
pub mod hash_chain;
pub mod ledger;
pub mod operations;

pub use epoch::{EpochClock, EpochPhase, EpochWindow};
pub use errors::{ApplyError, ProtocolErrorCode, ValidationError, WindowKind};
pub use evaluator::CommitRevealEvaluator;
pub use hash_chain::{chained_commitment, commitment, plain_commitment, HashInputs};
pub use ledger::{CommitRevealLedger, CommitRevealRecord, ObjectRef, RecordKey};
pub use operations::{
    CommitOperation, CommitRevealOperation, ProtocolBinding, RevealOperation,
};
