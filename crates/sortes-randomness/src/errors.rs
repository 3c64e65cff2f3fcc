//! Commit-reveal rejection taxonomy
//!
//! Every rejection is recoverable: the operation is dropped and the ledger is
//! left untouched. `ValidationError` covers malformed or out-of-window input;
//! `ApplyError` adds the failures that depend on stored records.

use sortes_core::{AccountId, ProtocolVersion, Timestamp};
use std::fmt;

/// Stable machine-readable code for a protocol error
pub trait ProtocolErrorCode {
    /// snake_case identifier that never changes across releases
    fn code(&self) -> &'static str;
}

/// Which half of the epoch an operation needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// First half
    Commit,
    /// Second half
    Reveal,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowKind::Commit => f.write_str("commit"),
            WindowKind::Reveal => f.write_str("reveal"),
        }
    }
}

/// Malformed, mistimed or unauthorized operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Empty commitment, zero reveal, wrong epoch marker
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// What was wrong
        reason: String,
    },

    /// Operation arrived outside its half of the epoch
    #[error("{window} window closed at {now} (epoch {epoch_marker})")]
    WindowClosed {
        /// Window the operation needed
        window: WindowKind,
        /// Block time of evaluation
        now: Timestamp,
        /// Current epoch marker
        epoch_marker: Timestamp,
    },

    /// Account is not a registered witness
    #[error("{account} is not a registered witness")]
    UnknownWitness {
        /// Submitting account
        account: AccountId,
    },

    /// Declared witness key differs from the registered signing key
    #[error("witness key of {account} does not match its registered signing key")]
    KeyMismatch {
        /// Submitting account
        account: AccountId,
    },

    /// Activation condition for the operation's generation does not hold
    #[error("protocol {version} is not active")]
    VersionInactive {
        /// Generation of the rejected operation
        version: ProtocolVersion,
    },
}

impl ValidationError {
    /// Create an invalid input error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl ProtocolErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidInput { .. } => "commit_reveal_invalid_input",
            ValidationError::WindowClosed { .. } => "commit_reveal_window_closed",
            ValidationError::UnknownWitness { .. } => "commit_reveal_unknown_witness",
            ValidationError::KeyMismatch { .. } => "commit_reveal_key_mismatch",
            ValidationError::VersionInactive { .. } => "commit_reveal_version_inactive",
        }
    }
}

/// Rejection raised while evaluating an operation against the ledger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// Stateless or chain-level validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A commit for this epoch already exists
    #[error("{account} already committed for epoch {epoch_marker}")]
    DuplicateCommit {
        /// Committing account
        account: AccountId,
        /// Epoch already committed to
        epoch_marker: Timestamp,
    },

    /// No commit to reveal against
    #[error("no matching commitment from {account}")]
    NoSuchCommit {
        /// Revealing account
        account: AccountId,
    },

    /// The commitment was already opened
    #[error("{account} already revealed for this epoch")]
    AlreadyRevealed {
        /// Revealing account
        account: AccountId,
    },

    /// Revealed value does not hash to the stored commitment
    #[error("revealed value does not open the commitment of {account}")]
    HashMismatch {
        /// Revealing account
        account: AccountId,
    },
}

impl ProtocolErrorCode for ApplyError {
    fn code(&self) -> &'static str {
        match self {
            ApplyError::Validation(inner) => inner.code(),
            ApplyError::DuplicateCommit { .. } => "commit_reveal_duplicate_commit",
            ApplyError::NoSuchCommit { .. } => "commit_reveal_no_such_commit",
            ApplyError::AlreadyRevealed { .. } => "commit_reveal_already_revealed",
            ApplyError::HashMismatch { .. } => "commit_reveal_hash_mismatch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through_validation() {
        let err = ApplyError::from(ValidationError::invalid("zero value"));
        assert_eq!(err.code(), "commit_reveal_invalid_input");
        assert_eq!(err.to_string(), "Invalid input: zero value");
    }

    #[test]
    fn test_window_closed_message() {
        let err = ValidationError::WindowClosed {
            window: WindowKind::Reveal,
            now: Timestamp::from_secs(10),
            epoch_marker: Timestamp::from_secs(180),
        };
        assert_eq!(err.to_string(), "reveal window closed at 10 (epoch 180)");
    }
}
