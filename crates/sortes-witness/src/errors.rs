//! Witness-side errors
//!
//! None of these reach protocol state. Broadcast failures are logged by the
//! scheduler and dropped; scheduler errors only surface at construction.

use sortes_core::{AccountId, SortesError};

/// Failure to hand a transaction to the network
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastError {
    /// The receiving node refused the transaction
    #[error("transaction rejected: {reason}")]
    Rejected {
        /// Reason given by the receiver
        reason: String,
    },

    /// Network or RPC failure
    #[error("transport failure: {message}")]
    Transport {
        /// Underlying failure
        message: String,
    },

    /// The submission queue is gone
    #[error("submission channel closed")]
    ChannelClosed,

    /// Encoding or signature failure
    #[error("signing failed: {message}")]
    Signing {
        /// Underlying failure
        message: String,
    },
}

impl BroadcastError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a signing error
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }
}

/// Scheduler construction errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Invalid node configuration
    #[error("configuration error: {0}")]
    Config(#[from] SortesError),

    /// A configured signing key could not be loaded
    #[error("signing key for {account} is unusable: {reason}")]
    Keyring {
        /// Witness whose key failed
        account: AccountId,
        /// What was wrong
        reason: String,
    },

    /// OS entropy was unavailable
    #[error("entropy source unavailable: {message}")]
    Entropy {
        /// Underlying failure
        message: String,
    },
}
