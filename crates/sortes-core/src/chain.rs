//! Ledger collaborator interfaces
//!
//! The randomness core never owns chain state. Block application, the
//! witness registry and version activation are provided by the surrounding
//! ledger through these traits, queried synchronously while a block is being
//! applied.

use crate::crypto::PublicKey;
use crate::identifiers::AccountId;
use crate::params::ChainParameters;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commit-reveal protocol generation.
///
/// Each generation keeps its own record slot per account, so operations of
/// different generations never overwrite each other on the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ProtocolVersion {
    /// Plain hash, no epoch binding
    V1,
    /// Plain hash, exact epoch marker
    V2,
    /// Chained hash bound to epoch, witness key and previous seed
    V3,
}

impl ProtocolVersion {
    /// All generations, oldest first
    pub const ALL: [ProtocolVersion; 3] = [Self::V1, Self::V2, Self::V3];

    /// Whether operations of this generation carry an epoch marker
    pub fn has_epoch_marker(self) -> bool {
        !matches!(self, Self::V1)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
            Self::V3 => f.write_str("v3"),
        }
    }
}

/// Registered witnesses and their current block-signing keys
pub trait WitnessRegistry {
    /// Signing key of `account` if it is a registered witness
    fn signing_key(&self, account: &AccountId) -> Option<PublicKey>;
}

/// Read-only view of chain state at the block being applied.
pub trait ChainState: WitnessRegistry {
    /// Current timing parameters
    fn parameters(&self) -> ChainParameters;

    /// Timestamp of the head block
    fn head_block_time(&self) -> Timestamp;

    /// End of the current epoch; this is the current epoch marker
    fn next_maintenance_time(&self) -> Timestamp;

    /// End of the previous epoch, which is also the start of the current one
    fn last_maintenance_time(&self) -> Timestamp;

    /// Seed aggregated at the last maintenance
    fn previous_seed(&self) -> u64;

    /// Whether the activation condition for `version` holds
    fn is_version_active(&self, version: ProtocolVersion) -> bool;

    /// Newest generation whose activation condition holds
    fn latest_active_version(&self) -> ProtocolVersion {
        ProtocolVersion::ALL
            .into_iter()
            .rev()
            .find(|v| self.is_version_active(*v))
            .unwrap_or(ProtocolVersion::V1)
    }
}

/// Notification that a block has been applied to the local chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedBlock {
    /// Block height
    pub number: u64,
    /// Block timestamp
    pub timestamp: Timestamp,
    /// False while the node is still replaying or catching up with the network
    pub synchronized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Activation(Vec<ProtocolVersion>);

    impl WitnessRegistry for Activation {
        fn signing_key(&self, _account: &AccountId) -> Option<PublicKey> {
            None
        }
    }

    impl ChainState for Activation {
        fn parameters(&self) -> ChainParameters {
            ChainParameters::default()
        }
        fn head_block_time(&self) -> Timestamp {
            Timestamp::default()
        }
        fn next_maintenance_time(&self) -> Timestamp {
            Timestamp::default()
        }
        fn last_maintenance_time(&self) -> Timestamp {
            Timestamp::default()
        }
        fn previous_seed(&self) -> u64 {
            0
        }
        fn is_version_active(&self, version: ProtocolVersion) -> bool {
            self.0.contains(&version)
        }
    }

    #[test]
    fn test_latest_active_version() {
        assert_eq!(Activation(vec![]).latest_active_version(), ProtocolVersion::V1);
        assert_eq!(
            Activation(vec![ProtocolVersion::V1, ProtocolVersion::V2]).latest_active_version(),
            ProtocolVersion::V2
        );
        assert_eq!(
            Activation(ProtocolVersion::ALL.to_vec()).latest_active_version(),
            ProtocolVersion::V3
        );
    }

    #[test]
    fn test_version_ordering() {
        assert!(ProtocolVersion::V1 < ProtocolVersion::V3);
        assert!(!ProtocolVersion::V1.has_epoch_marker());
        assert!(ProtocolVersion::V3.has_epoch_marker());
    }
}
