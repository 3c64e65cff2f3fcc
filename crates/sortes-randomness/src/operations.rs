//! Commit and reveal operations
//!
//! The three protocol generations share one operation shape. What differs is
//! carried by [`ProtocolBinding`]: nothing for v1, the epoch marker for v2,
//! the epoch marker plus the witness's signing key for v3. Evaluation
//! dispatches on the binding instead of keeping one code path per version.

use crate::errors::{ApplyError, ValidationError};
use crate::evaluator::CommitRevealEvaluator;
use crate::hash_chain::HashInputs;
use crate::ledger::{CommitRevealLedger, ObjectRef};
use serde::{Deserialize, Serialize};
use sortes_core::{AccountId, ChainState, Digest512, ProtocolVersion, PublicKey, Timestamp};

/// Version-specific fields of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolBinding {
    /// No epoch binding
    V1,
    /// Bound to the exact current epoch
    V2 {
        /// Targeted epoch
        epoch_marker: Timestamp,
    },
    /// Bound to epoch, witness identity and previous seed
    V3 {
        /// Targeted epoch
        epoch_marker: Timestamp,
        /// Witness's registered signing key
        witness_key: PublicKey,
    },
}

impl ProtocolBinding {
    /// Generation this binding belongs to
    pub fn version(&self) -> ProtocolVersion {
        match self {
            ProtocolBinding::V1 => ProtocolVersion::V1,
            ProtocolBinding::V2 { .. } => ProtocolVersion::V2,
            ProtocolBinding::V3 { .. } => ProtocolVersion::V3,
        }
    }

    /// Epoch marker, absent for v1
    pub fn epoch_marker(&self) -> Option<Timestamp> {
        match self {
            ProtocolBinding::V1 => None,
            ProtocolBinding::V2 { epoch_marker } | ProtocolBinding::V3 { epoch_marker, .. } => {
                Some(*epoch_marker)
            }
        }
    }

    /// Witness key, present only for v3
    pub fn witness_key(&self) -> Option<PublicKey> {
        match self {
            ProtocolBinding::V3 { witness_key, .. } => Some(*witness_key),
            _ => None,
        }
    }

    /// Hash scheme inputs; `prev_seed` only matters for v3
    pub fn hash_inputs(&self, prev_seed: u64) -> HashInputs {
        match self {
            ProtocolBinding::V1 | ProtocolBinding::V2 { .. } => HashInputs::Plain,
            ProtocolBinding::V3 {
                epoch_marker,
                witness_key,
            } => HashInputs::Chained {
                epoch_marker: *epoch_marker,
                witness_key: *witness_key,
                prev_seed,
            },
        }
    }
}

/// Publish a commitment to a secret for the current epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOperation {
    /// Committing witness
    pub account: AccountId,
    /// Commitment hash
    pub commitment: Digest512,
    /// Version-specific fields
    pub binding: ProtocolBinding,
}

impl CommitOperation {
    /// Stateless checks
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.commitment.is_empty() {
            return Err(ValidationError::invalid("commitment hash is empty"));
        }
        Ok(())
    }
}

/// Open a previously published commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealOperation {
    /// Revealing witness
    pub account: AccountId,
    /// The secret
    pub value: u64,
    /// Version-specific fields; must match the commit's
    pub binding: ProtocolBinding,
}

impl RevealOperation {
    /// Stateless checks. Zero means "not revealed" from v2 on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.value == 0 && self.binding.version() >= ProtocolVersion::V2 {
            return Err(ValidationError::invalid("revealed value must be non-zero"));
        }
        Ok(())
    }
}

/// Ledger-executable commit-reveal operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitRevealOperation {
    /// Commit
    Commit(CommitOperation),
    /// Reveal
    Reveal(RevealOperation),
}

impl CommitRevealOperation {
    /// Submitting account
    pub fn account(&self) -> &AccountId {
        match self {
            CommitRevealOperation::Commit(op) => &op.account,
            CommitRevealOperation::Reveal(op) => &op.account,
        }
    }

    /// Version-specific fields
    pub fn binding(&self) -> &ProtocolBinding {
        match self {
            CommitRevealOperation::Commit(op) => &op.binding,
            CommitRevealOperation::Reveal(op) => &op.binding,
        }
    }

    /// Protocol generation
    pub fn version(&self) -> ProtocolVersion {
        self.binding().version()
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            CommitRevealOperation::Commit(_) => "commit",
            CommitRevealOperation::Reveal(_) => "reveal",
        }
    }

    /// Fee charged for the operation. Always zero: committing and revealing
    /// are duties of every witness.
    pub fn fee(&self) -> u64 {
        0
    }

    /// Cheap stateless syntactic checks
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            CommitRevealOperation::Commit(op) => op.validate(),
            CommitRevealOperation::Reveal(op) => op.validate(),
        }
    }

    /// Validate against chain state and, if every check passes, mutate the ledger.
    pub fn apply(
        &self,
        ledger: &mut CommitRevealLedger,
        chain: &dyn ChainState,
    ) -> Result<ObjectRef, ApplyError> {
        CommitRevealEvaluator::new(chain)?.evaluate(ledger, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_chain::plain_commitment;

    fn alice() -> AccountId {
        AccountId::new("alice").unwrap()
    }

    #[test]
    fn test_commit_rejects_empty_hash() {
        let op = CommitOperation {
            account: alice(),
            commitment: Digest512::EMPTY,
            binding: ProtocolBinding::V1,
        };
        assert!(matches!(op.validate(), Err(ValidationError::InvalidInput { .. })));
    }

    #[test]
    fn test_reveal_zero_allowed_only_in_v1() {
        let mut op = RevealOperation {
            account: alice(),
            value: 0,
            binding: ProtocolBinding::V1,
        };
        assert!(op.validate().is_ok());

        op.binding = ProtocolBinding::V2 {
            epoch_marker: Timestamp::from_secs(180),
        };
        assert!(op.validate().is_err());
    }

    #[test]
    fn test_binding_accessors() {
        let key = PublicKey([1u8; 32]);
        let marker = Timestamp::from_secs(360);
        let v3 = ProtocolBinding::V3 {
            epoch_marker: marker,
            witness_key: key,
        };
        assert_eq!(v3.version(), ProtocolVersion::V3);
        assert_eq!(v3.epoch_marker(), Some(marker));
        assert_eq!(v3.witness_key(), Some(key));
        assert!(matches!(v3.hash_inputs(9), HashInputs::Chained { prev_seed: 9, .. }));
        assert_eq!(ProtocolBinding::V1.hash_inputs(9), HashInputs::Plain);
        assert_eq!(ProtocolBinding::V1.epoch_marker(), None);
    }

    #[test]
    fn test_fee_is_zero() {
        let op = CommitRevealOperation::Commit(CommitOperation {
            account: alice(),
            commitment: plain_commitment(7),
            binding: ProtocolBinding::V1,
        });
        assert_eq!(op.fee(), 0);
        assert_eq!(op.kind(), "commit");
        assert_eq!(op.account(), &alice());
    }
}
