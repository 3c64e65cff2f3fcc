//! Commit-reveal evaluation
//!
//! One evaluator serves all protocol generations. Checks run in a fixed
//! order and the first failure wins; the ledger is only touched once every
//! check has passed.
//!
//! Commit: stateless validation, version activation, epoch marker, duplicate,
//! witness identity (v3), commit window.
//!
//! Reveal: stateless validation, version activation, matching commit,
//! already revealed, hash opening, witness identity (v3), epoch marker still
//! open, reveal window.

use crate::epoch::EpochClock;
use crate::errors::{ApplyError, ProtocolErrorCode, ValidationError, WindowKind};
use crate::hash_chain;
use crate::ledger::{CommitRevealLedger, ObjectRef};
use crate::operations::{CommitOperation, CommitRevealOperation, RevealOperation};
use sortes_core::{AccountId, ChainState, ProtocolVersion, PublicKey, Timestamp};
use std::ops::RangeInclusive;

/// Evaluates operations against a chain snapshot
pub struct CommitRevealEvaluator<'a> {
    chain: &'a dyn ChainState,
    clock: EpochClock,
}

impl<'a> CommitRevealEvaluator<'a> {
    /// Bind to the chain state of the block being applied.
    pub fn new(chain: &'a dyn ChainState) -> Result<Self, ValidationError> {
        let clock = EpochClock::from_chain(chain)
            .map_err(|e| ValidationError::invalid(format!("chain parameters: {e}")))?;
        Ok(Self { chain, clock })
    }

    /// Validate `op` and apply it to `ledger`.
    pub fn evaluate(
        &self,
        ledger: &mut CommitRevealLedger,
        op: &CommitRevealOperation,
    ) -> Result<ObjectRef, ApplyError> {
        let result = self.check_and_apply(ledger, op);
        if let Err(err) = &result {
            tracing::debug!(
                account = %op.account(),
                kind = op.kind(),
                version = %op.version(),
                code = err.code(),
                error = %err,
                "commit-reveal operation rejected"
            );
        }
        result
    }

    fn check_and_apply(
        &self,
        ledger: &mut CommitRevealLedger,
        op: &CommitRevealOperation,
    ) -> Result<ObjectRef, ApplyError> {
        op.validate()?;
        self.ensure_active(op.version())?;

        match op {
            CommitRevealOperation::Commit(commit) => {
                self.check_commit(ledger, commit)?;
                Ok(ledger.commit(
                    commit.binding.version(),
                    commit.account.clone(),
                    commit.commitment,
                    commit.binding.epoch_marker(),
                    commit.binding.witness_key(),
                ))
            }
            CommitRevealOperation::Reveal(reveal) => {
                self.check_reveal(ledger, reveal)?;
                ledger
                    .reveal(reveal.binding.version(), &reveal.account, reveal.value)
                    .ok_or_else(|| ApplyError::NoSuchCommit {
                        account: reveal.account.clone(),
                    })
            }
        }
    }

    fn check_commit(
        &self,
        ledger: &CommitRevealLedger,
        op: &CommitOperation,
    ) -> Result<(), ApplyError> {
        let current = self.chain.next_maintenance_time();

        if let Some(epoch_marker) = op.binding.epoch_marker() {
            let accepted = self.accepted_markers(op.binding.version());
            if !accepted.contains(&epoch_marker) {
                return Err(ValidationError::invalid(format!(
                    "epoch marker {epoch_marker} is outside [{}, {}]",
                    accepted.start(),
                    accepted.end()
                ))
                .into());
            }

            let existing = ledger
                .find(op.binding.version(), &op.account)
                .and_then(|record| record.epoch_marker);
            if existing == Some(epoch_marker) {
                return Err(ApplyError::DuplicateCommit {
                    account: op.account.clone(),
                    epoch_marker,
                });
            }
        }

        if let Some(witness_key) = op.binding.witness_key() {
            self.ensure_witness_key(&op.account, &witness_key)?;
        }

        let now = self.chain.head_block_time();
        if !self.clock.in_commit_window(now, current) {
            return Err(ValidationError::WindowClosed {
                window: WindowKind::Commit,
                now,
                epoch_marker: current,
            }
            .into());
        }
        Ok(())
    }

    fn check_reveal(
        &self,
        ledger: &CommitRevealLedger,
        op: &RevealOperation,
    ) -> Result<(), ApplyError> {
        let version = op.binding.version();
        let no_commit = || ApplyError::NoSuchCommit {
            account: op.account.clone(),
        };

        let record = ledger.find(version, &op.account).ok_or_else(no_commit)?;
        if version.has_epoch_marker() && record.epoch_marker != op.binding.epoch_marker() {
            return Err(no_commit());
        }

        if record.is_revealed() {
            return Err(ApplyError::AlreadyRevealed {
                account: op.account.clone(),
            });
        }

        let inputs = op.binding.hash_inputs(self.chain.previous_seed());
        if !hash_chain::matches(op.value, &record.commitment, &inputs) {
            return Err(ApplyError::HashMismatch {
                account: op.account.clone(),
            });
        }

        if let Some(witness_key) = op.binding.witness_key() {
            self.ensure_witness_key(&op.account, &witness_key)?;
        }

        let now = self.chain.head_block_time();
        let current = self.chain.next_maintenance_time();
        let marker_closed = op
            .binding
            .epoch_marker()
            .filter(|marker| !self.accepted_markers(version).contains(marker));
        if let Some(epoch_marker) = marker_closed {
            return Err(ValidationError::WindowClosed {
                window: WindowKind::Reveal,
                now,
                epoch_marker,
            }
            .into());
        }
        if !self.clock.in_reveal_window(now, current) {
            return Err(ValidationError::WindowClosed {
                window: WindowKind::Reveal,
                now,
                epoch_marker: current,
            }
            .into());
        }
        Ok(())
    }

    /// Epoch markers a `version` operation may carry at the head block.
    ///
    /// v2 needs the current marker exactly; v3 tolerates one epoch of lag.
    fn accepted_markers(&self, version: ProtocolVersion) -> RangeInclusive<Timestamp> {
        let current = self.chain.next_maintenance_time();
        match version {
            ProtocolVersion::V3 => self.chain.last_maintenance_time()..=current,
            ProtocolVersion::V1 | ProtocolVersion::V2 => current..=current,
        }
    }

    fn ensure_active(&self, version: ProtocolVersion) -> Result<(), ValidationError> {
        if self.chain.is_version_active(version) {
            Ok(())
        } else {
            Err(ValidationError::VersionInactive { version })
        }
    }

    fn ensure_witness_key(
        &self,
        account: &AccountId,
        declared: &PublicKey,
    ) -> Result<(), ValidationError> {
        match self.chain.signing_key(account) {
            None => Err(ValidationError::UnknownWitness {
                account: account.clone(),
            }),
            Some(registered) if registered != *declared => Err(ValidationError::KeyMismatch {
                account: account.clone(),
            }),
            Some(_) => Ok(()),
        }
    }
}
