//! Commit-reveal record store
//!
//! One persistent slot per `(generation, account)`. A slot is created by the
//! account's first commit, overwritten by every later epoch's commit and
//! never deleted. Only the evaluators mutate it; the scheduler and the
//! seed-consuming election logic read it.
//!
//! Mutation happens strictly during block application, one block at a time,
//! so the store carries no locks.

use crate::epoch::EpochWindow;
use serde::{Deserialize, Serialize};
use sortes_core::{AccountId, Digest512, ProtocolVersion, PublicKey, Timestamp};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Address of a record slot; returned by successful evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// Protocol generation owning the slot
    pub generation: ProtocolVersion,
    /// Account owning the slot
    pub account: AccountId,
}

impl RecordKey {
    /// Key for `account`'s slot in `generation`
    pub fn new(generation: ProtocolVersion, account: AccountId) -> Self {
        Self {
            generation,
            account,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.generation, self.account)
    }
}

/// Reference to the ledger object an operation touched
pub type ObjectRef = RecordKey;

/// A witness's commitment and, once revealed, its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRevealRecord {
    /// Owning account
    pub account: AccountId,
    /// Generation of the operations that wrote this record
    pub generation: ProtocolVersion,
    /// Commitment to the secret
    pub commitment: Digest512,
    /// Revealed secret; `0` until revealed
    pub revealed_value: u64,
    /// Epoch the record belongs to; absent for v1
    pub epoch_marker: Option<Timestamp>,
    /// Witness key bound into a v3 commitment
    pub witness_key: Option<PublicKey>,
}

impl CommitRevealRecord {
    /// Slot address of this record
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.generation, self.account.clone())
    }

    /// Whether the secret has been revealed
    pub fn is_revealed(&self) -> bool {
        self.revealed_value != 0
    }

    /// Whether the record falls inside `window`.
    ///
    /// Records without an epoch marker (v1) and queries without a window are
    /// never filtered out.
    fn within(&self, window: Option<&EpochWindow>) -> bool {
        match (window, self.epoch_marker) {
            (Some(window), Some(marker)) => window.contains_marker(marker),
            _ => true,
        }
    }
}

/// Authoritative per-account commit/reveal state.
///
/// Serializes as a flat list of records so snapshots work with formats that
/// only allow string map keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    into = "Vec<CommitRevealRecord>",
    from = "Vec<CommitRevealRecord>"
)]
pub struct CommitRevealLedger {
    records: BTreeMap<RecordKey, CommitRevealRecord>,
}

impl From<Vec<CommitRevealRecord>> for CommitRevealLedger {
    fn from(records: Vec<CommitRevealRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.key(), record))
                .collect(),
        }
    }
}

impl From<CommitRevealLedger> for Vec<CommitRevealRecord> {
    fn from(ledger: CommitRevealLedger) -> Self {
        ledger.records.into_values().collect()
    }
}

impl CommitRevealLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert `account`'s slot with a fresh commitment.
    ///
    /// A new slot starts unrevealed. An existing slot is overwritten in place:
    /// commitment replaced, revealed value reset to zero, epoch marker and
    /// witness key updated. Rejecting a same-epoch duplicate is the caller's
    /// job.
    pub fn commit(
        &mut self,
        generation: ProtocolVersion,
        account: AccountId,
        commitment: Digest512,
        epoch_marker: Option<Timestamp>,
        witness_key: Option<PublicKey>,
    ) -> RecordKey {
        let key = RecordKey::new(generation, account);
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| CommitRevealRecord {
                account: key.account.clone(),
                generation,
                commitment,
                revealed_value: 0,
                epoch_marker,
                witness_key,
            });

        assert_eq!(record.key(), key, "commit-reveal slot holds a foreign record");

        record.commitment = commitment;
        record.revealed_value = 0;
        record.epoch_marker = epoch_marker;
        record.witness_key = witness_key;

        tracing::debug!(
            slot = %key,
            epoch = ?epoch_marker,
            "commitment stored"
        );
        key
    }

    /// Set the revealed value on an existing slot.
    ///
    /// The caller verifies the value against the commitment first. Returns
    /// `None` if the slot does not exist.
    pub fn reveal(
        &mut self,
        generation: ProtocolVersion,
        account: &AccountId,
        value: u64,
    ) -> Option<RecordKey> {
        let key = RecordKey::new(generation, account.clone());
        let record = self.records.get_mut(&key)?;
        record.revealed_value = value;
        tracing::debug!(slot = %key, "secret revealed");
        Some(key)
    }

    /// Read-only lookup of `account`'s slot
    pub fn find(
        &self,
        generation: ProtocolVersion,
        account: &AccountId,
    ) -> Option<&CommitRevealRecord> {
        self.records.get(&RecordKey::new(generation, account.clone()))
    }

    /// All records of one generation, in account order
    pub fn records(
        &self,
        generation: ProtocolVersion,
    ) -> impl Iterator<Item = &CommitRevealRecord> + '_ {
        self.records
            .values()
            .filter(move |record| record.generation == generation)
    }

    /// Number of slots across all generations
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no slot exists
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Wrapping sum of revealed values over `accounts`.
    ///
    /// With a window, records whose epoch marker falls outside it are skipped;
    /// v1 records carry no marker and always count. Each account counts once
    /// however often it is listed. The sum wraps on overflow.
    pub fn aggregate_seed<'a, I>(
        &self,
        generation: ProtocolVersion,
        accounts: I,
        window: Option<&EpochWindow>,
    ) -> u64
    where
        I: IntoIterator<Item = &'a AccountId>,
    {
        self.selected(generation, accounts, window)
            .into_iter()
            .fold(0u64, |seed, record| seed.wrapping_add(record.revealed_value))
    }

    /// Accounts among `accounts` that actually revealed inside `window`
    pub fn participants<'a, I>(
        &self,
        generation: ProtocolVersion,
        accounts: I,
        window: Option<&EpochWindow>,
    ) -> Vec<AccountId>
    where
        I: IntoIterator<Item = &'a AccountId>,
    {
        self.selected(generation, accounts, window)
            .into_iter()
            .filter(|record| record.is_revealed())
            .map(|record| record.account.clone())
            .collect()
    }

    fn selected<'a, I>(
        &self,
        generation: ProtocolVersion,
        accounts: I,
        window: Option<&EpochWindow>,
    ) -> Vec<&CommitRevealRecord>
    where
        I: IntoIterator<Item = &'a AccountId>,
    {
        let accounts: BTreeSet<&AccountId> = accounts.into_iter().collect();
        accounts
            .into_iter()
            .filter_map(|account| self.find(generation, account))
            .filter(|record| record.within(window))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch::EpochClock;
    use crate::hash_chain::plain_commitment;
    use sortes_core::ChainParameters;

    fn account(name: &str) -> AccountId {
        AccountId::new(name).unwrap()
    }

    fn window(marker: u64) -> EpochWindow {
        EpochClock::new(ChainParameters {
            maintenance_interval: 180,
            block_interval: 3,
            maintenance_skip_slots: 2,
        })
        .unwrap()
        .window(Timestamp::from_secs(marker))
    }

    #[test]
    fn test_commit_creates_then_overwrites() {
        let mut ledger = CommitRevealLedger::new();
        let alice = account("alice");
        let e1 = Some(Timestamp::from_secs(1_000));
        let e2 = Some(Timestamp::from_secs(1_180));

        ledger.commit(ProtocolVersion::V2, alice.clone(), plain_commitment(7), e1, None);
        ledger.reveal(ProtocolVersion::V2, &alice, 7).unwrap();
        assert!(ledger.find(ProtocolVersion::V2, &alice).unwrap().is_revealed());

        ledger.commit(ProtocolVersion::V2, alice.clone(), plain_commitment(9), e2, None);
        let record = ledger.find(ProtocolVersion::V2, &alice).unwrap();
        assert_eq!(record.commitment, plain_commitment(9));
        assert_eq!(record.revealed_value, 0);
        assert_eq!(record.epoch_marker, e2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_generations_use_separate_slots() {
        let mut ledger = CommitRevealLedger::new();
        let alice = account("alice");
        ledger.commit(ProtocolVersion::V1, alice.clone(), plain_commitment(1), None, None);
        ledger.commit(
            ProtocolVersion::V2,
            alice.clone(),
            plain_commitment(2),
            Some(Timestamp::from_secs(1_000)),
            None,
        );
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.records(ProtocolVersion::V1).count(), 1);
        assert_eq!(
            ledger.find(ProtocolVersion::V1, &alice).unwrap().commitment,
            plain_commitment(1)
        );
    }

    #[test]
    fn test_reveal_missing_slot() {
        let mut ledger = CommitRevealLedger::new();
        assert!(ledger.reveal(ProtocolVersion::V2, &account("bob"), 5).is_none());
    }

    #[test]
    fn test_aggregate_filters_by_window() {
        let mut ledger = CommitRevealLedger::new();
        let (alice, bob, carol) = (account("alice"), account("bob"), account("carol"));
        let w = window(1_180);

        for (who, value, marker) in [(&alice, 3u64, 1_000u64), (&bob, 4, 1_100), (&carol, 5, 1_180)] {
            ledger.commit(
                ProtocolVersion::V2,
                who.clone(),
                plain_commitment(value),
                Some(Timestamp::from_secs(marker)),
                None,
            );
            ledger.reveal(ProtocolVersion::V2, who, value);
        }

        let all = [alice.clone(), bob.clone(), carol.clone()];
        assert_eq!(ledger.aggregate_seed(ProtocolVersion::V2, &all, Some(&w)), 7);
        assert_eq!(ledger.aggregate_seed(ProtocolVersion::V2, &all, None), 12);
        assert_eq!(
            ledger.participants(ProtocolVersion::V2, &all, Some(&w)),
            vec![alice, bob]
        );
    }

    #[test]
    fn test_v1_ignores_window() {
        let mut ledger = CommitRevealLedger::new();
        let alice = account("alice");
        ledger.commit(ProtocolVersion::V1, alice.clone(), plain_commitment(11), None, None);
        ledger.reveal(ProtocolVersion::V1, &alice, 11);
        let w = window(5_000);
        assert_eq!(ledger.aggregate_seed(ProtocolVersion::V1, [&alice], Some(&w)), 11);
    }

    #[test]
    fn test_participants_excludes_unrevealed() {
        let mut ledger = CommitRevealLedger::new();
        let (alice, bob) = (account("alice"), account("bob"));
        let marker = Some(Timestamp::from_secs(1_100));
        ledger.commit(ProtocolVersion::V2, alice.clone(), plain_commitment(1), marker, None);
        ledger.commit(ProtocolVersion::V2, bob.clone(), plain_commitment(2), marker, None);
        ledger.reveal(ProtocolVersion::V2, &bob, 2);

        let w = window(1_180);
        assert_eq!(
            ledger.participants(ProtocolVersion::V2, [&alice, &bob], Some(&w)),
            vec![bob]
        );
    }

    #[test]
    fn test_aggregate_wraps_on_overflow() {
        let mut ledger = CommitRevealLedger::new();
        let (alice, bob) = (account("alice"), account("bob"));
        for (who, value) in [(&alice, u64::MAX), (&bob, 2)] {
            ledger.commit(ProtocolVersion::V1, who.clone(), plain_commitment(value), None, None);
            ledger.reveal(ProtocolVersion::V1, who, value);
        }
        assert_eq!(ledger.aggregate_seed(ProtocolVersion::V1, [&alice, &bob], None), 1);
    }

    #[test]
    fn test_duplicate_accounts_counted_once() {
        let mut ledger = CommitRevealLedger::new();
        let alice = account("alice");
        ledger.commit(ProtocolVersion::V1, alice.clone(), plain_commitment(5), None, None);
        ledger.reveal(ProtocolVersion::V1, &alice, 5);
        assert_eq!(ledger.aggregate_seed(ProtocolVersion::V1, [&alice, &alice], None), 5);
    }

    #[test]
    fn test_snapshot_restores_slots() {
        let mut ledger = CommitRevealLedger::new();
        let alice = account("alice");
        ledger.commit(
            ProtocolVersion::V2,
            alice.clone(),
            plain_commitment(4),
            Some(Timestamp::from_secs(1_000)),
            None,
        );
        ledger.reveal(ProtocolVersion::V2, &alice, 4);

        let json = serde_json::to_string(&ledger).unwrap();
        let restored: CommitRevealLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(
            restored.find(ProtocolVersion::V2, &alice),
            ledger.find(ProtocolVersion::V2, &alice)
        );
    }
}
