//! Property tests for seed aggregation and the chained commitment.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use sortes_core::{AccountId, ChainParameters, ProtocolVersion, PublicKey, Timestamp};
use sortes_randomness::{chained_commitment, plain_commitment, CommitRevealLedger, EpochClock};

const MARKER: u64 = 10_180;

fn clock() -> EpochClock {
    EpochClock::new(ChainParameters {
        maintenance_interval: 180,
        block_interval: 3,
        maintenance_skip_slots: 2,
    })
    .unwrap()
}

/// Revealed value and record marker per witness; markers straddle the window
fn arb_reveals() -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec((any::<u64>(), 9_900u64..10_300), 1..12)
}

fn build_ledger(reveals: &[(u64, u64)]) -> (CommitRevealLedger, Vec<AccountId>) {
    let mut ledger = CommitRevealLedger::new();
    let mut accounts = Vec::new();
    for (i, (value, marker)) in reveals.iter().enumerate() {
        let account = AccountId::new(format!("w{i}")).unwrap();
        ledger.commit(
            ProtocolVersion::V2,
            account.clone(),
            plain_commitment(*value),
            Some(Timestamp::from_secs(*marker)),
            None,
        );
        ledger.reveal(ProtocolVersion::V2, &account, *value);
        accounts.push(account);
    }
    (ledger, accounts)
}

proptest! {
    /// The seed is the wrapping sum of in-window reveals, whatever the account order
    #[test]
    fn seed_is_order_independent_and_window_bound(
        reveals in arb_reveals(),
        rotation in 0usize..12,
    ) {
        let (ledger, accounts) = build_ledger(&reveals);
        let window = clock().window(Timestamp::from_secs(MARKER));

        let expected = reveals
            .iter()
            .filter(|(_, marker)| (10_000..MARKER).contains(marker))
            .fold(0u64, |acc, (value, _)| acc.wrapping_add(*value));

        let mut shuffled = accounts.clone();
        shuffled.reverse();
        let len = shuffled.len();
        shuffled.rotate_left(rotation % len);

        let forward = ledger.aggregate_seed(ProtocolVersion::V2, &accounts, Some(&window));
        let backward = ledger.aggregate_seed(ProtocolVersion::V2, &shuffled, Some(&window));
        prop_assert_eq!(forward, expected);
        prop_assert_eq!(backward, expected);
    }

    /// Splitting the account set and adding the partial seeds gives the full seed
    #[test]
    fn seed_is_associative_over_partitions(
        reveals in arb_reveals(),
        split in 0usize..12,
    ) {
        let (ledger, accounts) = build_ledger(&reveals);
        let window = clock().window(Timestamp::from_secs(MARKER));
        let (left, right) = accounts.split_at(split.min(accounts.len()));

        let whole = ledger.aggregate_seed(ProtocolVersion::V2, &accounts, Some(&window));
        let parts = ledger
            .aggregate_seed(ProtocolVersion::V2, left, Some(&window))
            .wrapping_add(ledger.aggregate_seed(ProtocolVersion::V2, right, Some(&window)));
        prop_assert_eq!(whole, parts);
    }

    /// Changing any single input changes the chained commitment
    #[test]
    fn chained_commitment_depends_on_every_input(
        value in any::<u64>(),
        epoch in 0u64..u64::MAX,
        key in any::<[u8; 32]>(),
        prev_seed in any::<u64>(),
    ) {
        let witness = PublicKey(key);
        let mut other_key = key;
        other_key[0] ^= 1;
        let base = chained_commitment(value, Timestamp::from_secs(epoch), &witness, prev_seed);

        prop_assert_ne!(
            base,
            chained_commitment(value.wrapping_add(1), Timestamp::from_secs(epoch), &witness, prev_seed)
        );
        prop_assert_ne!(
            base,
            chained_commitment(value, Timestamp::from_secs(epoch + 1), &witness, prev_seed)
        );
        prop_assert_ne!(
            base,
            chained_commitment(value, Timestamp::from_secs(epoch), &PublicKey(other_key), prev_seed)
        );
        prop_assert_ne!(
            base,
            chained_commitment(value, Timestamp::from_secs(epoch), &witness, prev_seed.wrapping_add(1))
        );
    }
}
