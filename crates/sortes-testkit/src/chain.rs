//! In-memory chain state

use sortes_core::{
    AccountId, AppliedBlock, ChainParameters, ChainState, ProtocolVersion, PublicKey, Timestamp,
    WitnessRegistry,
};
use std::collections::{BTreeMap, BTreeSet};

/// Settable `ChainState` for tests.
///
/// Fields are public so tests can put the chain in any state directly.
#[derive(Debug, Clone)]
pub struct MockChain {
    /// Timing parameters
    pub params: ChainParameters,
    /// Time of the block being applied
    pub head_time: Timestamp,
    /// Current epoch marker
    pub next_maintenance: Timestamp,
    /// Previous epoch marker
    pub last_maintenance: Timestamp,
    /// Seed of the previous epoch
    pub previous_seed: u64,
    /// Registered witnesses
    pub witnesses: BTreeMap<AccountId, PublicKey>,
    /// Generations whose activation condition holds
    pub active_versions: BTreeSet<ProtocolVersion>,
    /// Height of the last applied block
    pub head_number: u64,
}

impl MockChain {
    /// Chain positioned at the start of the epoch ending at `epoch_marker`,
    /// with every generation active.
    pub fn new(params: ChainParameters, epoch_marker: Timestamp) -> Self {
        let last_maintenance = epoch_marker.minus(params.maintenance_interval);
        Self {
            params,
            head_time: last_maintenance,
            next_maintenance: epoch_marker,
            last_maintenance,
            previous_seed: 0,
            witnesses: BTreeMap::new(),
            active_versions: ProtocolVersion::ALL.into_iter().collect(),
            head_number: 0,
        }
    }

    /// 60 blocks of 3 seconds with two skipped commit slots
    pub fn small_epochs(epoch_marker: Timestamp) -> Self {
        Self::new(
            ChainParameters {
                maintenance_interval: 180,
                block_interval: 3,
                maintenance_skip_slots: 2,
            },
            epoch_marker,
        )
    }

    /// Register `account` as a witness signing with `key`
    pub fn register_witness(&mut self, account: AccountId, key: PublicKey) {
        self.witnesses.insert(account, key);
    }

    /// Only the given generations are active
    pub fn activate_only(&mut self, versions: &[ProtocolVersion]) {
        self.active_versions = versions.iter().copied().collect();
    }

    /// Set the head time to `index` blocks into the commit half
    pub fn at_commit_block(&mut self, index: u64) -> Timestamp {
        self.head_time = self.epoch_start().plus(index * self.params.block_interval);
        self.head_time
    }

    /// Set the head time to `index` blocks into the reveal half
    pub fn at_reveal_block(&mut self, index: u64) -> Timestamp {
        self.head_time = self
            .next_maintenance
            .minus(self.params.half_interval())
            .plus(index * self.params.block_interval);
        self.head_time
    }

    /// Start of the current epoch
    pub fn epoch_start(&self) -> Timestamp {
        self.next_maintenance.minus(self.params.maintenance_interval)
    }

    /// Run maintenance: the next epoch begins and `seed` becomes the previous seed
    pub fn start_next_epoch(&mut self, seed: u64) {
        self.last_maintenance = self.next_maintenance;
        self.next_maintenance = self.next_maintenance.plus(self.params.maintenance_interval);
        self.previous_seed = seed;
    }

    /// Apply one block at the head time
    pub fn apply_block(&mut self) -> AppliedBlock {
        self.head_number += 1;
        AppliedBlock {
            number: self.head_number,
            timestamp: self.head_time,
            synchronized: true,
        }
    }
}

impl WitnessRegistry for MockChain {
    fn signing_key(&self, account: &AccountId) -> Option<PublicKey> {
        self.witnesses.get(account).copied()
    }
}

impl ChainState for MockChain {
    fn parameters(&self) -> ChainParameters {
        self.params
    }

    fn head_block_time(&self) -> Timestamp {
        self.head_time
    }

    fn next_maintenance_time(&self) -> Timestamp {
        self.next_maintenance
    }

    fn last_maintenance_time(&self) -> Timestamp {
        self.last_maintenance
    }

    fn previous_seed(&self) -> u64 {
        self.previous_seed
    }

    fn is_version_active(&self, version: ProtocolVersion) -> bool {
        self.active_versions.contains(&version)
    }
}
