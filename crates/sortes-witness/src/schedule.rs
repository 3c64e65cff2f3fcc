//! Per-epoch commit and reveal offsets
//!
//! Offsets are block indices: commit offsets count from the epoch start,
//! reveal offsets from the midpoint. Entries are sorted by offset and flip
//! from pending to processed exactly once.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sortes_core::{AccountId, Timestamp};
use sortes_randomness::EpochWindow;

/// One witness's target block in one half of the epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Target block index within the half
    pub offset: u64,
    /// Local witness
    pub account: AccountId,
    /// Still waiting to fire
    pub pending: bool,
}

/// Commit and reveal offsets drawn for one epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    /// Epoch the offsets belong to
    pub epoch_marker: Timestamp,
    /// Commit entries, ascending by offset
    pub commits: Vec<ScheduleEntry>,
    /// Reveal entries, ascending by offset
    pub reveals: Vec<ScheduleEntry>,
}

impl EpochSchedule {
    /// Draw offsets for `witnesses`.
    ///
    /// Commit offsets are uniform over the window's commit slots. Reveal
    /// offsets are binomial with `half - 1` trials and success probability
    /// `reveal_bias`, which pushes reveals toward the end of the epoch.
    ///
    /// `reveal_bias` must lie in `(0, 1]`; `WitnessNodeConfig::validate`
    /// enforces this for the scheduler.
    pub fn draw<R>(
        rng: &mut R,
        window: &EpochWindow,
        witnesses: &[AccountId],
        reveal_bias: f64,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        debug_assert!(
            reveal_bias > 0.0 && reveal_bias <= 1.0,
            "reveal bias {reveal_bias} outside (0, 1]"
        );
        let commit_slots = window.commit_slots();
        let reveal_trials = window.half_blocks().saturating_sub(1);

        let mut commits = Vec::with_capacity(witnesses.len());
        let mut reveals = Vec::with_capacity(witnesses.len());
        for account in witnesses {
            commits.push(ScheduleEntry {
                offset: rng.gen_range(commit_slots.clone()),
                account: account.clone(),
                pending: true,
            });
            reveals.push(ScheduleEntry {
                offset: binomial(rng, reveal_trials, reveal_bias),
                account: account.clone(),
                pending: true,
            });
        }
        commits.sort_by_key(|entry| entry.offset);
        reveals.sort_by_key(|entry| entry.offset);

        Self {
            epoch_marker: window.marker,
            commits,
            reveals,
        }
    }

    /// Mark every pending commit with `offset <= index` processed and return its account
    pub fn take_due_commits(&mut self, index: u64) -> Vec<AccountId> {
        take_due(&mut self.commits, index)
    }

    /// Mark every pending reveal with `offset <= index` processed and return its account
    pub fn take_due_reveals(&mut self, index: u64) -> Vec<AccountId> {
        take_due(&mut self.reveals, index)
    }

    /// Commits still waiting to fire
    pub fn pending_commits(&self) -> usize {
        self.commits.iter().filter(|entry| entry.pending).count()
    }

    /// Reveals still waiting to fire
    pub fn pending_reveals(&self) -> usize {
        self.reveals.iter().filter(|entry| entry.pending).count()
    }
}

fn take_due(entries: &mut [ScheduleEntry], index: u64) -> Vec<AccountId> {
    entries
        .iter_mut()
        .take_while(|entry| entry.offset <= index)
        .filter(|entry| entry.pending)
        .map(|entry| {
            entry.pending = false;
            entry.account.clone()
        })
        .collect()
}

/// Number of successes in `trials` Bernoulli draws
fn binomial<R: Rng + ?Sized>(rng: &mut R, trials: u64, p: f64) -> u64 {
    (0..trials).filter(|_| rng.gen_bool(p)).count() as u64
}
