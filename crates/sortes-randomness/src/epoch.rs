//! Epoch clock
//!
//! All maintenance-interval arithmetic lives here. Evaluators, the ledger's
//! seed aggregation and the witness scheduler derive their windows from the
//! same `EpochWindow` so boundaries cannot drift between call sites.
//!
//! For an epoch marker `E` (the next maintenance time) and interval `I`:
//!
//! ```text
//! start = E - I        midpoint = E - I/2        end = E
//! |------ commit ------|------ reveal ------|
//! ```

use serde::{Deserialize, Serialize};
use sortes_core::{ChainParameters, ChainState, Result, Timestamp};

/// Translates chain parameters into epoch windows. Pure arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochClock {
    params: ChainParameters,
}

impl EpochClock {
    /// Build a clock, rejecting parameters that cannot be split into two
    /// equal block-aligned halves.
    pub fn new(params: ChainParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Clock for the parameters currently published by the chain
    pub fn from_chain(chain: &dyn ChainState) -> Result<Self> {
        Self::new(chain.parameters())
    }

    /// Parameters this clock was built from
    pub fn parameters(&self) -> &ChainParameters {
        &self.params
    }

    /// Window of the epoch ending at `epoch_marker`
    pub fn window(&self, epoch_marker: Timestamp) -> EpochWindow {
        EpochWindow {
            marker: epoch_marker,
            start: epoch_marker.minus(self.params.maintenance_interval),
            midpoint: epoch_marker.minus(self.params.half_interval()),
            block_interval: self.params.block_interval,
            total_blocks: self.params.blocks_per_epoch(),
            skip_blocks: self.params.maintenance_skip_slots,
        }
    }

    /// Window that aggregates the records committed under `epoch_marker`.
    ///
    /// Records carry the marker of the epoch they were committed in, and
    /// aggregation runs once maintenance has moved the marker one interval
    /// on, so this is the window whose start is `epoch_marker`.
    pub fn aggregation_window(&self, epoch_marker: Timestamp) -> EpochWindow {
        self.window(epoch_marker.plus(self.params.maintenance_interval))
    }

    /// Window of the epoch the chain is currently in
    pub fn current_window(&self, chain: &dyn ChainState) -> EpochWindow {
        self.window(chain.next_maintenance_time())
    }

    /// `now < epoch_marker - maintenance_interval/2`
    pub fn in_commit_window(&self, now: Timestamp, epoch_marker: Timestamp) -> bool {
        self.window(epoch_marker).in_commit_window(now)
    }

    /// `epoch_marker - maintenance_interval/2 <= now < epoch_marker`
    pub fn in_reveal_window(&self, now: Timestamp, epoch_marker: Timestamp) -> bool {
        self.window(epoch_marker).in_reveal_window(now)
    }
}

/// Where a point in time falls relative to an epoch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochPhase {
    /// Commit half, `index` blocks after the epoch start
    Commit {
        /// Block index since the epoch start
        index: u64,
    },
    /// Reveal half, `index` blocks after the midpoint
    Reveal {
        /// Block index since the midpoint
        index: u64,
    },
    /// Before the epoch start or at/after its end
    Outside,
}

/// Derived boundaries of one maintenance epoch. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochWindow {
    /// Epoch marker: the maintenance time that closes this epoch
    pub marker: Timestamp,
    /// First second of the epoch
    pub start: Timestamp,
    /// First second of the reveal half
    pub midpoint: Timestamp,
    /// Seconds per block
    pub block_interval: u64,
    /// Blocks in the whole epoch
    pub total_blocks: u64,
    /// Leading commit slots left unscheduled
    pub skip_blocks: u64,
}

impl EpochWindow {
    /// Blocks in each half
    pub fn half_blocks(&self) -> u64 {
        self.total_blocks / 2
    }

    /// Whether `now` is in the commit half.
    ///
    /// Only the upper bound is checked; callers pass the current epoch's
    /// marker so `now` is never before `start`.
    pub fn in_commit_window(&self, now: Timestamp) -> bool {
        now < self.midpoint
    }

    /// Whether `now` is in the reveal half
    pub fn in_reveal_window(&self, now: Timestamp) -> bool {
        self.midpoint <= now && now < self.marker
    }

    /// Whether a record's epoch marker belongs to this window: `start <= m < marker`
    pub fn contains_marker(&self, marker: Timestamp) -> bool {
        self.start <= marker && marker < self.marker
    }

    /// Blocks elapsed since the epoch start, or `None` outside `[start, marker)`
    pub fn block_index(&self, now: Timestamp) -> Option<u64> {
        if now >= self.marker {
            return None;
        }
        now.secs_since(self.start)
            .map(|elapsed| elapsed / self.block_interval.max(1))
    }

    /// Classify `now` into commit half, reveal half or outside
    pub fn phase(&self, now: Timestamp) -> EpochPhase {
        match self.block_index(now) {
            Some(index) if index < self.half_blocks() => EpochPhase::Commit { index },
            Some(index) => EpochPhase::Reveal {
                index: index - self.half_blocks(),
            },
            None => EpochPhase::Outside,
        }
    }

    /// Commit slots available to the scheduler: `[skip, half - 1]`
    pub fn commit_slots(&self) -> std::ops::RangeInclusive<u64> {
        let last = self.half_blocks().saturating_sub(1);
        self.skip_blocks.min(last)..=last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 60 blocks of 3s: 30-block halves, 90s each.
    fn clock() -> EpochClock {
        EpochClock::new(ChainParameters {
            maintenance_interval: 180,
            block_interval: 3,
            maintenance_skip_slots: 2,
        })
        .unwrap()
    }

    const MARKER: Timestamp = Timestamp::from_secs(10_180);

    #[test]
    fn test_window_boundaries() {
        let w = clock().window(MARKER);
        assert_eq!(w.start, Timestamp::from_secs(10_000));
        assert_eq!(w.midpoint, Timestamp::from_secs(10_090));
        assert_eq!(w.total_blocks, 60);
        assert_eq!(w.half_blocks(), 30);
        assert_eq!(w.commit_slots(), 2..=29);
    }

    #[test]
    fn test_windows_are_complementary_halves() {
        let clock = clock();
        for secs in 10_000..10_180 {
            let now = Timestamp::from_secs(secs);
            let commit = clock.in_commit_window(now, MARKER);
            let reveal = clock.in_reveal_window(now, MARKER);
            assert!(commit ^ reveal, "exactly one window must hold at {secs}");
        }
        let commit_secs = (10_000..10_180)
            .filter(|s| clock.in_commit_window(Timestamp::from_secs(*s), MARKER))
            .count();
        assert_eq!(commit_secs, 90);
        assert!(!clock.in_reveal_window(MARKER, MARKER));
    }

    #[test]
    fn test_phase_indices() {
        let w = clock().window(MARKER);
        assert_eq!(w.phase(Timestamp::from_secs(10_000)), EpochPhase::Commit { index: 0 });
        assert_eq!(w.phase(Timestamp::from_secs(10_015)), EpochPhase::Commit { index: 5 });
        assert_eq!(w.phase(Timestamp::from_secs(10_089)), EpochPhase::Commit { index: 29 });
        assert_eq!(w.phase(Timestamp::from_secs(10_090)), EpochPhase::Reveal { index: 0 });
        assert_eq!(w.phase(Timestamp::from_secs(10_105)), EpochPhase::Reveal { index: 5 });
        assert_eq!(w.phase(Timestamp::from_secs(10_179)), EpochPhase::Reveal { index: 29 });
        assert_eq!(w.phase(MARKER), EpochPhase::Outside);
        assert_eq!(w.phase(Timestamp::from_secs(9_999)), EpochPhase::Outside);
    }

    #[test]
    fn test_contains_marker_is_half_open() {
        let w = clock().window(MARKER);
        assert!(w.contains_marker(w.start));
        assert!(w.contains_marker(Timestamp::from_secs(10_179)));
        assert!(!w.contains_marker(MARKER));
        assert!(!w.contains_marker(Timestamp::from_secs(9_999)));
    }

    #[test]
    fn test_aggregation_window_starts_at_marker() {
        let w = clock().aggregation_window(MARKER);
        assert_eq!(w.start, MARKER);
        assert!(w.contains_marker(MARKER));
        assert!(!w.contains_marker(Timestamp::from_secs(10_000)));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(EpochClock::new(ChainParameters {
            maintenance_interval: 180,
            block_interval: 0,
            maintenance_skip_slots: 0,
        })
        .is_err());
    }
}
