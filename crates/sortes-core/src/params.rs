//! Chain parameters consumed by the epoch clock

use crate::errors::{Result, SortesError};
use serde::{Deserialize, Serialize};

/// Maintenance and block timing parameters published by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParameters {
    /// Length of one maintenance epoch, in seconds
    pub maintenance_interval: u64,
    /// Target time between blocks, in seconds
    pub block_interval: u64,
    /// Blocks skipped at the start of an epoch before commits are scheduled
    pub maintenance_skip_slots: u64,
}

impl ChainParameters {
    /// Blocks in one epoch: `maintenance_interval / block_interval`
    pub fn blocks_per_epoch(&self) -> u64 {
        self.maintenance_interval
            .checked_div(self.block_interval)
            .unwrap_or_default()
    }

    /// Blocks in each of the commit and reveal halves
    pub fn blocks_per_half(&self) -> u64 {
        self.blocks_per_epoch() / 2
    }

    /// Seconds in each of the commit and reveal halves
    pub fn half_interval(&self) -> u64 {
        self.maintenance_interval / 2
    }

    /// Check that the parameters describe two equal, block-aligned halves
    /// with room for at least one commit slot after the skipped slots.
    pub fn validate(&self) -> Result<()> {
        if self.block_interval == 0 {
            return Err(SortesError::invalid("block_interval must be non-zero"));
        }
        if self.maintenance_interval == 0 {
            return Err(SortesError::invalid("maintenance_interval must be non-zero"));
        }
        if self.maintenance_interval % self.block_interval != 0 {
            return Err(SortesError::invalid(format!(
                "maintenance_interval {} is not a multiple of block_interval {}",
                self.maintenance_interval, self.block_interval
            )));
        }
        let total = self.blocks_per_epoch();
        if total < 4 || total % 2 != 0 {
            return Err(SortesError::invalid(format!(
                "an epoch must hold an even number of at least 4 blocks, got {total}"
            )));
        }
        if self.maintenance_skip_slots >= self.blocks_per_half() {
            return Err(SortesError::invalid(format!(
                "maintenance_skip_slots {} leaves no commit slot in a {}-block half",
                self.maintenance_skip_slots,
                self.blocks_per_half()
            )));
        }
        Ok(())
    }
}

impl Default for ChainParameters {
    fn default() -> Self {
        Self {
            maintenance_interval: 86_400,
            block_interval: 3,
            maintenance_skip_slots: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_validate() {
        let params = ChainParameters::default();
        params.validate().unwrap();
        assert_eq!(params.blocks_per_epoch(), 28_800);
        assert_eq!(params.blocks_per_half(), 14_400);
        assert_eq!(params.half_interval(), 43_200);
    }

    #[test]
    fn test_rejects_misaligned_interval() {
        let params = ChainParameters {
            maintenance_interval: 100,
            block_interval: 3,
            maintenance_skip_slots: 0,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_odd_block_count() {
        let params = ChainParameters {
            maintenance_interval: 15,
            block_interval: 3,
            maintenance_skip_slots: 0,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_skip_covering_commit_half() {
        let params = ChainParameters {
            maintenance_interval: 60,
            block_interval: 3,
            maintenance_skip_slots: 10,
        };
        assert!(params.validate().is_err());

        let params = ChainParameters {
            maintenance_skip_slots: 9,
            ..params
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_zero_block_interval_is_invalid_not_a_panic() {
        let params = ChainParameters {
            maintenance_interval: 60,
            block_interval: 0,
            maintenance_skip_slots: 0,
        };
        assert_eq!(params.blocks_per_epoch(), 0);
        assert!(params.validate().is_err());
    }
}
