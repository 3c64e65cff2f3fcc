//! Chain time
//!
//! Block and maintenance times are whole unix seconds. Arithmetic saturates at
//! zero so window computations near genesis never underflow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix timestamp in seconds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create from unix seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Unix seconds
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// `self + secs`, saturating
    pub const fn plus(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// `self - secs`, saturating at zero
    pub const fn minus(self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// Seconds elapsed from `earlier` to `self`, or `None` if `earlier` is later
    pub fn secs_since(self, earlier: Timestamp) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    /// Wall-clock time of the local node.
    ///
    /// Only used to mix entropy; never for ledger decisions, which use block time.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_arithmetic() {
        let t = Timestamp::from_secs(10);
        assert_eq!(t.minus(20), Timestamp::from_secs(0));
        assert_eq!(t.plus(5).as_secs(), 15);
        assert_eq!(Timestamp::from_secs(u64::MAX).plus(1).as_secs(), u64::MAX);
    }

    #[test]
    fn test_secs_since() {
        let a = Timestamp::from_secs(100);
        let b = Timestamp::from_secs(130);
        assert_eq!(b.secs_since(a), Some(30));
        assert_eq!(a.secs_since(b), None);
    }

    #[test]
    fn test_display_is_decimal_seconds() {
        assert_eq!(Timestamp::from_secs(1_700_000_000).to_string(), "1700000000");
    }
}
