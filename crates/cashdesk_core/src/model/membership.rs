//! Membership interval entity.
//!
//! # Responsibility
//! - Represent one open or closed membership interval of a member.
//! - Provide the open-end sentinel and interval helpers used by the
//!   join/cancel/deposit paths.
//!
//! # Invariants
//! - A member holds at most one open membership at a time.
//! - A closed membership is never reopened.

use crate::model::member::MemberNumber;
use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

/// Store-assigned membership identity.
pub type MembershipId = i64;

/// One membership interval of a member.
///
/// Timestamps are Unix epoch milliseconds. An open membership carries the
/// `OPEN_END` sentinel as its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Store-assigned identity, positive once persisted.
    pub membership_id: MembershipId,
    /// Owning member; removal of the member removes this row.
    pub member_number: MemberNumber,
    /// Interval start, epoch milliseconds.
    pub begin_ms: i64,
    /// Interval end, epoch milliseconds. `OPEN_END` while still open.
    pub end_ms: i64,
}

impl Membership {
    /// Sentinel end timestamp denoting a currently open membership.
    pub const OPEN_END: i64 = i64::MAX;

    /// Whether this membership is still open (sentinel end).
    pub fn is_open(&self) -> bool {
        self.end_ms == Self::OPEN_END
    }

    /// Whether the interval covers the given instant.
    ///
    /// Deliberately a range check rather than a sentinel comparison: a
    /// finite end in the future also counts as active for deposits.
    pub fn covers(&self, now_ms: i64) -> bool {
        self.begin_ms <= now_ms && now_ms <= self.end_ms
    }

    /// Calendar year of the interval start.
    ///
    /// Returns `None` when `begin_ms` is outside the representable
    /// date range.
    pub fn begin_year(&self) -> Option<i32> {
        DateTime::from_timestamp_millis(self.begin_ms).map(|begin| begin.year())
    }
}

#[cfg(test)]
mod tests {
    use super::Membership;

    fn membership(begin_ms: i64, end_ms: i64) -> Membership {
        Membership {
            membership_id: 1,
            member_number: 1,
            begin_ms,
            end_ms,
        }
    }

    #[test]
    fn open_membership_covers_any_later_instant() {
        let open = membership(1_000, Membership::OPEN_END);
        assert!(open.is_open());
        assert!(open.covers(1_000));
        assert!(open.covers(i64::MAX - 1));
        assert!(!open.covers(999));
    }

    #[test]
    fn finite_future_end_still_covers_now() {
        let bounded = membership(1_000, 5_000);
        assert!(!bounded.is_open());
        assert!(bounded.covers(3_000));
        assert!(bounded.covers(5_000));
        assert!(!bounded.covers(5_001));
    }

    #[test]
    fn begin_year_matches_calendar_year() {
        // 2020-06-01T00:00:00Z
        let opened_2020 = membership(1_590_969_600_000, Membership::OPEN_END);
        assert_eq!(opened_2020.begin_year(), Some(2020));
    }
}
