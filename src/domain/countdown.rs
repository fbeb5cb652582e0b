//! Countdown utility: remaining time until a target, broken into display units.
//!
//! Pure and stateless. Used for the "expires in" display before a quiz starts;
//! it never drives a session transition.

use chrono::{DateTime, Utc};
use std::fmt;

/// Non-negative remaining duration split into days/hours/minutes/seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Remaining {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Remaining {
    pub fn from_secs(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.total_secs() == 0
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {}h {}m {}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Time left from `now` until `target`, clamped to zero once the target is reached.
/// Sub-second remainders are truncated.
pub fn remaining_until(target: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    let secs = (target - now).num_seconds().max(0) as u64;
    Remaining::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn splits_into_units() {
        let now = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();
        let target = now + Duration::days(1) + Duration::hours(2) + Duration::minutes(3) + Duration::seconds(4);
        let r = remaining_until(target, now);
        assert_eq!(
            r,
            Remaining {
                days: 1,
                hours: 2,
                minutes: 3,
                seconds: 4
            }
        );
        assert_eq!(r.to_string(), "1d 2h 3m 4s");
    }

    #[test]
    fn clamps_to_zero_after_target() {
        let now = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();
        let r = remaining_until(now - Duration::hours(5), now);
        assert!(r.is_zero());
        assert_eq!(r.to_string(), "0d 0h 0m 0s");
        assert!(remaining_until(now, now).is_zero());
    }

    #[test]
    fn truncates_partial_seconds() {
        let now = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();
        let r = remaining_until(now + Duration::milliseconds(1_999), now);
        assert_eq!(r.total_secs(), 1);
    }
}
