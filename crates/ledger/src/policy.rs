use chrono::{DateTime, Duration, Utc};
use time::CivilZone;

/// Gate for the first booking of an empty session: a session nobody has
/// booked yet closes for sign-up some hours before it starts. Sessions that
/// start up to `last_morning_hour` (civil time) need the longer notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingLockoutPolicy {
    pub last_morning_hour: u32,
    pub morning_notice: Duration,
    pub later_notice: Duration,
}

impl Default for BookingLockoutPolicy {
    fn default() -> Self {
        BookingLockoutPolicy {
            last_morning_hour: 11,
            morning_notice: Duration::hours(12),
            later_notice: Duration::hours(3),
        }
    }
}

impl BookingLockoutPolicy {
    pub fn notice(&self, start_at: DateTime<Utc>, zone: &CivilZone) -> Duration {
        if zone.hour(start_at) <= self.last_morning_hour {
            self.morning_notice
        } else {
            self.later_notice
        }
    }

    pub fn cutoff(&self, start_at: DateTime<Utc>, zone: &CivilZone) -> DateTime<Utc> {
        start_at - self.notice(start_at, zone)
    }

    /// Requests strictly after the cutoff are refused.
    pub fn is_locked(&self, start_at: DateTime<Utc>, now: DateTime<Utc>, zone: &CivilZone) -> bool {
        now > self.cutoff(start_at, zone)
    }
}

/// Whether cancelling a booking gives the credits back. Flat notice,
/// independent of the hour the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationRefundPolicy {
    pub notice: Duration,
}

impl Default for CancellationRefundPolicy {
    fn default() -> Self {
        CancellationRefundPolicy {
            notice: Duration::hours(12),
        }
    }
}

impl CancellationRefundPolicy {
    pub fn should_refund(&self, start_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        start_at - now >= self.notice
    }
}
