//! Age threshold used to decide whether a node is archived.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Days, Local};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// Wall clock of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// `now - days`, evaluated against the clock at every check.
///
/// The cutoff is never frozen: a long sweep sees it advance slowly, so each
/// comparison reflects the instant the node was examined.
#[derive(Clone)]
pub struct DeletionThreshold {
    days: u32,
    clock: Arc<dyn Clock>,
}

impl DeletionThreshold {
    /// Threshold of `days` against the system clock.
    pub fn new(days: u32) -> Self {
        Self::with_clock(days, Arc::new(SystemClock))
    }

    /// Threshold of `days` against a custom clock.
    pub fn with_clock(days: u32, clock: Arc<dyn Clock>) -> Self {
        Self { days, clock }
    }

    /// Configured age in days.
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Cutoff for a given instant: the same local time `days` calendar days
    /// earlier.
    pub fn cutoff_at(days: u32, now: SystemTime) -> SystemTime {
        let local: DateTime<Local> = now.into();
        match local.checked_sub_days(Days::new(u64::from(days))) {
            Some(earlier) => earlier.into(),
            // Local time does not exist or is ambiguous on that day.
            None => now
                .checked_sub(Duration::from_secs(u64::from(days) * 24 * 60 * 60))
                .unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Cutoff right now.
    pub fn current(&self) -> SystemTime {
        Self::cutoff_at(self.days, self.clock.now())
    }

    /// Whether `modified` is strictly before the current cutoff.
    ///
    /// A node modified exactly at the cutoff does not qualify.
    pub fn is_older_than_threshold(&self, modified: SystemTime) -> bool {
        modified < self.current()
    }
}

impl fmt::Debug for DeletionThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeletionThreshold")
            .field("days", &self.days)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Clock that advances by one second on every read.
    struct TickingClock(Mutex<SystemTime>);

    impl Clock for TickingClock {
        fn now(&self) -> SystemTime {
            let mut now = self.0.lock().unwrap();
            *now += Duration::from_secs(1);
            *now
        }
    }

    #[test]
    fn test_strict_boundary() {
        let now = SystemTime::now();
        let threshold = DeletionThreshold::with_clock(30, Arc::new(FixedClock(now)));
        let cutoff = threshold.current();

        assert!(!threshold.is_older_than_threshold(cutoff));
        assert!(threshold.is_older_than_threshold(cutoff - Duration::from_nanos(1)));
        assert!(!threshold.is_older_than_threshold(cutoff + Duration::from_secs(1)));
    }

    #[test]
    fn test_cutoff_is_about_days_ago() {
        let now = SystemTime::now();
        let cutoff = DeletionThreshold::cutoff_at(30, now);
        let age = now.duration_since(cutoff).unwrap();
        // Calendar days may be 23 or 25 hours long around DST changes.
        assert!(age >= 30 * DAY - Duration::from_secs(3600));
        assert!(age <= 30 * DAY + Duration::from_secs(3600));
    }

    #[test]
    fn test_scenario_ages() {
        let now = SystemTime::now();
        let threshold = DeletionThreshold::with_clock(30, Arc::new(FixedClock(now)));

        assert!(threshold.is_older_than_threshold(now - 40 * DAY));
        assert!(threshold.is_older_than_threshold(now - 35 * DAY));
        assert!(!threshold.is_older_than_threshold(now - 5 * DAY));
        assert!(!threshold.is_older_than_threshold(now));
    }

    #[test]
    fn test_recomputed_per_check() {
        let start = SystemTime::now();
        let threshold =
            DeletionThreshold::with_clock(1, Arc::new(TickingClock(Mutex::new(start))));

        let first = threshold.current();
        let second = threshold.current();
        assert!(second > first);
    }
}
