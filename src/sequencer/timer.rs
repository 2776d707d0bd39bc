// Timer - Clock sources and the repeating beat timer handle
// The beat loop is polled by the host event loop; nothing here spawns threads

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of "now" for the scheduler, as time elapsed since an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant` (monotonic)
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock
/// Clones share the same time, so a test can keep one handle and give
/// the other to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, delta: Duration) {
        self.nanos
            .fetch_add(delta.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Duration) {
        self.nanos.store(now.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

/// Handle to one live repeating timer
///
/// Owned by the scheduler while the beat loop runs. Dropping or
/// cancelling the handle means no further fire is ever reported for it.
#[derive(Debug)]
pub struct IntervalTimer {
    period: Duration,
    next_due: Duration,
    fired: u64,
}

impl IntervalTimer {
    /// Arm a timer whose first fire is one period after `now`
    pub fn start(now: Duration, period: Duration) -> Self {
        Self {
            period,
            next_due: now + period,
            fired: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time of the next fire
    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    /// Number of fires reported so far
    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.next_due
    }

    pub fn time_until_due(&self, now: Duration) -> Duration {
        self.next_due.saturating_sub(now)
    }

    /// Consume the current fire and schedule the next one.
    ///
    /// If the host fell behind by one or more whole periods, those fires are
    /// dropped and the timer re-anchors one period after `now`.
    /// Returns the number of dropped fires.
    pub fn advance(&mut self, now: Duration) -> u64 {
        self.fired += 1;
        self.next_due += self.period;

        if now < self.next_due {
            return 0;
        }

        let behind = now - self.next_due;
        let dropped = (behind.as_nanos() / self.period.as_nanos().max(1)) as u64 + 1;
        self.next_due = now + self.period;
        dropped
    }

    /// Cancel the timer, returning how many times it fired
    pub fn cancel(self) -> u64 {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));

        handle.set(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_interval_timer_first_fire_after_one_period() {
        let timer = IntervalTimer::start(Duration::from_millis(100), Duration::from_millis(500));

        assert!(!timer.is_due(Duration::from_millis(599)));
        assert!(timer.is_due(Duration::from_millis(600)));
        assert_eq!(
            timer.time_until_due(Duration::from_millis(350)),
            Duration::from_millis(250)
        );
        assert_eq!(timer.time_until_due(Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_interval_timer_advance_keeps_cadence() {
        let period = Duration::from_millis(500);
        let mut timer = IntervalTimer::start(Duration::ZERO, period);

        // Fired slightly late: next fire stays on the grid
        assert_eq!(timer.advance(Duration::from_millis(510)), 0);
        assert_eq!(timer.next_due(), Duration::from_millis(1000));
        assert_eq!(timer.fired(), 1);
    }

    #[test]
    fn test_interval_timer_drops_missed_fires() {
        let period = Duration::from_millis(500);
        let mut timer = IntervalTimer::start(Duration::ZERO, period);

        // Host stalled until 1.7s: fires at 1.0s and 1.5s are dropped
        let dropped = timer.advance(Duration::from_millis(1700));
        assert_eq!(dropped, 2);
        assert_eq!(timer.next_due(), Duration::from_millis(2200));
        assert_eq!(timer.cancel(), 1);
    }
}
