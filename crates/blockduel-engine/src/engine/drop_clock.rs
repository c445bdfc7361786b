use std::time::Duration;

use super::config::GravityConfig;

/// Converts elapsed match time into discrete gravity steps.
///
/// Elapsed time accumulates against the current drop interval; each full
/// interval is one step. When more than `max_catch_up` intervals piled up
/// (the host stalled), the backlog is dropped and a single step is taken.
#[derive(Debug, Clone)]
pub struct DropClock {
    gravity: GravityConfig,
    max_catch_up: u32,
    started_at: Duration,
    paused_for: Duration,
    last_step: Duration,
}

impl DropClock {
    #[must_use]
    pub fn new(gravity: GravityConfig, max_catch_up: u32, now: Duration) -> Self {
        Self {
            gravity,
            max_catch_up: max_catch_up.max(1),
            started_at: now,
            paused_for: Duration::ZERO,
            last_step: now,
        }
    }

    /// Play time since the start, excluding pauses.
    #[must_use]
    pub fn played(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
            .saturating_sub(self.paused_for)
    }

    #[must_use]
    pub fn level(&self, now: Duration) -> u32 {
        self.gravity.level(self.played(now))
    }

    #[must_use]
    pub fn interval(&self, now: Duration) -> Duration {
        self.gravity.interval(self.level(now))
    }

    /// Number of drop steps due at `now`, consuming them.
    pub fn due_steps(&mut self, now: Duration) -> u32 {
        let interval = self.interval(now);
        let mut delta = now.saturating_sub(self.last_step);
        let backlog_cap = interval
            .checked_mul(self.max_catch_up)
            .unwrap_or(Duration::MAX);
        if delta > backlog_cap {
            log::debug!("drop clock stalled for {delta:?}, skipping backlog");
            delta = interval;
            self.last_step = now.saturating_sub(interval);
        }
        let steps = u32::try_from(delta.as_nanos() / interval.as_nanos()).unwrap_or(0);
        self.last_step = self.last_step.saturating_add(interval.saturating_mul(steps));
        if steps > 0 {
            log::trace!("{steps} drop steps due");
        }
        steps
    }

    /// Accounts for a pause that just ended at `now`.
    pub fn resume(&mut self, paused: Duration, now: Duration) {
        self.paused_for += paused;
        self.last_step = now;
    }

    /// Starts the accumulator over from `now` without touching the level.
    pub fn rebaseline(&mut self, now: Duration) {
        self.last_step = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn clock() -> DropClock {
        DropClock::new(GravityConfig::default(), 10, Duration::ZERO)
    }

    #[test]
    fn test_steps_accumulate() {
        let mut clock = clock();
        assert_eq!(clock.due_steps(ms(1199)), 0);
        assert_eq!(clock.due_steps(ms(1200)), 1);
        assert_eq!(clock.due_steps(ms(2000)), 0);
        assert_eq!(clock.due_steps(ms(4800)), 3);
    }

    #[test]
    fn test_stall_is_capped_to_one_step() {
        let mut clock = clock();
        assert_eq!(clock.due_steps(ms(12_000)), 10);
        assert_eq!(clock.due_steps(ms(12_000 + 60_000)), 1);
        // The backlog is gone: the next step is one interval later.
        let interval = clock.interval(ms(72_000));
        assert_eq!(clock.due_steps(ms(72_000) + interval - ms(1)), 0);
        assert_eq!(clock.due_steps(ms(72_000) + interval), 1);
    }

    #[test]
    fn test_extreme_gravity_does_not_overflow() {
        let gravity = GravityConfig {
            initial_ms: u64::MAX,
            step_ms: 0,
            floor_ms: u64::MAX,
            level_duration_ms: u64::MAX,
        };
        let mut clock = DropClock::new(gravity, u32::MAX, Duration::ZERO);
        assert_eq!(clock.due_steps(ms(60_000)), 0);
        assert_eq!(clock.due_steps(Duration::MAX), 1000);
    }

    #[test]
    fn test_resume_discards_paused_time() {
        let mut clock = clock();
        clock.due_steps(ms(1000));
        clock.resume(ms(20_000), ms(21_000));
        assert_eq!(clock.due_steps(ms(21_000)), 0);
        assert_eq!(clock.level(ms(21_000)), 1);
        assert_eq!(clock.due_steps(ms(22_200)), 1);
    }

    #[test]
    fn test_level_follows_play_time() {
        let clock = clock();
        assert_eq!(clock.interval(ms(0)), ms(1200));
        assert_eq!(clock.interval(ms(30_000)), ms(1100));
    }
}
