//! # Fixed-Timestep Tick Loop
//!
//! Accumulates elapsed wall-clock time and hands it out in whole intervals.
//!
//! ## Design
//!
//! The loop never sleeps on behalf of the caller. The caller reports the
//! current time, drains every interval that is due, and goes back to
//! servicing its own events. All time is passed in explicitly, so tests can
//! drive the loop with synthetic instants.

use std::time::{Duration, Instant};

/// Fixed-timestep tick loop controller.
#[derive(Clone, Debug)]
pub struct TickLoop {
    /// Target tick duration.
    tick_duration: Duration,
    /// Time of last accumulation.
    last_tick: Instant,
    /// Time owed to the simulation.
    accumulator: Duration,
    /// Total ticks executed.
    tick_count: u64,
    /// Processing time statistics.
    stats: TickStats,
}

/// Tick processing statistics.
#[derive(Clone, Copy, Debug)]
pub struct TickStats {
    /// Minimum tick processing time observed.
    pub min_tick_us: u64,
    /// Maximum tick processing time observed.
    pub max_tick_us: u64,
    /// Average tick processing time (rolling).
    pub avg_tick_us: u64,
    /// Ticks whose processing took longer than the interval.
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

impl Default for TickStats {
    fn default() -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: 0,
            late_ticks: 0,
            total_ticks: 0,
        }
    }
}

impl TickLoop {
    /// Creates a tick loop with the given interval, starting at `now`.
    #[must_use]
    pub fn new(tick_duration: Duration, now: Instant) -> Self {
        Self {
            tick_duration,
            last_tick: now,
            accumulator: Duration::ZERO,
            tick_count: 0,
            stats: TickStats::default(),
        }
    }

    /// Adds the time elapsed since the previous call.
    pub fn accumulate(&mut self, now: Instant) {
        self.accumulator += now.saturating_duration_since(self.last_tick);
        self.last_tick = self.last_tick.max(now);
    }

    /// Consumes one interval if one is due.
    ///
    /// Call in a loop until it returns false.
    pub fn drain(&mut self) -> bool {
        if self.accumulator < self.tick_duration {
            return false;
        }
        self.accumulator -= self.tick_duration;
        self.tick_count += 1;
        true
    }

    /// Records how long processing one tick took.
    pub fn record_processing(&mut self, duration: Duration) {
        let duration_us = duration.as_micros() as u64;

        self.stats.total_ticks += 1;
        self.stats.min_tick_us = self.stats.min_tick_us.min(duration_us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(duration_us);

        // Rolling average
        self.stats.avg_tick_us = if self.stats.total_ticks == 1 {
            duration_us
        } else {
            (self.stats.avg_tick_us * 15 + duration_us) / 16
        };

        if duration > self.tick_duration {
            self.stats.late_ticks += 1;
        }
    }

    /// Time left before the next interval is due.
    #[must_use]
    pub fn time_until_next_tick(&self) -> Duration {
        self.tick_duration.saturating_sub(self.accumulator)
    }

    /// Returns the number of intervals drained so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns tick statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Returns the target tick duration.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}
