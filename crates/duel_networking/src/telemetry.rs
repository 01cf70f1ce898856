//! # Epoch Timing Statistics
//!
//! Wall-clock time between epoch advancements. Purely observational: nothing
//! in the protocol reads these numbers.

use std::time::Duration;

/// Fixed-capacity window over the most recent samples.
#[derive(Clone, Debug)]
pub struct RollingWindow {
    samples: Vec<Duration>,
    capacity: usize,
    index: usize,
}

impl RollingWindow {
    /// Creates an empty window.
    ///
    /// A zero capacity is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            index: 0,
        }
    }

    /// Adds a sample, evicting the oldest once full.
    pub fn push(&mut self, sample: Duration) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.index] = sample;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    /// Number of samples held (at most the capacity).
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True before the first sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean of the samples held, zero when empty.
    #[must_use]
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }
}

/// Lifetime totals at shutdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpochSummary {
    /// Epochs advanced.
    pub epochs: u64,
    /// Sum of all epoch durations.
    pub total: Duration,
    /// Mean epoch duration.
    pub average: Duration,
    /// Shortest epoch.
    pub min: Duration,
    /// Longest epoch.
    pub max: Duration,
}

/// Epoch duration statistics.
#[derive(Clone, Debug)]
pub struct EpochStats {
    count: u64,
    total: Duration,
    min: Duration,
    max: Duration,
    window: RollingWindow,
}

impl EpochStats {
    /// Creates empty statistics with a rolling window of `window` samples.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            count: 0,
            total: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
            window: RollingWindow::new(window),
        }
    }

    /// Records one epoch.
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total += duration;
        self.min = self.min.min(duration);
        self.max = self.max.max(duration);
        self.window.push(duration);
    }

    /// Epochs recorded.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Mean over the rolling window.
    #[must_use]
    pub fn window_average(&self) -> Duration {
        self.window.average()
    }

    /// Samples currently in the rolling window.
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Lifetime totals. `None` before the first epoch.
    #[must_use]
    pub fn summary(&self) -> Option<EpochSummary> {
        if self.count == 0 {
            return None;
        }

        Some(EpochSummary {
            epochs: self.count,
            total: self.total,
            average: Duration::from_nanos((self.total.as_nanos() / u128::from(self.count)) as u64),
            min: self.min,
            max: self.max,
        })
    }
}
