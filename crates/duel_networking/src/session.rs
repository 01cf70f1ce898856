//! # Peer Session
//!
//! Glues the sync engine to a simulator, a presenter and the clock.
//!
//! ## Outer Loop
//!
//! ```text
//! loop {
//!     poll presenter        → sampled input, quit?
//!     drain due ticks       → engine.tick() per interval
//!     render on advancement
//!     sleep until next tick
//! }
//! ```
//!
//! The presenter is the only collaborator that sees the outside world. It
//! must not block; a slow presenter only delays ticks, it never skips them.

use std::time::Instant;

use duel_core::{PaddleInput, Simulator};

use crate::engine::{SyncEngine, TickOutcome};
use crate::protocol::Epoch;
use crate::telemetry::EpochSummary;
use crate::tick::TickLoop;
use crate::transport::Transport;

/// Input state reported by the presenter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputEvent {
    /// Up key held.
    pub up: bool,
    /// Down key held.
    pub down: bool,
    /// The user asked to quit.
    pub quit: bool,
}

impl InputEvent {
    /// The paddle command for this input state. Up wins when both are held.
    #[must_use]
    pub const fn sampled(&self) -> PaddleInput {
        if self.up {
            PaddleInput::Up
        } else if self.down {
            PaddleInput::Down
        } else {
            PaddleInput::None
        }
    }
}

/// Whatever shows the match to a human (or pretends to).
pub trait Presenter<State> {
    /// Returns the current input state. Must not block.
    fn poll_event(&mut self) -> InputEvent;

    /// Shows the state produced by `epoch`.
    fn render(&mut self, epoch: Epoch, state: &State);
}

/// One peer: engine, simulation, presentation and clock.
pub struct PeerSession<T: Transport, S: Simulator, P: Presenter<S::State>> {
    engine: SyncEngine<T>,
    simulator: S,
    state: S::State,
    presenter: P,
    tick_loop: TickLoop,
    max_epochs: Option<u64>,
    epochs_run: u64,
}

impl<T: Transport, S: Simulator, P: Presenter<S::State>> PeerSession<T, S, P> {
    /// Creates a session whose clock starts at `now`.
    pub fn new(engine: SyncEngine<T>, simulator: S, state: S::State, presenter: P, now: Instant) -> Self {
        let tick_loop = TickLoop::new(engine.config().tick_interval(), now);
        Self {
            engine,
            simulator,
            state,
            presenter,
            tick_loop,
            max_epochs: None,
            epochs_run: 0,
        }
    }

    /// Stops the session after `epochs` executed epochs.
    #[must_use]
    pub fn with_max_epochs(mut self, epochs: Option<u64>) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Runs one outer loop iteration at `now`.
    ///
    /// Returns `false` once the session should stop.
    pub fn pump(&mut self, now: Instant) -> bool {
        let event = self.presenter.poll_event();
        if event.quit {
            tracing::info!("{}: quit requested at epoch {}", self.engine.local_player(), self.engine.epoch());
            return false;
        }

        self.tick_loop.accumulate(now);
        while self.tick_loop.drain() {
            let began = Instant::now();
            let outcome = self.engine.tick(&self.simulator, &mut self.state, event.sampled(), now);
            if let TickOutcome::Advanced { epoch, .. } = outcome {
                self.epochs_run += 1;
                self.presenter.render(epoch, &self.state);
            }
            self.tick_loop.record_processing(began.elapsed());

            if self.limit_reached() {
                return false;
            }
        }

        true
    }

    fn limit_reached(&self) -> bool {
        self.max_epochs.is_some_and(|max| self.epochs_run >= max)
    }

    /// Pumps on the real clock until quit or the epoch limit.
    ///
    /// Returns the lifetime epoch timing, if any epoch ran.
    pub fn run(&mut self) -> Option<EpochSummary> {
        tracing::info!(
            "{} running, {} ms per epoch, input delay {}",
            self.engine.local_player(),
            self.engine.config().tick_interval_ms,
            self.engine.config().input_delay
        );

        while self.pump(Instant::now()) {
            std::thread::sleep(self.tick_loop.time_until_next_tick());
        }

        let summary = self.engine.summary();
        self.log_summary(summary.as_ref());
        summary
    }

    fn log_summary(&self, summary: Option<&EpochSummary>) {
        let Some(summary) = summary else {
            tracing::info!("{}: no epochs executed", self.engine.local_player());
            return;
        };

        let counters = self.engine.counters();
        let ticks = self.tick_loop.stats();
        tracing::info!("=== summary for {} ===", self.engine.local_player());
        tracing::info!("total epochs: {}", summary.epochs);
        tracing::info!("total time: {} ms", summary.total.as_millis());
        tracing::info!("average epoch time: {} ms", summary.average.as_millis());
        tracing::info!("minimum epoch time: {} ms", summary.min.as_millis());
        tracing::info!("maximum epoch time: {} ms", summary.max.as_millis());
        tracing::info!(
            "packets: {} commands, {} retransmissions, {} acks, {} received, {} dropped",
            counters.commands_sent,
            counters.retransmissions,
            counters.acks_sent,
            counters.packets_received,
            counters.packets_dropped
        );
        tracing::info!(
            "tick processing: avg {} us, max {} us, {} late",
            ticks.avg_tick_us,
            ticks.max_tick_us,
            ticks.late_ticks
        );
    }

    /// The sync engine.
    #[must_use]
    pub const fn engine(&self) -> &SyncEngine<T> {
        &self.engine
    }

    /// Current simulation state.
    #[must_use]
    pub const fn state(&self) -> &S::State {
        &self.state
    }

    /// The presenter.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Epochs executed by this session.
    #[must_use]
    pub const fn epochs_run(&self) -> u64 {
        self.epochs_run
    }

    /// The fixed-timestep clock.
    #[must_use]
    pub const fn tick_loop(&self) -> &TickLoop {
        &self.tick_loop
    }
}
