//! # Synchronization Engine
//!
//! Decides, once per tick, whether both players' inputs for the current
//! epoch are settled, and if so steps the simulation.
//!
//! ## Tick Order
//!
//! ```text
//! 1. Drain every pending packet (CMD → store + ACK, ACK → mark, START → gate)
//! 2. Schedule the sampled local input at current + DELAY, send it once
//! 3. Resend the oldest unacknowledged local command in [current, current + DELAY/2)
//! 4. Advance if the remote command for current is here AND ours is acknowledged
//! ```
//!
//! ## Advancement Condition
//!
//! Epoch `E` executes only when the remote ring holds data tagged `E` and the
//! local slot tagged `E` is acknowledged. Both peers evaluate the same rule,
//! so both execute `E` with the same pair, whenever that happens for each.
//! Nothing here blocks: an unmet condition just means "try next tick".

use std::time::{Duration, Instant};

use duel_core::{PaddleInput, Player, Simulator};

use crate::config::SyncConfig;
use crate::error::NetResult;
use crate::protocol::{Epoch, Packet, WirePacket};
use crate::slots::CommandSlotStore;
use crate::telemetry::{EpochStats, EpochSummary};
use crate::transport::Transport;

/// Lifecycle of a peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Sending START, waiting for the other side to show up.
    WaitingForPeer,
    /// Exchanging commands and advancing epochs.
    Running,
}

/// What a tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still at the start gate.
    WaitingForPeer,
    /// The current epoch is not settled yet.
    Stalled {
        /// Epoch being waited on.
        epoch: Epoch,
    },
    /// One epoch was simulated.
    Advanced {
        /// Epoch that was executed.
        epoch: Epoch,
        /// Inputs it was executed with, indexed by player.
        inputs: [PaddleInput; 2],
    },
}

/// Protocol counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncCounters {
    /// First transmissions of freshly scheduled local commands.
    pub commands_sent: u64,
    /// Resends of unacknowledged local commands.
    pub retransmissions: u64,
    /// ACKs sent in reply to CMDs.
    pub acks_sent: u64,
    /// START packets sent.
    pub starts_sent: u64,
    /// Packets taken from the transport.
    pub packets_received: u64,
    /// Packets discarded as malformed.
    pub packets_dropped: u64,
    /// CMDs for epochs already executed (acknowledged, not stored).
    pub stale_commands: u64,
    /// CMDs for epochs already recorded.
    pub duplicate_commands: u64,
}

/// Lockstep input synchronization for one peer.
pub struct SyncEngine<T: Transport> {
    config: SyncConfig,
    local: Player,
    transport: T,
    slots: CommandSlotStore,
    epoch: Epoch,
    phase: Phase,
    last_inputs: [PaddleInput; 2],
    stats: EpochStats,
    counters: SyncCounters,
    /// When the current epoch started waiting (start gate or last advance).
    epoch_started: Option<Instant>,
    stall_reported: bool,
}

impl<T: Transport> SyncEngine<T> {
    /// Creates an engine at epoch 0, waiting for the peer.
    pub fn new(config: SyncConfig, local: Player, transport: T) -> NetResult<Self> {
        config.validate()?;

        Ok(Self {
            slots: CommandSlotStore::seeded(config.ring_size, config.input_delay),
            stats: EpochStats::new(config.stats_window),
            config,
            local,
            transport,
            epoch: Epoch::ZERO,
            phase: Phase::WaitingForPeer,
            last_inputs: [PaddleInput::None; 2],
            counters: SyncCounters::default(),
            epoch_started: None,
            stall_reported: false,
        })
    }

    /// Runs one tick. See the module docs for the order of work.
    ///
    /// `sampled` is the local player's current input; `now` is the tick's
    /// wall-clock time, used only for statistics.
    pub fn tick<S: Simulator>(
        &mut self,
        simulator: &S,
        state: &mut S::State,
        sampled: PaddleInput,
        now: Instant,
    ) -> TickOutcome {
        self.ingest(now);

        if self.phase == Phase::WaitingForPeer {
            self.send(Packet::Start);
            self.counters.starts_sent += 1;
            return TickOutcome::WaitingForPeer;
        }

        self.schedule_local_input(sampled);
        self.retransmit();

        let epoch = self.epoch;
        match self.try_advance(simulator, state, now) {
            Some(inputs) => TickOutcome::Advanced { epoch, inputs },
            None => {
                self.check_stall(now);
                TickOutcome::Stalled { epoch }
            }
        }
    }

    /// Drains the transport and applies every packet.
    pub fn ingest(&mut self, now: Instant) {
        while let Some(wire) = self.transport.try_receive() {
            self.counters.packets_received += 1;
            match Packet::try_from(wire) {
                Ok(packet) => self.handle(packet, now),
                Err(e) => {
                    self.counters.packets_dropped += 1;
                    tracing::warn!("{}: dropping packet from {}: {e}", self.local, self.local.other());
                }
            }
        }
    }

    fn handle(&mut self, packet: Packet, now: Instant) {
        tracing::debug!("{}: {:?} from {}", self.local, packet.opcode(), self.local.other());
        let remote = self.local.other();
        match packet {
            Packet::Cmd { epoch, input } => {
                // A CMD means the peer is already running.
                if self.phase == Phase::WaitingForPeer {
                    self.begin(now, false);
                }

                let ahead = usize::from(epoch.offset_from(self.epoch));
                if ahead >= self.slots.ring_size() {
                    // Already executed; the ring position may belong to a
                    // future epoch by now. The peer may still need the ACK.
                    self.counters.stale_commands += 1;
                    tracing::debug!("{}: stale cmd for epoch {epoch} at {}", self.local, self.epoch);
                } else if self.slots.get(remote, epoch).is_some() {
                    self.counters.duplicate_commands += 1;
                } else {
                    self.slots.put(remote, epoch, input);
                }

                self.send(Packet::Ack { epoch });
                self.counters.acks_sent += 1;
            }
            Packet::Ack { epoch } => {
                if !self.slots.mark_acknowledged(self.local, epoch) {
                    tracing::debug!("{}: ack for epoch {epoch} matches no slot", self.local);
                }
            }
            Packet::Start => {
                if self.phase == Phase::WaitingForPeer {
                    self.begin(now, true);
                }
            }
        }
    }

    /// Opens the start gate.
    fn begin(&mut self, now: Instant, reply_start: bool) {
        self.phase = Phase::Running;
        self.epoch_started = Some(now);
        tracing::info!("{} started, {} is ready", self.local, self.local.other());

        if reply_start {
            self.send(Packet::Start);
            self.counters.starts_sent += 1;
        }

        // Announce the pre-seeded idle epochs right away instead of trickling
        // them out one retransmission per tick.
        for e in 0..self.config.input_delay {
            let epoch = Epoch(e);
            if let Some(slot) = self.slots.get(self.local, epoch) {
                self.send(Packet::Cmd {
                    epoch,
                    input: slot.input,
                });
                self.counters.commands_sent += 1;
            }
        }
    }

    /// Records `sampled` at `current + DELAY` and sends it, once per epoch.
    pub fn schedule_local_input(&mut self, sampled: PaddleInput) {
        let target = self.epoch.plus(self.config.input_delay);
        if self.slots.get(self.local, target).is_some() {
            return;
        }

        self.slots.put(self.local, target, sampled);
        self.send(Packet::Cmd {
            epoch: target,
            input: sampled,
        });
        self.counters.commands_sent += 1;
    }

    /// Resends the oldest unacknowledged local command in the window.
    ///
    /// At most one packet per call.
    pub fn retransmit(&mut self) {
        for i in 0..self.config.input_delay / 2 {
            let epoch = self.epoch.plus(i);
            if let Some(slot) = self.slots.get(self.local, epoch) {
                if !slot.acknowledged {
                    self.send(Packet::Cmd {
                        epoch,
                        input: slot.input,
                    });
                    self.counters.retransmissions += 1;
                    return;
                }
            }
        }
    }

    /// Executes the current epoch if it is settled.
    ///
    /// Returns the inputs it ran with, or `None` if the remote command is
    /// missing or the local command is not yet acknowledged.
    pub fn try_advance<S: Simulator>(
        &mut self,
        simulator: &S,
        state: &mut S::State,
        now: Instant,
    ) -> Option<[PaddleInput; 2]> {
        let remote = self.local.other();
        let theirs = self.slots.get(remote, self.epoch)?;
        let ours = self.slots.get(self.local, self.epoch).filter(|s| s.acknowledged)?;

        let mut inputs = [PaddleInput::None; 2];
        inputs[self.local.index()] = ours.input;
        inputs[remote.index()] = theirs.input;

        *state = simulator.advance(state, inputs, self.config.tick_seconds());

        let started = self.epoch_started.unwrap_or(now);
        self.stats.record(now.saturating_duration_since(started));
        self.epoch_started = Some(now);

        if self.epoch.is_report_point(self.config.report_every) {
            tracing::info!(
                "epoch {}: average time over last {} epochs: {} ms",
                self.epoch,
                self.stats.window_len(),
                self.stats.window_average().as_millis()
            );
        }

        self.last_inputs = inputs;
        self.epoch = self.epoch.next();
        self.stall_reported = false;
        Some(inputs)
    }

    fn check_stall(&mut self, now: Instant) {
        let (Some(limit), Some(since)) = (self.config.stall_warning(), self.epoch_started) else {
            return;
        };

        let waited = now.saturating_duration_since(since);
        if waited >= limit && !self.stall_reported {
            self.stall_reported = true;
            let remote = self.local.other();
            tracing::warn!(
                "{}: epoch {} stalled for {} ms (remote cmd: {}, local ack: {})",
                self.local,
                self.epoch,
                waited.as_millis(),
                self.slots.get(remote, self.epoch).is_some(),
                self.slots.get(self.local, self.epoch).is_some_and(|s| s.acknowledged),
            );
        }
    }

    fn send(&mut self, packet: Packet) {
        self.transport.send(WirePacket::from(packet));
    }

    /// The epoch waiting to be executed.
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The seat this engine plays.
    #[must_use]
    pub const fn local_player(&self) -> Player {
        self.local
    }

    /// Inputs of the most recently executed epoch.
    #[must_use]
    pub const fn last_inputs(&self) -> [PaddleInput; 2] {
        self.last_inputs
    }

    /// Command rings.
    #[must_use]
    pub const fn slots(&self) -> &CommandSlotStore {
        &self.slots
    }

    /// Epoch timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &EpochStats {
        &self.stats
    }

    /// Lifetime epoch timing totals.
    #[must_use]
    pub fn summary(&self) -> Option<EpochSummary> {
        self.stats.summary()
    }

    /// Protocol counters.
    #[must_use]
    pub const fn counters(&self) -> &SyncCounters {
        &self.counters
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Time since the current epoch started waiting.
    #[must_use]
    pub fn waiting_for(&self, now: Instant) -> Duration {
        self.epoch_started
            .map_or(Duration::ZERO, |since| now.saturating_duration_since(since))
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;

    /// Transport that records what was sent and replays queued packets.
    #[derive(Default)]
    struct MockTransport {
        inbox: VecDeque<WirePacket>,
        sent: Vec<Packet>,
    }

    impl MockTransport {
        fn push(&mut self, packet: Packet) {
            self.inbox.push_back(WirePacket::from(packet));
        }

        fn take_sent(&mut self) -> Vec<Packet> {
            std::mem::take(&mut self.sent)
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, packet: WirePacket) {
            self.sent.push(Packet::try_from(packet).unwrap());
        }

        fn try_receive(&mut self) -> Option<WirePacket> {
            self.inbox.pop_front()
        }
    }

    /// Simulator whose state is the list of input pairs it was called with.
    #[derive(Default)]
    struct RecordingSimulator {
        calls: Cell<usize>,
    }

    impl Simulator for RecordingSimulator {
        type State = Vec<[PaddleInput; 2]>;

        fn advance(&self, state: &Self::State, inputs: [PaddleInput; 2], _dt: f32) -> Self::State {
            self.calls.set(self.calls.get() + 1);
            let mut next = state.clone();
            next.push(inputs);
            next
        }
    }

    fn engine(local: Player) -> SyncEngine<MockTransport> {
        SyncEngine::new(SyncConfig::default(), local, MockTransport::default()).unwrap()
    }

    /// An engine past the start gate with its outbox cleared.
    fn running(local: Player) -> SyncEngine<MockTransport> {
        let mut engine = engine(local);
        engine.transport_mut().push(Packet::Start);
        engine.ingest(Instant::now());
        assert_eq!(engine.phase(), Phase::Running);
        engine.transport_mut().take_sent();
        engine
    }

    /// Peer confirms our seeded epochs and sends its own idle ones.
    fn settle_seeded_epochs(engine: &mut SyncEngine<MockTransport>) {
        for e in 0..10 {
            engine.transport_mut().push(Packet::Ack { epoch: Epoch(e) });
        }
    }

    #[test]
    fn test_waiting_sends_start() {
        let mut engine = engine(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();

        let outcome = engine.tick(&sim, &mut state, PaddleInput::Up, Instant::now());

        assert_eq!(outcome, TickOutcome::WaitingForPeer);
        assert_eq!(engine.transport_mut().take_sent(), vec![Packet::Start]);
        assert_eq!(sim.calls.get(), 0);
    }

    #[test]
    fn test_start_opens_gate_and_replies() {
        let mut engine = engine(Player::One);
        engine.transport_mut().push(Packet::Start);
        engine.ingest(Instant::now());

        assert_eq!(engine.phase(), Phase::Running);
        let sent = engine.transport_mut().take_sent();
        assert_eq!(sent[0], Packet::Start);
        // Seeded idle epochs go out immediately
        assert_eq!(sent.len(), 11);
        assert_eq!(
            sent[10],
            Packet::Cmd {
                epoch: Epoch(9),
                input: PaddleInput::None
            }
        );

        // A second START once running is ignored
        engine.transport_mut().push(Packet::Start);
        engine.ingest(Instant::now());
        assert!(engine.transport_mut().take_sent().is_empty());
    }

    #[test]
    fn test_cmd_opens_gate_without_start_reply() {
        let mut engine = engine(Player::Zero);
        engine.transport_mut().push(Packet::Cmd {
            epoch: Epoch(10),
            input: PaddleInput::Down,
        });
        engine.ingest(Instant::now());

        assert_eq!(engine.phase(), Phase::Running);
        let sent = engine.transport_mut().take_sent();
        assert!(!sent.contains(&Packet::Start));
        assert_eq!(sent.last(), Some(&Packet::Ack { epoch: Epoch(10) }));
    }

    #[test]
    fn test_local_input_is_delayed() {
        let mut engine = running(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();

        engine.tick(&sim, &mut state, PaddleInput::Up, Instant::now());

        let sent = engine.transport_mut().take_sent();
        assert_eq!(
            sent[0],
            Packet::Cmd {
                epoch: Epoch(10),
                input: PaddleInput::Up
            }
        );
        assert_eq!(engine.slots().get(Player::Zero, Epoch(10)).unwrap().input, PaddleInput::Up);
        assert_eq!(engine.slots().get(Player::Zero, Epoch(0)).unwrap().input, PaddleInput::None);
    }

    #[test]
    fn test_input_scheduled_once_per_epoch() {
        let mut engine = running(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();

        engine.tick(&sim, &mut state, PaddleInput::Up, Instant::now());
        engine.tick(&sim, &mut state, PaddleInput::Down, Instant::now());

        // Stalled at epoch 0, so epoch 10 keeps the first sample
        assert_eq!(engine.slots().get(Player::Zero, Epoch(10)).unwrap().input, PaddleInput::Up);
        assert_eq!(engine.counters().commands_sent, 11);
    }

    #[test]
    fn test_retransmits_oldest_unacked_only() {
        let mut engine = running(Player::Zero);
        engine.transport_mut().push(Packet::Ack { epoch: Epoch(0) });
        engine.transport_mut().push(Packet::Ack { epoch: Epoch(2) });
        engine.ingest(Instant::now());

        engine.retransmit();
        assert_eq!(
            engine.transport_mut().take_sent(),
            vec![Packet::Cmd {
                epoch: Epoch(1),
                input: PaddleInput::None
            }]
        );
    }

    #[test]
    fn test_no_retransmit_when_window_acked() {
        let mut engine = running(Player::Zero);
        for e in 0..5 {
            engine.transport_mut().push(Packet::Ack { epoch: Epoch(e) });
        }
        engine.ingest(Instant::now());

        engine.retransmit();
        assert!(engine.transport_mut().take_sent().is_empty());
        assert_eq!(engine.counters().retransmissions, 0);
    }

    #[test]
    fn test_advance_requires_remote_cmd_and_local_ack() {
        let mut engine = running(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();
        let now = Instant::now();

        // Remote epoch 0 is pre-seeded; local epoch 0 lacks an ACK.
        let outcome = engine.tick(&sim, &mut state, PaddleInput::None, now);
        assert_eq!(outcome, TickOutcome::Stalled { epoch: Epoch(0) });
        assert_eq!(sim.calls.get(), 0);

        engine.transport_mut().push(Packet::Ack { epoch: Epoch(0) });
        let outcome = engine.tick(&sim, &mut state, PaddleInput::None, now);
        assert_eq!(
            outcome,
            TickOutcome::Advanced {
                epoch: Epoch(0),
                inputs: [PaddleInput::None; 2]
            }
        );
        assert_eq!(sim.calls.get(), 1);
        assert_eq!(engine.epoch(), Epoch(1));
    }

    #[test]
    fn test_ack_without_remote_cmd_does_not_advance() {
        let mut engine = running(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();
        let now = Instant::now();

        settle_seeded_epochs(&mut engine);
        for _ in 0..10 {
            engine.tick(&sim, &mut state, PaddleInput::None, now);
        }
        assert_eq!(engine.epoch(), Epoch(10));

        // Our epoch 10 gets acknowledged, theirs never arrives.
        engine.transport_mut().push(Packet::Ack { epoch: Epoch(10) });
        for _ in 0..5 {
            let outcome = engine.tick(&sim, &mut state, PaddleInput::None, now);
            assert_eq!(outcome, TickOutcome::Stalled { epoch: Epoch(10) });
        }
        assert_eq!(sim.calls.get(), 10);
    }

    #[test]
    fn test_one_epoch_per_tick() {
        let mut engine = running(Player::One);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();

        settle_seeded_epochs(&mut engine);
        engine.tick(&sim, &mut state, PaddleInput::None, Instant::now());

        assert_eq!(sim.calls.get(), 1);
        assert_eq!(engine.epoch(), Epoch(1));
    }

    #[test]
    fn test_duplicate_cmd_keeps_first_value() {
        let mut engine = running(Player::Zero);
        let cmd = Packet::Cmd {
            epoch: Epoch(12),
            input: PaddleInput::Up,
        };
        engine.transport_mut().push(cmd);
        engine.transport_mut().push(cmd);
        engine.transport_mut().push(Packet::Cmd {
            epoch: Epoch(12),
            input: PaddleInput::Down,
        });
        engine.ingest(Instant::now());

        let slot = engine.slots().get(Player::One, Epoch(12)).unwrap();
        assert_eq!(slot.input, PaddleInput::Up);
        assert_eq!(engine.counters().duplicate_commands, 2);
        // Every copy is acknowledged
        assert_eq!(
            engine.transport_mut().take_sent(),
            vec![Packet::Ack { epoch: Epoch(12) }; 3]
        );
    }

    #[test]
    fn test_stale_cmd_is_acked_but_not_stored() {
        let mut engine = running(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();
        let now = Instant::now();

        settle_seeded_epochs(&mut engine);
        for _ in 0..5 {
            engine.tick(&sim, &mut state, PaddleInput::None, now);
        }
        assert_eq!(engine.epoch(), Epoch(5));
        engine.transport_mut().take_sent();

        // Late copy of an executed epoch with a different value
        engine.transport_mut().push(Packet::Cmd {
            epoch: Epoch(2),
            input: PaddleInput::Down,
        });
        engine.ingest(now);

        assert_eq!(engine.counters().stale_commands, 1);
        assert_eq!(engine.slots().get(Player::One, Epoch(2)).unwrap().input, PaddleInput::None);
        assert_eq!(engine.transport_mut().take_sent(), vec![Packet::Ack { epoch: Epoch(2) }]);
    }

    #[test]
    fn test_forward_window_across_epoch_wrap() {
        let mut engine = running(Player::Zero);
        engine.epoch = Epoch(65_530);

        // Eighteen epochs ahead of 65530, after the wrap.
        engine.transport_mut().push(Packet::Cmd {
            epoch: Epoch(12),
            input: PaddleInput::Up,
        });
        // Already executed, before the wrap.
        engine.transport_mut().push(Packet::Cmd {
            epoch: Epoch(65_520),
            input: PaddleInput::Down,
        });
        engine.ingest(Instant::now());

        assert_eq!(engine.slots().get(Player::One, Epoch(12)).unwrap().input, PaddleInput::Up);
        assert!(engine.slots().get(Player::One, Epoch(65_520)).is_none());
        assert_eq!(engine.counters().stale_commands, 1);
        assert_eq!(
            engine.transport_mut().take_sent(),
            vec![Packet::Ack { epoch: Epoch(12) }, Packet::Ack { epoch: Epoch(65_520) }]
        );
    }

    #[test]
    fn test_late_ack_for_recycled_slot_is_ignored() {
        let mut engine = running(Player::Zero);
        // Epoch 70 shares a ring position with epoch 6.
        engine.transport_mut().push(Packet::Ack { epoch: Epoch(70) });
        engine.ingest(Instant::now());

        assert!(!engine.slots().get(Player::Zero, Epoch(6)).unwrap().acknowledged);
    }

    #[test]
    fn test_unknown_opcode_is_dropped() {
        let mut engine = running(Player::Zero);
        let before = *engine.counters();
        engine.transport_mut().inbox.push_back(WirePacket::new(9, 3, 0));
        engine.transport_mut().inbox.push_back(WirePacket::new(0, 3, 42));
        engine.transport_mut().push(Packet::Ack { epoch: Epoch(0) });
        engine.ingest(Instant::now());

        assert_eq!(engine.counters().packets_received - before.packets_received, 3);
        assert_eq!(engine.counters().packets_dropped - before.packets_dropped, 2);
        // Processing continued past the bad packets
        assert!(engine.slots().get(Player::Zero, Epoch(0)).unwrap().acknowledged);
    }

    #[test]
    fn test_scenario_up_lands_on_epoch_ten() {
        let mut engine = running(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();
        let now = Instant::now();

        // Epoch 0: sample UP, goes out as CMD(10, UP)
        engine.tick(&sim, &mut state, PaddleInput::Up, now);
        assert!(engine.transport_mut().take_sent().contains(&Packet::Cmd {
            epoch: Epoch(10),
            input: PaddleInput::Up
        }));

        // Peer acknowledges everything up to 10 and sends its epoch 10.
        for e in 0..=10 {
            engine.transport_mut().push(Packet::Ack { epoch: Epoch(e) });
        }
        engine.transport_mut().push(Packet::Cmd {
            epoch: Epoch(10),
            input: PaddleInput::Down,
        });

        while engine.epoch() != Epoch(11) {
            engine.tick(&sim, &mut state, PaddleInput::None, now);
            assert!(state.len() <= 11);
        }

        assert_eq!(state.len(), 11);
        assert!(state[..10].iter().all(|pair| *pair == [PaddleInput::None; 2]));
        assert_eq!(state[10], [PaddleInput::Up, PaddleInput::Down]);
        assert_eq!(engine.last_inputs(), [PaddleInput::Up, PaddleInput::Down]);
    }

    #[test]
    fn test_epoch_durations_recorded() {
        let mut engine = running(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();
        let start = Instant::now();

        // Gate opened in `running`; settle and advance at known instants.
        engine.epoch_started = Some(start);
        settle_seeded_epochs(&mut engine);
        engine.tick(&sim, &mut state, PaddleInput::None, start + Duration::from_millis(30));
        engine.tick(&sim, &mut state, PaddleInput::None, start + Duration::from_millis(40));

        let summary = engine.summary().unwrap();
        assert_eq!(summary.epochs, 2);
        assert_eq!(summary.max, Duration::from_millis(30));
        assert_eq!(summary.min, Duration::from_millis(10));
    }

    #[test]
    fn test_stall_warning_does_not_give_up() {
        let mut engine = running(Player::Zero);
        let sim = RecordingSimulator::default();
        let mut state = Vec::new();
        let start = Instant::now();
        engine.epoch_started = Some(start);

        for s in 0..10 {
            let outcome = engine.tick(&sim, &mut state, PaddleInput::None, start + Duration::from_secs(s));
            assert_eq!(outcome, TickOutcome::Stalled { epoch: Epoch(0) });
        }
        assert!(engine.stall_reported);
        assert_eq!(engine.phase(), Phase::Running);
        assert_eq!(engine.waiting_for(start + Duration::from_secs(9)), Duration::from_secs(9));

        // Recovery clears the stall flag
        engine.transport_mut().push(Packet::Ack { epoch: Epoch(0) });
        engine.tick(&sim, &mut state, PaddleInput::None, start + Duration::from_secs(10));
        assert!(!engine.stall_reported);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SyncConfig {
            ring_size: 12,
            ..SyncConfig::default()
        };
        assert!(SyncEngine::new(config, Player::Zero, MockTransport::default()).is_err());
    }
}
