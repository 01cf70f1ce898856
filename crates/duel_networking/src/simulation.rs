//! # Network Simulation
//!
//! An in-process link between two peers with configurable loss, duplication
//! and delay, for tests and benchmarks.
//!
//! ## Features
//!
//! - Packet loss simulation
//! - Duplicate delivery
//! - Latency and jitter (jitter reorders packets)
//! - Deterministic: the same seed and the same traffic give the same outcome
//!
//! Time on the link is counted in steps. Callers decide what a step is,
//! usually one tick of both peers.

use std::sync::Arc;

use duel_core::Player;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::protocol::WirePacket;
use crate::transport::Transport;

/// Network conditions for simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkConditions {
    /// Base latency in link steps.
    pub latency_steps: u32,
    /// Extra random latency, uniform in `0..=jitter_steps`.
    pub jitter_steps: u32,
    /// Packet loss percentage (0-100).
    pub packet_loss_percent: u8,
    /// Duplicate packet percentage (0-100).
    pub duplicate_percent: u8,
}

impl NetworkConditions {
    /// Instant, lossless delivery.
    pub const PERFECT: Self = Self {
        latency_steps: 0,
        jitter_steps: 0,
        packet_loss_percent: 0,
        duplicate_percent: 0,
    };

    /// A flaky home connection.
    pub const LOSSY: Self = Self {
        latency_steps: 2,
        jitter_steps: 3,
        packet_loss_percent: 10,
        duplicate_percent: 2,
    };

    /// Heavy loss, long delays, lots of reordering.
    pub const HOSTILE: Self = Self {
        latency_steps: 5,
        jitter_steps: 10,
        packet_loss_percent: 30,
        duplicate_percent: 10,
    };

    /// Total link outage.
    pub const BLACKHOLE: Self = Self {
        latency_steps: 0,
        jitter_steps: 0,
        packet_loss_percent: 100,
        duplicate_percent: 0,
    };
}

impl Default for NetworkConditions {
    fn default() -> Self {
        Self::PERFECT
    }
}

/// Link statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Packets handed to the link.
    pub sent: u64,
    /// Packets handed out by the link (duplicates included).
    pub delivered: u64,
    /// Packets dropped.
    pub dropped: u64,
    /// Extra copies created.
    pub duplicated: u64,
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    deliver_at: u64,
    order: u64,
    packet: WirePacket,
}

struct LinkState {
    clock: u64,
    next_order: u64,
    conditions: NetworkConditions,
    rng: ChaCha8Rng,
    /// Inbox per receiving player.
    inboxes: [Vec<InFlight>; 2],
    stats: LinkStats,
}

impl LinkState {
    fn roll_percent(&mut self, percent: u8) -> bool {
        percent > 0 && self.rng.gen_range(0..100u8) < percent
    }

    fn enqueue(&mut self, to: Player, packet: WirePacket) {
        let jitter = if self.conditions.jitter_steps > 0 {
            self.rng.gen_range(0..=self.conditions.jitter_steps)
        } else {
            0
        };
        let deliver_at = self.clock + u64::from(self.conditions.latency_steps + jitter);
        let order = self.next_order;
        self.next_order += 1;

        self.inboxes[to.index()].push(InFlight {
            deliver_at,
            order,
            packet,
        });
    }
}

/// A two-endpoint lossy link.
///
/// Cloning shares the same link.
#[derive(Clone)]
pub struct SimulatedLink {
    state: Arc<Mutex<LinkState>>,
}

impl SimulatedLink {
    /// Creates a link with the given conditions and RNG seed.
    #[must_use]
    pub fn new(conditions: NetworkConditions, seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(LinkState {
                clock: 0,
                next_order: 0,
                conditions,
                rng: ChaCha8Rng::seed_from_u64(seed),
                inboxes: [Vec::with_capacity(64), Vec::with_capacity(64)],
                stats: LinkStats::default(),
            })),
        }
    }

    /// The transport `player` uses to reach the other side.
    #[must_use]
    pub fn endpoint(&self, player: Player) -> SimulatedEndpoint {
        SimulatedEndpoint {
            player,
            state: Arc::clone(&self.state),
        }
    }

    /// Advances link time by one step.
    pub fn step(&self) {
        self.state.lock().clock += 1;
    }

    /// Replaces the conditions for packets sent from now on.
    pub fn set_conditions(&self, conditions: NetworkConditions) {
        self.state.lock().conditions = conditions;
    }

    /// Packets currently in flight in both directions.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        let state = self.state.lock();
        state.inboxes[0].len() + state.inboxes[1].len()
    }

    /// Returns statistics.
    #[must_use]
    pub fn stats(&self) -> LinkStats {
        self.state.lock().stats
    }
}

/// One side of a [`SimulatedLink`].
pub struct SimulatedEndpoint {
    player: Player,
    state: Arc<Mutex<LinkState>>,
}

impl Transport for SimulatedEndpoint {
    fn send(&mut self, packet: WirePacket) {
        let mut state = self.state.lock();
        state.stats.sent += 1;

        let loss = state.conditions.packet_loss_percent;
        if state.roll_percent(loss) {
            state.stats.dropped += 1;
            return;
        }

        let to = self.player.other();
        state.enqueue(to, packet);

        let duplicate = state.conditions.duplicate_percent;
        if state.roll_percent(duplicate) {
            state.stats.duplicated += 1;
            state.enqueue(to, packet);
        }
    }

    fn try_receive(&mut self) -> Option<WirePacket> {
        let mut state = self.state.lock();
        let clock = state.clock;
        let inbox = &mut state.inboxes[self.player.index()];

        let next = inbox
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deliver_at <= clock)
            .min_by_key(|(_, p)| (p.deliver_at, p.order))
            .map(|(i, _)| i)?;

        let packet = inbox.swap_remove(next).packet;
        state.stats.delivered += 1;
        Some(packet)
    }
}
