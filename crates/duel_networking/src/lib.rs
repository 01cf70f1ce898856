//! # DUEL Networking - The Lockstep Protocol
//!
//! Peer-to-peer input synchronization for a two-player deterministic
//! simulation over plain UDP.
//!
//! ## Architecture
//!
//! - **Protocol**: three 8-byte messages (CMD, ACK, START)
//! - **Slots**: a per-player ring of commands tagged with their epoch
//! - **Engine**: fixed input delay, retransmission, advancement gating
//! - **Transport**: non-blocking UDP, or an in-process lossy link for tests
//! - **Session**: fixed-timestep loop tying engine, simulator and presenter
//!
//! ## Lockstep
//!
//! ```text
//! PLAYER 0                          PLAYER 1
//!   |--- CMD(E+10, UP) ------------->|
//!   |<-------------------- ACK(E+10)-|
//!   |<------------ CMD(E+10, NONE) --|
//!   |--- ACK(E+10) ----------------->|
//!   |                                |
//!   | epoch E+10 runs [UP, NONE]     | epoch E+10 runs [UP, NONE]
//! ```
//!
//! Neither side runs epoch E until it holds the other side's command for E
//! and knows its own command for E arrived. Neither side ever blocks; a
//! missing packet stalls the epoch, not the process.
//!
//! ## Example
//!
//! ```rust,ignore
//! use duel_core::{Player, PongSimulator};
//! use duel_networking::{PeerSession, SyncConfig, SyncEngine, UdpTransport};
//!
//! let transport = UdpTransport::connect(9930, "127.0.0.1", 9931)?;
//! let engine = SyncEngine::new(SyncConfig::default(), Player::Zero, transport)?;
//! let sim = PongSimulator::default();
//! let state = sim.initial_state();
//! let mut session = PeerSession::new(engine, sim, state, presenter, Instant::now());
//! session.run();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod session;
pub mod simulation;
pub mod slots;
pub mod telemetry;
pub mod tick;
pub mod transport;

// Re-exports for convenience
pub use config::{usage, PeerConfig, SyncConfig};
pub use engine::{Phase, SyncCounters, SyncEngine, TickOutcome};
pub use error::{NetError, NetResult};
pub use protocol::{Epoch, Opcode, Packet, WirePacket};
pub use session::{InputEvent, PeerSession, Presenter};
pub use simulation::{LinkStats, NetworkConditions, SimulatedEndpoint, SimulatedLink};
pub use slots::{CommandSlot, CommandSlotStore};
pub use telemetry::{EpochStats, EpochSummary, RollingWindow};
pub use tick::{TickLoop, TickStats};
pub use transport::{Transport, TransportStats, UdpTransport};

/// Epochs between sampling an input and executing it.
pub const DEFAULT_INPUT_DELAY: u16 = 10;

/// Command ring capacity per player.
pub const DEFAULT_RING_SIZE: usize = 64;

/// Epoch length in milliseconds (100 Hz).
pub const DEFAULT_TICK_INTERVAL_MS: u32 = 10;
