//! # Network Protocol
//!
//! Three fixed-size messages, one datagram each.
//!
//! ## Packet Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Opcode (1) │ Reserved (1) │ Epoch (2, LE)    │
//! ├──────────────────────────────────────────────┤
//! │ Input (4, LE)                                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! - No sequence numbers: the epoch is the only ordering that matters
//! - No connection id: there is exactly one peer
//! - No checksum or version field

mod epoch;
mod packets;

pub use epoch::Epoch;
pub use packets::{Opcode, Packet, WirePacket};
