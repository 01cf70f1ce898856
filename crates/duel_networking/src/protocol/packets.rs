//! # Packet Definitions
//!
//! `WirePacket` is the raw fixed-shape datagram; `Packet` is what the engine
//! actually reasons about. Conversion between the two is where malformed
//! traffic gets rejected.

use bytemuck::{Pod, Zeroable};
use duel_core::PaddleInput;

use super::epoch::Epoch;
use crate::error::{NetError, NetResult};

/// Message kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Sender's command for an epoch.
    Cmd = 0,
    /// Receipt of the recipient's command for an epoch.
    Ack = 1,
    /// Pre-game rendezvous.
    Start = 2,
}

impl TryFrom<u8> for Opcode {
    type Error = NetError;

    fn try_from(value: u8) -> NetResult<Self> {
        match value {
            0 => Ok(Self::Cmd),
            1 => Ok(Self::Ack),
            2 => Ok(Self::Start),
            other => Err(NetError::UnknownOpcode(other)),
        }
    }
}

/// Raw datagram layout.
///
/// Fields hold host-order values; [`WirePacket::to_bytes`] and
/// [`WirePacket::from_bytes`] handle the little-endian wire order.
///
/// Size: 8 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct WirePacket {
    /// Raw opcode.
    pub opcode: u8,
    /// Always zero.
    pub reserved: u8,
    /// Epoch the message refers to.
    pub epoch: u16,
    /// Raw paddle input.
    pub input: i32,
}

impl WirePacket {
    /// Size in bytes.
    pub const SIZE: usize = 8;

    /// Creates a raw packet.
    #[inline]
    #[must_use]
    pub const fn new(opcode: u8, epoch: u16, input: i32) -> Self {
        Self {
            opcode,
            reserved: 0,
            epoch,
            input,
        }
    }

    /// Encodes for the wire.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        bytemuck::cast(Self {
            opcode: self.opcode,
            reserved: 0,
            epoch: self.epoch.to_le(),
            input: self.input.to_le(),
        })
    }

    /// Decodes a datagram. Only the length is validated here.
    pub fn from_bytes(bytes: &[u8]) -> NetResult<Self> {
        if bytes.len() != Self::SIZE {
            return Err(NetError::PacketSize {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }

        let raw: Self = bytemuck::pod_read_unaligned(bytes);
        Ok(Self {
            opcode: raw.opcode,
            reserved: raw.reserved,
            epoch: u16::from_le(raw.epoch),
            input: i32::from_le(raw.input),
        })
    }
}

/// A validated protocol message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packet {
    /// "My input for `epoch` is `input`."
    Cmd {
        /// Epoch the input is scheduled for.
        epoch: Epoch,
        /// The input.
        input: PaddleInput,
    },
    /// "I have your command for `epoch`."
    Ack {
        /// Epoch being confirmed.
        epoch: Epoch,
    },
    /// "I am here, let's begin."
    Start,
}

impl Packet {
    /// Returns the opcode.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Cmd { .. } => Opcode::Cmd,
            Self::Ack { .. } => Opcode::Ack,
            Self::Start => Opcode::Start,
        }
    }
}

impl TryFrom<WirePacket> for Packet {
    type Error = NetError;

    fn try_from(wire: WirePacket) -> NetResult<Self> {
        let epoch = Epoch(wire.epoch);
        match Opcode::try_from(wire.opcode)? {
            Opcode::Cmd => {
                let input =
                    PaddleInput::from_wire(wire.input).ok_or(NetError::InvalidInput(wire.input))?;
                Ok(Self::Cmd { epoch, input })
            }
            Opcode::Ack => Ok(Self::Ack { epoch }),
            Opcode::Start => Ok(Self::Start),
        }
    }
}

impl From<Packet> for WirePacket {
    fn from(packet: Packet) -> Self {
        let none = PaddleInput::None.to_wire();
        match packet {
            Packet::Cmd { epoch, input } => Self::new(Opcode::Cmd as u8, epoch.get(), input.to_wire()),
            Packet::Ack { epoch } => Self::new(Opcode::Ack as u8, epoch.get(), none),
            Packet::Start => Self::new(Opcode::Start as u8, 0, none),
        }
    }
}
