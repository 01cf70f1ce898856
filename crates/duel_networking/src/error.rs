//! # Networking Error Types
//!
//! Everything that can go wrong outside the tick path. Inside the tick path
//! nothing is fatal: anomalies are logged, counted and dropped.

use thiserror::Error;

/// Errors raised while setting up or decoding for a peer.
#[derive(Error, Debug)]
pub enum NetError {
    /// Socket failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration parsed but breaks an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Command line does not match the expected shape.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Peer hostname did not resolve to any address.
    #[error("could not resolve peer address {0}")]
    AddressResolution(String),

    /// Datagram carried an opcode outside CMD / ACK / START.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    /// Datagram carried an input value outside the paddle alphabet.
    #[error("invalid input value {0}")]
    InvalidInput(i32),

    /// Datagram length does not match the fixed packet size.
    #[error("packet size mismatch: expected {expected} bytes, got {actual}")]
    PacketSize {
        /// Fixed wire size.
        expected: usize,
        /// Received length.
        actual: usize,
    },
}

/// Result type for networking setup.
pub type NetResult<T> = Result<T, NetError>;
