//! # DUEL Core
//!
//! The deterministic side of a two-player lockstep game.
//!
//! ## Contract
//!
//! Both peers hold a copy of the same state and step it with the same pair of
//! inputs for every epoch. Everything in this crate is a pure function of its
//! arguments, so two peers that agree on the inputs agree on the state.
//!
//! ```rust,ignore
//! use duel_core::{PaddleInput, PongSimulator, Simulator};
//!
//! let sim = PongSimulator::default();
//! let state = sim.initial_state();
//! let next = sim.advance(&state, [PaddleInput::Up, PaddleInput::None], 0.01);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod input;
pub mod sim;

pub use input::{PaddleInput, Player};
pub use sim::{PongSimulator, PongState, Simulator};

/// Playfield width in world units.
pub const FIELD_WIDTH: f32 = 720.0;

/// Playfield height in world units.
pub const FIELD_HEIGHT: f32 = 640.0;
