//! # Field Simulation
//!
//! Two paddles, one ball, fixed timestep.
//!
//! ## Determinism
//!
//! `advance` reads nothing but its arguments. Given the same state, the same
//! input pair and the same `dt`, it produces the same bits on every run of
//! the same binary. Peers compare [`PongState::checksum`] to spot a desync.

use bytemuck::{bytes_of, Pod, Zeroable};

use crate::input::{PaddleInput, Player};
use crate::{FIELD_HEIGHT, FIELD_WIDTH};

/// A deterministic state transition driven by both players' inputs.
pub trait Simulator {
    /// Simulation state. Owned by the caller, replaced wholesale each epoch.
    type State: Clone;

    /// Produces the state one epoch after `state`.
    ///
    /// `inputs` is indexed by [`Player::index`]. `dt` is the epoch length
    /// in seconds.
    fn advance(&self, state: &Self::State, inputs: [PaddleInput; 2], dt: f32) -> Self::State;
}

/// Full state of a match.
///
/// Size: 32 bytes, no padding.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PongState {
    /// Vertical centre of each paddle.
    pub paddle_y: [f32; 2],
    /// Ball centre X.
    pub ball_x: f32,
    /// Ball centre Y.
    pub ball_y: f32,
    /// Ball velocity X (units per second).
    pub ball_vx: f32,
    /// Ball velocity Y (units per second).
    pub ball_vy: f32,
    /// Points scored by each player.
    pub score: [u32; 2],
}

impl PongState {
    /// Size in bytes.
    pub const SIZE: usize = 32;

    /// FNV-1a hash over the raw state bytes.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0100_0000_01b3;

        bytes_of(self)
            .iter()
            .fold(OFFSET, |hash, &byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
    }

    /// Score of one player.
    #[inline]
    #[must_use]
    pub const fn score_of(&self, player: Player) -> u32 {
        self.score[player.index()]
    }
}

/// The two-paddle game rules.
#[derive(Clone, Copy, Debug)]
pub struct PongSimulator {
    /// Paddle travel speed (units per second).
    pub paddle_speed: f32,
    /// Paddle height.
    pub paddle_height: f32,
    /// Distance of each paddle face from its wall.
    pub paddle_inset: f32,
    /// Ball radius.
    pub ball_radius: f32,
    /// Serve velocity X.
    pub serve_vx: f32,
    /// Serve velocity Y.
    pub serve_vy: f32,
}

impl Default for PongSimulator {
    fn default() -> Self {
        Self {
            paddle_speed: 400.0,
            paddle_height: 80.0,
            paddle_inset: 30.0,
            ball_radius: 6.0,
            serve_vx: 240.0,
            serve_vy: 160.0,
        }
    }
}

impl PongSimulator {
    /// Kick-off state: paddles centred, ball served toward player one.
    #[must_use]
    pub fn initial_state(&self) -> PongState {
        PongState {
            paddle_y: [FIELD_HEIGHT / 2.0; 2],
            ball_x: FIELD_WIDTH / 2.0,
            ball_y: FIELD_HEIGHT / 2.0,
            ball_vx: self.serve_vx,
            ball_vy: self.serve_vy,
            score: [0, 0],
        }
    }

    fn move_paddle(&self, y: f32, input: PaddleInput, dt: f32) -> f32 {
        let half = self.paddle_height / 2.0;
        (y + input.direction() * self.paddle_speed * dt).clamp(half, FIELD_HEIGHT - half)
    }

    fn paddle_covers(&self, paddle_y: f32, ball_y: f32) -> bool {
        (ball_y - paddle_y).abs() <= self.paddle_height / 2.0 + self.ball_radius
    }

    /// Re-centres the ball after a point, serving toward the player who conceded.
    fn serve(&self, next: &mut PongState, toward: Player) {
        next.ball_x = FIELD_WIDTH / 2.0;
        next.ball_y = FIELD_HEIGHT / 2.0;
        next.ball_vx = match toward {
            Player::Zero => -self.serve_vx,
            Player::One => self.serve_vx,
        };
        next.ball_vy = self.serve_vy;
    }
}

impl Simulator for PongSimulator {
    type State = PongState;

    fn advance(&self, state: &PongState, inputs: [PaddleInput; 2], dt: f32) -> PongState {
        let mut next = *state;

        for player in Player::ALL {
            let i = player.index();
            next.paddle_y[i] = self.move_paddle(state.paddle_y[i], inputs[i], dt);
        }

        next.ball_x += state.ball_vx * dt;
        next.ball_y += state.ball_vy * dt;

        // Top and bottom walls
        if next.ball_y < self.ball_radius {
            next.ball_y = 2.0 * self.ball_radius - next.ball_y;
            next.ball_vy = next.ball_vy.abs();
        } else if next.ball_y > FIELD_HEIGHT - self.ball_radius {
            next.ball_y = 2.0 * (FIELD_HEIGHT - self.ball_radius) - next.ball_y;
            next.ball_vy = -next.ball_vy.abs();
        }

        let left_face = self.paddle_inset + self.ball_radius;
        let right_face = FIELD_WIDTH - self.paddle_inset - self.ball_radius;

        if next.ball_vx < 0.0 && state.ball_x >= left_face && next.ball_x < left_face {
            if self.paddle_covers(next.paddle_y[0], next.ball_y) {
                next.ball_x = 2.0 * left_face - next.ball_x;
                next.ball_vx = -next.ball_vx;
            }
        } else if next.ball_vx > 0.0
            && state.ball_x <= right_face
            && next.ball_x > right_face
            && self.paddle_covers(next.paddle_y[1], next.ball_y)
        {
            next.ball_x = 2.0 * right_face - next.ball_x;
            next.ball_vx = -next.ball_vx;
        }

        if next.ball_x < 0.0 {
            next.score[Player::One.index()] += 1;
            self.serve(&mut next, Player::Zero);
        } else if next.ball_x > FIELD_WIDTH {
            next.score[Player::Zero.index()] += 1;
            self.serve(&mut next, Player::One);
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.01;

    #[test]
    fn test_state_size() {
        assert_eq!(std::mem::size_of::<PongState>(), PongState::SIZE);
    }

    #[test]
    fn test_paddle_moves_and_clamps() {
        let sim = PongSimulator::default();
        let mut state = sim.initial_state();

        state = sim.advance(&state, [PaddleInput::Up, PaddleInput::Down], DT);
        assert!(state.paddle_y[0] < FIELD_HEIGHT / 2.0);
        assert!(state.paddle_y[1] > FIELD_HEIGHT / 2.0);

        for _ in 0..1_000 {
            state = sim.advance(&state, [PaddleInput::Up, PaddleInput::Down], DT);
        }
        assert_eq!(state.paddle_y[0], sim.paddle_height / 2.0);
        assert_eq!(state.paddle_y[1], FIELD_HEIGHT - sim.paddle_height / 2.0);
    }

    #[test]
    fn test_same_inputs_same_checksum() {
        let sim = PongSimulator::default();
        let mut a = sim.initial_state();
        let mut b = sim.initial_state();

        let script = [PaddleInput::Up, PaddleInput::None, PaddleInput::Down];
        for i in 0..5_000 {
            let inputs = [script[i % 3], script[(i / 7) % 3]];
            a = sim.advance(&a, inputs, DT);
            b = sim.advance(&b, inputs, DT);
        }

        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn test_different_inputs_diverge() {
        let sim = PongSimulator::default();
        let start = sim.initial_state();

        let a = sim.advance(&start, [PaddleInput::Up, PaddleInput::None], DT);
        let b = sim.advance(&start, [PaddleInput::Down, PaddleInput::None], DT);

        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn test_idle_match_scores_eventually() {
        let sim = PongSimulator::default();
        let mut state = sim.initial_state();

        // Paddles never move, the ball has to get past one of them.
        for _ in 0..10_000 {
            state = sim.advance(&state, [PaddleInput::None; 2], DT);
        }

        assert!(state.score_of(Player::Zero) + state.score_of(Player::One) > 0);
        assert!(state.ball_y >= 0.0 && state.ball_y <= FIELD_HEIGHT);
    }
}
