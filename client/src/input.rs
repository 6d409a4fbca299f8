//! Input sources for the simulation loop.
//!
//! Polling a real input device is an external concern; the loop only needs
//! a "sample the current input state" capability.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::InputState;
use std::collections::VecDeque;

pub trait InputSource: Send {
    /// Samples the input state for the current tick.
    fn sample(&mut self) -> InputState;
}

/// Random-walk input: picks a direction, holds it for a stretch of ticks,
/// picks again. Stands in for a keyboard when none is wired up.
pub struct WanderInput {
    rng: StdRng,
    current: InputState,
    ticks_left: u32,
}

impl WanderInput {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            current: InputState::default(),
            ticks_left: 0,
        }
    }
}

impl Default for WanderInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for WanderInput {
    fn sample(&mut self) -> InputState {
        if self.ticks_left == 0 {
            self.ticks_left = self.rng.gen_range(30..120);
            self.current = match self.rng.gen_range(0..6) {
                0 => InputState {
                    up: true,
                    ..Default::default()
                },
                1 => InputState {
                    down: true,
                    ..Default::default()
                },
                2 => InputState {
                    left: true,
                    ..Default::default()
                },
                3 => InputState {
                    right: true,
                    ..Default::default()
                },
                4 => InputState {
                    up: true,
                    right: true,
                    ..Default::default()
                },
                _ => InputState::default(),
            };
        }
        self.ticks_left -= 1;
        self.current
    }
}

/// Replays a fixed input sequence, then goes idle. For tests.
pub struct ScriptedInput {
    steps: VecDeque<InputState>,
}

impl ScriptedInput {
    pub fn new(steps: Vec<InputState>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self) -> InputState {
        self.steps.pop_front().unwrap_or_default()
    }
}
