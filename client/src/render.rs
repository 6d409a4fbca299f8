//! Frame presentation seam.
//!
//! Drawing is an external concern; the simulation loop only needs a
//! "present a frame" capability. The default sink logs positions at a low
//! rate so a headless client still shows what it sees.

use log::debug;
use shared::Player;

pub trait FrameSink: Send {
    fn present(&mut self, players: &[Player]);
}

/// Logs player positions every `every` frames.
pub struct LogFrameSink {
    frames: u64,
    every: u64,
}

impl LogFrameSink {
    pub fn new(every: u64) -> Self {
        Self {
            frames: 0,
            every: every.max(1),
        }
    }
}

impl FrameSink for LogFrameSink {
    fn present(&mut self, players: &[Player]) {
        self.frames += 1;
        if self.frames % self.every != 0 {
            return;
        }
        for player in players {
            debug!(
                "frame {}: player {} at ({:.1}, {:.1})",
                self.frames, player.id, player.x, player.y
            );
        }
    }
}

/// Discards frames entirely. For tests.
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn present(&mut self, _players: &[Player]) {}
}
