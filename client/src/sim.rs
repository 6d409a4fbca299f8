//! Fixed-tick simulation loop on its own OS thread.

use crate::game::{OutboundStaging, SharedWorld};
use crate::input::InputSource;
use crate::render::FrameSink;
use log::info;
use shared::{clamp_dt, step_position, Message, Player};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 60;

/// Advances the locally controlled player and stages its moves.
///
/// The loop reads the shared world but never writes it: the staged move
/// travels to the server and the authoritative echo is what the router
/// applies, for the controlled player exactly like for remote ones.
pub struct SimulationLoop {
    world: SharedWorld,
    staging: Arc<OutboundStaging>,
    input: Box<dyn InputSource>,
    frames: Box<dyn FrameSink>,
    shutdown: Arc<AtomicBool>,
    tick_duration: Duration,
}

impl SimulationLoop {
    pub fn new(
        world: SharedWorld,
        staging: Arc<OutboundStaging>,
        input: Box<dyn InputSource>,
        frames: Box<dyn FrameSink>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            world,
            staging,
            input,
            frames,
            shutdown,
            tick_duration: Duration::from_secs_f32(1.0 / TICK_RATE as f32),
        }
    }

    /// Spawns the loop on a dedicated thread. Ticks may block freely there;
    /// message delivery on the async side is never stalled by a slow frame.
    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(mut self) {
        info!("Simulation loop started at {} Hz", TICK_RATE);
        let mut last_tick = Instant::now();

        while !self.shutdown.load(Ordering::Relaxed) {
            let tick_start = Instant::now();
            let dt = clamp_dt((tick_start - last_tick).as_secs_f32());
            last_tick = tick_start;

            self.tick(dt);

            if let Some(remaining) = self.tick_duration.checked_sub(tick_start.elapsed()) {
                thread::sleep(remaining);
            }
        }

        info!("Simulation loop stopped");
    }

    /// One fixed step: sample input, integrate the controlled player's
    /// position, stage the move, present the frame.
    fn tick(&mut self, dt: f32) {
        let input = self.input.sample();

        let (staged, frame) = {
            let world = self.world.lock();
            let staged = world.controlled_player().map(|player| {
                let (pos_x, pos_y) = step_position(player.x, player.y, &input, dt);
                Message::PlayerMove {
                    id: player.id,
                    pos_x,
                    pos_y,
                }
            });
            let frame: Vec<Player> = world.players().cloned().collect();
            (staged, frame)
        };

        // No controlled player yet means the id assignment has not arrived;
        // the tick is a no-op until it does.
        if let Some(msg) = staged {
            self.staging.stage(msg);
        }

        self.frames.present(&frame);
    }
}
