use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8765";
pub const WORLD_WIDTH: f32 = 1280.0;
pub const WORLD_HEIGHT: f32 = 720.0;
pub const PLAYER_SPEED: f32 = 300.0;
pub const PLAYER_RADIUS: f32 = 40.0;
pub const SPAWN_X: f32 = WORLD_WIDTH / 2.0;
pub const SPAWN_Y: f32 = WORLD_HEIGHT / 2.0;

/// Upper bound on a single simulation step. A stalled tick resumes with a
/// capped dt instead of teleporting the player.
pub const MAX_TICK_DT: f32 = 0.05;

/// Wire message. One flat JSON object per WebSocket text frame, dispatched
/// on the `type` field. Unrecognized types decode to `Unknown` so receivers
/// can skip them without treating new message kinds as errors.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    NewConnection {
        id: u32,
    },
    PlayerMove {
        id: u32,
        pos_x: f32,
        pos_y: f32,
    },
    #[serde(other)]
    Unknown,
}

impl Message {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl Player {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    /// New player at the default spawn point, awaiting its first move.
    pub fn spawn(id: u32) -> Self {
        Self::new(id, SPAWN_X, SPAWN_Y)
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }
}

/// Directional input sampled once per simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn is_idle(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }
}

/// Clamps a frame delta to the maximum simulation step.
pub fn clamp_dt(dt: f32) -> f32 {
    dt.min(MAX_TICK_DT)
}

/// Integrates a position one step under the given input, keeping the player
/// inside the world bounds.
pub fn step_position(x: f32, y: f32, input: &InputState, dt: f32) -> (f32, f32) {
    let mut new_x = x;
    let mut new_y = y;

    if input.up {
        new_y -= PLAYER_SPEED * dt;
    }
    if input.down {
        new_y += PLAYER_SPEED * dt;
    }
    if input.left {
        new_x -= PLAYER_SPEED * dt;
    }
    if input.right {
        new_x += PLAYER_SPEED * dt;
    }

    new_x = new_x.clamp(PLAYER_RADIUS, WORLD_WIDTH - PLAYER_RADIUS);
    new_y = new_y.clamp(PLAYER_RADIUS, WORLD_HEIGHT - PLAYER_RADIUS);

    (new_x, new_y)
}
