/// Entities: Player and Enemy, plus per-tick input.
///
/// Both actors store a continuous pixel position (authoritative) and the
/// pixel target of their in-flight move. Grid cells are always derived
/// from position, never stored.

use serde::{Deserialize, Serialize};

use super::grid::Cell;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Motion state shared by both actors. `Hanging` is reachable only by the player.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Motion {
    /// Grid-aligned, no pending move.
    Resting,
    /// Sliding toward `target`.
    Animating,
    /// Gravity pulling the actor down at fixed speed.
    Falling,
    /// Post-jump apex; gravity suspended until `until_ms`.
    Hanging { until_ms: u64 },
}

/// Movement keys currently held.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub up_left: bool,
    pub up_right: bool,
}

/// Frame input: held movement keys plus edge-triggered actions.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub keys: MoveKeys,
    pub fire: bool,
    pub dig_at: Option<Cell>,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub motion: Motion,
    pub jumping: bool,
    pub facing: Facing,
    pub coins: usize,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x, y,
            target_x: x,
            target_y: y,
            motion: Motion::Resting,
            jumping: false,
            facing: Facing::Right,
            coins: 0,
        }
    }

    /// Drop any in-flight move and settle where the player stands.
    pub fn reset_movement(&mut self) {
        self.target_x = self.x;
        self.target_y = self.y;
        self.motion = Motion::Resting;
        self.jumping = false;
    }

    pub fn is_hanging(&self) -> bool {
        matches!(self.motion, Motion::Hanging { .. })
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub facing: Facing,
}

impl Enemy {
    pub fn new(x: f32, y: f32) -> Self {
        Enemy { x, y, target_x: x, target_y: y, facing: Facing::Left }
    }

    /// Enemies decide only when they have arrived.
    pub fn is_resting(&self) -> bool {
        self.x == self.target_x && self.y == self.target_y
    }
}
