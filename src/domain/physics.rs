/// Actor motion model: shared by Player and Enemy.
///
/// ## Coordinates
///
/// Actors live in pixel space: `(x, y)` is the top-left of a
/// `tile_size × tile_size` box. The logical grid cell is derived from the
/// box centre:
///
///   row = floor((y + T/2) / T)     col = floor((x + T/2) / T)
///
/// Mid-move, an actor's logical cell is the cell it left until it is within
/// half a tile of its target (`actor_cell`).
///
/// ## Stepping
///
/// A move is a target exactly one tile away on one or both axes. Each tick
/// every axis approaches its target by at most `speed` and never
/// overshoots; the move completes when both axes land together.
///
/// ## Gravity
///
/// ┌──────────────────────────────┬─────────────────────────────────┐
/// │ Situation                     │ Result                           │
/// ├──────────────────────────────┼─────────────────────────────────┤
/// │ aligned, here is Ladder       │ Supported                        │
/// │ aligned, below Ground/Ladder  │ Supported                        │
/// │ aligned, otherwise            │ y += fall_speed → Falling        │
/// │ unaligned, next line ≤ 1 step │ snap if landing cell holds,      │
/// │   away                        │   else y += fall_speed           │
/// │ unaligned, otherwise          │ y += fall_speed → Falling        │
/// └──────────────────────────────┴─────────────────────────────────┘
///
/// "Landing cell holds" = the cell the actor would occupy is a Ladder or
/// the cell beneath it is Ground/Ladder.

use super::grid::{Cell, GridMap};
use crate::config::PhysicsConfig;

// ══════════════════════════════════════════════════════════════
// Geometry
// ══════════════════════════════════════════════════════════════

/// Axis-aligned box in pixel space.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// The full box of an actor at `(x, y)`.
    pub fn actor(x: f32, y: f32, tile: f32) -> Self {
        Rect { x, y, w: tile, h: tile }
    }

    /// Shrink by `d` on every side (negative grows).
    pub fn inset(self, d: f32) -> Self {
        Rect {
            x: self.x + d,
            y: self.y + d,
            w: (self.w - 2.0 * d).max(0.0),
            h: (self.h - 2.0 * d).max(0.0),
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Overlap with positive area. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

// ══════════════════════════════════════════════════════════════
// Grid ↔ pixel
// ══════════════════════════════════════════════════════════════

/// Logical cell of an actor whose top-left is `(x, y)`.
#[inline]
pub fn cell_of(x: f32, y: f32, tile: f32) -> Cell {
    let half = tile / 2.0;
    Cell::new(((y + half) / tile).floor() as i32, ((x + half) / tile).floor() as i32)
}

/// Logical cell of an actor sliding from one cell toward `(tx, ty)`.
///
/// The actor stays in the cell it left until it is less than half a tile
/// from its target on both axes, then it is in the target cell. A diagonal
/// move therefore never reports either side cell it cuts past.
pub fn actor_cell(x: f32, y: f32, tx: f32, ty: f32, tile: f32) -> Cell {
    let target = cell_of(tx, ty, tile);
    let (dx, dy) = (tx - x, ty - y);
    if dx.abs().max(dy.abs()) < tile / 2.0 {
        return target;
    }
    target.offset(-sign(dy), -sign(dx))
}

fn sign(d: f32) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

/// Cell containing a raw pixel point (projectiles, explosions).
#[inline]
pub fn cell_at_point(px: f32, py: f32, tile: f32) -> Cell {
    Cell::new((py / tile).floor() as i32, (px / tile).floor() as i32)
}

/// Top-left pixel of `cell`.
#[inline]
pub fn origin_of(cell: Cell, tile: f32) -> (f32, f32) {
    (cell.col as f32 * tile, cell.row as f32 * tile)
}

/// Is `y` on a grid line (within `align_epsilon`)?
#[inline]
pub fn is_aligned(y: f32, phys: &PhysicsConfig) -> bool {
    let r = y.rem_euclid(phys.tile_size);
    r < phys.align_epsilon || phys.tile_size - r < phys.align_epsilon
}

// ══════════════════════════════════════════════════════════════
// Support
// ══════════════════════════════════════════════════════════════

/// Does the tile directly below `cell` hold an actor up?
#[inline]
pub fn stands_on_support(grid: &GridMap, cell: Cell) -> bool {
    grid.tile_at(cell.offset(1, 0)).supports()
}

/// Would an aligned actor at `cell` start to fall?
#[inline]
pub fn should_fall(grid: &GridMap, cell: Cell) -> bool {
    !grid.tile_at(cell).is_ladder() && !stands_on_support(grid, cell)
}

// ══════════════════════════════════════════════════════════════
// Stepping
// ══════════════════════════════════════════════════════════════

/// Move `pos` toward `target` by at most `speed`, clamped at `target`.
#[inline]
pub fn approach(pos: f32, target: f32, speed: f32) -> f32 {
    if pos < target {
        (pos + speed).min(target)
    } else if pos > target {
        (pos - speed).max(target)
    } else {
        pos
    }
}

/// One interpolation tick on both axes. Returns true once both axes arrive.
pub fn step_toward(x: &mut f32, y: &mut f32, tx: f32, ty: f32, speed: f32) -> bool {
    *x = approach(*x, tx, speed);
    *y = approach(*y, ty, speed);
    *x == tx && *y == ty
}

// ══════════════════════════════════════════════════════════════
// Gravity
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Gravity {
    /// Aligned and held up; `y` is exactly on the grid line.
    Supported,
    /// Moved down this tick.
    Falling,
    /// Snapped onto a grid line that holds.
    Landed,
}

/// Apply one tick of gravity to an actor at `(x, y)`.
pub fn apply_gravity(x: f32, y: &mut f32, grid: &GridMap, phys: &PhysicsConfig) -> Gravity {
    let t = phys.tile_size;

    if is_aligned(*y, phys) {
        let cell = cell_of(x, *y, t);
        if should_fall(grid, cell) {
            *y += phys.fall_speed;
            return Gravity::Falling;
        }
        *y = (*y / t).round() * t;
        return Gravity::Supported;
    }

    let next_line = ((*y / t).floor() + 1.0) * t;
    if next_line - *y <= phys.fall_speed {
        let landing = cell_of(x, next_line, t);
        if !should_fall(grid, landing) {
            *y = next_line;
            return Gravity::Landed;
        }
    }
    *y += phys.fall_speed;
    Gravity::Falling
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
