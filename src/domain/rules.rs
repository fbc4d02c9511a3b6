/// Player movement rules and dig reach, truth-table driven.
///
/// Pure functions over the grid: they decide what is legal and return an
/// intent, without touching any state. The controller in `sim::step`
/// applies the intent.
///
/// Terms, evaluated at the player's logical cell:
///   - **Support**   = vertically aligned AND tile below is Ground or Ladder
///   - **On ladder** = tile here is Ladder
///   - **Can climb** = on ladder OR (support AND tile below is Ladder)
///
/// ## Priority (first rule that yields a move wins)
///
/// ┌───┬──────────────┬──────────────────────────────┬──────────────────────────┐
/// │ # │ Move          │ Requires                      │ Denied when               │
/// ├───┼──────────────┼──────────────────────────────┼──────────────────────────┤
/// │ 1 │ Climb down    │ can climb, Down held          │ below is Ground           │
/// │ 1 │ Climb up      │ can climb, Up held            │ row 0, above is Ground    │
/// │ 2 │ Walk          │ support or on ladder,         │ dest out of bounds,       │
/// │   │               │ Left/Right held               │ dest is Ground            │
/// │ 3 │ Jump          │ support, Up held              │ above is Ground           │
/// │ 3 │ Jump-roll     │ support, Up-Left/Up-Right held│ above is Ground, diagonal │
/// │   │               │                               │ is Ground, dest col OOB   │
/// └───┴──────────────┴──────────────────────────────┴──────────────────────────┘
///
/// Down wins over Up and Left wins over Right when both are held.

use super::entity::{Facing, MoveKeys};
use super::grid::{Cell, GridMap};

/// One discrete move, in whole tiles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MoveIntent {
    pub d_col: i32,
    pub d_row: i32,
    /// Jumps end in a hang instead of a plain rest.
    pub jump: bool,
}

impl MoveIntent {
    const fn step(d_row: i32, d_col: i32) -> Self {
        MoveIntent { d_col, d_row, jump: false }
    }

    const fn jump(d_col: i32) -> Self {
        MoveIntent { d_col, d_row: -1, jump: true }
    }
}

/// What the player stands in / on, sampled once per decision.
#[derive(Clone, Copy, Debug)]
pub struct Footing {
    pub support: bool,
    pub on_ladder: bool,
    pub can_climb: bool,
}

pub fn footing(grid: &GridMap, cell: Cell, aligned: bool) -> Footing {
    let here = grid.tile_at(cell);
    let below = grid.tile_at(cell.offset(1, 0));
    let support = aligned && below.supports();
    let on_ladder = here.is_ladder();
    Footing {
        support,
        on_ladder,
        can_climb: on_ladder || (support && below.is_ladder()),
    }
}

// ── Individual rules ──

pub fn climb(grid: &GridMap, cell: Cell, f: Footing, keys: &MoveKeys) -> Option<MoveIntent> {
    if !f.can_climb {
        return None;
    }
    if keys.down {
        return (!grid.tile_at(cell.offset(1, 0)).is_solid()).then(|| MoveIntent::step(1, 0));
    }
    if keys.up && cell.row > 0 && !grid.tile_at(cell.offset(-1, 0)).is_solid() {
        return Some(MoveIntent::step(-1, 0));
    }
    None
}

pub fn walk(grid: &GridMap, cell: Cell, f: Footing, keys: &MoveKeys) -> Option<MoveIntent> {
    if !(f.support || f.on_ladder) {
        return None;
    }
    let dir = if keys.left {
        -1
    } else if keys.right {
        1
    } else {
        return None;
    };
    let dest = cell.offset(0, dir);
    (grid.in_bounds(dest) && !grid.tile_at(dest).is_solid()).then(|| MoveIntent::step(0, dir))
}

pub fn jump(grid: &GridMap, cell: Cell, f: Footing, keys: &MoveKeys) -> Option<MoveIntent> {
    if !f.support {
        return None;
    }
    let above_clear = !grid.tile_at(cell.offset(-1, 0)).is_solid();
    if keys.up && above_clear {
        return Some(MoveIntent::jump(0));
    }
    let dir = if keys.up_left {
        -1
    } else if keys.up_right {
        1
    } else {
        return None;
    };
    let dest = cell.offset(-1, dir);
    let col_in_bounds = dest.col >= 0 && (dest.col as usize) < grid.width();
    (above_clear && col_in_bounds && !grid.tile_at(dest).is_solid()).then(|| MoveIntent::jump(dir))
}

// ── Controller decision ──

/// The single move the player makes this poll, if any.
pub fn choose_move(grid: &GridMap, cell: Cell, aligned: bool, keys: &MoveKeys) -> Option<MoveIntent> {
    let f = footing(grid, cell, aligned);
    climb(grid, cell, f, keys)
        .or_else(|| walk(grid, cell, f, keys))
        .or_else(|| jump(grid, cell, f, keys))
}

/// Facing follows horizontal intent even when the move itself is blocked.
pub fn facing_from_keys(keys: &MoveKeys) -> Option<Facing> {
    if keys.left || keys.up_left {
        Some(Facing::Left)
    } else if keys.right || keys.up_right {
        Some(Facing::Right)
    } else {
        None
    }
}

/// Digging reaches the eight neighbours and the player's own cell.
pub fn dig_in_reach(player: Cell, target: Cell) -> bool {
    player.chebyshev(target) <= 1
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
