/// Enemy AI: breadth-first pursuit over the tile grid.
///
/// Each queued cell carries the first step taken out of `start`, so the
/// answer is ready the moment the goal is dequeued; no backtracking pass.
///
/// ## Neighbours of a cell (r, c)
///
/// ┌───────────────────────────────────┬──────────────────────────────────┐
/// │ Cell                               │ Expanded, in order                │
/// ├───────────────────────────────────┼──────────────────────────────────┤
/// │ airborne: below is not Ground or   │ down only (r < h-1, below ≠ #)    │
/// │   Ladder AND here is not Ladder    │                                   │
/// │ otherwise                          │ up    (here is Ladder, r > 0,     │
/// │                                    │        above ≠ #)                 │
/// │                                    │ down  (r < h-1, below ≠ #)        │
/// │                                    │ left  (c > 0, left ≠ #)           │
/// │                                    │ right (c < w-1, right ≠ #)        │
/// └───────────────────────────────────┴──────────────────────────────────┘
///
/// Cells are marked on enqueue, so the first predecessor to reach a cell
/// owns it. Ties between equal-length paths resolve by the order above.

use std::collections::VecDeque;

use super::grid::{Cell, GridMap};

/// Neighbours in expansion order.
pub fn neighbours(grid: &GridMap, cell: Cell) -> Vec<Cell> {
    let open = |c: Cell| grid.in_bounds(c) && !grid.tile_at(c).is_solid();
    let here = grid.tile_at(cell);
    let below = cell.offset(1, 0);

    if !grid.tile_at(below).supports() && !here.is_ladder() {
        return if open(below) { vec![below] } else { vec![] };
    }

    let mut out = Vec::with_capacity(4);
    if here.is_ladder() && open(cell.offset(-1, 0)) {
        out.push(cell.offset(-1, 0));
    }
    for next in [below, cell.offset(0, -1), cell.offset(0, 1)] {
        if open(next) {
            out.push(next);
        }
    }
    out
}

/// First cell on a shortest path from `start` to `goal`.
///
/// `None` when the goal is unreachable or already reached.
pub fn next_step(grid: &GridMap, start: Cell, goal: Cell) -> Option<Cell> {
    if start == goal || !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return None;
    }

    let (w, h) = (grid.width(), grid.height());
    let idx = |c: Cell| c.row as usize * w + c.col as usize;
    let mut visited = vec![false; w * h];
    visited[idx(start)] = true;

    let mut queue: VecDeque<(Cell, Cell)> = VecDeque::with_capacity(64);
    for n in neighbours(grid, start) {
        if n == goal {
            return Some(n);
        }
        visited[idx(n)] = true;
        queue.push_back((n, n));
    }

    while let Some((cur, first)) = queue.pop_front() {
        for n in neighbours(grid, cur) {
            if visited[idx(n)] {
                continue;
            }
            if n == goal {
                return Some(first);
            }
            visited[idx(n)] = true;
            queue.push_back((n, first));
        }
    }
    None
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
