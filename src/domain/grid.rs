/// Grid map: tile layout, boundary-safe queries, and the hole lifecycle.
///
/// ## Invariants
///
///   - Every coordinate resolves. Anything outside `[0,height)×[0,width)`
///     reads as `Ground`, so the border is solid without special cases.
///   - A hole cell reads `Empty` while its record is alive and reverts to
///     `Ground` exactly once, on the first sweep where
///     `now - created_at > hole_duration`.
///   - `total_coins` is counted once at construction and never recomputed.

use serde::{Deserialize, Serialize};

use super::tile::Tile;
use crate::error::{GameError, Result};

/// A grid coordinate. Signed so neighbours of edge cells stay representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Cell {
    #[serde(alias = "r")]
    pub row: i32,
    #[serde(alias = "c")]
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Cell { row, col }
    }

    pub fn offset(self, d_row: i32, d_col: i32) -> Self {
        Cell { row: self.row + d_row, col: self.col + d_col }
    }

    /// Chebyshev distance (king moves).
    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.row - other.row).abs().max((self.col - other.col).abs())
    }
}

/// A dug ground tile waiting to regenerate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Hole {
    pub cell: Cell,
    pub created_at_ms: u64,
}

impl Hole {
    pub fn is_expired(&self, now_ms: u64, duration_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > duration_ms
    }

    pub fn age(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_ms)
    }
}

#[derive(Clone, Debug)]
pub struct GridMap {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
    holes: Vec<Hole>,
    total_coins: usize,
    hole_duration_ms: u64,
}

// ── Construction ──

impl GridMap {
    pub fn new(tiles: Vec<Vec<Tile>>, hole_duration_ms: u64) -> Result<Self> {
        let height = tiles.len();
        let width = tiles.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(GameError::EmptyLayout);
        }
        if let Some((row, r)) = tiles.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GameError::RaggedLayout { row, expected: width, found: r.len() });
        }
        let total_coins = tiles.iter().flatten().filter(|t| **t == Tile::Coin).count();

        Ok(GridMap { tiles, width, height, holes: vec![], total_coins, hole_duration_ms })
    }

    /// Build from symbol rows (`#` Ground, `^` Ladder, `$` Coin, `_` Empty).
    pub fn from_rows<S: AsRef<str>>(rows: &[S], hole_duration_ms: u64) -> Result<Self> {
        Self::new(parse_rows(rows)?, hole_duration_ms)
    }
}

/// Parse symbol rows into tiles without validating shape.
pub fn parse_rows<S: AsRef<str>>(rows: &[S]) -> Result<Vec<Vec<Tile>>> {
    rows.iter()
        .enumerate()
        .map(|(row, line)| {
            line.as_ref()
                .chars()
                .enumerate()
                .map(|(col, symbol)| {
                    Tile::from_symbol(symbol).ok_or(GameError::UnknownTile { row, col, symbol })
                })
                .collect()
        })
        .collect()
}

// ── Queries ──

impl GridMap {
    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn total_coins(&self) -> usize { self.total_coins }
    pub fn holes(&self) -> &[Hole] { &self.holes }
    pub fn hole_duration_ms(&self) -> u64 { self.hole_duration_ms }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && (cell.row as usize) < self.height
            && (cell.col as usize) < self.width
    }

    /// Tile at `cell`; out-of-range reads as solid Ground.
    #[inline]
    pub fn tile_at(&self, cell: Cell) -> Tile {
        if self.in_bounds(cell) {
            self.tiles[cell.row as usize][cell.col as usize]
        } else {
            Tile::Ground
        }
    }

    pub fn rows(&self) -> &[Vec<Tile>] {
        &self.tiles
    }

    /// Layout as symbol rows (snapshot encoding).
    pub fn to_symbol_rows(&self) -> Vec<String> {
        self.tiles.iter().map(|r| r.iter().map(|t| t.symbol()).collect()).collect()
    }
}

// ── Mutation ──

impl GridMap {
    /// No-op out of range.
    #[inline]
    pub fn set_tile(&mut self, cell: Cell, tile: Tile) {
        if self.in_bounds(cell) {
            self.tiles[cell.row as usize][cell.col as usize] = tile;
        }
    }

    /// Dig `cell` if it is Ground. Anything else is silently ignored.
    /// Returns whether a hole was opened.
    pub fn dig_hole(&mut self, cell: Cell, now_ms: u64) -> bool {
        if self.tile_at(cell) != Tile::Ground || !self.in_bounds(cell) {
            return false;
        }
        self.set_tile(cell, Tile::Empty);
        self.holes.push(Hole { cell, created_at_ms: now_ms });
        true
    }

    /// Regenerate every expired hole. Returns the cells that closed.
    pub fn advance_holes(&mut self, now_ms: u64) -> Vec<Cell> {
        let duration = self.hole_duration_ms;
        let mut closed = vec![];
        self.holes.retain(|h| {
            if h.is_expired(now_ms, duration) {
                closed.push(h.cell);
                false
            } else {
                true
            }
        });
        for &cell in &closed {
            self.set_tile(cell, Tile::Ground);
        }
        closed
    }

    /// Replace tiles and holes wholesale (snapshot restore).
    /// `total_coins` is deliberately left at its load-time value.
    pub fn restore(&mut self, tiles: Vec<Vec<Tile>>, holes: Vec<Hole>) -> Result<()> {
        let found_h = tiles.len();
        let found_w = tiles.first().map_or(0, Vec::len);
        if found_h != self.height || found_w != self.width || tiles.iter().any(|r| r.len() != found_w) {
            return Err(GameError::SnapshotMismatch {
                expected_w: self.width,
                expected_h: self.height,
                found_w,
                found_h,
            });
        }
        self.tiles = tiles;
        self.holes = holes.into_iter().filter(|h| self.in_bounds(h.cell)).collect();
        for h in &self.holes {
            self.tiles[h.cell.row as usize][h.cell.col as usize] = Tile::Empty;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> GridMap {
        GridMap::from_rows(rows, 4000).unwrap()
    }

    #[test]
    fn out_of_bounds_is_ground() {
        let g = grid(&["___", "___"]);
        for cell in [Cell::new(-1, 0), Cell::new(0, -1), Cell::new(2, 0), Cell::new(0, 3), Cell::new(-5, 99)] {
            assert_eq!(g.tile_at(cell), Tile::Ground, "{cell:?}");
        }
        assert_eq!(g.tile_at(Cell::new(1, 2)), Tile::Empty);
    }

    #[test]
    fn set_tile_out_of_range_is_noop() {
        let mut g = grid(&["__"]);
        g.set_tile(Cell::new(3, 3), Tile::Coin);
        g.set_tile(Cell::new(-1, 0), Tile::Coin);
        assert_eq!(g.to_symbol_rows(), vec!["__".to_string()]);
    }

    #[test]
    fn rejects_bad_layouts() {
        assert!(matches!(GridMap::from_rows::<&str>(&[], 10), Err(GameError::EmptyLayout)));
        assert!(matches!(
            GridMap::from_rows(&["###", "##"], 10),
            Err(GameError::RaggedLayout { row: 1, expected: 3, found: 2 })
        ));
        assert!(matches!(
            GridMap::from_rows(&["#X#"], 10),
            Err(GameError::UnknownTile { row: 0, col: 1, symbol: 'X' })
        ));
    }

    #[test]
    fn dig_only_affects_ground() {
        let mut g = grid(&["#^$_"]);
        assert!(g.dig_hole(Cell::new(0, 0), 0));
        assert!(!g.dig_hole(Cell::new(0, 1), 0));
        assert!(!g.dig_hole(Cell::new(0, 2), 0));
        assert!(!g.dig_hole(Cell::new(0, 3), 0));
        assert!(!g.dig_hole(Cell::new(0, 9), 0)); // border reads Ground but is not diggable
        assert_eq!(g.to_symbol_rows(), vec!["_^$_".to_string()]);
        assert_eq!(g.holes().len(), 1);
    }

    #[test]
    fn hole_regenerates_strictly_after_duration() {
        let mut g = grid(&["#####", "#####", "#####", "#####"]);
        let c = Cell::new(3, 3);
        g.dig_hole(c, 1000);

        assert!(g.advance_holes(4999).is_empty());
        assert_eq!(g.tile_at(c), Tile::Empty);
        assert!(g.advance_holes(5000).is_empty());
        assert_eq!(g.tile_at(c), Tile::Empty);
        assert_eq!(g.advance_holes(5001), vec![c]);
        assert_eq!(g.tile_at(c), Tile::Ground);
        assert!(g.holes().is_empty());
        // already closed: never reverts twice
        assert!(g.advance_holes(9000).is_empty());
    }

    #[test]
    fn later_hole_never_closes_first() {
        let mut g = grid(&["###"]);
        g.dig_hole(Cell::new(0, 0), 100);
        g.dig_hole(Cell::new(0, 2), 900);
        assert_eq!(g.advance_holes(4101), vec![Cell::new(0, 0)]);
        assert_eq!(g.tile_at(Cell::new(0, 2)), Tile::Empty);
        assert_eq!(g.advance_holes(4901), vec![Cell::new(0, 2)]);
    }

    #[test]
    fn total_coins_is_a_load_time_snapshot() {
        let mut g = grid(&["$_$", "#$#"]);
        assert_eq!(g.total_coins(), 3);
        g.set_tile(Cell::new(0, 0), Tile::Empty);
        g.set_tile(Cell::new(0, 1), Tile::Coin);
        g.set_tile(Cell::new(0, 1), Tile::Coin);
        assert_eq!(g.total_coins(), 3);
    }

    #[test]
    fn restore_checks_dimensions_and_reopens_holes() {
        let mut g = grid(&["##", "##"]);
        let tiles = parse_rows(&["$#", "##"]).unwrap();
        let hole = Hole { cell: Cell::new(1, 1), created_at_ms: 7 };
        g.restore(tiles, vec![hole]).unwrap();
        assert_eq!(g.tile_at(Cell::new(1, 1)), Tile::Empty);
        assert_eq!(g.tile_at(Cell::new(0, 0)), Tile::Coin);
        assert_eq!(g.total_coins(), 0);

        let wrong = parse_rows(&["###"]).unwrap();
        assert!(matches!(g.restore(wrong, vec![]), Err(GameError::SnapshotMismatch { .. })));
    }

    #[test]
    fn chebyshev_distance() {
        let a = Cell::new(2, 2);
        assert_eq!(a.chebyshev(Cell::new(3, 3)), 1);
        assert_eq!(a.chebyshev(Cell::new(2, 4)), 2);
        assert_eq!(a.chebyshev(a), 0);
    }
}
