/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Ground, // Solid, diggable
    Ladder, // Climbable, supports from below
    Coin,   // Pickup target, passable
}

impl Tile {
    /// Blocks movement into the cell.
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Ground)
    }

    /// Can an actor stand on top of this tile?
    pub fn supports(self) -> bool {
        matches!(self, Tile::Ground | Tile::Ladder)
    }

    pub fn is_ladder(self) -> bool {
        matches!(self, Tile::Ladder)
    }

    pub fn symbol(self) -> char {
        match self {
            Tile::Empty  => '_',
            Tile::Ground => '#',
            Tile::Ladder => '^',
            Tile::Coin   => '$',
        }
    }

    /// Level symbols. Space and `.` are accepted as Empty for hand-written layouts.
    pub fn from_symbol(c: char) -> Option<Tile> {
        match c {
            '_' | ' ' | '.' => Some(Tile::Empty),
            '#' => Some(Tile::Ground),
            '^' => Some(Tile::Ladder),
            '$' => Some(Tile::Coin),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_stable() {
        for t in [Tile::Empty, Tile::Ground, Tile::Ladder, Tile::Coin] {
            assert_eq!(Tile::from_symbol(t.symbol()), Some(t));
        }
        assert_eq!(Tile::from_symbol(' '), Some(Tile::Empty));
        assert_eq!(Tile::from_symbol('H'), None);
    }

    #[test]
    fn only_ground_is_solid() {
        assert!(Tile::Ground.is_solid());
        assert!(!Tile::Ladder.is_solid());
        assert!(!Tile::Coin.is_solid());
        assert!(Tile::Ladder.supports());
        assert!(!Tile::Coin.supports());
    }
}
