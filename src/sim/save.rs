/// Quicksave: mid-level snapshots, one file per level.
///
/// ## Snapshot contents
///
///   level index, elapsed ms, player position/coins/facing, tile rows,
///   holes, enemies (position + target), ammo, fireballs, explosions.
///
/// Holes are stored by **age**, not timestamp, and rebased on restore as
/// `created_at = elapsed − age`, so a hole keeps exactly the lifetime it
/// had left when saved.
///
/// The restored player has its movement reset (target = position,
/// Resting); any in-flight slide or hang is dropped.
///
/// ## Files
///
///   `<save_dir>/quicksave_<level>.json` (serde_json, pretty-printed).
///   A missing file is "no save", never an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::entity::{Enemy, Facing, Player};
use crate::domain::grid::{self, Cell, Hole};
use crate::domain::projectile::{Explosion, Fireball};
use crate::error::{GameError, Result};
use crate::sim::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub level_index: usize,
    pub elapsed_ms: u64,
    pub player: SnapshotPlayer,
    pub tiles: Vec<String>,
    pub holes: Vec<SnapshotHole>,
    pub enemies: Vec<SnapshotEnemy>,
    pub ammo: u32,
    #[serde(default)]
    pub fireballs: Vec<Fireball>,
    #[serde(default)]
    pub explosions: Vec<Explosion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPlayer {
    pub x: f32,
    pub y: f32,
    pub coins: usize,
    pub facing: Facing,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHole {
    pub row: i32,
    pub col: i32,
    pub age_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEnemy {
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
}

// ══════════════════════════════════════════════════════════════
// Snapshot capture / restore (WorldState ↔ Snapshot)
// ══════════════════════════════════════════════════════════════

pub fn capture_snapshot(w: &WorldState) -> Snapshot {
    let now = w.clock_ms;
    Snapshot {
        level_index: w.level_index,
        elapsed_ms: now,
        player: SnapshotPlayer {
            x: w.player.x,
            y: w.player.y,
            coins: w.player.coins,
            facing: w.player.facing,
        },
        tiles: w.grid.to_symbol_rows(),
        holes: w.grid.holes().iter().map(|h| SnapshotHole {
            row: h.cell.row,
            col: h.cell.col,
            age_ms: h.age(now),
        }).collect(),
        enemies: w.enemies.iter().map(|e| SnapshotEnemy {
            x: e.x, y: e.y,
            target_x: e.target_x,
            target_y: e.target_y,
        }).collect(),
        ammo: w.ammo,
        fireballs: w.fireballs.clone(),
        explosions: w.explosions.clone(),
    }
}

/// Overwrite the runtime state of `w`, which must be built for the level
/// the snapshot was taken on.
/// On error `w` is left untouched.
pub fn restore_snapshot(w: &mut WorldState, snap: &Snapshot) -> Result<()> {
    if snap.level_index != w.level_index {
        return Err(GameError::SnapshotLevel { saved: snap.level_index, current: w.level_index });
    }
    let tiles = grid::parse_rows(&snap.tiles)?;
    let now = snap.elapsed_ms;
    let holes = snap.holes.iter().map(|h| Hole {
        cell: Cell::new(h.row, h.col),
        created_at_ms: now.saturating_sub(h.age_ms),
    }).collect();
    w.grid.restore(tiles, holes)?;

    w.clock_ms = now;
    w.player = Player::new(snap.player.x, snap.player.y);
    w.player.coins = snap.player.coins;
    w.player.facing = snap.player.facing;
    w.player.reset_movement();

    w.enemies = snap.enemies.iter().map(|e| {
        let mut enemy = Enemy::new(e.x, e.y);
        enemy.target_x = e.target_x;
        enemy.target_y = e.target_y;
        enemy
    }).collect();

    w.ammo = snap.ammo;
    w.fireballs = snap.fireballs.clone();
    w.explosions = snap.explosions.clone();
    w.phase = Phase::Playing;
    w.paused = false;
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Quicksave files
// ══════════════════════════════════════════════════════════════

pub fn quicksave_path(dir: &Path, level_index: usize) -> PathBuf {
    dir.join(format!("quicksave_{level_index}.json"))
}

/// Write the current level's quicksave. Returns the file written.
pub fn save_quick(dir: &Path, w: &WorldState) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| GameError::io(dir, e))?;
    let path = quicksave_path(dir, w.level_index);
    let text = serde_json::to_string_pretty(&capture_snapshot(w))
        .map_err(|e| GameError::json(&path, e))?;
    std::fs::write(&path, text).map_err(|e| GameError::io(&path, e))?;
    log::info!("saved {}", path.display());
    Ok(path)
}

/// Read a level's quicksave. `Ok(None)` when there is none.
pub fn load_quick(dir: &Path, level_index: usize) -> Result<Option<Snapshot>> {
    let path = quicksave_path(dir, level_index);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|e| GameError::io(&path, e))?;
    let snap = serde_json::from_str(&text).map_err(|e| GameError::json(&path, e))?;
    Ok(Some(snap))
}
