/// Level source: JSON level files with an embedded fallback.
///
/// ## File format (`levels.json`)
///
///   ```json
///   [
///     { "name": "Level 1",
///       "layout": ["#####", "#_$_#", "#####"],
///       "player_start": { "r": 1, "c": 1 },
///       "enemies": [{ "r": 1, "c": 3 }],
///       "fireballs": 3 }
///   ]
///   ```
///
/// The legacy format, a bare array of layouts, is still accepted and
/// converted to `Level N` entries with no enemies and no ammo.
///
/// ## Tile legend:
///   '#' = Ground (diggable)    '^' = Ladder
///   '$' = Coin                 '_' or ' ' = Empty
///
/// A level without `player_start` spawns the player at `(height − 3, 2)`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::grid::{Cell, GridMap};
use crate::error::{GameError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    #[serde(default)]
    pub name: String,
    pub layout: Vec<String>,
    #[serde(default, alias = "start")]
    pub player_start: Option<Cell>,
    #[serde(default)]
    pub enemies: Vec<Cell>,
    #[serde(default)]
    pub fireballs: u32,
}

impl LevelDef {
    pub fn new(name: &str, layout: &[&str]) -> Self {
        LevelDef {
            name: name.to_string(),
            layout: layout.iter().map(|s| s.to_string()).collect(),
            player_start: None,
            enemies: vec![],
            fireballs: 0,
        }
    }

    pub fn with_start(mut self, row: i32, col: i32) -> Self {
        self.player_start = Some(Cell::new(row, col));
        self
    }

    pub fn with_enemies(mut self, cells: &[(i32, i32)]) -> Self {
        self.enemies = cells.iter().map(|&(r, c)| Cell::new(r, c)).collect();
        self
    }

    pub fn with_fireballs(mut self, n: u32) -> Self {
        self.fireballs = n;
        self
    }

    pub fn height(&self) -> usize {
        self.layout.len()
    }

    /// Configured start, or the conventional bottom-left spawn.
    pub fn start_cell(&self) -> Cell {
        self.player_start
            .unwrap_or_else(|| Cell::new(self.height() as i32 - 3, 2))
    }

    pub fn build_grid(&self, hole_duration_ms: u64) -> Result<GridMap> {
        GridMap::from_rows(&self.layout, hole_duration_ms)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelFile {
    Levels(Vec<LevelDef>),
    Legacy(Vec<Vec<String>>),
}

/// Ordered level list plus the index being played.
#[derive(Clone, Debug)]
pub struct LevelSet {
    levels: Vec<LevelDef>,
    current: usize,
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

impl LevelSet {
    pub fn new(levels: Vec<LevelDef>) -> Result<Self> {
        if levels.is_empty() {
            return Err(GameError::NoLevels);
        }
        Ok(LevelSet { levels, current: 0 })
    }

    pub fn embedded() -> Self {
        LevelSet { levels: embedded_levels(), current: 0 }
    }

    /// Load a level file. A missing file falls back to the embedded set;
    /// an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found; using built-in levels", path.display());
            return Ok(Self::embedded());
        }
        let text = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
        let set = Self::from_json(&text, path)?;
        log::info!("loaded {} levels from {}: {:?}", set.len(), path.display(), set.names());
        Ok(set)
    }

    /// Parse a level document; `origin` only labels errors.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let file = serde_json::from_str::<LevelFile>(text).map_err(|e| GameError::json(origin, e))?;
        let levels = match file {
            LevelFile::Levels(levels) => levels,
            LevelFile::Legacy(layouts) => {
                log::info!("converting {} legacy layouts", layouts.len());
                layouts
                    .into_iter()
                    .enumerate()
                    .map(|(i, layout)| LevelDef {
                        name: format!("Level {}", i + 1),
                        layout,
                        player_start: None,
                        enemies: vec![],
                        fireballs: 0,
                    })
                    .collect()
            }
        };
        let levels = levels
            .into_iter()
            .enumerate()
            .map(|(i, mut def)| {
                if def.name.is_empty() {
                    def.name = format!("Level {}", i + 1);
                }
                def
            })
            .collect();
        Self::new(levels)
    }
}

// ══════════════════════════════════════════════════════════════
// Navigation
// ══════════════════════════════════════════════════════════════

impl LevelSet {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &LevelDef {
        &self.levels[self.current]
    }

    pub fn names(&self) -> Vec<&str> {
        self.levels.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn next(&mut self) -> bool {
        self.select(self.current + 1)
    }

    pub fn prev(&mut self) -> bool {
        self.current > 0 && self.select(self.current - 1)
    }

    /// Jump to `index`; out of range leaves the selection alone.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.levels.len() || index == self.current {
            return false;
        }
        self.current = index;
        true
    }
}

// ══════════════════════════════════════════════════════════════
// Authoring
// ══════════════════════════════════════════════════════════════

/// Smallest blank level that still leaves the default spawn in open air.
const MIN_SIDE: usize = 5;

impl LevelSet {
    /// Append a Ground-bordered empty level named "New Level" and select it.
    /// Returns its index.
    pub fn create_blank(&mut self, width: usize, height: usize) -> usize {
        let (w, h) = (width.max(MIN_SIDE), height.max(MIN_SIDE));
        let layout = (0..h)
            .map(|r| {
                if r == 0 || r == h - 1 {
                    "#".repeat(w)
                } else {
                    format!("#{}#", "_".repeat(w - 2))
                }
            })
            .collect();
        self.levels.push(LevelDef {
            name: "New Level".to_string(),
            layout,
            player_start: None,
            enemies: vec![],
            fireballs: 0,
        });
        self.current = self.levels.len() - 1;
        log::info!("created blank level {} ({w}x{h})", self.current + 1);
        self.current
    }

    /// Rename the current level and replace its layout. A layout that does
    /// not parse is rejected and nothing changes.
    pub fn update_current(&mut self, name: &str, layout: Vec<String>) -> Result<()> {
        GridMap::from_rows(&layout, 0)?;
        let def = &mut self.levels[self.current];
        def.name = name.to_string();
        def.layout = layout;
        Ok(())
    }

    /// Remove the current level. The last remaining level cannot be removed.
    /// The selection stays at the same index, clamped to the new end.
    pub fn delete_current(&mut self) -> bool {
        if self.levels.len() <= 1 {
            return false;
        }
        let removed = self.levels.remove(self.current);
        self.current = self.current.min(self.levels.len() - 1);
        log::info!("deleted level \"{}\"", removed.name);
        true
    }

    /// Write every level to `path` in the current JSON format.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| GameError::io(dir, e))?;
        }
        let text = serde_json::to_string_pretty(&self.levels).map_err(|e| GameError::json(path, e))?;
        std::fs::write(path, text).map_err(|e| GameError::io(path, e))?;
        log::info!("saved {} levels to {}", self.len(), path.display());
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        LevelDef::new("Level 1 - Two Shafts", &[
            "####################",
            "#__$__________$____#",
            "#####^######^#######",
            "#____^______^______#",
            "#____^__$___^___$__#",
            "#####^####^#########",
            "#____^____^________#",
            "#__$_^____^____$___#",
            "#__________________#",
            "####################",
        ])
        .with_enemies(&[(1, 17)])
        .with_fireballs(3),
        LevelDef::new("Level 2 - Twin Towers", &[
            "####################",
            "#$________________$#",
            "#^######____######^#",
            "#^______$_______$_^#",
            "#^##########^#####^#",
            "#^__________^_____^#",
            "#^___$______^___$_^#",
            "#^________________^#",
            "#__________________#",
            "####################",
        ])
        .with_start(8, 9)
        .with_enemies(&[(1, 9), (5, 6)])
        .with_fireballs(2),
    ]
}
