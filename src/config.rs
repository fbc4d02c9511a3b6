/// External configuration loader.
///
/// Reads `config.toml` from an explicit path, else the executable's
/// directory, else CWD. Missing files or keys fall back to defaults;
/// a malformed file is logged and ignored.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::GameError;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub levels_file: PathBuf,
    pub save_dir: PathBuf,
    pub scores_file: PathBuf,
}

/// Per-tick constants for the simulation. Speeds are pixels per tick,
/// durations are milliseconds of simulation time.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub tile_size: f32,
    pub tick_rate_ms: u64,
    pub animation_speed: f32,
    pub enemy_speed: f32,
    pub fall_speed: f32,
    pub hole_duration_ms: u64,
    pub jump_hang_ms: u64,
    pub fireball_speed: f32,
    pub explosion_duration_ms: u64,
    pub explosion_radius_tiles: f32,
    pub enemy_hitbox_inset: f32,
    pub align_epsilon: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        TomlPhysics::default().into()
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_tile_size")]
    tile_size: f32,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_animation_speed")]
    animation_speed: f32,
    #[serde(default = "default_enemy_speed")]
    enemy_speed: f32,
    #[serde(default = "default_fall_speed")]
    fall_speed: f32,
    #[serde(default = "default_hole_duration")]
    hole_duration_ms: u64,
    #[serde(default = "default_jump_hang")]
    jump_hang_ms: u64,
    #[serde(default = "default_fireball_speed")]
    fireball_speed: f32,
    #[serde(default = "default_explosion_duration")]
    explosion_duration_ms: u64,
    #[serde(default = "default_explosion_radius")]
    explosion_radius_tiles: f32,
    #[serde(default = "default_hitbox_inset")]
    enemy_hitbox_inset: f32,
    #[serde(default = "default_align_epsilon")]
    align_epsilon: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_file")]
    levels_file: String,
    #[serde(default = "default_save_dir")]
    save_dir: String,
    #[serde(default = "default_scores_file")]
    scores_file: String,
}

// ── Defaults ──

fn default_tile_size() -> f32 { 32.0 }
fn default_tick_rate() -> u64 { 16 }           // ~60 ticks per second
fn default_animation_speed() -> f32 { 4.0 }    // 8 ticks per tile
fn default_enemy_speed() -> f32 { 1.5 }        // noticeably slower than the player
fn default_fall_speed() -> f32 { 4.0 }
fn default_hole_duration() -> u64 { 4000 }
fn default_jump_hang() -> u64 { 300 }
fn default_fireball_speed() -> f32 { 6.0 }
fn default_explosion_duration() -> u64 { 500 }
fn default_explosion_radius() -> f32 { 1.5 }
fn default_hitbox_inset() -> f32 { 5.0 }
fn default_align_epsilon() -> f32 { 0.1 }

fn default_levels_file() -> String { "levels.json".into() }
fn default_save_dir() -> String { "saves".into() }
fn default_scores_file() -> String { "scores.txt".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            tile_size: default_tile_size(),
            tick_rate_ms: default_tick_rate(),
            animation_speed: default_animation_speed(),
            enemy_speed: default_enemy_speed(),
            fall_speed: default_fall_speed(),
            hole_duration_ms: default_hole_duration(),
            jump_hang_ms: default_jump_hang(),
            fireball_speed: default_fireball_speed(),
            explosion_duration_ms: default_explosion_duration(),
            explosion_radius_tiles: default_explosion_radius(),
            enemy_hitbox_inset: default_hitbox_inset(),
            align_epsilon: default_align_epsilon(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_file: default_levels_file(),
            save_dir: default_save_dir(),
            scores_file: default_scores_file(),
        }
    }
}

impl From<TomlPhysics> for PhysicsConfig {
    fn from(t: TomlPhysics) -> Self {
        PhysicsConfig {
            tile_size: t.tile_size,
            tick_rate_ms: t.tick_rate_ms.max(1),
            animation_speed: t.animation_speed,
            enemy_speed: t.enemy_speed,
            fall_speed: t.fall_speed,
            hole_duration_ms: t.hole_duration_ms,
            jump_hang_ms: t.jump_hang_ms,
            fireball_speed: t.fireball_speed,
            explosion_duration_ms: t.explosion_duration_ms,
            explosion_radius_tiles: t.explosion_radius_tiles,
            enemy_hitbox_inset: t.enemy_hitbox_inset,
            align_epsilon: t.align_epsilon,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config. `explicit` (from `--config`) is tried first; otherwise
    /// the exe directory and CWD are searched for `config.toml`.
    pub fn load(explicit: Option<&Path>) -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_else(|e| {
                log::warn!("{e}; using default settings");
                TomlConfig::default()
            }),
            None => find_toml(&search_dirs),
        };

        let resolve = |name: &str| -> PathBuf {
            let p = PathBuf::from(name);
            if p.is_absolute() {
                return p;
            }
            search_dirs.iter()
                .map(|d| d.join(name))
                .find(|c| c.exists())
                .unwrap_or(p)
        };

        GameConfig {
            physics: toml_cfg.physics.into(),
            levels_file: resolve(&toml_cfg.general.levels_file),
            save_dir: resolve(&toml_cfg.general.save_dir),
            scores_file: resolve(&toml_cfg.general.scores_file),
        }
    }

    /// Parse a config document; used by `load` and tests.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg: TomlConfig = toml::from_str(text)?;
        Ok(GameConfig {
            physics: cfg.physics.into(),
            levels_file: PathBuf::from(cfg.general.levels_file),
            save_dir: PathBuf::from(cfg.general.save_dir),
            scores_file: PathBuf::from(cfg.general.scores_file),
        })
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn read_toml(path: &Path) -> Result<TomlConfig, GameError> {
    let text = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
    toml::from_str::<TomlConfig>(&text).map_err(|source| GameError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Search for config.toml in candidate directories.
fn find_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match read_toml(&path) {
            Ok(cfg) => {
                log::info!("loaded {}", path.display());
                return cfg;
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                return TomlConfig::default();
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.physics, PhysicsConfig::default());
        assert_eq!(cfg.physics.hole_duration_ms, 4000);
        assert_eq!(cfg.levels_file, PathBuf::from("levels.json"));
    }

    #[test]
    fn partial_physics_section_keeps_other_defaults() {
        let cfg = GameConfig::from_toml_str("[physics]\nenemy_speed = 2.0\n").unwrap();
        assert_eq!(cfg.physics.enemy_speed, 2.0);
        assert_eq!(cfg.physics.tile_size, 32.0);
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let cfg = GameConfig::from_toml_str("[physics]\ntick_rate_ms = 0\n").unwrap();
        assert_eq!(cfg.physics.tick_rate_ms, 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::from_toml_str("[physics\n").is_err());
    }
}
