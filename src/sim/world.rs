/// WorldState: the complete state of a running level.
///
/// ## Grid layers
///
/// Two grids, the same idea as a base/effective tile split:
///   - `base_grid`: the level as loaded. **Never mutated** after load.
///   - `grid`:      the live map (coins taken, holes dug).
///
/// `restart_level` resets `grid = base_grid.clone()` and respawns every
/// actor from the retained `LevelDef`, so a restart cannot fail.
///
/// ## Time
///
/// `clock_ms` is simulation time since the level started. Only `step`
/// advances it, so a paused world does not age: holes, hang time and the
/// elapsed time reported on completion all exclude paused spans.

use crate::config::PhysicsConfig;
use crate::domain::entity::{Enemy, Player};
use crate::domain::grid::{Cell, GridMap};
use crate::domain::physics;
use crate::domain::projectile::{Explosion, Fireball};
use crate::error::{GameError, Result};
use crate::sim::level::LevelDef;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Won { elapsed_ms: u64 },
    Caught,
}

#[derive(Clone, Debug)]
pub struct WorldState {
    // ── Map ──
    pub grid: GridMap,
    base_grid: GridMap,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub fireballs: Vec<Fireball>,
    pub explosions: Vec<Explosion>,
    pub ammo: u32,

    // ── Game tracking ──
    pub clock_ms: u64,
    pub phase: Phase,
    pub paused: bool,

    // ── Meta ──
    pub physics: PhysicsConfig,
    pub level: LevelDef,
    pub level_index: usize,
}

// ── Construction ──

impl WorldState {
    /// Build a fresh world for `def`. Fails on a malformed layout or when an
    /// actor would spawn outside the map or inside Ground.
    pub fn from_level(def: &LevelDef, level_index: usize, physics: PhysicsConfig) -> Result<Self> {
        let grid = def.build_grid(physics.hole_duration_ms)?;
        check_spawn(&grid, "player", def.start_cell())?;
        for &cell in &def.enemies {
            check_spawn(&grid, "enemy", cell)?;
        }
        let mut world = WorldState {
            base_grid: grid.clone(),
            grid,
            player: Player::new(0.0, 0.0),
            enemies: vec![],
            fireballs: vec![],
            explosions: vec![],
            ammo: 0,
            clock_ms: 0,
            phase: Phase::Playing,
            paused: false,
            physics,
            level: def.clone(),
            level_index,
        };
        world.spawn_actors();
        log::info!(
            "level {} \"{}\": {}x{}, {} coins, {} enemies, {} fireballs",
            level_index + 1,
            def.name,
            world.grid.width(),
            world.grid.height(),
            world.grid.total_coins(),
            world.enemies.len(),
            world.ammo,
        );
        Ok(world)
    }

    fn spawn_actors(&mut self) {
        let t = self.physics.tile_size;
        let (px, py) = physics::origin_of(self.level.start_cell(), t);
        self.player = Player::new(px, py);
        self.enemies = self.level.enemies.iter()
            .map(|&cell| {
                let (x, y) = physics::origin_of(cell, t);
                Enemy::new(x, y)
            })
            .collect();
        self.fireballs.clear();
        self.explosions.clear();
        self.ammo = self.level.fireballs;
    }

    /// Reset the level to its loaded state.
    pub fn restart_level(&mut self) {
        self.grid = self.base_grid.clone();
        self.spawn_actors();
        self.clock_ms = 0;
        self.phase = Phase::Playing;
        self.paused = false;
        log::info!("level {} restarted", self.level_index + 1);
    }
}

fn check_spawn(grid: &GridMap, actor: &'static str, cell: Cell) -> Result<()> {
    if grid.in_bounds(cell) && !grid.tile_at(cell).is_solid() {
        Ok(())
    } else {
        Err(GameError::BadSpawn { actor, cell })
    }
}

// ── Queries ──

impl WorldState {
    pub fn player_cell(&self) -> Cell {
        let p = &self.player;
        physics::actor_cell(p.x, p.y, p.target_x, p.target_y, self.physics.tile_size)
    }

    pub fn enemy_cell(&self, enemy: &Enemy) -> Cell {
        physics::actor_cell(enemy.x, enemy.y, enemy.target_x, enemy.target_y, self.physics.tile_size)
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Playing && !self.paused
    }

    /// Elapsed level time: frozen at the winning moment once won.
    pub fn elapsed_ms(&self) -> u64 {
        match self.phase {
            Phase::Won { elapsed_ms } => elapsed_ms,
            _ => self.clock_ms,
        }
    }

    /// Pause only while playing; finished levels stay unpaused.
    pub fn toggle_pause(&mut self) {
        if self.phase == Phase::Playing {
            self.paused = !self.paused;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Motion;
    use crate::domain::tile::Tile;

    fn level() -> LevelDef {
        LevelDef::new("box", &[
            "#######",
            "#_$__$#",
            "#_____#",
            "#######",
        ])
        .with_start(2, 1)
        .with_enemies(&[(2, 5)])
        .with_fireballs(2)
    }

    #[test]
    fn from_level_places_actors_on_their_cells() {
        let w = WorldState::from_level(&level(), 0, PhysicsConfig::default()).unwrap();
        assert_eq!((w.player.x, w.player.y), (32.0, 64.0));
        assert_eq!(w.player.motion, Motion::Resting);
        assert_eq!(w.player_cell(), Cell::new(2, 1));
        assert_eq!(w.enemy_cell(&w.enemies[0]), Cell::new(2, 5));
        assert_eq!(w.ammo, 2);
        assert_eq!(w.grid.total_coins(), 2);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn malformed_layout_is_an_error() {
        let bad = LevelDef::new("bad", &["###", "#"]);
        assert!(WorldState::from_level(&bad, 0, PhysicsConfig::default()).is_err());
    }

    #[test]
    fn spawns_outside_the_map_or_in_ground_are_rejected() {
        // two rows: the default start (h-3, 2) is above the map
        let tiny = LevelDef::new("tiny", &["_$", "##"]);
        assert!(matches!(
            WorldState::from_level(&tiny, 0, PhysicsConfig::default()),
            Err(GameError::BadSpawn { actor: "player", cell }) if cell == Cell::new(-1, 2)
        ));

        let buried = level().with_start(0, 0);
        assert!(matches!(
            WorldState::from_level(&buried, 0, PhysicsConfig::default()),
            Err(GameError::BadSpawn { actor: "player", .. })
        ));

        let walled = level().with_enemies(&[(2, 1), (3, 3)]);
        assert!(matches!(
            WorldState::from_level(&walled, 0, PhysicsConfig::default()),
            Err(GameError::BadSpawn { actor: "enemy", cell }) if cell == Cell::new(3, 3)
        ));
    }

    #[test]
    fn restart_restores_map_and_actors() {
        let mut w = WorldState::from_level(&level(), 3, PhysicsConfig::default()).unwrap();
        w.grid.set_tile(Cell::new(1, 2), Tile::Empty);
        w.grid.dig_hole(Cell::new(3, 3), 10);
        w.player.x = 96.0;
        w.player.coins = 1;
        w.enemies.clear();
        w.ammo = 0;
        w.clock_ms = 5000;
        w.phase = Phase::Caught;

        w.restart_level();
        assert_eq!(w.grid.tile_at(Cell::new(1, 2)), Tile::Coin);
        assert_eq!(w.grid.tile_at(Cell::new(3, 3)), Tile::Ground);
        assert!(w.grid.holes().is_empty());
        assert_eq!(w.player.x, 32.0);
        assert_eq!(w.player.coins, 0);
        assert_eq!(w.enemies.len(), 1);
        assert_eq!(w.ammo, 2);
        assert_eq!(w.clock_ms, 0);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.level_index, 3);
    }

    #[test]
    fn pause_only_while_playing() {
        let mut w = WorldState::from_level(&level(), 0, PhysicsConfig::default()).unwrap();
        w.toggle_pause();
        assert!(w.paused && !w.is_running());
        w.toggle_pause();
        assert!(w.is_running());
        w.phase = Phase::Won { elapsed_ms: 1234 };
        w.toggle_pause();
        assert!(!w.paused);
        assert_eq!(w.elapsed_ms(), 1234);
    }
}
