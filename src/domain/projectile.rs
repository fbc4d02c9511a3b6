/// Fireballs and the explosions they leave behind.
///
/// A fireball is a `tile/3` square flying horizontally at a fixed speed.
/// It detonates on the first tick where any of these holds:
///
///   - its left edge leaves `[0, width × tile]`
///   - the tile under its centre is Ground (sampled one pixel up, so a ball
///     skimming a floor line reads the row it flies in)
///   - its box overlaps any enemy box
///
/// The explosion sits at the fireball's centre, ages by one tick per step,
/// and removes every enemy whose centre lies within the blast radius on
/// each tick until it expires.

use serde::{Deserialize, Serialize};

use super::entity::{Enemy, Facing};
use super::grid::GridMap;
use super::physics::{cell_at_point, Rect};
use crate::config::PhysicsConfig;

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Fireball {
    pub x: f32,
    pub y: f32,
    pub direction: Facing,
}

impl Fireball {
    pub fn size(tile: f32) -> f32 {
        tile / 3.0
    }

    /// Launch from a player whose top-left is `(px, py)`.
    pub fn launch(px: f32, py: f32, facing: Facing, tile: f32) -> Self {
        let size = Self::size(tile);
        let x = match facing {
            Facing::Right => px + tile,
            Facing::Left => px - tile,
        };
        Fireball { x, y: py + tile * 0.6 - size / 2.0, direction: facing }
    }

    pub fn rect(&self, tile: f32) -> Rect {
        let s = Self::size(tile);
        Rect::new(self.x, self.y, s, s)
    }

    /// Move one tick. Returns the explosion if the fireball detonated.
    pub fn advance(&mut self, grid: &GridMap, enemies: &[Enemy], phys: &PhysicsConfig) -> Option<Explosion> {
        let t = phys.tile_size;
        self.x += phys.fireball_speed * self.direction.sign();

        let rect = self.rect(t);
        let (cx, cy) = rect.center();
        let out_of_bounds = self.x < 0.0 || self.x > grid.width() as f32 * t;
        let hit_wall = grid.tile_at(cell_at_point(cx, cy - 1.0, t)).is_solid();
        let hit_enemy = enemies.iter().any(|e| rect.intersects(&Rect::actor(e.x, e.y, t)));

        (out_of_bounds || hit_wall || hit_enemy).then(|| Explosion::new(cx, cy))
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Explosion {
    /// Blast centre in pixels.
    pub x: f32,
    pub y: f32,
    pub age_ms: u64,
}

impl Explosion {
    pub fn new(x: f32, y: f32) -> Self {
        Explosion { x, y, age_ms: 0 }
    }

    pub fn radius(phys: &PhysicsConfig) -> f32 {
        phys.explosion_radius_tiles * phys.tile_size
    }

    pub fn reaches(&self, enemy: &Enemy, phys: &PhysicsConfig) -> bool {
        let half = phys.tile_size / 2.0;
        let (dx, dy) = (enemy.x + half - self.x, enemy.y + half - self.y);
        dx.hypot(dy) <= Self::radius(phys)
    }

    pub fn is_finished(&self, phys: &PhysicsConfig) -> bool {
        self.age_ms > phys.explosion_duration_ms
    }

    /// Age one tick, then remove every enemy in reach unless expired.
    /// Returns how many enemies were destroyed.
    pub fn advance(&mut self, enemies: &mut Vec<Enemy>, phys: &PhysicsConfig) -> usize {
        self.age_ms += phys.tick_rate_ms;
        if self.is_finished(phys) {
            return 0;
        }
        let before = enemies.len();
        enemies.retain(|e| !self.reaches(e, phys));
        before - enemies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: f32 = 32.0;

    fn phys() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn map_from(rows: &[&str]) -> GridMap {
        GridMap::from_rows(rows, 4000).unwrap()
    }

    #[test]
    fn launch_offsets_by_facing() {
        let r = Fireball::launch(64.0, 32.0, Facing::Right, T);
        assert_eq!(r.x, 96.0);
        let size = Fireball::size(T);
        assert!((r.y + size / 2.0 - (32.0 + T * 0.6)).abs() < 1e-4);

        let l = Fireball::launch(64.0, 32.0, Facing::Left, T);
        assert_eq!(l.x, 32.0);
        assert_eq!(r.x - 64.0, 64.0 - l.x);
        assert_eq!(l.direction, Facing::Left);
    }

    #[test]
    fn flies_until_wall() {
        let g = map_from(&[
            "______#",
            "#######",
        ]);
        let p = phys();
        let mut fb = Fireball::launch(0.0, 0.0, Facing::Right, T);
        let mut ticks = 0;
        let blast = loop {
            if let Some(ex) = fb.advance(&g, &[], &p) {
                break ex;
            }
            ticks += 1;
            assert!(ticks < 100);
        };
        // centre entered column 6
        assert!(blast.x >= 6.0 * T && blast.x < 7.0 * T);
        assert!(blast.y > 0.0 && blast.y < T);
    }

    #[test]
    fn detonates_leaving_the_map() {
        let g = map_from(&["___", "###"]);
        let p = phys();
        let mut fb = Fireball::launch(0.0, 0.0, Facing::Left, T);
        assert!(fb.advance(&g, &[], &p).is_some());
    }

    #[test]
    fn detonates_on_enemy_contact() {
        let g = map_from(&["______", "######"]);
        let p = phys();
        let enemies = vec![Enemy::new(3.0 * T, 0.0)];
        let mut fb = Fireball::launch(0.0, 0.0, Facing::Right, T);
        let mut hit = None;
        for _ in 0..20 {
            if let Some(ex) = fb.advance(&g, &enemies, &p) {
                hit = Some(ex);
                break;
            }
        }
        let ex = hit.expect("fireball should reach the enemy");
        assert!(ex.x < 4.0 * T);
    }

    #[test]
    fn explosion_destroys_enemies_in_radius_only() {
        let p = phys();
        let mut ex = Explosion::new(2.0 * T + 16.0, 16.0);
        let mut enemies = vec![
            Enemy::new(3.0 * T, 0.0), // 1 tile away
            Enemy::new(6.0 * T, 0.0), // 4 tiles away
        ];
        assert_eq!(ex.advance(&mut enemies, &p), 1);
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].x, 6.0 * T);
    }

    #[test]
    fn explosion_expires_after_duration() {
        let p = phys();
        let mut ex = Explosion::new(0.0, 0.0);
        let mut none: Vec<Enemy> = vec![];
        let mut ticks = 0;
        while !ex.is_finished(&p) {
            ex.advance(&mut none, &p);
            ticks += 1;
        }
        assert_eq!(ticks as u64, p.explosion_duration_ms / p.tick_rate_ms + 1);

        // expired blasts no longer kill
        let mut late = vec![Enemy::new(0.0, 0.0)];
        assert_eq!(ex.advance(&mut late, &p), 0);
        assert_eq!(late.len(), 1);
    }
}
