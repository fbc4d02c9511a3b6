/// The step function: advances the world by one fixed tick.
///
/// Processing order:
///   1. Clock (`clock_ms += tick_rate_ms`)
///   2. Dig and fire requests from this frame's input
///   3. Hole regeneration
///   4. Player: accept a move when resting, then motion/gravity, then coin
///   5. Enemies, in spawn order: slide, then re-plan on arrival
///   6. Fireballs, then explosions
///   7. Contact with enemies (caught), then the coin count (won)
///
/// Nothing here fails. Illegal requests are dropped without a state
/// change; an enemy with no path simply waits.

use crate::domain::ai;
use crate::domain::entity::{Facing, FrameInput, Motion, MoveKeys};
use crate::domain::grid::Cell;
use crate::domain::physics::{self, Gravity, Rect};
use crate::domain::projectile::Fireball;
use crate::domain::rules;
use crate::domain::tile::Tile;
use super::event::GameEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if !world.is_running() { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.clock_ms += world.physics.tick_rate_ms;

    resolve_dig(world, input.dig_at, &mut events);
    resolve_fire(world, input.fire, &mut events);
    resolve_holes(world, &mut events);
    resolve_player(world, &input.keys);
    resolve_coin_pickup(world, &mut events);
    resolve_enemies(world);
    resolve_fireballs(world, &mut events);
    resolve_explosions(world, &mut events);
    if resolve_enemy_collision(world, &mut events) { return events; }
    resolve_win(world, &mut events);

    events
}

/// Reset the current level to its loaded state.
pub fn restart_level(world: &mut WorldState) {
    world.restart_level();
}

// ══════════════════════════════════════════════════════════════
// Input actions
// ══════════════════════════════════════════════════════════════

fn resolve_dig(world: &mut WorldState, target: Option<Cell>, events: &mut Vec<GameEvent>) {
    let Some(cell) = target else { return };
    if !rules::dig_in_reach(world.player_cell(), cell) { return; }
    if world.grid.dig_hole(cell, world.clock_ms) {
        log::debug!("hole dug at {cell:?}");
        events.push(GameEvent::HoleDug { cell });
    }
}

fn resolve_fire(world: &mut WorldState, fire: bool, events: &mut Vec<GameEvent>) {
    if !fire { return; }
    if world.ammo == 0 {
        events.push(GameEvent::OutOfAmmo);
        return;
    }
    let p = &world.player;
    world.fireballs.push(Fireball::launch(p.x, p.y, p.facing, world.physics.tile_size));
    world.ammo -= 1;
    events.push(GameEvent::FireballLaunched);
}

fn resolve_holes(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for cell in world.grid.advance_holes(world.clock_ms) {
        events.push(GameEvent::HoleClosed { cell });
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut WorldState, keys: &MoveKeys) {
    let t = world.physics.tile_size;
    let now = world.clock_ms;

    // Input is accepted only at rest, so one discrete move completes first.
    if world.player.motion == Motion::Resting {
        let p = &mut world.player;
        if let Some(facing) = rules::facing_from_keys(keys) {
            p.facing = facing;
        }
        let cell = physics::cell_of(p.x, p.y, t);
        let aligned = physics::is_aligned(p.y, &world.physics);
        if let Some(m) = rules::choose_move(&world.grid, cell, aligned, keys) {
            p.target_x = p.x + m.d_col as f32 * t;
            p.target_y = p.y + m.d_row as f32 * t;
            p.jumping = m.jump;
            p.motion = Motion::Animating;
        }
    }

    let p = &mut world.player;
    match p.motion {
        Motion::Animating => {
            let speed = world.physics.animation_speed;
            if physics::step_toward(&mut p.x, &mut p.y, p.target_x, p.target_y, speed) {
                p.motion = if p.jumping {
                    p.jumping = false;
                    Motion::Hanging { until_ms: now + world.physics.jump_hang_ms }
                } else {
                    Motion::Resting
                };
            }
        }
        Motion::Hanging { until_ms } => {
            let cell = physics::cell_of(p.x, p.y, t);
            if keys.up && world.grid.tile_at(cell.offset(-1, 0)).is_ladder() {
                p.target_y = p.y - t;
                p.motion = Motion::Animating;
            } else if now > until_ms {
                p.motion = Motion::Resting;
            }
        }
        Motion::Resting | Motion::Falling => {
            match physics::apply_gravity(p.x, &mut p.y, &world.grid, &world.physics) {
                Gravity::Falling => p.motion = Motion::Falling,
                Gravity::Supported | Gravity::Landed => p.motion = Motion::Resting,
            }
            p.target_x = p.x;
            p.target_y = p.y;
        }
    }
}

fn resolve_coin_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let cell = world.player_cell();
    if world.grid.tile_at(cell) == Tile::Coin {
        world.grid.set_tile(cell, Tile::Empty);
        world.player.coins += 1;
        log::debug!("coin at {cell:?} ({}/{})", world.player.coins, world.grid.total_coins());
        events.push(GameEvent::CoinCollected { cell });
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies: slide, then plan the next cell once arrived
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(world: &mut WorldState) {
    let t = world.physics.tile_size;
    let speed = world.physics.enemy_speed;
    let goal = world.player_cell();

    for e in &mut world.enemies {
        if e.target_x != e.x {
            e.facing = if e.target_x > e.x { Facing::Right } else { Facing::Left };
        }
        physics::step_toward(&mut e.x, &mut e.y, e.target_x, e.target_y, speed);

        if e.is_resting() {
            let here = physics::cell_of(e.x, e.y, t);
            if let Some(next) = ai::next_step(&world.grid, here, goal) {
                let (tx, ty) = physics::origin_of(next, t);
                e.target_x = tx;
                e.target_y = ty;
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Projectiles
// ══════════════════════════════════════════════════════════════

fn resolve_fireballs(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let mut flying = Vec::with_capacity(world.fireballs.len());
    for mut fb in world.fireballs.drain(..) {
        match fb.advance(&world.grid, &world.enemies, &world.physics) {
            Some(blast) => {
                events.push(GameEvent::Exploded { x: blast.x, y: blast.y });
                world.explosions.push(blast);
            }
            None => flying.push(fb),
        }
    }
    world.fireballs = flying;
}

fn resolve_explosions(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let mut destroyed = 0;
    for ex in &mut world.explosions {
        destroyed += ex.advance(&mut world.enemies, &world.physics);
    }
    world.explosions.retain(|ex| !ex.is_finished(&world.physics));
    if destroyed > 0 {
        log::info!("explosion destroyed {destroyed} enemies");
        events.push(GameEvent::EnemyDestroyed { count: destroyed });
    }
}

// ══════════════════════════════════════════════════════════════
// Contact / win
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_collision(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let t = world.physics.tile_size;
    let player = Rect::actor(world.player.x, world.player.y, t);
    let inset = world.physics.enemy_hitbox_inset;
    let caught = world.enemies.iter()
        .any(|e| player.intersects(&Rect::actor(e.x, e.y, t).inset(inset)));
    if caught {
        log::info!("caught at {}ms", world.clock_ms);
        world.phase = Phase::Caught;
        events.push(GameEvent::PlayerCaught);
    }
    caught
}

fn resolve_win(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.coins < world.grid.total_coins() { return; }
    let elapsed_ms = world.clock_ms;
    log::info!("level {} complete in {elapsed_ms}ms", world.level_index + 1);
    world.phase = Phase::Won { elapsed_ms };
    events.push(GameEvent::LevelCompleted { elapsed_ms });
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::domain::entity::Enemy;
    use crate::sim::level::LevelDef;

    /// Legend: '#'=Ground '^'=Ladder '$'=Coin '_'=Empty
    fn world_from(rows: &[&str], start: (i32, i32)) -> WorldState {
        let def = LevelDef::new("test", rows).with_start(start.0, start.1);
        WorldState::from_level(&def, 0, PhysicsConfig::default()).unwrap()
    }

    fn held(keys: MoveKeys) -> FrameInput {
        FrameInput { keys, ..FrameInput::default() }
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    /// Step until the player is resting again (bounded).
    fn settle(w: &mut WorldState) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..200 {
            all.extend(step(w, idle()));
            if w.player.motion == Motion::Resting || w.phase != Phase::Playing {
                break;
            }
        }
        all
    }

    fn walk(w: &mut WorldState, keys: MoveKeys) -> Vec<GameEvent> {
        let mut ev = step(w, held(keys));
        ev.extend(settle(w));
        ev
    }

    const RIGHT: MoveKeys = MoveKeys { up: false, down: false, left: false, right: true, up_left: false, up_right: false };
    const UP: MoveKeys = MoveKeys { up: true, down: false, left: false, right: false, up_left: false, up_right: false };

    // ── Clock / phases ──

    #[test]
    fn clock_advances_by_tick_rate() {
        let mut w = world_from(&["$___", "####"], (0, 3));
        step(&mut w, idle());
        step(&mut w, idle());
        assert_eq!(w.clock_ms, 2 * w.physics.tick_rate_ms);
    }

    #[test]
    fn paused_or_finished_world_does_not_step() {
        let mut w = world_from(&["$___", "####"], (0, 3));
        w.toggle_pause();
        assert!(step(&mut w, held(RIGHT)).is_empty());
        assert_eq!(w.clock_ms, 0);
        w.toggle_pause();
        w.phase = Phase::Caught;
        assert!(step(&mut w, idle()).is_empty());
        assert_eq!(w.clock_ms, 0);
    }

    // ── Player movement ──

    #[test]
    fn walk_one_tile_and_rest_aligned() {
        let mut w = world_from(&["$____", "#####"], (0, 1));
        walk(&mut w, RIGHT);
        assert_eq!(w.player_cell(), Cell::new(0, 2));
        assert_eq!((w.player.x, w.player.y), (w.player.target_x, w.player.target_y));
        assert_eq!(w.player.y % w.physics.tile_size, 0.0);
        assert_eq!(w.player.facing, Facing::Right);
    }

    #[test]
    fn input_is_ignored_mid_move() {
        let mut w = world_from(&["$____", "#####"], (0, 1));
        step(&mut w, held(RIGHT));
        assert_eq!(w.player.motion, Motion::Animating);
        let target = w.player.target_x;
        step(&mut w, held(RIGHT));
        assert_eq!(w.player.target_x, target);
    }

    #[test]
    fn walking_off_a_ledge_falls_to_the_floor() {
        let mut w = world_from(&[
            "__$",
            "#__",
            "___",
            "###",
        ], (0, 0));
        walk(&mut w, RIGHT);
        // the walk ends over air; keep stepping until it lands
        settle(&mut w);
        for _ in 0..100 {
            if w.player.motion == Motion::Resting && w.player_cell() == Cell::new(2, 1) { break; }
            step(&mut w, idle());
        }
        assert_eq!(w.player_cell(), Cell::new(2, 1));
        assert_eq!(w.player.y, 64.0);
        assert_eq!(w.player.motion, Motion::Resting);
    }

    #[test]
    fn jump_hangs_then_drops_back() {
        let mut w = world_from(&[
            "$___",
            "____",
            "____",
            "####",
        ], (2, 1));
        step(&mut w, held(UP));
        for _ in 0..50 {
            if w.player.is_hanging() { break; }
            step(&mut w, idle());
        }
        assert!(w.player.is_hanging());
        assert_eq!(w.player_cell(), Cell::new(1, 1));

        let hang_started = w.clock_ms;
        while w.player.is_hanging() {
            step(&mut w, idle());
            assert!(w.clock_ms <= hang_started + w.physics.jump_hang_ms + w.physics.tick_rate_ms);
        }
        assert!(w.clock_ms > hang_started + w.physics.jump_hang_ms - w.physics.tick_rate_ms);
        for _ in 0..50 { step(&mut w, idle()); }
        assert_eq!(w.player_cell(), Cell::new(2, 1));
    }

    #[test]
    fn hang_grabs_ladder_above() {
        let mut w = world_from(&[
            "$^__",
            "_^__",
            "____",
            "____",
            "####",
        ], (3, 1));
        step(&mut w, held(UP));
        for _ in 0..50 {
            if w.player.is_hanging() { break; }
            step(&mut w, held(UP));
        }
        assert_eq!(w.player_cell(), Cell::new(2, 1));
        step(&mut w, held(UP));
        assert_eq!(w.player.motion, Motion::Animating);
        settle(&mut w);
        assert_eq!(w.player_cell(), Cell::new(1, 1));
        // on the ladder now: no fall
        for _ in 0..30 { step(&mut w, idle()); }
        assert_eq!(w.player_cell(), Cell::new(1, 1));
    }

    // ── Coins / win ──

    #[test]
    fn coin_is_collected_once_and_wins() {
        let mut w = world_from(&["_$_", "###"], (0, 0));
        let events = walk(&mut w, RIGHT);
        assert_eq!(w.player.coins, 1);
        assert_eq!(w.grid.tile_at(Cell::new(0, 1)), Tile::Empty);
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::CoinCollected { .. })).count(), 1);
        assert!(matches!(w.phase, Phase::Won { .. }));
        let won = events.iter().find_map(|e| match e {
            GameEvent::LevelCompleted { elapsed_ms } => Some(*elapsed_ms),
            _ => None,
        });
        assert_eq!(won, Some(w.elapsed_ms()));
    }

    #[test]
    fn jump_roll_does_not_touch_the_cell_it_cuts_past() {
        let mut w = world_from(&[
            "____",
            "_$_$",
            "####",
        ], (1, 0));
        let up_right = MoveKeys { up_right: true, ..MoveKeys::default() };
        step(&mut w, held(up_right));
        assert_eq!(w.player.motion, Motion::Animating);
        for _ in 0..50 {
            assert_eq!(w.player.coins, 0);
            assert_eq!(w.grid.tile_at(Cell::new(1, 1)), Tile::Coin);
            let c = w.player_cell();
            assert!(c == Cell::new(1, 0) || c == Cell::new(0, 1), "{c:?}");
            if w.player.is_hanging() { break; }
            step(&mut w, idle());
        }
        assert_eq!(w.player_cell(), Cell::new(0, 1));
    }

    #[test]
    fn jump_roll_onto_a_block_never_reports_the_block() {
        let mut w = world_from(&[
            "____",
            "_#__",
            "####",
        ], (1, 0));
        step(&mut w, held(MoveKeys { up_right: true, ..MoveKeys::default() }));
        while w.player.motion == Motion::Animating {
            assert_ne!(w.grid.tile_at(w.player_cell()), Tile::Ground);
            step(&mut w, idle());
        }
        assert_eq!(w.player_cell(), Cell::new(0, 1));
    }

    #[test]
    fn win_ignores_coins_placed_later() {
        let mut w = world_from(&["_$_$", "####"], (0, 0));
        w.grid.set_tile(Cell::new(0, 3), Tile::Empty);
        walk(&mut w, RIGHT);
        // one coin taken, total stays at the load-time count of 2
        assert_eq!(w.phase, Phase::Playing);
    }

    // ── Digging ──

    #[test]
    fn dig_within_reach_only() {
        let mut w = world_from(&["$____", "#####", "#####"], (0, 1));
        let near = FrameInput { dig_at: Some(Cell::new(1, 2)), ..idle() };
        let ev = step(&mut w, near);
        assert!(ev.contains(&GameEvent::HoleDug { cell: Cell::new(1, 2) }));
        assert_eq!(w.grid.tile_at(Cell::new(1, 2)), Tile::Empty);

        let far = FrameInput { dig_at: Some(Cell::new(2, 3)), ..idle() };
        assert!(step(&mut w, far).is_empty());
        assert_eq!(w.grid.tile_at(Cell::new(2, 3)), Tile::Ground);
    }

    #[test]
    fn dug_hole_closes_after_duration() {
        let mut w = world_from(&["$____", "#####"], (0, 1));
        step(&mut w, FrameInput { dig_at: Some(Cell::new(1, 2)), ..idle() });
        let dug = w.clock_ms;
        let mut closed_at = None;
        for _ in 0..400 {
            let ev = step(&mut w, idle());
            if ev.contains(&GameEvent::HoleClosed { cell: Cell::new(1, 2) }) {
                closed_at = Some(w.clock_ms);
                break;
            }
        }
        let closed_at = closed_at.unwrap();
        assert!(closed_at > dug + w.physics.hole_duration_ms);
        assert!(closed_at <= dug + w.physics.hole_duration_ms + w.physics.tick_rate_ms);
        assert_eq!(w.grid.tile_at(Cell::new(1, 2)), Tile::Ground);
    }

    // ── Enemies ──

    #[test]
    fn enemy_waits_when_player_unreachable() {
        let mut w = world_from(&[
            "__#__$",
            "######",
        ], (0, 0));
        w.enemies.push(Enemy::new(4.0 * 32.0, 0.0));
        for _ in 0..20 { step(&mut w, idle()); }
        assert_eq!((w.enemies[0].x, w.enemies[0].target_x), (128.0, 128.0));
    }

    #[test]
    fn enemy_closes_in_and_catches() {
        let mut w = world_from(&[
            "$_____",
            "######",
        ], (0, 1));
        w.enemies.push(Enemy::new(5.0 * 32.0, 0.0));
        let mut caught = false;
        for _ in 0..400 {
            if step(&mut w, idle()).contains(&GameEvent::PlayerCaught) {
                caught = true;
                break;
            }
        }
        assert!(caught);
        assert_eq!(w.phase, Phase::Caught);
        // the inset hitbox means contact happens with some overlap
        assert!(w.enemies[0].x < 32.0 + 32.0 - 5.0);
    }

    // ── Fireballs ──

    #[test]
    fn fireball_spends_ammo_and_kills() {
        let def = LevelDef::new("range", &[
            "$_________",
            "##########",
        ])
        .with_start(0, 1)
        .with_enemies(&[(0, 8)])
        .with_fireballs(1);
        let mut w = WorldState::from_level(&def, 0, PhysicsConfig::default()).unwrap();

        let ev = step(&mut w, FrameInput { fire: true, ..idle() });
        assert!(ev.contains(&GameEvent::FireballLaunched));
        assert_eq!(w.ammo, 0);
        assert_eq!(step(&mut w, FrameInput { fire: true, ..idle() }), vec![GameEvent::OutOfAmmo]);

        let mut destroyed = false;
        for _ in 0..100 {
            let ev = step(&mut w, idle());
            if ev.iter().any(|e| matches!(e, GameEvent::EnemyDestroyed { .. })) {
                destroyed = true;
                break;
            }
        }
        assert!(destroyed);
        assert!(w.enemies.is_empty());
        assert!(w.fireballs.is_empty());
    }
}
