/// Events emitted during a simulation step.
/// The front end consumes these for sound and status; the leaderboard
/// consumes `LevelCompleted`.

use crate::domain::grid::Cell;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CoinCollected { cell: Cell },
    HoleDug { cell: Cell },
    HoleClosed { cell: Cell },
    FireballLaunched,
    OutOfAmmo,
    Exploded { x: f32, y: f32 },
    EnemyDestroyed { count: usize },
    PlayerCaught,
    LevelCompleted { elapsed_ms: u64 },
}
