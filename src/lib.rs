/// Pit Runner core: grid map, actor motion, player rules, enemy pursuit,
/// fireballs, and the fixed-tick simulation step that ties them together.
///
/// The terminal front end lives in the binary; everything here is
/// deterministic and free of I/O except the level, save and score files.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod sim;

pub use config::{GameConfig, PhysicsConfig};
pub use domain::entity::{Facing, FrameInput, MoveKeys};
pub use domain::grid::{Cell, GridMap};
pub use domain::tile::Tile;
pub use error::{GameError, Result};
pub use sim::event::GameEvent;
pub use sim::level::{LevelDef, LevelSet};
pub use sim::step::{restart_level, step};
pub use sim::world::{Phase, WorldState};
