pub mod event;
pub mod level;
pub mod save;
pub mod score;
pub mod step;
pub mod world;
