/// Errors raised at the collaborator boundary (levels, saves, scores, config).
///
/// The simulation itself never fails: out-of-range queries resolve to
/// Ground, illegal moves are ignored, unreachable enemies wait.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::grid::Cell;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("level layout is empty")]
    EmptyLayout,

    #[error("layout row {row} has {found} tiles, expected {expected}")]
    RaggedLayout { row: usize, expected: usize, found: usize },

    #[error("unknown tile symbol {symbol:?} at row {row}, col {col}")]
    UnknownTile { row: usize, col: usize, symbol: char },

    #[error("snapshot is {found_w}x{found_h} but level is {expected_w}x{expected_h}")]
    SnapshotMismatch {
        expected_w: usize,
        expected_h: usize,
        found_w: usize,
        found_h: usize,
    },

    #[error("snapshot belongs to level {} but level {} is loaded", .saved + 1, .current + 1)]
    SnapshotLevel { saved: usize, current: usize },

    #[error("{actor} spawns at row {}, col {} which is outside the map or solid", .cell.row, .cell.col)]
    BadSpawn { actor: &'static str, cell: Cell },

    #[error("level set contains no levels")]
    NoLevels,
}

impl GameError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GameError::Io { path: path.into(), source }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        GameError::Json { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
