/// Leaderboard: completion times per level.
///
/// ## File format
///
///   One `level:time_ms` line per completion, appended. Blank lines are
///   ignored; any other unparsable line is skipped with a warning, so a
///   damaged file loses only the damaged entries.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{GameError, Result};

pub const DEFAULT_TOP: usize = 3;

#[derive(Clone, Debug, Default)]
pub struct ScoreBoard {
    path: Option<PathBuf>,
    times: BTreeMap<usize, Vec<u64>>,
}

impl ScoreBoard {
    /// A board that is never written to disk.
    pub fn in_memory() -> Self {
        ScoreBoard::default()
    }

    /// Load `path`. A missing file is an empty board.
    pub fn load(path: &Path) -> Result<Self> {
        let mut board = ScoreBoard { path: Some(path.to_path_buf()), times: BTreeMap::new() };
        if !path.exists() {
            return Ok(board);
        }
        let text = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
        board.times = parse_lines(&text);
        Ok(board)
    }

    /// Add a completion and append it to the backing file, if any.
    /// The in-memory entry is kept even when the write fails.
    pub fn record(&mut self, level: usize, time_ms: u64) -> Result<()> {
        self.times.entry(level).or_default().push(time_ms);
        let Some(path) = &self.path else { return Ok(()) };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| GameError::io(path, e))?;
        writeln!(file, "{level}:{time_ms}").map_err(|e| GameError::io(path, e))
    }

    pub fn best(&self, level: usize) -> Option<u64> {
        self.times.get(&level)?.iter().copied().min()
    }

    /// Fastest `limit` times, ascending.
    pub fn top(&self, level: usize, limit: usize) -> Vec<u64> {
        let mut times = self.times.get(&level).cloned().unwrap_or_default();
        times.sort_unstable();
        times.truncate(limit);
        times
    }
}

fn parse_lines(text: &str) -> BTreeMap<usize, Vec<u64>> {
    let mut times: BTreeMap<usize, Vec<u64>> = BTreeMap::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed = line.split_once(':').and_then(|(level, ms)| {
            Some((level.trim().parse::<usize>().ok()?, ms.trim().parse::<u64>().ok()?))
        });
        match parsed {
            Some((level, ms)) => times.entry(level).or_default().push(ms),
            None => log::warn!("skipping corrupt score line {line:?}"),
        }
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pitrunner_{name}_{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn corrupt_lines_are_skipped() {
        let times = parse_lines("0:5000\n\ngarbage\n0:4200\n1:x\n1:9000:1\n1:7000\n");
        assert_eq!(times[&0], vec![5000, 4200]);
        assert_eq!(times[&1], vec![7000]);
    }

    #[test]
    fn best_and_top_are_ascending() {
        let mut b = ScoreBoard::in_memory();
        for t in [9000, 4000, 6500, 4000, 12000] {
            b.record(0, t).unwrap();
        }
        assert_eq!(b.best(0), Some(4000));
        assert_eq!(b.top(0, DEFAULT_TOP), vec![4000, 4000, 6500]);
        assert_eq!(b.best(1), None);
        assert!(b.top(1, DEFAULT_TOP).is_empty());
    }

    #[test]
    fn records_persist_across_loads() {
        let path = scratch_file("scores");
        let mut b = ScoreBoard::load(&path).unwrap();
        assert_eq!(b.best(2), None);
        b.record(2, 3100).unwrap();
        b.record(2, 2900).unwrap();

        let again = ScoreBoard::load(&path).unwrap();
        assert_eq!(again.top(2, 5), vec![2900, 3100]);
        let _ = std::fs::remove_file(&path);
    }
}
