use std::{
    fs, io,
    path::{Path, PathBuf},
};

use pipeflow_core::Score;
use thiserror::Error;

const KEY: &str = "TopScore";

/// Persistence for the best score.
pub trait ScoreStore {
    /// Reads the stored best score; an absent record reads as zero.
    fn load(&self) -> Result<Score, ScoreStoreError>;

    /// Overwrites the stored best score.
    fn save(&mut self, score: Score) -> Result<(), ScoreStoreError>;

    /// Writes `candidate` only when it beats `current`, reporting whether a
    /// write happened.
    fn save_if_higher(&mut self, current: Score, candidate: Score) -> Result<bool, ScoreStoreError> {
        if candidate <= current {
            return Ok(false);
        }
        self.save(candidate)?;
        Ok(true)
    }
}

/// Failures raised by score stores.
#[derive(Debug, Error)]
pub enum ScoreStoreError {
    /// Reading or writing the file failed.
    #[error("could not access top score file {}", .path.display())]
    Io {
        /// File the store is bound to.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file does not contain a `TopScore = <integer>` line.
    #[error("top score file {} is malformed", .path.display())]
    Malformed {
        /// File the store is bound to.
        path: PathBuf,
    },
}

/// Stores the best score in a small text file holding `TopScore = <n>`.
#[derive(Clone, Debug)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    /// Binds the store to `path`. The file is created on the first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, contents: &str) -> Result<Score, ScoreStoreError> {
        contents
            .lines()
            .filter_map(|line| line.split_once('='))
            .find(|(key, _)| key.trim() == KEY)
            .and_then(|(_, value)| value.trim().parse::<i64>().ok())
            .map(Score::new)
            .ok_or_else(|| ScoreStoreError::Malformed {
                path: self.path.clone(),
            })
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&self) -> Result<Score, ScoreStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => self.parse(&contents),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Score::default()),
            Err(source) => Err(ScoreStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&mut self, score: Score) -> Result<(), ScoreStoreError> {
        fs::write(&self.path, format!("{KEY} = {}\n", score.get())).map_err(|source| {
            ScoreStoreError::Io {
                path: self.path.clone(),
                source,
            }
        })
    }
}

/// Keeps the best score in memory; used by headless runs and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryScoreStore {
    best: Score,
    writes: usize,
}

impl MemoryScoreStore {
    /// Creates a store that already holds `best`.
    #[must_use]
    pub const fn with_best(best: Score) -> Self {
        Self { best, writes: 0 }
    }

    /// Number of saves performed so far.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> Result<Score, ScoreStoreError> {
        Ok(self.best)
    }

    fn save(&mut self, score: Score) -> Result<(), ScoreStoreError> {
        self.best = score;
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_spacing_variants() {
        let store = FileScoreStore::new("unused");
        assert_eq!(store.parse("TopScore = 1650\n").ok(), Some(Score::new(1650)));
        assert_eq!(store.parse("TopScore=-20").ok(), Some(Score::new(-20)));
        assert_eq!(
            store.parse("# saved\n  TopScore   =  7  \n").ok(),
            Some(Score::new(7))
        );
    }

    #[test]
    fn parse_rejects_other_contents() {
        let store = FileScoreStore::new("unused");
        assert!(matches!(
            store.parse("Best = 3"),
            Err(ScoreStoreError::Malformed { .. })
        ));
        assert!(matches!(
            store.parse("TopScore = lots"),
            Err(ScoreStoreError::Malformed { .. })
        ));
    }

    #[test]
    fn save_if_higher_skips_lower_candidates() {
        let mut store = MemoryScoreStore::with_best(Score::new(900));
        assert!(!store
            .save_if_higher(Score::new(900), Score::new(900))
            .expect("memory store never fails"));
        assert_eq!(store.writes(), 0);
        assert!(store
            .save_if_higher(Score::new(900), Score::new(901))
            .expect("memory store never fails"));
        assert_eq!(store.load().expect("memory store never fails"), Score::new(901));
    }
}
