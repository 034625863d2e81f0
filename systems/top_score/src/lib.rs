#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Top-score bookkeeping driven by world events.
//!
//! The best score is loaded once when the system is created and written back
//! through a [`ScoreStore`] whenever a game ends with a better score.

mod store;

use pipeflow_core::{Event, Score};
use tracing::{info, warn};

pub use store::{FileScoreStore, MemoryScoreStore, ScoreStore, ScoreStoreError};

/// System tracking the best score across games.
#[derive(Debug)]
pub struct TopScore<S> {
    store: S,
    best: Score,
}

impl<S: ScoreStore> TopScore<S> {
    /// Loads the stored best score, falling back to zero when the store is
    /// unreadable.
    pub fn new(store: S) -> Self {
        let best = store.load().unwrap_or_else(|error| {
            warn!(%error, "top score unavailable, starting from zero");
            Score::default()
        });
        Self { store, best }
    }

    /// Best score known to the system.
    #[must_use]
    pub const fn best(&self) -> Score {
        self.best
    }

    /// Consumes world events and records a better final score.
    ///
    /// Returns the new best score when one was set by these events.
    pub fn handle(&mut self, events: &[Event]) -> Option<Score> {
        let mut record = None;
        for event in events {
            let Event::GameOver { score, .. } = event else {
                continue;
            };
            match self.store.save_if_higher(self.best, *score) {
                Ok(true) => info!(score = score.get(), "new top score saved"),
                Ok(false) => continue,
                Err(error) => warn!(%error, score = score.get(), "could not save top score"),
            }
            self.best = *score;
            record = Some(*score);
        }
        record
    }

    /// Gives back the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }
}
