use std::collections::VecDeque;

use pipeflow_core::PipeShape;
use rand::{Rng, RngCore};

/// Current piece plus the shapes lined up behind it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PieceQueue {
    current: PipeShape,
    upcoming: VecDeque<PipeShape>,
}

impl PieceQueue {
    /// Draws `length` random shapes; the first becomes the current piece.
    pub(crate) fn filled(length: usize, rng: &mut dyn RngCore) -> Self {
        let current = random_shape(rng);
        let upcoming = (1..length).map(|_| random_shape(rng)).collect();
        Self { current, upcoming }
    }

    pub(crate) const fn current(&self) -> PipeShape {
        self.current
    }

    pub(crate) fn upcoming(&self) -> impl Iterator<Item = PipeShape> + '_ {
        self.upcoming.iter().copied()
    }

    /// Consumes the current piece, promotes the head of the queue and
    /// appends a fresh random shape. Returns the new current piece.
    pub(crate) fn advance(&mut self, rng: &mut dyn RngCore) -> PipeShape {
        self.upcoming.push_back(random_shape(rng));
        if let Some(next) = self.upcoming.pop_front() {
            self.current = next;
        }
        self.current
    }
}

fn random_shape(rng: &mut dyn RngCore) -> PipeShape {
    PipeShape::ALL[rng.gen_range(0..PipeShape::ALL.len())]
}
