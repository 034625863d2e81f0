use std::{collections::BTreeMap, time::Duration};

use pipeflow_core::{
    CellCoord, DeadEnd, Direction, EndOrientation, FlowDirection, GridSize, PipeShape,
    PlacementError, RemovalError, StartOrientation, Timestamp,
};
use rand::RngCore;
use thiserror::Error;

use crate::{
    config::SessionConfig,
    grid::Grid,
    layout::{BoardLayout, LayoutError},
    pieces::{BoardPiece, EndPiece, FlowPiece, PieceOutcome, StartPiece},
    placement,
};

/// Cells and orientations of the start and end pieces of a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoints {
    /// Cell occupied by the start piece.
    pub start: CellCoord,
    /// Direction the start piece releases flow toward.
    pub start_orientation: StartOrientation,
    /// Cell occupied by the end piece.
    pub end: CellCoord,
    /// Side the end piece is open on.
    pub end_orientation: EndOrientation,
}

/// Reasons a random board could not be generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BoardSetupError {
    /// No cell could host the start piece.
    #[error("no valid start cell on a {}x{} grid", .size.rows(), .size.columns())]
    NoStartCell {
        /// Dimensions of the grid.
        size: GridSize,
    },
    /// No cell could host the end piece.
    #[error("no valid end cell on a {}x{} grid", .size.rows(), .size.columns())]
    NoEndCell {
        /// Dimensions of the grid.
        size: GridSize,
    },
}

/// Grid of tags kept in lockstep with the stateful pieces occupying it.
#[derive(Clone, Debug)]
pub(crate) struct Board {
    grid: Grid,
    pieces: BTreeMap<CellCoord, BoardPiece>,
    endpoints: Endpoints,
    flow_step: Duration,
}

impl Board {
    /// Generates a board with randomly placed endpoints.
    pub(crate) fn generate(
        config: &SessionConfig,
        countdown: Duration,
        now: Timestamp,
        rng: &mut dyn RngCore,
    ) -> Result<Self, BoardSetupError> {
        let size = config.grid_size();
        let mut grid = Grid::new(size);
        let (start, start_orientation) =
            placement::place_start(&grid, rng).ok_or(BoardSetupError::NoStartCell { size })?;
        grid.set(start, pipeflow_core::CellTag::Start(start_orientation));
        let (end, end_orientation) =
            placement::place_end(&grid, rng).ok_or(BoardSetupError::NoEndCell { size })?;

        let mut board = Self::empty(
            size,
            Endpoints {
                start,
                start_orientation,
                end,
                end_orientation,
            },
            config.flow_step,
        );
        board.insert_endpoints(config, countdown, now);
        Ok(board)
    }

    /// Builds the board a layout describes.
    pub(crate) fn from_layout(
        layout: &BoardLayout,
        config: &SessionConfig,
        countdown: Duration,
        now: Timestamp,
    ) -> Result<Self, LayoutError> {
        layout.validate()?;
        let (start, start_orientation) = layout.start();
        let (end, end_orientation) = layout.end();
        let mut board = Self::empty(
            layout.size(),
            Endpoints {
                start,
                start_orientation,
                end,
                end_orientation,
            },
            config.flow_step,
        );
        board.insert_endpoints(config, countdown, now);
        for (cell, shape) in layout.pipes() {
            board
                .place_pipe(*cell, *shape)
                .map_err(|_| LayoutError::Overlap { cell: *cell })?;
        }
        Ok(board)
    }

    fn empty(size: GridSize, endpoints: Endpoints, flow_step: Duration) -> Self {
        Self {
            grid: Grid::new(size),
            pieces: BTreeMap::new(),
            endpoints,
            flow_step,
        }
    }

    fn insert_endpoints(&mut self, config: &SessionConfig, countdown: Duration, now: Timestamp) {
        let Endpoints {
            start,
            start_orientation,
            end,
            end_orientation,
        } = self.endpoints;
        self.insert(
            start,
            BoardPiece::Start(StartPiece::new(
                start,
                start_orientation,
                countdown,
                config.animations.start_frames(start_orientation),
                config.flow_step,
                now,
            )),
        );
        self.insert(end, BoardPiece::End(EndPiece::new(end_orientation)));
    }

    fn insert(&mut self, cell: CellCoord, piece: BoardPiece) {
        self.grid.set(cell, piece.tag());
        let _ = self.pieces.insert(cell, piece);
    }

    pub(crate) const fn grid(&self) -> &Grid {
        &self.grid
    }

    pub(crate) const fn endpoints(&self) -> Endpoints {
        self.endpoints
    }

    pub(crate) fn pieces(&self) -> impl Iterator<Item = (CellCoord, &BoardPiece)> + '_ {
        self.pieces.iter().map(|(cell, piece)| (*cell, piece))
    }

    pub(crate) fn piece(&self, cell: CellCoord) -> Option<&BoardPiece> {
        self.pieces.get(&cell)
    }

    /// Puts a fresh idle pipe into an empty cell.
    pub(crate) fn place_pipe(
        &mut self,
        cell: CellCoord,
        shape: PipeShape,
    ) -> Result<(), PlacementError> {
        match self.grid.tag(cell) {
            None => Err(PlacementError::OutOfBounds),
            Some(tag) if !tag.is_empty() => Err(PlacementError::Occupied),
            Some(_) => {
                self.insert(
                    cell,
                    BoardPiece::Flow(FlowPiece::new(cell, shape, self.flow_step)),
                );
                Ok(())
            }
        }
    }

    /// Takes a pipe the flow has not reached yet off the board.
    pub(crate) fn remove_pipe(&mut self, cell: CellCoord) -> Result<PipeShape, RemovalError> {
        let tag = self.grid.tag(cell).ok_or(RemovalError::OutOfBounds)?;
        if tag.is_empty() {
            return Err(RemovalError::Empty);
        }
        if tag.is_immutable() {
            return Err(RemovalError::Immutable);
        }
        let shape = match self.pieces.get(&cell) {
            Some(BoardPiece::Flow(piece)) if piece.is_reached() => {
                return Err(RemovalError::FlowReached)
            }
            Some(BoardPiece::Flow(piece)) => piece.shape(),
            Some(BoardPiece::Start(_) | BoardPiece::End(_)) => return Err(RemovalError::Immutable),
            None => return Err(RemovalError::Empty),
        };
        let _ = self.pieces.remove(&cell);
        self.grid.set(cell, pipeflow_core::CellTag::Empty);
        Ok(shape)
    }

    /// Lets the start piece release flow on its next update.
    pub(crate) fn release_start(&mut self) {
        if let Some(BoardPiece::Start(start)) = self.pieces.get_mut(&self.endpoints.start) {
            start.release();
        }
    }

    /// Updates every piece once in row-major order.
    pub(crate) fn update_pieces(&mut self, now: Timestamp) -> Vec<(CellCoord, PieceOutcome)> {
        let grid = &self.grid;
        self.pieces
            .iter_mut()
            .map(|(cell, piece)| (*cell, piece.update(now, grid)))
            .filter(|(_, outcome)| *outcome != PieceOutcome::Continue)
            .collect()
    }

    /// Starts filling the pipe at `cell` with flow heading `heading`.
    pub(crate) fn activate(
        &mut self,
        cell: CellCoord,
        heading: Direction,
        config: &SessionConfig,
        now: Timestamp,
    ) -> Result<FlowDirection, DeadEnd> {
        match self.pieces.get_mut(&cell) {
            Some(BoardPiece::Flow(piece)) => {
                let animations = &config.animations;
                piece.activate(heading, |flow| animations.flow_frames(flow), now)
            }
            Some(BoardPiece::Start(_) | BoardPiece::End(_)) => Err(DeadEnd::Incompatible),
            None => Err(DeadEnd::EmptyCell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeflow_core::CellTag;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn corridor() -> Board {
        let layout: BoardLayout = "S> . . E<".parse().expect("valid layout");
        Board::from_layout(
            &layout,
            &SessionConfig::default(),
            Duration::from_secs(1),
            Timestamp::ZERO,
        )
        .expect("board builds")
    }

    #[test]
    fn generated_board_holds_both_endpoints() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let board = Board::generate(
            &SessionConfig::default(),
            Duration::from_secs(30),
            Timestamp::ZERO,
            &mut rng,
        )
        .expect("default grid fits endpoints");
        let endpoints = board.endpoints();
        assert!(matches!(
            board.grid().tag(endpoints.start),
            Some(CellTag::Start(_))
        ));
        assert!(matches!(board.grid().tag(endpoints.end), Some(CellTag::End(_))));
        assert_eq!(board.pieces().count(), 2);
    }

    #[test]
    fn placement_keeps_grid_and_pieces_in_lockstep() {
        let mut board = corridor();
        let cell = CellCoord::new(0, 1);
        assert_eq!(board.place_pipe(cell, PipeShape::Horizontal), Ok(()));
        assert_eq!(
            board.grid().tag(cell),
            Some(CellTag::Pipe(PipeShape::Horizontal))
        );
        assert!(board.piece(cell).is_some());
        assert_eq!(
            board.place_pipe(cell, PipeShape::Vertical),
            Err(PlacementError::Occupied)
        );
        assert_eq!(
            board.place_pipe(CellCoord::new(1, 0), PipeShape::Vertical),
            Err(PlacementError::OutOfBounds)
        );

        assert_eq!(board.remove_pipe(cell), Ok(PipeShape::Horizontal));
        assert_eq!(board.grid().tag(cell), Some(CellTag::Empty));
        assert!(board.piece(cell).is_none());
    }

    #[test]
    fn endpoints_and_reached_pipes_cannot_be_removed() {
        let mut board = corridor();
        assert_eq!(
            board.remove_pipe(CellCoord::new(0, 0)),
            Err(RemovalError::Immutable)
        );
        assert_eq!(
            board.remove_pipe(CellCoord::new(0, 2)),
            Err(RemovalError::Empty)
        );

        let cell = CellCoord::new(0, 1);
        assert_eq!(board.place_pipe(cell, PipeShape::Horizontal), Ok(()));
        assert_eq!(
            board.activate(cell, Direction::Right, &SessionConfig::default(), Timestamp::ZERO),
            Ok(FlowDirection::LeftToRight)
        );
        assert_eq!(board.remove_pipe(cell), Err(RemovalError::FlowReached));
    }
}
