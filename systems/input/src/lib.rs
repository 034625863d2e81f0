#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system translating pointer clicks into placement and removal
//! commands.

use pipeflow_core::{CellCoord, Command, Event, GamePhase, GridSize};
use tracing::trace;

/// Screen-space placement of the board.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardGeometry {
    origin_x: f32,
    origin_y: f32,
    cell_size: f32,
    size: GridSize,
}

impl BoardGeometry {
    /// Creates a geometry whose top-left cell corner sits at
    /// `(origin_x, origin_y)`.
    #[must_use]
    pub const fn new(origin_x: f32, origin_y: f32, cell_size: f32, size: GridSize) -> Self {
        Self {
            origin_x,
            origin_y,
            cell_size,
            size,
        }
    }

    /// Horizontal offset of the board in pixels.
    #[must_use]
    pub const fn origin_x(&self) -> f32 {
        self.origin_x
    }

    /// Vertical offset of the board in pixels.
    #[must_use]
    pub const fn origin_y(&self) -> f32 {
        self.origin_y
    }

    /// Side length of one square cell in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Dimensions of the board in cells.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Cell under the pixel position, or `None` when the position misses the
    /// board.
    #[must_use]
    pub fn cell_at(&self, x: f32, y: f32) -> Option<CellCoord> {
        if !(self.cell_size > 0.0) {
            return None;
        }
        let column = ((x - self.origin_x) / self.cell_size).floor();
        let row = ((y - self.origin_y) / self.cell_size).floor();
        if !(column >= 0.0 && row >= 0.0) {
            return None;
        }
        if column >= self.size.columns() as f32 || row >= self.size.rows() as f32 {
            return None;
        }
        let cell = CellCoord::new(row as u32, column as u32);
        self.size.contains(cell).then_some(cell)
    }

    /// Pixel position of the top-left corner of `cell`.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> (f32, f32) {
        (
            self.origin_x + cell.column() as f32 * self.cell_size,
            self.origin_y + cell.row() as f32 * self.cell_size,
        )
    }
}

/// Pointer activity captured by the adapter during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerInput {
    /// Primary button press position, if any.
    pub primary_click: Option<(f32, f32)>,
    /// Secondary button press position, if any.
    pub secondary_click: Option<(f32, f32)>,
}

impl PointerInput {
    /// Creates a pointer snapshot with explicit click positions.
    #[must_use]
    pub const fn new(
        primary_click: Option<(f32, f32)>,
        secondary_click: Option<(f32, f32)>,
    ) -> Self {
        Self {
            primary_click,
            secondary_click,
        }
    }
}

/// Input system that turns clicks on the board into world commands.
///
/// Primary clicks place the current piece and secondary clicks remove a
/// piece. Clicks are only forwarded while a round is being played.
#[derive(Clone, Debug)]
pub struct BoardInput {
    phase: GamePhase,
}

impl Default for BoardInput {
    fn default() -> Self {
        Self::new(GamePhase::NewGame)
    }
}

impl BoardInput {
    /// Creates the system for a world currently in `phase`.
    #[must_use]
    pub const fn new(phase: GamePhase) -> Self {
        Self { phase }
    }

    /// Phase the system believes the world is in.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Consumes world events and pointer input to emit board commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        geometry: &BoardGeometry,
        pointer: PointerInput,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::PhaseChanged { phase } = event {
                self.phase = *phase;
            }
        }

        if self.phase != GamePhase::Playing {
            return;
        }

        if let Some(cell) = pointer
            .primary_click
            .and_then(|(x, y)| geometry.cell_at(x, y))
        {
            trace!(?cell, "place requested");
            out.push(Command::PlacePiece { cell });
        }

        if let Some(cell) = pointer
            .secondary_click
            .and_then(|(x, y)| geometry.cell_at(x, y))
        {
            trace!(?cell, "removal requested");
            out.push(Command::RemovePiece { cell });
        }
    }
}
