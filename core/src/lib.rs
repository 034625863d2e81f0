#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pipeflow engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.
//!
//! The connectivity rules that decide how flow travels from one cell to the
//! next live in [`catalog`]; the pacing primitive used by every animated
//! piece and by the stage countdown is [`Timer`].

pub mod catalog;
mod timer;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use timer::Timer;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Pipeflow.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock to the provided monotonic timestamp.
    Tick {
        /// Current reading of the external monotonic clock.
        now: Timestamp,
    },
    /// Requests that the queued current piece be placed into a cell.
    PlacePiece {
        /// Cell that should receive the current piece.
        cell: CellCoord,
    },
    /// Requests removal of a player-placed piece.
    RemovePiece {
        /// Cell holding the piece targeted for removal.
        cell: CellCoord,
    },
    /// Freezes the countdown, banks the remaining time and releases the flow.
    Ready,
    /// Starts a fresh game from the first stage.
    StartNewGame,
    /// Advances to the next stage after a cleared board.
    AdvanceStage,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Timestamp the world advanced to.
        now: Timestamp,
    },
    /// Announces that the board was rebuilt with fresh start and end pieces.
    BoardReset {
        /// Zero-based stage index the board belongs to.
        stage: u32,
        /// Cell occupied by the start piece.
        start: CellCoord,
        /// Direction the start piece releases flow toward.
        start_orientation: StartOrientation,
        /// Cell occupied by the end piece.
        end: CellCoord,
        /// Side of the end piece that accepts flow.
        end_orientation: EndOrientation,
        /// Countdown granted to the player before the flow starts.
        countdown: Duration,
    },
    /// Announces that the session entered a new phase.
    PhaseChanged {
        /// Phase that became active after processing commands.
        phase: GamePhase,
    },
    /// Confirms that the current piece was placed into the grid.
    PiecePlaced {
        /// Cell that received the piece.
        cell: CellCoord,
        /// Shape of the placed piece.
        shape: PipeShape,
        /// Shape that became the new current piece.
        next: PipeShape,
    },
    /// Confirms that a player-placed piece was removed from the grid.
    PieceRemoved {
        /// Cell that held the piece.
        cell: CellCoord,
        /// Shape of the removed piece.
        shape: PipeShape,
    },
    /// Reports the score after it changed.
    ScoreChanged {
        /// Score held by the session after the change.
        score: Score,
    },
    /// Reports that the player froze the countdown.
    CountdownFrozen {
        /// Time carried over into the next stage.
        banked: Duration,
    },
    /// Reports that the stage countdown ran out.
    CountdownExpired,
    /// Reports that the start piece began releasing flow.
    FlowStarted {
        /// Cell occupied by the start piece.
        cell: CellCoord,
    },
    /// Confirms that flow travelled from one piece into the next pipe.
    FlowAdvanced {
        /// Cell the flow left.
        from: CellCoord,
        /// Cell the flow entered.
        to: CellCoord,
        /// Directional flow state the entered pipe adopted.
        flow: FlowDirection,
    },
    /// Reports that the flow hit a dead end.
    FlowFailed {
        /// Cell the flow was leaving when it failed.
        at: CellCoord,
        /// Reason the neighbouring cell could not accept the flow.
        reason: DeadEnd,
    },
    /// Reports that the flow reached the end piece.
    StageCleared {
        /// Stage that was cleared.
        stage: u32,
        /// Score after the win bonus was applied.
        score: Score,
    },
    /// Reports that the round ended in a loss.
    GameOver {
        /// Stage the loss happened on.
        stage: u32,
        /// Final score of the game.
        score: Score,
    },
}

/// Phases of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to start the first game.
    NewGame,
    /// Board accepts placements and the flow is simulated.
    Playing,
    /// Flow reached the end piece; waiting for the next stage.
    StageClear,
    /// Flow failed; waiting for a new game.
    GameOver,
}

/// Millisecond reading of the external monotonic clock.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Clock origin.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from a millisecond reading.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Millisecond reading carried by the timestamp.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Timestamp offset by `duration`, saturating at the clock's upper bound.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Time elapsed since `earlier`, or zero when `earlier` lies in the future.
    #[must_use]
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Location of a single grid cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate from `(row, column)`.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

/// Dimensions of the playing grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    rows: u32,
    columns: u32,
}

impl GridSize {
    /// Creates a new grid size.
    #[must_use]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.rows) * u64::from(self.columns);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.row < self.rows && cell.column < self.columns
    }

    /// Dense row-major index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row).ok()?;
        let column = usize::try_from(cell.column).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }

    /// Returns the neighbouring cell one step toward `direction`, if in bounds.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let candidate = match direction {
            Direction::Up => CellCoord::new(cell.row.checked_sub(1)?, cell.column),
            Direction::Down => CellCoord::new(cell.row.checked_add(1)?, cell.column),
            Direction::Left => CellCoord::new(cell.row, cell.column.checked_sub(1)?),
            Direction::Right => CellCoord::new(cell.row, cell.column.checked_add(1)?),
        };
        self.contains(candidate).then_some(candidate)
    }

    /// Reports whether `direction` points off the grid from `cell`.
    #[must_use]
    pub fn is_boundary(&self, cell: CellCoord, direction: Direction) -> bool {
        self.neighbor(cell, direction).is_none()
    }

    /// Iterator over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(row, column)))
    }
}

/// Cardinal directions on the grid; used both for edges and for travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing row indices.
    Down,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in declaration order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Pipe geometry occupying a cell, named after the two edges it connects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipeShape {
    /// Connects the left and right edges.
    Horizontal,
    /// Connects the top and bottom edges.
    Vertical,
    /// Connects the top and left edges.
    TopLeft,
    /// Connects the bottom and left edges.
    BottomLeft,
    /// Connects the top and right edges.
    TopRight,
    /// Connects the bottom and right edges.
    BottomRight,
}

impl PipeShape {
    /// Every shape; random piece selection draws uniformly from this table.
    pub const ALL: [PipeShape; 6] = [
        Self::Horizontal,
        Self::Vertical,
        Self::TopLeft,
        Self::BottomLeft,
        Self::TopRight,
        Self::BottomRight,
    ];

    /// The two edges joined by the shape.
    #[must_use]
    pub const fn edges(self) -> [Direction; 2] {
        match self {
            Self::Horizontal => [Direction::Left, Direction::Right],
            Self::Vertical => [Direction::Up, Direction::Down],
            Self::TopLeft => [Direction::Up, Direction::Left],
            Self::BottomLeft => [Direction::Down, Direction::Left],
            Self::TopRight => [Direction::Up, Direction::Right],
            Self::BottomRight => [Direction::Down, Direction::Right],
        }
    }
}

/// Directional flow state of a pipe: the edge flow entered through and the
/// edge it leaves through.
///
/// Each shape carries two states because the animation differs by travel
/// direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlowDirection {
    /// Horizontal pipe, entering left and leaving right.
    LeftToRight,
    /// Horizontal pipe, entering right and leaving left.
    RightToLeft,
    /// Vertical pipe, entering top and leaving bottom.
    TopToBottom,
    /// Vertical pipe, entering bottom and leaving top.
    BottomToTop,
    /// Top-left corner, entering left and leaving top.
    LeftToTop,
    /// Top-left corner, entering top and leaving left.
    TopToLeft,
    /// Bottom-left corner, entering left and leaving bottom.
    LeftToBottom,
    /// Bottom-left corner, entering bottom and leaving left.
    BottomToLeft,
    /// Top-right corner, entering right and leaving top.
    RightToTop,
    /// Top-right corner, entering top and leaving right.
    TopToRight,
    /// Bottom-right corner, entering right and leaving bottom.
    RightToBottom,
    /// Bottom-right corner, entering bottom and leaving right.
    BottomToRight,
}

impl FlowDirection {
    /// Every directional flow state.
    pub const ALL: [FlowDirection; 12] = [
        Self::LeftToRight,
        Self::RightToLeft,
        Self::TopToBottom,
        Self::BottomToTop,
        Self::LeftToTop,
        Self::TopToLeft,
        Self::LeftToBottom,
        Self::BottomToLeft,
        Self::RightToTop,
        Self::TopToRight,
        Self::RightToBottom,
        Self::BottomToRight,
    ];

    /// Edge the flow entered the cell through.
    #[must_use]
    pub const fn entry(self) -> Direction {
        match self {
            Self::LeftToRight | Self::LeftToTop | Self::LeftToBottom => Direction::Left,
            Self::RightToLeft | Self::RightToTop | Self::RightToBottom => Direction::Right,
            Self::TopToBottom | Self::TopToLeft | Self::TopToRight => Direction::Up,
            Self::BottomToTop | Self::BottomToLeft | Self::BottomToRight => Direction::Down,
        }
    }

    /// Edge the flow leaves the cell through, which is also the direction it
    /// travels into the next cell.
    #[must_use]
    pub const fn exit(self) -> Direction {
        match self {
            Self::LeftToRight | Self::TopToRight | Self::BottomToRight => Direction::Right,
            Self::RightToLeft | Self::TopToLeft | Self::BottomToLeft => Direction::Left,
            Self::TopToBottom | Self::LeftToBottom | Self::RightToBottom => Direction::Down,
            Self::BottomToTop | Self::LeftToTop | Self::RightToTop => Direction::Up,
        }
    }

    /// Shape that carries this flow state.
    #[must_use]
    pub const fn shape(self) -> PipeShape {
        match self {
            Self::LeftToRight | Self::RightToLeft => PipeShape::Horizontal,
            Self::TopToBottom | Self::BottomToTop => PipeShape::Vertical,
            Self::LeftToTop | Self::TopToLeft => PipeShape::TopLeft,
            Self::LeftToBottom | Self::BottomToLeft => PipeShape::BottomLeft,
            Self::RightToTop | Self::TopToRight => PipeShape::TopRight,
            Self::RightToBottom | Self::BottomToRight => PipeShape::BottomRight,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Orientation of a start piece: the direction its flow leaves toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StartOrientation {
    /// Flow leaves toward the right-hand neighbour.
    Right,
    /// Flow leaves toward the left-hand neighbour.
    Left,
    /// Flow leaves toward the neighbour above.
    Up,
    /// Flow leaves toward the neighbour below.
    Down,
}

impl StartOrientation {
    /// Every start orientation.
    pub const ALL: [StartOrientation; 4] = [Self::Right, Self::Left, Self::Up, Self::Down];

    /// Direction the released flow travels.
    #[must_use]
    pub const fn heading(self) -> Direction {
        match self {
            Self::Right => Direction::Right,
            Self::Left => Direction::Left,
            Self::Up => Direction::Up,
            Self::Down => Direction::Down,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Orientation of an end piece: the side of its cell that is open to flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EndOrientation {
    /// Open on the left edge; accepts flow travelling right.
    Left,
    /// Open on the right edge; accepts flow travelling left.
    Right,
    /// Open on the top edge; accepts flow travelling down.
    Up,
    /// Open on the bottom edge; accepts flow travelling up.
    Down,
}

impl EndOrientation {
    /// Every end orientation.
    pub const ALL: [EndOrientation; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    /// Edge of the cell that accepts flow.
    #[must_use]
    pub const fn open_side(self) -> Direction {
        match self {
            Self::Left => Direction::Left,
            Self::Right => Direction::Right,
            Self::Up => Direction::Up,
            Self::Down => Direction::Down,
        }
    }
}

/// Content tag stored for every grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellTag {
    /// Nothing occupies the cell.
    #[default]
    Empty,
    /// A player-placed pipe.
    Pipe(PipeShape),
    /// The start piece.
    Start(StartOrientation),
    /// The end piece.
    End(EndOrientation),
}

impl CellTag {
    /// Reports whether the cell is free.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Reports whether the tag marks a start or end piece, which players
    /// cannot remove.
    #[must_use]
    pub const fn is_immutable(&self) -> bool {
        matches!(self, Self::Start(_) | Self::End(_))
    }
}

/// Session score. May become negative when placements outpace bonuses.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Score(i64);

impl Score {
    /// Creates a score with the provided value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Numeric value of the score.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Score increased by `amount`.
    #[must_use]
    pub const fn saturating_add(self, amount: i64) -> Self {
        Self(self.0.saturating_add(amount))
    }

    /// Score decreased by `amount`.
    #[must_use]
    pub const fn saturating_sub(self, amount: i64) -> Self {
        Self(self.0.saturating_sub(amount))
    }
}

/// Animation frame counts per animated piece kind.
///
/// The world only needs to know how many frames an animation has to decide
/// when it completes; the frames themselves belong to the asset provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationTable {
    start: [u32; 4],
    flow: [u32; 12],
}

impl AnimationTable {
    /// Frame count used by the stock sprite strips.
    pub const DEFAULT_FRAMES: u32 = 11;

    /// Creates a table where every animation uses `frames` frames.
    #[must_use]
    pub const fn uniform(frames: u32) -> Self {
        let frames = if frames == 0 { 1 } else { frames };
        Self {
            start: [frames; 4],
            flow: [frames; 12],
        }
    }

    /// Overrides the frame count of one start orientation.
    #[must_use]
    pub const fn with_start_frames(mut self, orientation: StartOrientation, frames: u32) -> Self {
        self.start[orientation.index()] = if frames == 0 { 1 } else { frames };
        self
    }

    /// Overrides the frame count of one flow direction.
    #[must_use]
    pub const fn with_flow_frames(mut self, flow: FlowDirection, frames: u32) -> Self {
        self.flow[flow.index()] = if frames == 0 { 1 } else { frames };
        self
    }

    /// Frames in the start piece's release animation. Never zero.
    #[must_use]
    pub const fn start_frames(&self, orientation: StartOrientation) -> u32 {
        self.start[orientation.index()]
    }

    /// Frames in a pipe's fill animation for the given flow. Never zero.
    #[must_use]
    pub const fn flow_frames(&self, flow: FlowDirection) -> u32 {
        self.flow[flow.index()]
    }
}

impl Default for AnimationTable {
    fn default() -> Self {
        Self::uniform(Self::DEFAULT_FRAMES)
    }
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The session is not in the playing phase.
    InvalidPhase,
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell already holds a piece.
    Occupied,
}

/// Reasons a removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// The session is not in the playing phase.
    InvalidPhase,
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell holds nothing.
    Empty,
    /// Start and end pieces cannot be removed.
    Immutable,
    /// The flow already reached the piece.
    FlowReached,
}

/// Reasons the flow could not continue into the neighbouring cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadEnd {
    /// The flow left the grid.
    OutOfBounds,
    /// The neighbouring cell is empty.
    EmptyCell,
    /// The neighbouring piece has no edge facing the flow.
    Incompatible,
}
