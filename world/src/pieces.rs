//! Stateful board pieces and the per-tick outcomes they report.
//!
//! Pieces never reach into the session. Each update returns a
//! [`PieceOutcome`] and the world applies its effects, so a piece only needs
//! read access to the grid to decide where its flow goes next.

use std::time::Duration;

use pipeflow_core::{
    catalog::{self, Connection},
    CellCoord, CellTag, DeadEnd, Direction, EndOrientation, FlowDirection, PipeShape,
    StartOrientation, Timer, Timestamp,
};

use crate::grid::Grid;

/// Lifecycle stage of a piece as exposed to queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceState {
    /// Waiting; pipes stay here until flow reaches them.
    Idle,
    /// Start piece waiting for the countdown or the ready button.
    CountingDown,
    /// Stepping through the animation strip.
    Animating,
    /// Animation finished and the flow moved on.
    Resolved,
}

/// What the world must do after a piece update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PieceOutcome {
    Continue,
    Started,
    Activate { target: CellCoord, heading: Direction },
    Won,
    Failed(DeadEnd),
}

/// Frame cursor driven by a [`Timer`].
#[derive(Clone, Copy, Debug)]
struct Animation {
    frame: u32,
    frames: u32,
    timer: Timer,
}

impl Animation {
    fn new(frames: u32, step: Duration) -> Self {
        Self {
            frame: 0,
            frames: frames.max(1),
            timer: Timer::new(step),
        }
    }

    fn restart(&mut self, now: Timestamp) {
        self.frame = 0;
        self.timer.start(now);
    }

    /// Steps one frame whenever the timer lapsed and reports whether the last
    /// frame is showing.
    fn advance(&mut self, now: Timestamp) -> bool {
        self.timer.tick(now);
        if self.timer.is_active() {
            return false;
        }
        if self.frame + 1 < self.frames {
            self.frame += 1;
            self.timer.start(now);
        }
        self.frame + 1 >= self.frames
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StartState {
    CountingDown,
    Releasing,
    Resolved,
}

#[derive(Clone, Debug)]
pub(crate) struct StartPiece {
    cell: CellCoord,
    orientation: StartOrientation,
    delay: Timer,
    animation: Animation,
    state: StartState,
}

impl StartPiece {
    pub(crate) fn new(
        cell: CellCoord,
        orientation: StartOrientation,
        delay: Duration,
        frames: u32,
        step: Duration,
        now: Timestamp,
    ) -> Self {
        let mut timer = Timer::new(delay);
        timer.start(now);
        Self {
            cell,
            orientation,
            delay: timer,
            animation: Animation::new(frames, step),
            state: StartState::CountingDown,
        }
    }

    /// Skips the remaining delay; the flow starts on the next update.
    pub(crate) fn release(&mut self) {
        self.delay.stop();
    }

    fn update(&mut self, now: Timestamp, grid: &Grid) -> PieceOutcome {
        match self.state {
            StartState::CountingDown => {
                self.delay.tick(now);
                if self.delay.is_active() {
                    return PieceOutcome::Continue;
                }
                self.state = StartState::Releasing;
                PieceOutcome::Started
            }
            StartState::Releasing => {
                if !self.animation.advance(now) {
                    return PieceOutcome::Continue;
                }
                self.state = StartState::Resolved;
                // The start only feeds pipes, never the end directly.
                match resolve(self.cell, self.orientation.heading(), grid) {
                    PieceOutcome::Won => PieceOutcome::Failed(DeadEnd::Incompatible),
                    outcome => outcome,
                }
            }
            StartState::Resolved => PieceOutcome::Continue,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlowState {
    Idle,
    Filling,
    Resolved,
}

#[derive(Clone, Debug)]
pub(crate) struct FlowPiece {
    cell: CellCoord,
    shape: PipeShape,
    flow: Option<FlowDirection>,
    animation: Animation,
    state: FlowState,
    step: Duration,
}

impl FlowPiece {
    pub(crate) fn new(cell: CellCoord, shape: PipeShape, step: Duration) -> Self {
        Self {
            cell,
            shape,
            flow: None,
            animation: Animation::new(1, step),
            state: FlowState::Idle,
            step,
        }
    }

    pub(crate) const fn shape(&self) -> PipeShape {
        self.shape
    }

    pub(crate) fn is_reached(&self) -> bool {
        self.state != FlowState::Idle
    }

    /// Starts filling the pipe with flow heading `heading`.
    ///
    /// A pipe only fills once; offering flow a second time, or through an
    /// edge the shape lacks, is a dead end.
    pub(crate) fn activate(
        &mut self,
        heading: Direction,
        frames: impl Fn(FlowDirection) -> u32,
        now: Timestamp,
    ) -> Result<FlowDirection, DeadEnd> {
        if self.state != FlowState::Idle {
            return Err(DeadEnd::Incompatible);
        }
        let flow = catalog::accept(heading, self.shape).ok_or(DeadEnd::Incompatible)?;
        self.flow = Some(flow);
        self.animation = Animation::new(frames(flow), self.step);
        self.animation.restart(now);
        self.state = FlowState::Filling;
        Ok(flow)
    }

    fn update(&mut self, now: Timestamp, grid: &Grid) -> PieceOutcome {
        let (FlowState::Filling, Some(flow)) = (self.state, self.flow) else {
            return PieceOutcome::Continue;
        };
        if !self.animation.advance(now) {
            return PieceOutcome::Continue;
        }
        self.state = FlowState::Resolved;
        resolve(self.cell, flow.exit(), grid)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct EndPiece {
    orientation: EndOrientation,
}

impl EndPiece {
    pub(crate) const fn new(orientation: EndOrientation) -> Self {
        Self { orientation }
    }
}

/// Any piece that lives on the board.
#[derive(Clone, Debug)]
pub(crate) enum BoardPiece {
    Start(StartPiece),
    End(EndPiece),
    Flow(FlowPiece),
}

impl BoardPiece {
    pub(crate) fn tag(&self) -> CellTag {
        match self {
            Self::Start(piece) => CellTag::Start(piece.orientation),
            Self::End(piece) => CellTag::End(piece.orientation),
            Self::Flow(piece) => CellTag::Pipe(piece.shape),
        }
    }

    pub(crate) fn update(&mut self, now: Timestamp, grid: &Grid) -> PieceOutcome {
        match self {
            Self::Start(piece) => piece.update(now, grid),
            Self::Flow(piece) => piece.update(now, grid),
            Self::End(_) => PieceOutcome::Continue,
        }
    }

    pub(crate) fn state(&self) -> PieceState {
        match self {
            Self::Start(piece) => match piece.state {
                StartState::CountingDown => PieceState::CountingDown,
                StartState::Releasing => PieceState::Animating,
                StartState::Resolved => PieceState::Resolved,
            },
            Self::End(_) => PieceState::Idle,
            Self::Flow(piece) => match piece.state {
                FlowState::Idle => PieceState::Idle,
                FlowState::Filling => PieceState::Animating,
                FlowState::Resolved => PieceState::Resolved,
            },
        }
    }

    /// Animation frame currently showing; zero for pieces that never animate.
    pub(crate) fn frame(&self) -> u32 {
        match self {
            Self::Start(piece) => piece.animation.frame,
            Self::Flow(piece) if piece.state != FlowState::Idle => piece.animation.frame,
            Self::Flow(_) | Self::End(_) => 0,
        }
    }

    pub(crate) fn flow(&self) -> Option<FlowDirection> {
        match self {
            Self::Flow(piece) => piece.flow,
            Self::Start(_) | Self::End(_) => None,
        }
    }
}

/// Offers the flow leaving `cell` toward `heading` to the neighbouring cell.
fn resolve(cell: CellCoord, heading: Direction, grid: &Grid) -> PieceOutcome {
    let Some(target) = grid.size().neighbor(cell, heading) else {
        return PieceOutcome::Failed(DeadEnd::OutOfBounds);
    };
    match catalog::connect(heading, grid.tag(target).unwrap_or_default()) {
        Connection::Pipe(_) => PieceOutcome::Activate { target, heading },
        Connection::End => PieceOutcome::Won,
        Connection::Blocked(reason) => PieceOutcome::Failed(reason),
    }
}
