#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Pipeflow.
//!
//! The world owns the grid, the pieces on it, the piece queue, the stage
//! countdown and the score. It changes only through [`apply`] and is read
//! through [`query`].

mod board;
mod config;
mod grid;
mod layout;
mod pieces;
mod placement;
mod queue;

use std::{fmt, time::Duration};

use pipeflow_core::{
    CellCoord, Command, DeadEnd, Direction, Event, GamePhase, Score, Timer, Timestamp,
    WELCOME_BANNER,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, error, info};

pub use board::{BoardSetupError, Endpoints};
pub use config::{ConfigError, SessionConfig, MAXIMUM_GRID_EDGE, MINIMUM_GRID_EDGE};
pub use grid::Grid;
pub use layout::{BoardLayout, LayoutError};
pub use pieces::PieceState;

use board::Board;
use pieces::PieceOutcome;
use queue::PieceQueue;

/// Reasons a world could not be created or reset.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The session configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The fixed layout is unusable.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// Random endpoint placement failed.
    #[error(transparent)]
    BoardSetup(#[from] BoardSetupError),
}

/// Represents the authoritative Pipeflow world state.
pub struct World {
    banner: &'static str,
    config: SessionConfig,
    layout: Option<BoardLayout>,
    board: Board,
    queue: PieceQueue,
    countdown: Timer,
    banked: Duration,
    now: Timestamp,
    phase: GamePhase,
    score: Score,
    stage: u32,
    rng: Box<dyn RngCore>,
}

impl World {
    /// Creates a world with randomly placed endpoints drawn from `rng`.
    pub fn new(config: SessionConfig, rng: Box<dyn RngCore>) -> Result<Self, WorldError> {
        config.validate()?;
        Self::assemble(config, None, rng)
    }

    /// Creates a world whose randomness derives from `seed`.
    pub fn with_seed(config: SessionConfig, seed: u64) -> Result<Self, WorldError> {
        Self::new(config, Box::new(ChaCha8Rng::seed_from_u64(seed)))
    }

    /// Creates a world that rebuilds `layout` on every reset.
    ///
    /// The layout's dimensions replace the configured grid size; the random
    /// source still feeds the piece queue.
    pub fn from_layout(
        mut config: SessionConfig,
        layout: BoardLayout,
        rng: Box<dyn RngCore>,
    ) -> Result<Self, WorldError> {
        config.validate_rules()?;
        layout.validate()?;
        config.rows = layout.size().rows();
        config.columns = layout.size().columns();
        Self::assemble(config, Some(layout), rng)
    }

    fn assemble(
        config: SessionConfig,
        layout: Option<BoardLayout>,
        mut rng: Box<dyn RngCore>,
    ) -> Result<Self, WorldError> {
        let countdown = config.stage_countdown(0);
        let board = build_board(&config, layout.as_ref(), countdown, Timestamp::ZERO, &mut *rng)?;
        let queue = PieceQueue::filled(config.queue_length, &mut *rng);
        let phase = if config.skip_lobby {
            GamePhase::Playing
        } else {
            GamePhase::NewGame
        };
        let mut timer = Timer::new(countdown);
        timer.start(Timestamp::ZERO);
        Ok(Self {
            banner: WELCOME_BANNER,
            score: Score::new(config.initial_score),
            config,
            layout,
            board,
            queue,
            countdown: timer,
            banked: Duration::ZERO,
            now: Timestamp::ZERO,
            phase,
            stage: 0,
            rng,
        })
    }

    fn reset_board(&mut self, out_events: &mut Vec<Event>) -> Result<(), WorldError> {
        let countdown = self
            .config
            .stage_countdown(self.stage)
            .saturating_add(self.banked);
        let board = build_board(
            &self.config,
            self.layout.as_ref(),
            countdown,
            self.now,
            &mut *self.rng,
        )?;
        self.banked = Duration::ZERO;
        self.queue = PieceQueue::filled(self.config.queue_length, &mut *self.rng);
        self.countdown = Timer::new(countdown);
        self.countdown.start(self.now);

        let endpoints = board.endpoints();
        self.board = board;
        info!(stage = self.stage, ?countdown, "board reset");
        out_events.push(Event::BoardReset {
            stage: self.stage,
            start: endpoints.start,
            start_orientation: endpoints.start_orientation,
            end: endpoints.end,
            end_orientation: endpoints.end_orientation,
            countdown,
        });
        Ok(())
    }

    fn enter_phase(&mut self, phase: GamePhase, out_events: &mut Vec<Event>) {
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    fn add_score(&mut self, amount: i64, out_events: &mut Vec<Event>) {
        self.score = self.score.saturating_add(amount);
        out_events.push(Event::ScoreChanged { score: self.score });
    }

    fn advance_pieces(&mut self, out_events: &mut Vec<Event>) {
        for (cell, outcome) in self.board.update_pieces(self.now) {
            if self.phase != GamePhase::Playing {
                break;
            }
            match outcome {
                PieceOutcome::Continue => {}
                PieceOutcome::Started => {
                    debug!(?cell, "flow released");
                    out_events.push(Event::FlowStarted { cell });
                }
                PieceOutcome::Activate { target, heading } => {
                    self.hand_over(cell, target, heading, out_events);
                }
                PieceOutcome::Won => self.win(out_events),
                PieceOutcome::Failed(reason) => self.fail(cell, reason, out_events),
            }
        }
    }

    fn hand_over(
        &mut self,
        from: CellCoord,
        to: CellCoord,
        heading: Direction,
        out_events: &mut Vec<Event>,
    ) {
        match self.board.activate(to, heading, &self.config, self.now) {
            Ok(flow) => {
                debug!(?from, ?to, ?flow, "flow advanced");
                out_events.push(Event::FlowAdvanced { from, to, flow });
                self.add_score(self.config.hop_bonus, out_events);
            }
            Err(reason) => self.fail(from, reason, out_events),
        }
    }

    fn win(&mut self, out_events: &mut Vec<Event>) {
        self.countdown.stop();
        self.add_score(self.config.win_bonus, out_events);
        info!(stage = self.stage, score = self.score.get(), "stage cleared");
        out_events.push(Event::StageCleared {
            stage: self.stage,
            score: self.score,
        });
        self.enter_phase(GamePhase::StageClear, out_events);
    }

    fn fail(&mut self, at: CellCoord, reason: DeadEnd, out_events: &mut Vec<Event>) {
        self.countdown.stop();
        info!(
            stage = self.stage,
            score = self.score.get(),
            ?at,
            ?reason,
            "game over"
        );
        out_events.push(Event::FlowFailed { at, reason });
        out_events.push(Event::GameOver {
            stage: self.stage,
            score: self.score,
        });
        self.enter_phase(GamePhase::GameOver, out_events);
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("phase", &self.phase)
            .field("stage", &self.stage)
            .field("score", &self.score)
            .field("now", &self.now)
            .field("board", &self.board)
            .finish_non_exhaustive()
    }
}

fn build_board(
    config: &SessionConfig,
    layout: Option<&BoardLayout>,
    countdown: Duration,
    now: Timestamp,
    rng: &mut dyn RngCore,
) -> Result<Board, WorldError> {
    match layout {
        Some(layout) => Ok(Board::from_layout(layout, config, countdown, now)?),
        None => Ok(Board::generate(config, countdown, now, rng)?),
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Requests that are not valid in the current phase, or that target an
/// unusable cell, leave the world untouched and emit no event.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { now } => {
            world.now = world.now.max(now);
            out_events.push(Event::TimeAdvanced { now: world.now });
            if world.phase != GamePhase::Playing {
                return;
            }

            let was_counting = world.countdown.is_active();
            world.countdown.tick(world.now);
            if was_counting && !world.countdown.is_active() {
                out_events.push(Event::CountdownExpired);
            }
            world.advance_pieces(out_events);
        }
        Command::PlacePiece { cell } => {
            if world.phase != GamePhase::Playing {
                debug!(?cell, phase = ?world.phase, "placement outside play ignored");
                return;
            }
            let shape = world.queue.current();
            if let Err(reason) = world.board.place_pipe(cell, shape) {
                debug!(?cell, ?reason, "placement rejected");
                return;
            }
            let next = world.queue.advance(&mut *world.rng);
            out_events.push(Event::PiecePlaced { cell, shape, next });
            world.add_score(-world.config.placement_cost, out_events);
        }
        Command::RemovePiece { cell } => {
            if world.phase != GamePhase::Playing {
                debug!(?cell, phase = ?world.phase, "removal outside play ignored");
                return;
            }
            match world.board.remove_pipe(cell) {
                Ok(shape) => out_events.push(Event::PieceRemoved { cell, shape }),
                Err(reason) => debug!(?cell, ?reason, "removal rejected"),
            }
        }
        Command::Ready => {
            if world.phase != GamePhase::Playing {
                debug!(phase = ?world.phase, "ready outside play ignored");
                return;
            }
            world.board.release_start();
            if world.countdown.is_active() {
                let remaining = world.countdown.remaining(world.now);
                let banked = Duration::from_secs(remaining.as_secs());
                world.countdown.stop();
                world.banked = banked;
                out_events.push(Event::CountdownFrozen { banked });
            }
        }
        Command::StartNewGame => {
            if !matches!(world.phase, GamePhase::NewGame | GamePhase::GameOver) {
                debug!(phase = ?world.phase, "new game request ignored");
                return;
            }
            world.stage = 0;
            world.banked = Duration::ZERO;
            if let Err(error) = world.reset_board(out_events) {
                error!(%error, "could not start a new game");
                return;
            }
            world.score = Score::new(world.config.initial_score);
            out_events.push(Event::ScoreChanged { score: world.score });
            world.enter_phase(GamePhase::Playing, out_events);
        }
        Command::AdvanceStage => {
            if world.phase != GamePhase::StageClear {
                debug!(phase = ?world.phase, "stage advance ignored");
                return;
            }
            world.stage = world.stage.saturating_add(1);
            if let Err(error) = world.reset_board(out_events) {
                error!(%error, "could not build the next stage");
                return;
            }
            world.enter_phase(GamePhase::Playing, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Endpoints, Grid, PieceState, SessionConfig, World};
    use pipeflow_core::{CellCoord, CellTag, FlowDirection, GamePhase, PipeShape, Score, Timestamp};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the session runs with.
    #[must_use]
    pub fn config(world: &World) -> &SessionConfig {
        &world.config
    }

    /// Phase the session is in.
    #[must_use]
    pub fn phase(world: &World) -> GamePhase {
        world.phase
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> Score {
        world.score
    }

    /// Zero-based index of the stage being played.
    #[must_use]
    pub fn stage(world: &World) -> u32 {
        world.stage
    }

    /// Latest timestamp the world advanced to.
    #[must_use]
    pub fn now(world: &World) -> Timestamp {
        world.now
    }

    /// Time left on the stage countdown; zero once it expired or froze.
    #[must_use]
    pub fn time_remaining(world: &World) -> Duration {
        world.countdown.remaining(world.now)
    }

    /// Time the player banked for the next stage.
    #[must_use]
    pub fn banked_time(world: &World) -> Duration {
        world.banked
    }

    /// Provides read-only access to the grid of cell tags.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        world.board.grid()
    }

    /// Tag of the cell, or `None` outside the grid.
    #[must_use]
    pub fn cell_tag(world: &World, cell: CellCoord) -> Option<CellTag> {
        world.board.grid().tag(cell)
    }

    /// Start and end pieces of the current board.
    #[must_use]
    pub fn endpoints(world: &World) -> Endpoints {
        world.board.endpoints()
    }

    /// Shape the next placement will use.
    #[must_use]
    pub fn current_piece(world: &World) -> PipeShape {
        world.queue.current()
    }

    /// Shapes queued behind the current piece, nearest first.
    #[must_use]
    pub fn upcoming_pieces(world: &World) -> Vec<PipeShape> {
        world.queue.upcoming().collect()
    }

    /// Snapshot of the piece occupying `cell`.
    #[must_use]
    pub fn piece(world: &World, cell: CellCoord) -> Option<PieceSnapshot> {
        world
            .board
            .piece(cell)
            .map(|piece| snapshot(cell, piece))
    }

    /// Captures a read-only view of every piece on the board.
    #[must_use]
    pub fn piece_view(world: &World) -> PieceView {
        PieceView {
            snapshots: world
                .board
                .pieces()
                .map(|(cell, piece)| snapshot(cell, piece))
                .collect(),
        }
    }

    fn snapshot(cell: CellCoord, piece: &super::pieces::BoardPiece) -> PieceSnapshot {
        PieceSnapshot {
            cell,
            tag: piece.tag(),
            state: piece.state(),
            frame: piece.frame(),
            flow: piece.flow(),
        }
    }

    /// Read-only snapshot describing all pieces on the board.
    #[derive(Clone, Debug)]
    pub struct PieceView {
        snapshots: Vec<PieceSnapshot>,
    }

    impl PieceView {
        /// Iterator over the captured snapshots in row-major order.
        pub fn iter(&self) -> impl Iterator<Item = &PieceSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<PieceSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single piece used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PieceSnapshot {
        /// Cell the piece occupies.
        pub cell: CellCoord,
        /// Tag the piece writes into the grid.
        pub tag: CellTag,
        /// Lifecycle stage of the piece.
        pub state: PieceState,
        /// Animation frame currently showing.
        pub frame: u32,
        /// Flow the piece carries once reached.
        pub flow: Option<FlowDirection>,
    }
}
