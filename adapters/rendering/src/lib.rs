#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Pipeflow adapters.
//!
//! Backends receive a [`Presentation`] once and then a mutable [`Scene`] every
//! frame. The scene is plain data copied out of world queries, so backends
//! never touch the simulation directly.

use anyhow::Result as AnyResult;
use glam::Vec2;
use pipeflow_core::{
    AnimationTable, CellCoord, CellTag, EndOrientation, FlowDirection, GamePhase, PipeShape,
    StartOrientation,
};
use std::time::Duration;
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let lift = |channel: f32| channel + (1.0 - channel) * amount;
        Self {
            red: lift(self.red),
            green: lift(self.green),
            blue: lift(self.blue),
            alpha: self.alpha,
        }
    }
}

/// Identifies the sprite strip a cell is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    /// An unfilled pipe.
    Pipe(PipeShape),
    /// A pipe carrying flow in the given direction.
    Flow(FlowDirection),
    /// The start piece.
    Start(StartOrientation),
    /// The end piece.
    End(EndOrientation),
}

impl SpriteKey {
    /// Sprite for a piece with `tag`, switching pipes to their flow strip
    /// once flow reached them. Empty cells have no sprite.
    #[must_use]
    pub const fn for_piece(tag: CellTag, flow: Option<FlowDirection>) -> Option<Self> {
        match (tag, flow) {
            (CellTag::Empty, _) => None,
            (CellTag::Pipe(_), Some(flow)) => Some(Self::Flow(flow)),
            (CellTag::Pipe(shape), None) => Some(Self::Pipe(shape)),
            (CellTag::Start(orientation), _) => Some(Self::Start(orientation)),
            (CellTag::End(orientation), _) => Some(Self::End(orientation)),
        }
    }
}

/// Supplies animation strips for every sprite.
///
/// The simulation only needs frame counts; backends resolve the frames
/// themselves through whatever handle type they use.
pub trait AssetProvider {
    /// Number of frames in the strip for `sprite`. Never zero.
    fn frame_count(&self, sprite: SpriteKey) -> u32;

    /// Frame counts of every animated strip, ready to hand to the world.
    fn animation_table(&self) -> AnimationTable {
        let table = StartOrientation::ALL
            .into_iter()
            .fold(AnimationTable::default(), |table, orientation| {
                table.with_start_frames(
                    orientation,
                    self.frame_count(SpriteKey::Start(orientation)),
                )
            });
        FlowDirection::ALL.into_iter().fold(table, |table, flow| {
            table.with_flow_frames(flow, self.frame_count(SpriteKey::Flow(flow)))
        })
    }
}

/// Describes where and how large the board is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardPresentation {
    /// Number of rows in the grid.
    pub rows: u32,
    /// Number of columns in the grid.
    pub columns: u32,
    /// Side length of one cell in pixels.
    pub cell_size: f32,
    /// Screen position of the top-left corner of the board.
    pub origin: Vec2,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl BoardPresentation {
    /// Creates a new board descriptor.
    ///
    /// Returns an error when `cell_size` is not a positive finite number.
    pub fn new(
        rows: u32,
        columns: u32,
        cell_size: f32,
        origin: Vec2,
        line_color: Color,
    ) -> Result<Self, RenderingError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }
        Ok(Self {
            rows,
            columns,
            cell_size,
            origin,
            line_color,
        })
    }

    /// Width of the board in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Height of the board in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Screen position of the top-left corner of `cell`.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        self.origin + Vec2::new(cell.column() as f32, cell.row() as f32) * self.cell_size
    }
}

/// One occupied cell and the frame of its strip to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSprite {
    /// Cell the sprite covers.
    pub cell: CellCoord,
    /// Strip the frame is taken from.
    pub sprite: SpriteKey,
    /// Zero-based frame index.
    pub frame: u32,
}

/// Numbers and pieces shown next to the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HudPresentation {
    /// Current score.
    pub score: i64,
    /// Best score on record.
    pub top_score: i64,
    /// One-based stage number.
    pub stage: u32,
    /// Whole seconds left on the countdown, rounded up.
    pub seconds_remaining: u64,
    /// Shape the next placement uses.
    pub current: Option<PipeShape>,
    /// Shapes queued behind the current piece.
    pub upcoming: Vec<PipeShape>,
}

/// Clickable control-panel button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelButton {
    /// Text printed on the button.
    pub label: String,
}

impl PanelButton {
    /// Creates a button with the given label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Position of a primary button press this frame, in screen pixels.
    pub primary_click: Option<Vec2>,
    /// Position of a secondary button press this frame, in screen pixels.
    pub secondary_click: Option<Vec2>,
    /// Index into [`Scene::buttons`] of the panel button pressed this frame.
    pub pressed_button: Option<usize>,
}

/// Everything a backend draws in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Board placement.
    pub board: BoardPresentation,
    /// Occupied cells in row-major order.
    pub cells: Vec<CellSprite>,
    /// Side panel numbers.
    pub hud: HudPresentation,
    /// Buttons on offer.
    pub buttons: Vec<PanelButton>,
    /// Session phase.
    pub phase: GamePhase,
}

impl Scene {
    /// Creates an empty scene for the given board.
    #[must_use]
    pub fn new(board: BoardPresentation, phase: GamePhase) -> Self {
        Self {
            board,
            cells: Vec::new(),
            hud: HudPresentation::default(),
            buttons: Vec::new(),
            phase,
        }
    }
}

/// Static window configuration plus the first scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title of the window.
    pub window_title: String,
    /// Background color.
    pub clear_color: Color,
    /// Scene shown on the first frame.
    pub scene: Scene,
}

impl Presentation {
    /// Creates a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Behaviour shared by every rendering backend.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and mutates the scene before it is
    /// drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Error)]
pub enum RenderingError {
    /// Cells must have a positive size.
    #[error("cell size must be positive (received {cell_size})")]
    InvalidCellSize {
        /// Provided size that failed validation.
        cell_size: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Strips;

    impl AssetProvider for Strips {
        fn frame_count(&self, sprite: SpriteKey) -> u32 {
            match sprite {
                SpriteKey::Start(StartOrientation::Up) => 4,
                SpriteKey::Flow(FlowDirection::TopToBottom) => 7,
                _ => 11,
            }
        }
    }

    #[test]
    fn board_rejects_non_positive_cells() {
        let error = BoardPresentation::new(12, 12, 0.0, Vec2::ZERO, Color::from_rgb_u8(0, 0, 0))
            .expect_err("zero cell size must be rejected");
        assert_eq!(error, RenderingError::InvalidCellSize { cell_size: 0.0 });
        assert!(
            BoardPresentation::new(12, 12, f32::NAN, Vec2::ZERO, Color::new(0.0, 0.0, 0.0, 1.0))
                .is_err()
        );
    }

    #[test]
    fn cell_origin_offsets_by_whole_cells() {
        let board = BoardPresentation::new(
            12,
            12,
            64.0,
            Vec2::new(128.0, 64.0),
            Color::from_rgb_u8(0, 0, 0),
        )
        .expect("valid board");
        assert_eq!(
            board.cell_origin(CellCoord::new(2, 1)),
            Vec2::new(192.0, 192.0)
        );
        assert_eq!(board.width(), 768.0);
    }

    #[test]
    fn sprite_switches_to_flow_strip_once_reached() {
        let tag = CellTag::Pipe(PipeShape::Vertical);
        assert_eq!(
            SpriteKey::for_piece(tag, None),
            Some(SpriteKey::Pipe(PipeShape::Vertical))
        );
        assert_eq!(
            SpriteKey::for_piece(tag, Some(FlowDirection::BottomToTop)),
            Some(SpriteKey::Flow(FlowDirection::BottomToTop))
        );
        assert_eq!(SpriteKey::for_piece(CellTag::Empty, None), None);
    }

    #[test]
    fn animation_table_collects_frame_counts() {
        let table = Strips.animation_table();
        assert_eq!(table.start_frames(StartOrientation::Up), 4);
        assert_eq!(table.start_frames(StartOrientation::Left), 11);
        assert_eq!(table.flow_frames(FlowDirection::TopToBottom), 7);
        assert_eq!(table.flow_frames(FlowDirection::LeftToRight), 11);
    }

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::new(0.0, 0.5, 1.0, 0.25).lighten(0.5);
        assert_eq!(color, Color::new(0.5, 0.75, 1.0, 0.25));
    }
}
