#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Pipeflow.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Pieces are drawn procedurally from primitives, so the adapter ships its
//! own [`ProceduralAssets`] describing the animation strips it renders.

mod ui;

use self::ui::{draw_control_panel_ui, ControlPanelUiContext};
use anyhow::{ensure, Result};
use glam::Vec2;
use macroquad::{
    input::{is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton},
    math::Vec2 as MacroquadVec2,
};
use pipeflow_core::{AnimationTable, Direction};
use pipeflow_rendering::{
    AssetProvider, BoardPresentation, CellSprite, Color, FrameInput, Presentation,
    RenderingBackend, Scene, SpriteKey,
};
use std::time::Duration;

/// Width of the control panel drawn to the right of the board.
pub const PANEL_WIDTH: f32 = 240.0;

/// Tracks UI-sourced button presses so they can be merged with physical input
/// on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    pressed_button: Option<usize>,
}

impl ControlPanelInputState {
    /// Records that the panel button at `index` was pressed this frame.
    pub fn register_button(&mut self, index: usize) {
        self.pressed_button = Some(index);
    }

    /// Returns the latched button press, clearing it so the action fires once.
    pub fn take_button(&mut self) -> Option<usize> {
        self.pressed_button.take()
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the game loop.
    quit_requested: bool,
    /// `Enter` or `Space` presses the first panel button.
    confirm: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            confirm: is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::Space),
        }
    }
}

/// Animation strips the procedural renderer draws.
///
/// Animated sprites share one frame count; static pieces use a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProceduralAssets {
    animated_frames: u32,
}

impl Default for ProceduralAssets {
    fn default() -> Self {
        Self::with_frames(AnimationTable::DEFAULT_FRAMES)
    }
}

impl ProceduralAssets {
    /// Uses `frames` frames for every animated strip. Zero is raised to one.
    #[must_use]
    pub const fn with_frames(frames: u32) -> Self {
        Self {
            animated_frames: if frames == 0 { 1 } else { frames },
        }
    }
}

impl AssetProvider for ProceduralAssets {
    fn frame_count(&self, sprite: SpriteKey) -> u32 {
        match sprite {
            SpriteKey::Start(_) | SpriteKey::Flow(_) => self.animated_frames,
            SpriteKey::Pipe(_) | SpriteKey::End(_) => 1,
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    assets: ProceduralAssets,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the
    /// display refresh rate or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame rate once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Replaces the animation strips the backend draws.
    #[must_use]
    pub fn with_assets(mut self, assets: ProceduralAssets) -> Self {
        self.assets = assets;
        self
    }

    /// Animation strips the backend draws.
    #[must_use]
    pub const fn assets(&self) -> ProceduralAssets {
        self.assets
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the frame rate once a second has
    /// elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }
        let per_second = self.frames as f32 / self.elapsed.as_secs_f32();
        *self = Self::default();
        Some(per_second)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            assets,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        ensure!(
            scene.board.rows > 0 && scene.board.columns > 0,
            "board must have at least one cell"
        );

        let (window_width, window_height) = window_size(&scene.board);
        let mut config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            window_resizable: false,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut control_panel_input = ControlPanelInputState::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let frame_dt =
                    Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));
                let pressed_button = control_panel_input.take_button();
                let frame_input = gather_frame_input(&scene, pressed_button, keyboard);

                update_scene(frame_dt, frame_input, &mut scene);

                draw_board(&scene.board);
                for sprite in &scene.cells {
                    draw_cell(&scene.board, *sprite, &assets);
                }

                let screen_height = macroquad::window::screen_height();
                let panel_left = scene.board.origin.x * 2.0 + scene.board.width();
                let panel_background = to_macroquad_color(clear_color.lighten(0.08));
                macroquad::shapes::draw_rectangle(
                    panel_left,
                    0.0,
                    PANEL_WIDTH,
                    screen_height,
                    panel_background,
                );
                let context = ControlPanelUiContext {
                    origin: MacroquadVec2::new(panel_left, 0.0),
                    size: MacroquadVec2::new(PANEL_WIDTH, screen_height),
                    background: panel_background,
                    hud: &scene.hud,
                    buttons: &scene.buttons,
                    phase: scene.phase,
                };
                let mut control_panel_ui = macroquad::ui::root_ui();
                if let Some(index) = draw_control_panel_ui(&mut control_panel_ui, context) {
                    control_panel_input.register_button(index);
                }
                drop(control_panel_ui);

                if let Some(per_second) = fps_counter.record_frame(frame_dt) {
                    if show_fps {
                        println!("FPS: {per_second:.2}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn window_size(board: &BoardPresentation) -> (i32, i32) {
    let width = board.origin.x * 2.0 + board.width() + PANEL_WIDTH;
    let height = (board.origin.y * 2.0 + board.height()).max(480.0);
    (width.ceil() as i32, height.ceil() as i32)
}

fn gather_frame_input(
    scene: &Scene,
    pressed_button: Option<usize>,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    gather_frame_input_from_observations(
        scene,
        Vec2::new(cursor_x, cursor_y),
        is_mouse_button_pressed(MouseButton::Left),
        is_mouse_button_pressed(MouseButton::Right),
        pressed_button,
        keyboard.confirm,
    )
}

fn gather_frame_input_from_observations(
    scene: &Scene,
    cursor: Vec2,
    primary_pressed: bool,
    secondary_pressed: bool,
    pressed_button: Option<usize>,
    confirm_pressed: bool,
) -> FrameInput {
    let inside = cursor.x >= scene.board.origin.x
        && cursor.y >= scene.board.origin.y
        && cursor.x < scene.board.origin.x + scene.board.width()
        && cursor.y < scene.board.origin.y + scene.board.height();
    let keyboard_button = (confirm_pressed && !scene.buttons.is_empty()).then_some(0);

    FrameInput {
        primary_click: (inside && primary_pressed).then_some(cursor),
        secondary_click: (inside && secondary_pressed).then_some(cursor),
        pressed_button: pressed_button.or(keyboard_button),
    }
}

fn draw_board(board: &BoardPresentation) {
    let line_color = to_macroquad_color(board.line_color);
    let fill = to_macroquad_color(board.line_color.lighten(0.1));
    macroquad::shapes::draw_rectangle(
        board.origin.x,
        board.origin.y,
        board.width(),
        board.height(),
        fill,
    );
    for column in 0..=board.columns {
        let x = board.origin.x + column as f32 * board.cell_size;
        macroquad::shapes::draw_line(
            x,
            board.origin.y,
            x,
            board.origin.y + board.height(),
            1.0,
            line_color,
        );
    }
    for row in 0..=board.rows {
        let y = board.origin.y + row as f32 * board.cell_size;
        macroquad::shapes::draw_line(
            board.origin.x,
            y,
            board.origin.x + board.width(),
            y,
            1.0,
            line_color,
        );
    }
}

const PIPE_COLOR: Color = Color::new(0.55, 0.57, 0.6, 1.0);
const WATER_COLOR: Color = Color::new(0.2, 0.55, 0.95, 1.0);
const START_COLOR: Color = Color::new(0.3, 0.75, 0.35, 1.0);
const END_COLOR: Color = Color::new(0.85, 0.35, 0.3, 1.0);

fn draw_cell(board: &BoardPresentation, sprite: CellSprite, assets: &impl AssetProvider) {
    let origin = board.cell_origin(sprite.cell);
    let size = board.cell_size;
    let center = origin + Vec2::splat(size * 0.5);
    let pipe_width = size * 0.3;
    let water_width = size * 0.16;
    let progress = frame_progress(sprite.frame, assets.frame_count(sprite.sprite));

    match sprite.sprite {
        SpriteKey::Pipe(shape) => {
            for edge in shape.edges() {
                draw_segment(center, edge_midpoint(origin, size, edge), pipe_width, PIPE_COLOR);
            }
        }
        SpriteKey::Flow(flow) => {
            for edge in flow.shape().edges() {
                draw_segment(center, edge_midpoint(origin, size, edge), pipe_width, PIPE_COLOR);
            }
            let entry = edge_midpoint(origin, size, flow.entry());
            let exit = edge_midpoint(origin, size, flow.exit());
            for (from, to) in fill_segments(entry, center, exit, progress) {
                draw_segment(from, to, water_width, WATER_COLOR);
            }
        }
        SpriteKey::Start(orientation) => {
            let outlet = edge_midpoint(origin, size, orientation.heading());
            draw_segment(center, outlet, pipe_width, PIPE_COLOR);
            draw_block(origin, size, START_COLOR);
            if sprite.frame > 0 {
                draw_segment(center, center.lerp(outlet, progress), water_width, WATER_COLOR);
            }
        }
        SpriteKey::End(orientation) => {
            let inlet = edge_midpoint(origin, size, orientation.open_side());
            draw_segment(center, inlet, pipe_width, PIPE_COLOR);
            draw_block(origin, size, END_COLOR);
        }
    }
}

fn draw_block(origin: Vec2, size: f32, color: Color) {
    let inset = size * 0.25;
    macroquad::shapes::draw_rectangle(
        origin.x + inset,
        origin.y + inset,
        size - inset * 2.0,
        size - inset * 2.0,
        to_macroquad_color(color),
    );
}

fn draw_segment(from: Vec2, to: Vec2, thickness: f32, color: Color) {
    macroquad::shapes::draw_line(
        from.x,
        from.y,
        to.x,
        to.y,
        thickness,
        to_macroquad_color(color),
    );
}

/// Share of an animation strip shown once `frame` is displayed.
fn frame_progress(frame: u32, frames: u32) -> f32 {
    if frames == 0 {
        return 1.0;
    }
    ((frame + 1) as f32 / frames as f32).clamp(0.0, 1.0)
}

/// Midpoint of the cell edge facing `direction`.
fn edge_midpoint(origin: Vec2, size: f32, direction: Direction) -> Vec2 {
    let offset = match direction {
        Direction::Up => Vec2::new(0.5, 0.0),
        Direction::Down => Vec2::new(0.5, 1.0),
        Direction::Left => Vec2::new(0.0, 0.5),
        Direction::Right => Vec2::new(1.0, 0.5),
    };
    origin + offset * size
}

/// Water line segments for a pipe filled up to `progress` along the path
/// entry, center, exit.
fn fill_segments(entry: Vec2, center: Vec2, exit: Vec2, progress: f32) -> Vec<(Vec2, Vec2)> {
    let progress = progress.clamp(0.0, 1.0);
    if progress <= 0.5 {
        return vec![(entry, entry.lerp(center, progress * 2.0))];
    }
    vec![
        (entry, center),
        (center, center.lerp(exit, (progress - 0.5) * 2.0)),
    ]
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeflow_core::{CellCoord, FlowDirection, GamePhase, PipeShape, StartOrientation};
    use pipeflow_rendering::PanelButton;

    fn scene() -> Scene {
        let board = BoardPresentation::new(
            4,
            4,
            32.0,
            Vec2::new(16.0, 16.0),
            Color::from_rgb_u8(40, 40, 40),
        )
        .expect("valid board");
        let mut scene = Scene::new(board, GamePhase::Playing);
        scene.buttons.push(PanelButton::new("Ready"));
        scene
    }

    fn assert_vec2_close(actual: Vec2, expected: Vec2) {
        assert!(
            (actual - expected).length() < 1e-4,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn clicks_outside_the_board_are_dropped() {
        let scene = scene();
        let input = gather_frame_input_from_observations(
            &scene,
            Vec2::new(200.0, 20.0),
            true,
            true,
            None,
            false,
        );
        assert_eq!(input.primary_click, None);
        assert_eq!(input.secondary_click, None);

        let inside = gather_frame_input_from_observations(
            &scene,
            Vec2::new(20.0, 20.0),
            true,
            false,
            None,
            false,
        );
        assert_eq!(inside.primary_click, Some(Vec2::new(20.0, 20.0)));
        assert_eq!(inside.secondary_click, None);
    }

    #[test]
    fn confirm_key_presses_first_button_only_when_offered() {
        let mut scene = scene();
        let input =
            gather_frame_input_from_observations(&scene, Vec2::ZERO, false, false, None, true);
        assert_eq!(input.pressed_button, Some(0));

        scene.buttons.clear();
        let input =
            gather_frame_input_from_observations(&scene, Vec2::ZERO, false, false, None, true);
        assert_eq!(input.pressed_button, None);
    }

    #[test]
    fn ui_press_wins_over_keyboard() {
        let mut scene = scene();
        scene.buttons.push(PanelButton::new("Other"));
        let input =
            gather_frame_input_from_observations(&scene, Vec2::ZERO, false, false, Some(1), true);
        assert_eq!(input.pressed_button, Some(1));
    }

    #[test]
    fn edge_midpoints_sit_on_cell_edges() {
        let origin = Vec2::new(10.0, 20.0);
        assert_vec2_close(edge_midpoint(origin, 40.0, Direction::Up), Vec2::new(30.0, 20.0));
        assert_vec2_close(edge_midpoint(origin, 40.0, Direction::Down), Vec2::new(30.0, 60.0));
        assert_vec2_close(edge_midpoint(origin, 40.0, Direction::Left), Vec2::new(10.0, 40.0));
        assert_vec2_close(edge_midpoint(origin, 40.0, Direction::Right), Vec2::new(50.0, 40.0));
    }

    #[test]
    fn fill_reaches_center_at_half_progress() {
        let entry = Vec2::new(0.0, 5.0);
        let center = Vec2::new(5.0, 5.0);
        let exit = Vec2::new(5.0, 0.0);

        let quarter = fill_segments(entry, center, exit, 0.25);
        assert_eq!(quarter.len(), 1);
        assert_vec2_close(quarter[0].1, Vec2::new(2.5, 5.0));

        let full = fill_segments(entry, center, exit, 1.0);
        assert_eq!(full.len(), 2);
        assert_vec2_close(full[1].1, exit);
    }

    #[test]
    fn last_frame_shows_a_full_strip() {
        assert_eq!(frame_progress(10, 11), 1.0);
        assert!(frame_progress(0, 11) > 0.0);
        assert_eq!(frame_progress(0, 0), 1.0);
    }

    #[test]
    fn procedural_assets_animate_start_and_flow_only() {
        let assets = ProceduralAssets::with_frames(6);
        assert_eq!(assets.frame_count(SpriteKey::Start(StartOrientation::Up)), 6);
        assert_eq!(
            assets.frame_count(SpriteKey::Flow(FlowDirection::LeftToBottom)),
            6
        );
        assert_eq!(assets.frame_count(SpriteKey::Pipe(PipeShape::TopLeft)), 1);
        assert_eq!(
            assets
                .animation_table()
                .flow_frames(FlowDirection::RightToLeft),
            6
        );
        assert_eq!(ProceduralAssets::with_frames(0).animated_frames, 1);
    }

    #[test]
    fn window_fits_board_and_panel() {
        let scene = scene();
        assert_eq!(window_size(&scene.board), (32 + 128 + 240, 480));
        assert_eq!(scene.board.cell_origin(CellCoord::new(1, 0)), Vec2::new(16.0, 48.0));
    }

    #[test]
    fn fps_counter_reports_once_per_second() {
        let mut counter = FpsCounter::default();
        for _ in 0..9 {
            assert_eq!(counter.record_frame(Duration::from_millis(100)), None);
        }
        let rate = counter
            .record_frame(Duration::from_millis(100))
            .expect("one second elapsed");
        assert!((rate - 10.0).abs() < 1e-3);
    }
}
