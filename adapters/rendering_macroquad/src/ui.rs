//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! Every use of `macroquad::ui` lives here so the rest of the adapter stays
//! agnostic of Macroquad's UI types.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use pipeflow_core::{GamePhase, PipeShape};
use pipeflow_rendering::{HudPresentation, PanelButton};

/// Snapshot of the control panel's layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ControlPanelUiContext<'a> {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin.
    pub background: Color,
    /// Numbers shown above the buttons.
    pub hud: &'a HudPresentation,
    /// Buttons on offer this frame.
    pub buttons: &'a [PanelButton],
    /// Session phase, shown as a status line.
    pub phase: GamePhase,
}

/// Renders the control panel and reports the index of a pressed button.
pub(crate) fn draw_control_panel_ui(ui: &mut Ui, context: ControlPanelUiContext<'_>) -> Option<usize> {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 4.0, 4.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .color(Color::from_rgba(38, 84, 124, 255))
        .color_hovered(Color::from_rgba(52, 110, 160, 255))
        .color_clicked(Color::from_rgba(28, 64, 96, 255))
        .margin(RectOffset::new(0.0, 0.0, 8.0, 8.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let mut pressed = None;
    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        let hud = context.hud;
        ui.label(None, &format!("Score: {}", hud.score));
        ui.label(None, &format!("Top score: {}", hud.top_score));
        ui.label(None, &format!("Stage: {}", hud.stage));
        ui.label(None, &format!("Time: {}s", hud.seconds_remaining));
        ui.label(None, phase_status(context.phase));

        let current = hud.current.map_or("-", shape_name);
        ui.label(None, &format!("Current: {current}"));
        for (position, shape) in hud.upcoming.iter().enumerate() {
            ui.label(None, &format!("{}. {}", position + 1, shape_name(*shape)));
        }

        for (index, button) in context.buttons.iter().enumerate() {
            if ui.button(None, button.label.as_str()) {
                pressed = Some(index);
            }
        }
    });

    ui.pop_skin();
    pressed
}

fn phase_status(phase: GamePhase) -> &'static str {
    match phase {
        GamePhase::NewGame => "Press New Game to begin.",
        GamePhase::Playing => "Lay pipes before the flow starts.",
        GamePhase::StageClear => "Stage clear!",
        GamePhase::GameOver => "The flow spilled.",
    }
}

fn shape_name(shape: PipeShape) -> &'static str {
    match shape {
        PipeShape::Horizontal => "Horizontal",
        PipeShape::Vertical => "Vertical",
        PipeShape::TopLeft => "Top-left bend",
        PipeShape::BottomLeft => "Bottom-left bend",
        PipeShape::TopRight => "Top-right bend",
        PipeShape::BottomRight => "Bottom-right bend",
    }
}
