use pipeflow_core::{Command, Event, GamePhase};
use pipeflow_system_control_panel::{ButtonKind, ControlPanel};

#[test]
fn lobby_button_starts_a_game() {
    let mut panel = ControlPanel::default();
    let mut commands = Vec::new();

    panel.handle(&[], Some(ButtonKind::NewGame), &mut commands);

    assert_eq!(
        commands,
        vec![Command::StartNewGame],
        "new game button should start the session",
    );
}

#[test]
fn panel_follows_phase_changes() {
    let mut panel = ControlPanel::default();
    let mut commands = Vec::new();

    panel.handle(
        &[Event::PhaseChanged {
            phase: GamePhase::Playing,
        }],
        Some(ButtonKind::Ready),
        &mut commands,
    );
    panel.handle(
        &[Event::PhaseChanged {
            phase: GamePhase::StageClear,
        }],
        Some(ButtonKind::NextStage),
        &mut commands,
    );
    panel.handle(
        &[Event::PhaseChanged {
            phase: GamePhase::GameOver,
        }],
        Some(ButtonKind::GameOver),
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::Ready, Command::AdvanceStage, Command::StartNewGame],
        "each phase's button should map to its command",
    );
}

#[test]
fn stale_presses_are_dropped() {
    let mut panel = ControlPanel::new(GamePhase::Playing);
    let mut commands = Vec::new();

    panel.handle(&[], Some(ButtonKind::NextStage), &mut commands);
    panel.handle(
        &[Event::PhaseChanged {
            phase: GamePhase::GameOver,
        }],
        Some(ButtonKind::Ready),
        &mut commands,
    );

    assert!(
        commands.is_empty(),
        "buttons from another phase must not reach the world",
    );
    assert_eq!(panel.buttons(), &[ButtonKind::GameOver]);
}
