#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure control-panel system that offers one button per session phase and
//! translates presses into world commands.

use pipeflow_core::{Command, Event, GamePhase};
use tracing::debug;

/// Buttons the control panel can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonKind {
    /// Starts the first game from the lobby.
    NewGame,
    /// Freezes the countdown and releases the flow.
    Ready,
    /// Moves on after a cleared stage.
    NextStage,
    /// Acknowledges a loss and starts over.
    GameOver,
}

impl ButtonKind {
    /// Text printed on the button.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewGame => "New Game",
            Self::Ready => "Ready",
            Self::NextStage => "Next Stage",
            Self::GameOver => "Game Over",
        }
    }

    /// Command issued when the button is pressed.
    #[must_use]
    pub const fn command(self) -> Command {
        match self {
            Self::NewGame | Self::GameOver => Command::StartNewGame,
            Self::Ready => Command::Ready,
            Self::NextStage => Command::AdvanceStage,
        }
    }

    /// Buttons shown while the session is in `phase`.
    #[must_use]
    pub const fn for_phase(phase: GamePhase) -> &'static [ButtonKind] {
        match phase {
            GamePhase::NewGame => &[Self::NewGame],
            GamePhase::Playing => &[Self::Ready],
            GamePhase::StageClear => &[Self::NextStage],
            GamePhase::GameOver => &[Self::GameOver],
        }
    }
}

/// Control-panel system tracking the phase and gating button presses.
#[derive(Clone, Debug)]
pub struct ControlPanel {
    phase: GamePhase,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new(GamePhase::NewGame)
    }
}

impl ControlPanel {
    /// Creates the system for a world currently in `phase`.
    #[must_use]
    pub const fn new(phase: GamePhase) -> Self {
        Self { phase }
    }

    /// Buttons currently on offer.
    #[must_use]
    pub const fn buttons(&self) -> &'static [ButtonKind] {
        ButtonKind::for_phase(self.phase)
    }

    /// Consumes world events and an optional button press to emit commands.
    ///
    /// Presses of buttons that the current phase does not offer are dropped.
    pub fn handle(&mut self, events: &[Event], pressed: Option<ButtonKind>, out: &mut Vec<Command>) {
        for event in events {
            if let Event::PhaseChanged { phase } = event {
                self.phase = *phase;
            }
        }

        let Some(button) = pressed else {
            return;
        };
        if self.buttons().contains(&button) {
            out.push(button.command());
        } else {
            debug!(?button, phase = ?self.phase, "button press ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_phase_offers_its_own_button() {
        let table = [
            (GamePhase::NewGame, ButtonKind::NewGame, Command::StartNewGame),
            (GamePhase::Playing, ButtonKind::Ready, Command::Ready),
            (GamePhase::StageClear, ButtonKind::NextStage, Command::AdvanceStage),
            (GamePhase::GameOver, ButtonKind::GameOver, Command::StartNewGame),
        ];
        for (phase, button, command) in table {
            assert_eq!(ButtonKind::for_phase(phase), &[button], "{phase:?}");
            assert_eq!(button.command(), command, "{button:?}");

            let mut panel = ControlPanel::new(phase);
            let mut out = Vec::new();
            panel.handle(&[], Some(button), &mut out);
            assert_eq!(out, vec![command], "{phase:?}");
        }
    }
}
