//! Window-less runner that releases the flow at once and reports how the
//! stage ends.

use std::{fmt, time::Duration};

use anyhow::{bail, Result};
use pipeflow_core::{GamePhase, Score};
use pipeflow_system_control_panel::ButtonKind;
use pipeflow_system_input::PointerInput;
use pipeflow_system_top_score::ScoreStore;
use pipeflow_world::query;

use crate::simulation::Simulation;

/// Upper bound on simulated frames before the runner gives up.
const MAX_FRAMES: u32 = 1_000_000;

/// How a headless stage ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The flow reached the end piece.
    Cleared,
    /// The flow hit a dead end.
    Lost,
}

/// Summary printed after a headless run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HeadlessReport {
    pub(crate) outcome: Outcome,
    pub(crate) score: Score,
    pub(crate) hops: u32,
    pub(crate) elapsed: Duration,
}

impl fmt::Display for HeadlessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Outcome::Cleared => "stage cleared",
            Outcome::Lost => "game over",
        };
        write!(
            f,
            "{outcome}: score {}, {} pipes filled in {:.2}s",
            self.score.get(),
            self.hops,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Starts a game if needed, presses Ready and steps the simulation by
/// `frame` until the stage resolves.
pub(crate) fn run<S: ScoreStore>(
    simulation: &mut Simulation<S>,
    frame: Duration,
) -> Result<HeadlessReport> {
    if frame.is_zero() {
        bail!("headless frame step must be positive");
    }

    let mut elapsed = Duration::ZERO;
    let mut ready_pressed = false;
    for _ in 0..MAX_FRAMES {
        let phase = query::phase(simulation.world());
        let outcome = match phase {
            GamePhase::StageClear => Some(Outcome::Cleared),
            GamePhase::GameOver if ready_pressed => Some(Outcome::Lost),
            _ => None,
        };
        if let Some(outcome) = outcome {
            return Ok(HeadlessReport {
                outcome,
                score: query::score(simulation.world()),
                hops: simulation.hops(),
                elapsed,
            });
        }

        let pressed = match phase {
            GamePhase::NewGame | GamePhase::GameOver => simulation
                .button(0)
                .filter(|button| *button == ButtonKind::NewGame || *button == ButtonKind::GameOver),
            GamePhase::Playing if !ready_pressed => {
                let button = simulation.button(0).filter(|button| *button == ButtonKind::Ready);
                ready_pressed = button.is_some();
                button
            }
            _ => None,
        };
        simulation.step(frame, PointerInput::default(), pressed);
        elapsed = elapsed.saturating_add(frame);
    }
    bail!("flow did not resolve within {MAX_FRAMES} frames")
}
