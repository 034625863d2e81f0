#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure audio system deriving sound cues from world events.
//!
//! The system never plays anything itself. Backends drain the emitted cues
//! and start or stop the flow loop without waiting for playback.

use pipeflow_core::Event;

/// Discrete sound cues an audio backend may render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// The start piece began releasing flow.
    FlowStarted,
    /// The flow stopped because the stage was won, lost or reset.
    FlowStopped,
}

/// Tracks whether the flow loop is audible and emits edge-triggered cues.
#[derive(Clone, Debug, Default)]
pub struct Audio {
    flowing: bool,
}

impl Audio {
    /// Creates a silent audio system.
    #[must_use]
    pub const fn new() -> Self {
        Self { flowing: false }
    }

    /// Reports whether the flow loop should currently be audible.
    #[must_use]
    pub const fn is_flowing(&self) -> bool {
        self.flowing
    }

    /// Consumes world events and appends the resulting cues.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<AudioCue>) {
        for event in events {
            match event {
                Event::FlowStarted { .. } if !self.flowing => {
                    self.flowing = true;
                    out.push(AudioCue::FlowStarted);
                }
                Event::StageCleared { .. } | Event::GameOver { .. } | Event::BoardReset { .. }
                    if self.flowing =>
                {
                    self.flowing = false;
                    out.push(AudioCue::FlowStopped);
                }
                _ => {}
            }
        }
    }
}
