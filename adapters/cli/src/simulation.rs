//! Frame loop glue between the world, the pure systems and the renderer.

use std::time::Duration;

use pipeflow_core::{Command, Event, GamePhase, Timestamp};
use pipeflow_rendering::{CellSprite, HudPresentation, PanelButton, Scene, SpriteKey};
use pipeflow_system_audio::{Audio, AudioCue};
use pipeflow_system_control_panel::{ButtonKind, ControlPanel};
use pipeflow_system_input::{BoardGeometry, BoardInput, PointerInput};
use pipeflow_system_top_score::{ScoreStore, TopScore};
use pipeflow_world::{self as world, query, World};
use tracing::{debug, info};

/// Owns the world and every system, and advances them one frame at a time.
///
/// Events produced while applying a frame's commands are handed to the
/// systems at the start of the next frame.
#[derive(Debug)]
pub(crate) struct Simulation<S> {
    world: World,
    input: BoardInput,
    control_panel: ControlPanel,
    audio: Audio,
    top_score: TopScore<S>,
    geometry: BoardGeometry,
    elapsed: Duration,
    pending_events: Vec<Event>,
    commands: Vec<Command>,
    cues: Vec<AudioCue>,
    hops: u32,
}

impl<S: ScoreStore> Simulation<S> {
    /// Wires the systems to a freshly built world.
    pub(crate) fn new(world: World, top_score: TopScore<S>, geometry: BoardGeometry) -> Self {
        let phase = query::phase(&world);
        Self {
            world,
            input: BoardInput::new(phase),
            control_panel: ControlPanel::new(phase),
            audio: Audio::new(),
            top_score,
            geometry,
            elapsed: Duration::ZERO,
            pending_events: Vec::new(),
            commands: Vec::new(),
            cues: Vec::new(),
            hops: 0,
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Pipes the flow entered since the current stage began.
    pub(crate) const fn hops(&self) -> u32 {
        self.hops
    }

    /// Cues raised during the latest step.
    #[cfg(test)]
    pub(crate) fn cues(&self) -> &[AudioCue] {
        &self.cues
    }

    /// Button shown at `index` in the current scene.
    pub(crate) fn button(&self, index: usize) -> Option<ButtonKind> {
        self.control_panel.buttons().get(index).copied()
    }

    /// Advances the session by `dt` with this frame's input.
    pub(crate) fn step(
        &mut self,
        dt: Duration,
        pointer: PointerInput,
        pressed: Option<ButtonKind>,
    ) {
        self.elapsed = self.elapsed.saturating_add(dt);
        let now = Timestamp::from_millis(u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX));

        let events = std::mem::take(&mut self.pending_events);
        self.commands.clear();
        self.input
            .handle(&events, &self.geometry, pointer, &mut self.commands);
        self.control_panel
            .handle(&events, pressed, &mut self.commands);
        self.commands.push(Command::Tick { now });

        let mut produced = Vec::new();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut produced);
        }

        self.observe(&produced);
        self.pending_events = produced;
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::BoardReset { stage, .. } => {
                    self.hops = 0;
                    debug!(stage, "new board");
                }
                Event::FlowAdvanced { .. } => self.hops = self.hops.saturating_add(1),
                Event::PhaseChanged { phase } => info!(?phase, "phase changed"),
                _ => {}
            }
        }

        self.cues.clear();
        self.audio.handle(events, &mut self.cues);
        for cue in &self.cues {
            debug!(?cue, "audio cue");
        }

        if let Some(best) = self.top_score.handle(events) {
            info!(score = best.get(), "new top score");
        }
    }

    /// Copies the world state the renderer needs into `scene`.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        let world = &self.world;
        let phase = query::phase(world);
        scene.phase = phase;

        scene.cells.clear();
        scene.cells.extend(query::piece_view(world).iter().filter_map(|piece| {
            SpriteKey::for_piece(piece.tag, piece.flow).map(|sprite| CellSprite {
                cell: piece.cell,
                sprite,
                frame: piece.frame,
            })
        }));

        let remaining = query::time_remaining(world);
        scene.hud = HudPresentation {
            score: query::score(world).get(),
            top_score: self.top_score.best().get(),
            stage: query::stage(world).saturating_add(1),
            seconds_remaining: whole_seconds_up(remaining),
            current: (phase == GamePhase::Playing).then(|| query::current_piece(world)),
            upcoming: query::upcoming_pieces(world),
        };

        scene.buttons.clear();
        scene.buttons.extend(
            self.control_panel
                .buttons()
                .iter()
                .map(|button| PanelButton::new(button.label())),
        );
    }
}

fn whole_seconds_up(duration: Duration) -> u64 {
    let seconds = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        seconds.saturating_add(1)
    } else {
        seconds
    }
}
