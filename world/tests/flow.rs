use std::time::Duration;

use pipeflow_core::{
    CellCoord, CellTag, Command, DeadEnd, Event, FlowDirection, GamePhase, PipeShape, Score,
    Timestamp,
};
use pipeflow_world::{self as world, query, BoardLayout, PieceState, SessionConfig, World};
use rand::rngs::mock::StepRng;

const TICK: u64 = 10;

fn config() -> SessionConfig {
    SessionConfig {
        skip_lobby: true,
        ..SessionConfig::default()
    }
}

/// Builds a world on a fixed layout whose queue only ever deals horizontal
/// pipes.
fn corridor_world(layout: &str) -> World {
    let layout: BoardLayout = layout.parse().expect("valid layout");
    World::from_layout(config(), layout, Box::new(StepRng::new(0, 0))).expect("world builds")
}

fn send(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

/// Ticks in small increments until the phase leaves `Playing` or `limit`
/// passes, returning every event produced.
fn run_until_settled(world: &mut World, limit: u64) -> Vec<Event> {
    let mut log = Vec::new();
    let mut now = query::now(world).as_millis();
    while query::phase(world) == GamePhase::Playing && now <= limit {
        now += TICK;
        world::apply(
            world,
            Command::Tick {
                now: Timestamp::from_millis(now),
            },
            &mut log,
        );
    }
    log
}

#[test]
fn straight_corridor_reaches_the_end() {
    let mut world = corridor_world("S> . . . E<");
    assert_eq!(query::current_piece(&world), PipeShape::Horizontal);

    for column in 1..=3 {
        let events = send(
            &mut world,
            Command::PlacePiece {
                cell: CellCoord::new(0, column),
            },
        );
        assert_eq!(events.len(), 2, "placement emits piece and score events");
    }
    assert_eq!(query::score(&world), Score::new(350));

    let _ = send(&mut world, Command::Ready);
    let log = run_until_settled(&mut world, 10_000);

    assert_eq!(query::phase(&world), GamePhase::StageClear);
    assert_eq!(
        query::score(&world),
        Score::new(500 - 50 * 3 + 100 * 3 + 1000),
        "corridor score"
    );

    let hops: Vec<_> = log
        .iter()
        .filter_map(|event| match event {
            Event::FlowAdvanced { from, to, flow } => Some((*from, *to, *flow)),
            _ => None,
        })
        .collect();
    assert_eq!(
        hops,
        vec![
            (
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                FlowDirection::LeftToRight
            ),
            (
                CellCoord::new(0, 1),
                CellCoord::new(0, 2),
                FlowDirection::LeftToRight
            ),
            (
                CellCoord::new(0, 2),
                CellCoord::new(0, 3),
                FlowDirection::LeftToRight
            ),
        ]
    );
    assert!(log.contains(&Event::StageCleared {
        stage: 0,
        score: Score::new(1650)
    }));
    assert!(log.contains(&Event::PhaseChanged {
        phase: GamePhase::StageClear
    }));

    for piece in query::piece_view(&world).iter() {
        assert!(
            !matches!(
                piece.state,
                PieceState::Animating | PieceState::CountingDown
            ),
            "{piece:?} still in flight"
        );
    }
}

#[test]
fn flow_into_an_empty_cell_ends_the_game() {
    let mut world = corridor_world("S> . . . E<");
    let _ = send(
        &mut world,
        Command::PlacePiece {
            cell: CellCoord::new(0, 1),
        },
    );
    let _ = send(&mut world, Command::Ready);
    let log = run_until_settled(&mut world, 10_000);

    assert_eq!(query::phase(&world), GamePhase::GameOver);
    assert!(log.contains(&Event::FlowFailed {
        at: CellCoord::new(0, 1),
        reason: DeadEnd::EmptyCell,
    }));
    assert!(log.contains(&Event::GameOver {
        stage: 0,
        score: Score::new(550),
    }));

    let after = send(
        &mut world,
        Command::Tick {
            now: Timestamp::from_millis(60_000),
        },
    );
    assert_eq!(
        after,
        vec![Event::TimeAdvanced {
            now: Timestamp::from_millis(60_000)
        }],
        "nothing moves after the loss"
    );
}

#[test]
fn incompatible_pipe_ends_the_game() {
    let mut world = corridor_world("S> | . E<");
    let _ = send(&mut world, Command::Ready);
    let log = run_until_settled(&mut world, 10_000);

    assert!(log.contains(&Event::FlowFailed {
        at: CellCoord::new(0, 0),
        reason: DeadEnd::Incompatible,
    }));
    assert_eq!(query::score(&world), Score::new(500), "no hop was paid");
}

#[test]
fn start_facing_the_wall_of_a_layout_fails_out_of_bounds() {
    let mut world = corridor_world(". E< S>");
    let _ = send(&mut world, Command::Ready);
    let log = run_until_settled(&mut world, 10_000);
    assert!(log.contains(&Event::FlowFailed {
        at: CellCoord::new(0, 2),
        reason: DeadEnd::OutOfBounds,
    }));
}

#[test]
fn expired_countdown_releases_the_flow() {
    let mut world = corridor_world("S> - - - E<");
    let before = send(
        &mut world,
        Command::Tick {
            now: Timestamp::from_millis(29_990),
        },
    );
    assert!(!before.contains(&Event::CountdownExpired));
    assert_eq!(query::time_remaining(&world), Duration::from_millis(10));

    let expiry = send(
        &mut world,
        Command::Tick {
            now: Timestamp::from_millis(30_000),
        },
    );
    assert!(expiry.contains(&Event::CountdownExpired));
    assert!(expiry.contains(&Event::FlowStarted {
        cell: CellCoord::new(0, 0)
    }));

    let _ = run_until_settled(&mut world, 60_000);
    assert_eq!(query::phase(&world), GamePhase::StageClear);
    assert_eq!(query::banked_time(&world), Duration::ZERO);
}

#[test]
fn banked_time_extends_the_next_stage() {
    let mut world = corridor_world("S> - - - E<");
    let frozen = send(&mut world, Command::Ready);
    assert_eq!(
        frozen,
        vec![Event::CountdownFrozen {
            banked: Duration::from_secs(30)
        }]
    );
    let _ = run_until_settled(&mut world, 10_000);
    assert_eq!(query::phase(&world), GamePhase::StageClear);

    let events = send(&mut world, Command::AdvanceStage);
    let countdown = events.iter().find_map(|event| match event {
        Event::BoardReset {
            stage, countdown, ..
        } => Some((*stage, *countdown)),
        _ => None,
    });
    assert_eq!(countdown, Some((1, Duration::from_secs(29 + 30))));
    assert_eq!(query::phase(&world), GamePhase::Playing);
    assert_eq!(query::banked_time(&world), Duration::ZERO);
    assert_eq!(
        query::cell_tag(&world, CellCoord::new(0, 2)),
        Some(CellTag::Pipe(PipeShape::Horizontal)),
        "layout pipes come back on reset"
    );
}

#[test]
fn new_game_after_loss_restores_the_opening_state() {
    let mut world = corridor_world("S> . . . E<");
    let _ = send(&mut world, Command::Ready);
    let _ = run_until_settled(&mut world, 10_000);
    assert_eq!(query::phase(&world), GamePhase::GameOver);

    let ignored = send(&mut world, Command::AdvanceStage);
    assert!(ignored.is_empty());

    let events = send(&mut world, Command::StartNewGame);
    assert!(events.contains(&Event::ScoreChanged {
        score: Score::new(500)
    }));
    assert_eq!(
        events.last(),
        Some(&Event::PhaseChanged {
            phase: GamePhase::Playing
        })
    );
    assert_eq!(query::stage(&world), 0);
    assert_eq!(query::grid(&world).occupied_count(), 2);
}

#[test]
fn placement_and_removal_rejections_leave_no_trace() {
    let mut world = corridor_world("S> - . . E<");
    let occupied = send(
        &mut world,
        Command::PlacePiece {
            cell: CellCoord::new(0, 1),
        },
    );
    let outside = send(
        &mut world,
        Command::PlacePiece {
            cell: CellCoord::new(1, 0),
        },
    );
    let endpoint = send(
        &mut world,
        Command::RemovePiece {
            cell: CellCoord::new(0, 4),
        },
    );
    let empty = send(
        &mut world,
        Command::RemovePiece {
            cell: CellCoord::new(0, 2),
        },
    );
    assert!(occupied.is_empty() && outside.is_empty());
    assert!(endpoint.is_empty() && empty.is_empty());
    assert_eq!(query::score(&world), Score::new(500));

    let _ = send(&mut world, Command::Ready);
    let mut now = 0;
    while query::piece(&world, CellCoord::new(0, 1)).map(|piece| piece.state)
        == Some(PieceState::Idle)
    {
        now += TICK;
        let _ = send(
            &mut world,
            Command::Tick {
                now: Timestamp::from_millis(now),
            },
        );
    }
    let reached = send(
        &mut world,
        Command::RemovePiece {
            cell: CellCoord::new(0, 1),
        },
    );
    assert!(reached.is_empty(), "pipes holding flow stay put");
    assert_eq!(
        query::cell_tag(&world, CellCoord::new(0, 1)),
        Some(CellTag::Pipe(PipeShape::Horizontal))
    );
}

#[test]
fn start_beside_the_end_needs_a_pipe_between_them() {
    let mut world = corridor_world("S> E< .");
    let _ = send(&mut world, Command::Ready);
    let log = run_until_settled(&mut world, 10_000);

    assert_eq!(query::phase(&world), GamePhase::GameOver);
    assert!(log.contains(&Event::FlowFailed {
        at: CellCoord::new(0, 0),
        reason: DeadEnd::Incompatible,
    }));
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::StageCleared { .. })));
    assert_eq!(query::score(&world), Score::new(500));
}

#[test]
fn pipes_past_a_gap_never_fill() {
    let mut world = corridor_world("S> - . - E<");
    let _ = send(&mut world, Command::Ready);
    let log = run_until_settled(&mut world, 10_000);

    assert_eq!(query::phase(&world), GamePhase::GameOver);
    assert!(log.contains(&Event::FlowFailed {
        at: CellCoord::new(0, 1),
        reason: DeadEnd::EmptyCell,
    }));
    assert!(!log.iter().any(|event| matches!(
        event,
        Event::FlowAdvanced { to, .. } if *to == CellCoord::new(0, 3)
    )));

    for now in [20_000, 40_000, 60_000] {
        let _ = send(
            &mut world,
            Command::Tick {
                now: Timestamp::from_millis(now),
            },
        );
    }
    assert_eq!(
        query::piece(&world, CellCoord::new(0, 3)).map(|piece| piece.state),
        Some(PieceState::Idle)
    );
    assert_eq!(
        query::piece(&world, CellCoord::new(0, 1)).map(|piece| piece.state),
        Some(PieceState::Resolved)
    );
}
