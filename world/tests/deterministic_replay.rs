use pipeflow_core::{CellCoord, Command, Direction, Event, GamePhase, Timestamp};
use pipeflow_world::{self as world, query, SessionConfig, World};

const SEED: u64 = 0x5eed_f10e;

#[test]
fn deterministic_replay_produces_identical_logs() {
    let first = replay(SEED);
    let second = replay(SEED);

    assert_eq!(first, second, "replay diverged between runs");
    assert!(
        first
            .events
            .iter()
            .any(|event| matches!(event, Event::GameOver { .. } | Event::StageCleared { .. })),
        "scripted session reaches a verdict"
    );
}

#[test]
fn different_seeds_produce_different_boards() {
    let boards: Vec<_> = (0..8)
        .map(|seed| {
            let world = World::with_seed(SessionConfig::default(), seed).expect("world builds");
            query::endpoints(&world)
        })
        .collect();
    assert!(
        boards.windows(2).any(|pair| pair[0] != pair[1]),
        "eight seeds produced the same board"
    );
}

#[test]
fn random_endpoints_respect_placement_rules() {
    for seed in 0..300 {
        for (rows, columns) in [(3, 3), (3, 7), (12, 12)] {
            let config = SessionConfig {
                rows,
                columns,
                ..SessionConfig::default()
            };
            let mut world = World::with_seed(config, seed).expect("world builds");
            assert_endpoints_valid(&world, seed);

            let mut events = Vec::new();
            world::apply(&mut world, Command::StartNewGame, &mut events);
            assert_endpoints_valid(&world, seed);
        }
    }
}

fn assert_endpoints_valid(world: &World, seed: u64) {
    let endpoints = query::endpoints(world);
    let size = query::grid(world).size();
    assert!(
        size.neighbor(endpoints.start, endpoints.start_orientation.heading())
            .is_some(),
        "seed {seed}: start faces the boundary"
    );
    assert!(
        size.neighbor(endpoints.end, endpoints.end_orientation.open_side())
            .is_some(),
        "seed {seed}: end opens onto the boundary"
    );
    assert!(
        Direction::ALL
            .iter()
            .all(|&direction| size.neighbor(endpoints.end, direction) != Some(endpoints.start)),
        "seed {seed}: endpoints touch"
    );
    assert_eq!(query::grid(world).occupied_count(), 2);
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    final_phase: GamePhase,
    occupied: Vec<CellCoord>,
}

fn replay(seed: u64) -> ReplayOutcome {
    let config = SessionConfig {
        skip_lobby: true,
        ..SessionConfig::default()
    };
    let mut world = World::with_seed(config, seed).expect("world builds");
    let mut log = Vec::new();

    for command in scripted_commands() {
        world::apply(&mut world, command, &mut log);
    }
    let mut now = 0;
    while query::phase(&world) == GamePhase::Playing && now < 120_000 {
        now += 16;
        world::apply(
            &mut world,
            Command::Tick {
                now: Timestamp::from_millis(now),
            },
            &mut log,
        );
    }

    let occupied = query::grid(&world)
        .iter()
        .filter(|(_, tag)| !tag.is_empty())
        .map(|(cell, _)| cell)
        .collect();

    ReplayOutcome {
        events: log,
        final_phase: query::phase(&world),
        occupied,
    }
}

fn scripted_commands() -> Vec<Command> {
    let mut commands: Vec<Command> = (0..12)
        .map(|index| Command::PlacePiece {
            cell: CellCoord::new(index % 12, (index * 5) % 12),
        })
        .collect();
    commands.push(Command::RemovePiece {
        cell: CellCoord::new(0, 0),
    });
    commands.push(Command::Tick {
        now: Timestamp::from_millis(1_250),
    });
    commands.push(Command::Ready);
    commands
}
