#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Pipeflow experience.

mod config;
mod headless;
mod layout_transfer;
mod simulation;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use glam::Vec2;
use pipeflow_core::GridSize;
use pipeflow_rendering::{
    AssetProvider, BoardPresentation, Color, Presentation, RenderingBackend, Scene,
};
use pipeflow_rendering_macroquad::MacroquadBackend;
use pipeflow_system_input::{BoardGeometry, PointerInput};
use pipeflow_system_top_score::{FileScoreStore, MemoryScoreStore, TopScore};
use pipeflow_world::{query, BoardLayout, SessionConfig, World};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::simulation::Simulation;

/// Log filter applied when neither `--log-level` nor `RUST_LOG` is set.
const DEFAULT_LOG_FILTER: &str = "pipeflow=info";
/// Largest side of the board in pixels.
const MAX_BOARD_EXTENT: f32 = 768.0;
/// Largest cell edge in pixels.
const MAX_CELL_SIZE: f32 = 64.0;
/// Gap between the window edge and the board.
const BOARD_MARGIN: f32 = 32.0;

/// Command-line arguments accepted by the `pipeflow` binary.
#[derive(Debug, Parser)]
#[command(name = "pipeflow", about = "Lay pipes before the flow arrives.")]
pub(crate) struct CliArgs {
    /// Number of grid rows; overrides the config file.
    #[arg(long)]
    pub(crate) rows: Option<u32>,
    /// Number of grid columns; overrides the config file.
    #[arg(long)]
    pub(crate) columns: Option<u32>,
    /// Seed for board generation and the piece queue. Random when omitted.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Plays the short-fuse variant: five seconds and no lobby.
    #[arg(long, conflicts_with = "config")]
    pub(crate) classic: bool,
    /// TOML file holding a full session configuration.
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// Fixed board: a layout file or a `pipes:v1:` transfer string.
    #[arg(long, value_name = "FILE|STRING")]
    pub(crate) layout: Option<String>,
    /// File the best score is kept in.
    #[arg(long, value_name = "PATH", default_value = "topscore.txt")]
    pub(crate) top_score: PathBuf,
    /// Prints the layout as a one-line transfer string and exits.
    #[arg(long, requires = "layout")]
    pub(crate) export_layout: bool,
    /// Runs one stage without a window and prints the outcome.
    #[arg(long)]
    pub(crate) headless: bool,
    /// Synchronises presentation with the display refresh rate.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) vsync: bool,
    /// Prints the frame rate once per second.
    #[arg(long)]
    pub(crate) show_fps: bool,
    /// Log filter directive, for example `debug` or `pipeflow_world=trace`.
    #[arg(long, value_name = "FILTER")]
    pub(crate) log_level: Option<String>,
}

/// Entry point for the Pipeflow command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_level.as_deref())?;

    let mut config = config::session_config(&args)?;
    let layout = args
        .layout
        .as_deref()
        .map(config::load_layout)
        .transpose()?;
    if args.export_layout {
        let layout = layout.context("--export-layout needs --layout")?;
        println!("{}", layout_transfer::encode(&layout)?);
        return Ok(());
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, "session seed");

    if args.headless {
        let world = build_world(config, layout, seed)?;
        let geometry = board_geometry(query::grid(&world).size());
        let mut simulation = Simulation::new(
            world,
            TopScore::new(MemoryScoreStore::default()),
            geometry,
        );
        let frame = query::config(simulation.world()).flow_step;
        let report = headless::run(&mut simulation, frame)?;
        println!("{report}");
        return Ok(());
    }

    let backend = MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps);
    config.animations = backend.assets().animation_table();
    let world = build_world(config, layout, seed)?;
    println!("{}", query::welcome_banner(&world));

    let size = query::grid(&world).size();
    let geometry = board_geometry(size);
    let board = BoardPresentation::new(
        size.rows(),
        size.columns(),
        geometry.cell_size(),
        Vec2::new(geometry.origin_x(), geometry.origin_y()),
        Color::from_rgb_u8(58, 62, 70),
    )?;
    let mut simulation = Simulation::new(
        world,
        TopScore::new(FileScoreStore::new(&args.top_score)),
        geometry,
    );
    let mut scene = Scene::new(board, query::phase(simulation.world()));
    simulation.populate_scene(&mut scene);
    let presentation = Presentation::new("Pipeflow", Color::from_rgb_u8(22, 24, 28), scene);

    backend.run(presentation, move |dt, input, scene| {
        let pointer = PointerInput::new(
            input.primary_click.map(|click| (click.x, click.y)),
            input.secondary_click.map(|click| (click.x, click.y)),
        );
        let pressed = input
            .pressed_button
            .and_then(|index| simulation.button(index));
        simulation.step(dt, pointer, pressed);
        simulation.populate_scene(scene);
    })
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter '{directive}'"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn build_world(config: SessionConfig, layout: Option<BoardLayout>, seed: u64) -> Result<World> {
    let rng: Box<dyn RngCore> = Box::new(ChaCha8Rng::seed_from_u64(seed));
    let world = match layout {
        Some(layout) => World::from_layout(config, layout, rng),
        None => World::new(config, rng),
    };
    world.context("failed to build the session")
}

fn board_geometry(size: GridSize) -> BoardGeometry {
    let longest = size.rows().max(size.columns()).max(1) as f32;
    let cell_size = (MAX_BOARD_EXTENT / longest).min(MAX_CELL_SIZE);
    BoardGeometry::new(BOARD_MARGIN, BOARD_MARGIN, cell_size, size)
}
