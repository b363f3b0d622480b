#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Amida ladder-lottery experience.

mod game_file;
mod ladder_transfer;

use std::{path::PathBuf, time::Duration};

use amida_core::{
    Command, Density, Event, LadderGrid, LineIndex, OutcomeEntry, OutcomeLabel, Rung, RunPhase,
    GAME_TITLE,
};
use amida_rendering::{
    Color, LadderPresentation, Presentation, RenderingBackend, RunPresentation, Scene,
};
use amida_rendering_macroquad::MacroquadBackend;
use amida_system_assignment::participant_number;
use amida_world::{self as world, query, World};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::game_file::{GameFile, GameFileOutcome};
use crate::ladder_transfer::LadderSnapshot;

const BACKGROUND: Color = Color::from_rgb_u8(24, 26, 33);
const RAIL_COLOR: Color = Color::from_rgb_u8(196, 200, 208);
const RUNG_COLOR: Color = Color::from_rgb_u8(120, 126, 140);
const TRACE_COLOR: Color = Color::from_rgb_u8(224, 70, 70);
const MARKER_COLOR: Color = Color::from_rgb_u8(226, 80, 226);

const RAIL_SPACING: f32 = 48.0;
const LEVEL_SPACING: f32 = 24.0;
const LABEL_BAND: f32 = 36.0;

/// Mixed into the ladder seed when no explicit outcome seed is provided, so
/// one `--seed` flag reproduces the whole session while the two streams stay
/// independent.
const OUTCOME_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Command-line arguments accepted by the `amida` binary.
#[derive(Debug, Parser)]
#[command(
    name = "amida",
    version,
    about = "Ladder lottery: random rung generation and deterministic path tracing"
)]
struct Args {
    /// Number of participants (vertical rails, 2..=12).
    #[arg(long)]
    lines: Option<u32>,

    /// Number of interior levels between the boundaries.
    #[arg(long)]
    levels: Option<u32>,

    /// Per-level rung probability in [0, 1].
    #[arg(long)]
    density: Option<f32>,

    /// Seed for rung generation; drawn from OS entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Seed for the outcome shuffle; derived from the ladder seed when omitted.
    #[arg(long)]
    outcome_seed: Option<u64>,

    /// Outcome entry written as LABEL=COUNT; repeat the flag for more entries.
    #[arg(long = "outcome", value_name = "LABEL=COUNT")]
    outcomes: Vec<String>,

    /// TOML game file supplying lines, levels, density and outcomes.
    #[arg(long, value_name = "FILE")]
    game: Option<PathBuf>,

    /// Rail the first run descends from (zero-based).
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// Compute and print the descent without opening a window.
    #[arg(long)]
    headless: bool,

    /// Install a shared ladder from a code instead of generating one.
    #[arg(long, value_name = "CODE")]
    share: Option<String>,

    /// Print the share code of the created ladder.
    #[arg(long)]
    emit_share: bool,

    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,

    /// Print frame timing metrics once per second.
    #[arg(long)]
    show_fps: bool,
}

/// Entry point for the Amida command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = match args.game.as_deref() {
        Some(path) => GameFile::load(path)
            .with_context(|| format!("failed to load game file {}", path.display()))?,
        None => GameFile::default(),
    };

    let mut session = Session::configure(&args, &file)?;
    session.build_ladder(&args)?;

    if args.emit_share {
        println!("{}", session.share_code()?);
    }

    session.select_start(LineIndex::new(args.start))?;

    if args.headless {
        session.run_headless()
    } else {
        session.run_windowed(args.vsync, args.show_fps)
    }
}

/// One configured game session and the event buffer used to drive it.
struct Session {
    world: World,
    events: Vec<Event>,
}

impl Session {
    fn configure(args: &Args, file: &GameFile) -> Result<Self> {
        let lines = args.lines.or(file.lines).unwrap_or(4);
        let levels = args
            .levels
            .or(file.levels)
            .unwrap_or(LadderGrid::DEFAULT_LEVELS);
        let grid = LadderGrid::new(lines, levels).context("unplayable board dimensions")?;
        let density = match args.density.or(file.density) {
            Some(value) => Density::new(value).context("invalid density")?,
            None => Density::default(),
        };
        let entries = resolve_outcomes(args, file)?;

        let mut session = Self {
            world: World::new(),
            events: Vec::new(),
        };
        session.apply(Command::ConfigureGrid { grid });
        session.apply(Command::ConfigureDensity { density });
        session.apply(Command::ConfigureOutcomes { entries });
        if let Some((total, capacity)) = session.find_map_event(|event| match event {
            Event::OutcomesRejected { total, capacity } => Some((*total, *capacity)),
            _ => None,
        }) {
            bail!("outcome counts total {total} but only {capacity} participants exist");
        }

        Ok(session)
    }

    fn apply(&mut self, command: Command) {
        self.events.clear();
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn find_map_event<T>(&self, f: impl Fn(&Event) -> Option<T>) -> Option<T> {
        self.events.iter().find_map(f)
    }

    fn build_ladder(&mut self, args: &Args) -> Result<()> {
        if let Some(code) = args.share.as_deref() {
            let snapshot =
                LadderSnapshot::decode(code).context("could not decode the share code")?;
            let grid = LadderGrid::new(snapshot.lines, snapshot.levels)
                .context("share code carries unplayable board dimensions")?;
            self.apply(Command::ConfigureGrid { grid });
            self.apply(Command::InstallLadder {
                rungs: snapshot.rungs,
                labels: snapshot.labels,
            });
            if let Some(fault) = self.find_map_event(|event| match event {
                Event::LadderRejected { fault } => Some(*fault),
                _ => None,
            }) {
                bail!("share code violates ladder invariants: {fault}");
            }
            info!("installed a shared {}x{} ladder", grid.lines(), grid.levels());
        } else {
            let ladder_seed = args.seed.unwrap_or_else(entropy_seed);
            let outcome_seed = args
                .outcome_seed
                .unwrap_or(ladder_seed ^ OUTCOME_SEED_SALT);
            self.apply(Command::CreateLadder {
                ladder_seed,
                outcome_seed,
            });
            let rung_count = self
                .find_map_event(|event| match event {
                    Event::LadderCreated { rung_count } => Some(*rung_count),
                    _ => None,
                })
                .context("ladder creation must succeed")?;
            info!("created a ladder with {rung_count} rungs (seed {ladder_seed})");
        }

        Ok(())
    }

    fn share_code(&self) -> Result<String> {
        let grid = query::grid(&self.world);
        let view = query::ladder_view(&self.world).context("no ladder exists to share")?;
        let snapshot = LadderSnapshot {
            lines: grid.lines(),
            levels: grid.levels(),
            rungs: view.rungs.to_vec(),
            labels: view.labels.to_vec(),
        };
        Ok(snapshot.encode())
    }

    fn select_start(&mut self, line: LineIndex) -> Result<()> {
        self.apply(Command::SelectStart { line });
        if let Some(reason) = self.find_map_event(|event| match event {
            Event::SelectionRejected { reason, .. } => Some(*reason),
            _ => None,
        }) {
            bail!("start rail {} was rejected: {reason}", line.get());
        }
        Ok(())
    }

    fn run_headless(&mut self) -> Result<()> {
        println!("{GAME_TITLE}");
        let grid = query::grid(&self.world);
        {
            let view = query::ladder_view(&self.world).context("a ladder must exist")?;
            print!("{}", render_ascii(grid, view.rungs, view.labels));
        }

        self.apply(Command::StartRun);
        if let Some(reason) = self.find_map_event(|event| match event {
            Event::RunRejected { reason } => Some(*reason),
            _ => None,
        }) {
            bail!("run was rejected: {reason}");
        }

        let step = Duration::from_millis(10);
        let mut finished = None;
        for _ in 0..200 {
            self.apply(Command::Tick { dt: step });
            finished = self.find_map_event(|event| match event {
                Event::RunFinished {
                    start_line,
                    final_line,
                    label,
                } => Some((*start_line, *final_line, label.clone())),
                _ => None,
            });
            if finished.is_some() {
                break;
            }
        }

        let (start_line, final_line, label) =
            finished.context("playback must finish within the run duration")?;
        println!(
            "participant {} descends to rail {} and receives '{label}'",
            participant_number(start_line),
            participant_number(final_line),
        );
        Ok(())
    }

    fn run_windowed(self, vsync: bool, show_fps: bool) -> Result<()> {
        let Self {
            mut world,
            mut events,
        } = self;

        let backend = MacroquadBackend::new()
            .with_vsync(vsync)
            .with_show_fps(show_fps);
        let presentation = Presentation::new(GAME_TITLE, BACKGROUND, populate_scene(&world));
        let mut seed_stream = ChaCha8Rng::from_entropy();

        backend.run(presentation, move |dt, input, scene| {
            events.clear();

            if input.reset_requested {
                world::apply(&mut world, Command::Reset, &mut events);
            }
            if input.create_requested {
                let ladder_seed = seed_stream.next_u64();
                let outcome_seed = seed_stream.next_u64();
                world::apply(
                    &mut world,
                    Command::CreateLadder {
                        ladder_seed,
                        outcome_seed,
                    },
                    &mut events,
                );
            }
            if input.select_left || input.select_right {
                let current = query::ladder_view(&world).map(|view| view.selected_start.get());
                if let Some(current) = current {
                    let last = query::grid(&world).lines() - 1;
                    let target = if input.select_right {
                        (current + 1).min(last)
                    } else {
                        current.saturating_sub(1)
                    };
                    if target != current {
                        world::apply(
                            &mut world,
                            Command::SelectStart {
                                line: LineIndex::new(target),
                            },
                            &mut events,
                        );
                    }
                }
            }
            if input.run_requested {
                world::apply(&mut world, Command::StartRun, &mut events);
            }
            world::apply(&mut world, Command::Tick { dt }, &mut events);

            for event in &events {
                match event {
                    Event::LadderCreated { rung_count } => {
                        info!("created a ladder with {rung_count} rungs");
                    }
                    Event::RunFinished {
                        final_line, label, ..
                    } => {
                        info!(
                            "run finished on rail {} with '{label}'",
                            participant_number(*final_line),
                        );
                    }
                    Event::RunRejected { reason } => warn!("run rejected: {reason}"),
                    Event::SelectionRejected { reason, .. } => {
                        warn!("selection rejected: {reason}");
                    }
                    _ => {}
                }
            }

            *scene = populate_scene(&world);
        })
    }
}

fn resolve_outcomes(args: &Args, file: &GameFile) -> Result<Vec<OutcomeEntry>> {
    if !args.outcomes.is_empty() {
        return args
            .outcomes
            .iter()
            .map(|raw| parse_outcome(raw))
            .collect();
    }
    Ok(file.outcomes.iter().map(GameFileOutcome::to_entry).collect())
}

fn parse_outcome(raw: &str) -> Result<OutcomeEntry> {
    let (label, count) = raw
        .split_once('=')
        .with_context(|| format!("outcome '{raw}' must look like LABEL=COUNT"))?;
    let label = label.trim();
    if label.is_empty() {
        bail!("outcome '{raw}' has an empty label");
    }
    let count = count
        .trim()
        .parse::<u32>()
        .with_context(|| format!("outcome '{raw}' has an invalid count"))?;
    Ok(OutcomeEntry::new(OutcomeLabel::new(label), count))
}

fn entropy_seed() -> u64 {
    ChaCha8Rng::from_entropy().next_u64()
}

fn populate_scene(world: &World) -> Scene {
    let grid = query::grid(world);
    let board = LadderPresentation::new(
        grid.lines(),
        grid.levels(),
        RAIL_SPACING,
        LEVEL_SPACING,
        LABEL_BAND,
        RAIL_COLOR,
        RUNG_COLOR,
        TRACE_COLOR,
        MARKER_COLOR,
    )
    .expect("board spacing constants are positive");

    let mut rungs = Vec::new();
    let mut top_labels = Vec::new();
    let mut bottom_labels = Vec::new();
    let mut selected_start = None;
    if let Some(view) = query::ladder_view(world) {
        rungs = view.rungs.to_vec();
        top_labels = (0..grid.lines())
            .map(|line| participant_number(LineIndex::new(line)).to_string())
            .collect();
        bottom_labels = view
            .labels
            .iter()
            .map(|label| label.as_str().to_owned())
            .collect();
        selected_start = Some(view.selected_start);
    }

    let run = query::run_view(world)
        .map(|view| RunPresentation::new(view.points.to_vec(), view.progress));
    let banner = banner_text(world);

    Scene::new(
        board,
        rungs,
        top_labels,
        bottom_labels,
        selected_start,
        run,
        banner,
    )
}

fn banner_text(world: &World) -> String {
    match query::phase(world) {
        RunPhase::Idle => "Press C to create a ladder".to_owned(),
        RunPhase::Ready => "Left/Right picks a start, Space runs it".to_owned(),
        RunPhase::Animating => "Climbing...".to_owned(),
        RunPhase::Finished => match query::outcome(world) {
            Some(label) => format!("Result: {label}"),
            None => "Result revealed".to_owned(),
        },
    }
}

fn render_ascii(grid: LadderGrid, rungs: &[Rung], labels: &[OutcomeLabel]) -> String {
    use std::fmt::Write as _;

    let mut crossing = vec![vec![false; grid.candidate_count() as usize]; grid.levels() as usize];
    for rung in rungs {
        if grid.is_interior_level(rung.level()) {
            crossing[rung.level().get() as usize][rung.left_line().get() as usize] = true;
        }
    }

    let mut out = String::new();
    for line in 0..grid.lines() {
        let number = participant_number(LineIndex::new(line));
        if line + 1 == grid.lines() {
            let _ = write!(out, "{number}");
        } else {
            let _ = write!(out, "{number:<4}");
        }
    }
    out.push('\n');

    for level in 0..=grid.levels() {
        for line in 0..grid.lines() {
            out.push('|');
            if line + 1 < grid.lines() {
                let connected = grid.is_interior_level(amida_core::LevelIndex::new(level))
                    && crossing[level as usize][line as usize];
                out.push_str(if connected { "---" } else { "   " });
            }
        }
        out.push('\n');
    }

    for (index, label) in labels.iter().enumerate() {
        let number = participant_number(LineIndex::new(index as u32));
        let _ = writeln!(out, "{number:>2}: {label}");
    }

    out
}
