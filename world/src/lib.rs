#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for the Amida ladder lottery.

use std::time::Duration;

use amida_core::{
    Assignment, Command, Density, Event, LadderFault, LadderGrid, LineIndex, OutcomeEntry,
    OutcomeLabel, RejectReason, Rung, Trace,
};
use amida_system_assignment::{assign, total_labels};
use amida_system_generation::generate;
use amida_system_tracing::trace;

/// Wall-clock duration of one trace playback.
pub const RUN_DURATION: Duration = Duration::from_millis(1_000);

/// Represents the authoritative state of one game session.
#[derive(Debug)]
pub struct World {
    grid: LadderGrid,
    density: Density,
    outcome_entries: Vec<OutcomeEntry>,
    ladder: Option<Ladder>,
}

impl World {
    /// Creates a new session with the default grid, density and no outcomes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: LadderGrid::default(),
            density: Density::default(),
            outcome_entries: Vec::new(),
            ladder: None,
        }
    }

    fn clear_ladder(&mut self, out_events: &mut Vec<Event>) {
        if self.ladder.take().is_some() {
            out_events.push(Event::LadderCleared);
        }
    }

    fn install(&mut self, rungs: Vec<Rung>, assignment: Assignment, out_events: &mut Vec<Event>) {
        let rung_count = rungs.len();
        self.ladder = Some(Ladder {
            rungs,
            assignment,
            selected_start: LineIndex::new(0),
            run: None,
        });
        out_events.push(Event::LadderCreated { rung_count });
    }

    fn is_animating(&self) -> bool {
        self.ladder
            .as_ref()
            .and_then(|ladder| ladder.run.as_ref())
            .is_some_and(|run| !run.finished)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { grid } => {
            world.grid = grid;
            world.clear_ladder(out_events);
            out_events.push(Event::GridConfigured { grid });
        }
        Command::ConfigureDensity { density } => {
            world.density = density;
            out_events.push(Event::DensityConfigured { density });
        }
        Command::ConfigureOutcomes { entries } => {
            let total = total_labels(&entries);
            let capacity = world.grid.lines();
            if total > capacity {
                out_events.push(Event::OutcomesRejected { total, capacity });
                return;
            }

            world.outcome_entries = entries;
            world.clear_ladder(out_events);
            out_events.push(Event::OutcomesConfigured {
                total_labels: total,
            });
        }
        Command::CreateLadder {
            ladder_seed,
            outcome_seed,
        } => {
            let rungs = generate(&world.grid, world.density, ladder_seed);
            let assignment = assign(&world.outcome_entries, world.grid.lines(), outcome_seed);
            world.install(rungs, assignment, out_events);
        }
        Command::InstallLadder { rungs, labels } => {
            if let Err(fault) = validate_ladder(&world.grid, &rungs, &labels) {
                out_events.push(Event::LadderRejected { fault });
                return;
            }

            world.install(rungs, Assignment::from_labels(labels), out_events);
        }
        Command::SelectStart { line } => {
            if world.is_animating() {
                out_events.push(Event::SelectionRejected {
                    line,
                    reason: RejectReason::AnimationInFlight,
                });
                return;
            }
            if !world.grid.contains_line(line) {
                out_events.push(Event::SelectionRejected {
                    line,
                    reason: RejectReason::OutOfRange {
                        line: line.get(),
                        lines: world.grid.lines(),
                    },
                });
                return;
            }
            let Some(ladder) = world.ladder.as_mut() else {
                out_events.push(Event::SelectionRejected {
                    line,
                    reason: RejectReason::NoLadder,
                });
                return;
            };

            ladder.selected_start = line;
            out_events.push(Event::StartSelected { line });
        }
        Command::StartRun => {
            if world.is_animating() {
                out_events.push(Event::RunRejected {
                    reason: RejectReason::AnimationInFlight,
                });
                return;
            }
            let grid = world.grid;
            let Some(ladder) = world.ladder.as_mut() else {
                out_events.push(Event::RunRejected {
                    reason: RejectReason::NoLadder,
                });
                return;
            };

            let start_line = ladder.selected_start;
            let computed = trace(start_line, &grid, &ladder.rungs);
            ladder.run = Some(Run {
                start_line,
                trace: computed,
                elapsed: Duration::ZERO,
                finished: false,
            });
            out_events.push(Event::RunStarted { start_line });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });

            let Some(ladder) = world.ladder.as_mut() else {
                return;
            };
            let Some(run) = ladder.run.as_mut() else {
                return;
            };
            if run.finished {
                return;
            }

            run.elapsed = run.elapsed.saturating_add(dt);
            if run.elapsed >= RUN_DURATION {
                run.finished = true;
                let final_line = run.trace.final_line();
                let label = ladder
                    .assignment
                    .label_for(final_line)
                    .cloned()
                    .unwrap_or_else(OutcomeLabel::filler);
                out_events.push(Event::RunFinished {
                    start_line: run.start_line,
                    final_line,
                    label,
                });
            }
        }
        Command::Reset => {
            world.ladder = None;
            out_events.push(Event::LadderCleared);
        }
    }
}

fn validate_ladder(
    grid: &LadderGrid,
    rungs: &[Rung],
    labels: &[OutcomeLabel],
) -> Result<(), LadderFault> {
    if labels.len() as u32 != grid.lines() {
        return Err(LadderFault::LabelCountMismatch {
            labels: labels.len() as u32,
            lines: grid.lines(),
        });
    }

    for rung in rungs {
        if !grid.is_interior_level(rung.level()) {
            return Err(LadderFault::RungOutOfBand {
                level: rung.level().get(),
            });
        }
        if rung.left_line().get() >= grid.candidate_count() {
            return Err(LadderFault::RungOffGrid {
                left_line: rung.left_line().get(),
            });
        }
    }

    let mut lefts_per_level: Vec<Vec<u32>> = vec![Vec::new(); grid.levels() as usize];
    for rung in rungs {
        lefts_per_level[rung.level().get() as usize].push(rung.left_line().get());
    }
    for (level, lefts) in lefts_per_level.iter_mut().enumerate() {
        lefts.sort_unstable();
        for pair in lefts.windows(2) {
            if pair[1] - pair[0] < 2 {
                return Err(LadderFault::AdjacentRungs {
                    level: level as u32,
                });
            }
        }
    }

    Ok(())
}

#[derive(Debug)]
struct Ladder {
    rungs: Vec<Rung>,
    assignment: Assignment,
    selected_start: LineIndex,
    run: Option<Run>,
}

#[derive(Debug)]
struct Run {
    start_line: LineIndex,
    trace: Trace,
    elapsed: Duration,
    finished: bool,
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use super::{World, RUN_DURATION};
    use amida_core::{
        Density, LadderGrid, LineIndex, OutcomeEntry, OutcomeLabel, Rung, RunPhase, TracePoint,
    };

    /// Dimensions of the ladder the session is configured to build.
    #[must_use]
    pub fn grid(world: &World) -> LadderGrid {
        world.grid
    }

    /// Per-level rung probability the session is configured to use.
    #[must_use]
    pub fn density(world: &World) -> Density {
        world.density
    }

    /// Outcome entries the next assignment will expand.
    #[must_use]
    pub fn outcome_entries(world: &World) -> &[OutcomeEntry] {
        &world.outcome_entries
    }

    /// Captures a read-only view of the current ladder, if one exists.
    #[must_use]
    pub fn ladder_view(world: &World) -> Option<LadderView<'_>> {
        world.ladder.as_ref().map(|ladder| LadderView {
            rungs: &ladder.rungs,
            labels: ladder.assignment.labels(),
            selected_start: ladder.selected_start,
        })
    }

    /// Captures a read-only view of the current run, if one exists.
    #[must_use]
    pub fn run_view(world: &World) -> Option<RunView<'_>> {
        let ladder = world.ladder.as_ref()?;
        let run = ladder.run.as_ref()?;
        let progress = if run.finished {
            1.0
        } else {
            (run.elapsed.as_secs_f32() / RUN_DURATION.as_secs_f32()).clamp(0.0, 1.0)
        };
        Some(RunView {
            points: run.trace.points(),
            progress,
            start_line: run.start_line,
            final_line: run.trace.final_line(),
            finished: run.finished,
        })
    }

    /// Outcome label revealed by the most recent finished run.
    #[must_use]
    pub fn outcome(world: &World) -> Option<&OutcomeLabel> {
        let ladder = world.ladder.as_ref()?;
        let run = ladder.run.as_ref()?;
        if !run.finished {
            return None;
        }
        ladder.assignment.label_for(run.trace.final_line())
    }

    /// Lifecycle phase the session currently occupies.
    #[must_use]
    pub fn phase(world: &World) -> RunPhase {
        let Some(ladder) = world.ladder.as_ref() else {
            return RunPhase::Idle;
        };
        match ladder.run.as_ref() {
            None => RunPhase::Ready,
            Some(run) if run.finished => RunPhase::Finished,
            Some(_) => RunPhase::Animating,
        }
    }

    /// Read-only snapshot of the current immutable ladder.
    #[derive(Clone, Copy, Debug)]
    pub struct LadderView<'a> {
        /// Rungs composing the ladder, ordered by ascending level.
        pub rungs: &'a [Rung],
        /// Outcome labels indexed by rail, left to right.
        pub labels: &'a [OutcomeLabel],
        /// Rail currently selected as the starting position.
        pub selected_start: LineIndex,
    }

    /// Read-only snapshot of the current trace playback.
    #[derive(Clone, Copy, Debug)]
    pub struct RunView<'a> {
        /// Positions visited by the token, in descent order.
        pub points: &'a [TracePoint],
        /// Playback progress in `[0.0, 1.0]`.
        pub progress: f32,
        /// Rail the token descended from.
        pub start_line: LineIndex,
        /// Rail the token comes to rest on.
        pub final_line: LineIndex,
        /// Whether playback completed and the outcome is revealed.
        pub finished: bool,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amida_core::RunPhase;

    fn valid_grid(lines: u32, levels: u32) -> LadderGrid {
        LadderGrid::new(lines, levels).expect("test grid is valid")
    }

    fn entries() -> Vec<OutcomeEntry> {
        vec![
            OutcomeEntry::new(OutcomeLabel::new("winner"), 1),
            OutcomeEntry::new(OutcomeLabel::new("blank"), 2),
        ]
    }

    fn created_world() -> (World, Vec<Event>) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureOutcomes { entries: entries() },
            &mut events,
        );
        apply(
            &mut world,
            Command::CreateLadder {
                ladder_seed: 11,
                outcome_seed: 12,
            },
            &mut events,
        );
        (world, events)
    }

    #[test]
    fn new_session_starts_idle() {
        let world = World::new();
        assert_eq!(query::phase(&world), RunPhase::Idle);
        assert!(query::ladder_view(&world).is_none());
        assert!(query::run_view(&world).is_none());
    }

    #[test]
    fn create_ladder_reports_rung_count_and_becomes_ready() {
        let (world, events) = created_world();
        let view = query::ladder_view(&world).expect("ladder exists");
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LadderCreated { rung_count } if *rung_count == view.rungs.len())));
        assert_eq!(query::phase(&world), RunPhase::Ready);
        assert_eq!(view.labels.len() as u32, query::grid(&world).lines());
        assert_eq!(view.selected_start, LineIndex::new(0));
    }

    #[test]
    fn outcomes_exceeding_capacity_are_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureOutcomes {
                entries: vec![OutcomeEntry::new(OutcomeLabel::new("blank"), 5)],
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::OutcomesRejected {
                total: 5,
                capacity: 4,
            }],
        );
        assert!(query::outcome_entries(&world).is_empty());
    }

    #[test]
    fn reconfiguring_the_grid_discards_the_ladder() {
        let (mut world, _) = created_world();
        let mut events = Vec::new();
        let grid = valid_grid(6, 10);
        apply(&mut world, Command::ConfigureGrid { grid }, &mut events);
        assert_eq!(
            events,
            vec![Event::LadderCleared, Event::GridConfigured { grid }],
        );
        assert_eq!(query::phase(&world), RunPhase::Idle);
    }

    #[test]
    fn start_run_without_a_ladder_is_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::StartRun, &mut events);
        assert_eq!(
            events,
            vec![Event::RunRejected {
                reason: RejectReason::NoLadder,
            }],
        );
    }

    #[test]
    fn selection_is_validated_against_the_grid() {
        let (mut world, _) = created_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SelectStart {
                line: LineIndex::new(9),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SelectionRejected {
                line: LineIndex::new(9),
                reason: RejectReason::OutOfRange { line: 9, lines: 4 },
            }],
        );

        events.clear();
        apply(
            &mut world,
            Command::SelectStart {
                line: LineIndex::new(2),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::StartSelected {
                line: LineIndex::new(2),
            }],
        );
        let view = query::ladder_view(&world).expect("ladder exists");
        assert_eq!(view.selected_start, LineIndex::new(2));
    }

    #[test]
    fn runs_cannot_overlap_an_animation_in_flight() {
        let (mut world, _) = created_world();
        let mut events = Vec::new();
        apply(&mut world, Command::StartRun, &mut events);
        assert_eq!(query::phase(&world), RunPhase::Animating);

        events.clear();
        apply(&mut world, Command::StartRun, &mut events);
        assert_eq!(
            events,
            vec![Event::RunRejected {
                reason: RejectReason::AnimationInFlight,
            }],
        );

        events.clear();
        apply(
            &mut world,
            Command::SelectStart {
                line: LineIndex::new(1),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SelectionRejected {
                line: LineIndex::new(1),
                reason: RejectReason::AnimationInFlight,
            }],
        );
    }

    #[test]
    fn playback_finishes_exactly_once_and_reveals_the_outcome() {
        let (mut world, _) = created_world();
        let mut events = Vec::new();
        apply(&mut world, Command::StartRun, &mut events);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(400),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(400),
            }],
        );
        let view = query::run_view(&world).expect("run exists");
        assert!(!view.finished);
        assert!(view.progress > 0.0 && view.progress < 1.0);
        assert!(query::outcome(&world).is_none());

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(700),
            },
            &mut events,
        );
        let finished = events
            .iter()
            .find_map(|event| match event {
                Event::RunFinished {
                    start_line,
                    final_line,
                    label,
                } => Some((*start_line, *final_line, label.clone())),
                _ => None,
            })
            .expect("crossing the duration finishes the run");
        assert_eq!(finished.0, LineIndex::new(0));
        assert_eq!(query::phase(&world), RunPhase::Finished);
        let view = query::run_view(&world).expect("run exists");
        assert_eq!(view.progress, 1.0);
        assert_eq!(view.final_line, finished.1);
        assert_eq!(query::outcome(&world), Some(&finished.2));

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(500),
            }],
            "a finished run must not finish twice",
        );
    }

    #[test]
    fn finished_runs_may_be_superseded_from_another_rail() {
        let (mut world, _) = created_world();
        let mut events = Vec::new();
        apply(&mut world, Command::StartRun, &mut events);
        apply(
            &mut world,
            Command::Tick { dt: RUN_DURATION },
            &mut events,
        );
        assert_eq!(query::phase(&world), RunPhase::Finished);

        events.clear();
        apply(
            &mut world,
            Command::SelectStart {
                line: LineIndex::new(3),
            },
            &mut events,
        );
        apply(&mut world, Command::StartRun, &mut events);
        assert!(events.contains(&Event::StartSelected {
            line: LineIndex::new(3),
        }));
        assert!(events.contains(&Event::RunStarted {
            start_line: LineIndex::new(3),
        }));
        assert_eq!(query::phase(&world), RunPhase::Animating);
    }

    #[test]
    fn reset_clears_the_session() {
        let (mut world, _) = created_world();
        let mut events = Vec::new();
        apply(&mut world, Command::Reset, &mut events);
        assert_eq!(events, vec![Event::LadderCleared]);
        assert_eq!(query::phase(&world), RunPhase::Idle);
        assert!(query::ladder_view(&world).is_none());
    }

    #[test]
    fn install_accepts_a_structurally_valid_ladder() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                grid: valid_grid(3, 4),
            },
            &mut events,
        );

        events.clear();
        let rungs = vec![
            Rung::new(amida_core::LevelIndex::new(1), LineIndex::new(0)),
            Rung::new(amida_core::LevelIndex::new(3), LineIndex::new(1)),
        ];
        let labels = vec![
            OutcomeLabel::new("winner"),
            OutcomeLabel::filler(),
            OutcomeLabel::filler(),
        ];
        apply(
            &mut world,
            Command::InstallLadder { rungs, labels },
            &mut events,
        );
        assert_eq!(events, vec![Event::LadderCreated { rung_count: 2 }]);
        assert_eq!(query::phase(&world), RunPhase::Ready);
    }

    #[test]
    fn install_rejects_invariant_violations() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                grid: valid_grid(4, 5),
            },
            &mut events,
        );
        let labels = || {
            vec![
                OutcomeLabel::filler(),
                OutcomeLabel::filler(),
                OutcomeLabel::filler(),
                OutcomeLabel::filler(),
            ]
        };

        events.clear();
        apply(
            &mut world,
            Command::InstallLadder {
                rungs: vec![Rung::new(amida_core::LevelIndex::new(5), LineIndex::new(0))],
                labels: labels(),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::LadderRejected {
                fault: LadderFault::RungOutOfBand { level: 5 },
            }],
        );

        events.clear();
        apply(
            &mut world,
            Command::InstallLadder {
                rungs: vec![Rung::new(amida_core::LevelIndex::new(1), LineIndex::new(3))],
                labels: labels(),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::LadderRejected {
                fault: LadderFault::RungOffGrid { left_line: 3 },
            }],
        );

        events.clear();
        apply(
            &mut world,
            Command::InstallLadder {
                rungs: vec![
                    Rung::new(amida_core::LevelIndex::new(2), LineIndex::new(0)),
                    Rung::new(amida_core::LevelIndex::new(2), LineIndex::new(1)),
                ],
                labels: labels(),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::LadderRejected {
                fault: LadderFault::AdjacentRungs { level: 2 },
            }],
        );

        events.clear();
        apply(
            &mut world,
            Command::InstallLadder {
                rungs: Vec::new(),
                labels: vec![OutcomeLabel::filler()],
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::LadderRejected {
                fault: LadderFault::LabelCountMismatch { labels: 1, lines: 4 },
            }],
        );
    }
}
