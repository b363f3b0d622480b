#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Amida ladder-lottery game.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session world, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values describing
//! what actually happened. The pure systems (rung generation, path tracing,
//! outcome assignment) consume and produce only the data types declared here.

use std::{error::Error, fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Window title shared by every adapter that presents the game.
pub const GAME_TITLE: &str = "Amida Ladder Lottery";

/// Index of a vertical rail, counted from the left edge of the ladder.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct LineIndex(u32);

impl LineIndex {
    /// Creates a new line index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the index of the rail immediately to the right.
    #[must_use]
    pub const fn right(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Index of a horizontal row, counted from the top of the ladder.
///
/// Level `0` is the starting row and `level_count` the terminal row; rungs
/// only ever occupy the interior levels in between.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct LevelIndex(u32);

impl LevelIndex {
    /// Creates a new level index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Horizontal connector joining two adjacent rails at a single level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rung {
    level: LevelIndex,
    left_line: LineIndex,
}

impl Rung {
    /// Creates a new rung anchored at the provided level and left rail.
    #[must_use]
    pub const fn new(level: LevelIndex, left_line: LineIndex) -> Self {
        Self { level, left_line }
    }

    /// Level at which the rung crosses the ladder.
    #[must_use]
    pub const fn level(&self) -> LevelIndex {
        self.level
    }

    /// Leftmost of the two rails joined by the rung.
    #[must_use]
    pub const fn left_line(&self) -> LineIndex {
        self.left_line
    }

    /// Rightmost of the two rails joined by the rung.
    #[must_use]
    pub const fn right_line(&self) -> LineIndex {
        self.left_line.right()
    }

    /// Reports whether the rung touches the provided rail.
    #[must_use]
    pub fn connects(&self, line: LineIndex) -> bool {
        line == self.left_line || line == self.right_line()
    }
}

/// Position visited by a token while descending the ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TracePoint {
    line: LineIndex,
    level: LevelIndex,
}

impl TracePoint {
    /// Creates a new trace point at the provided rail and level.
    #[must_use]
    pub const fn new(line: LineIndex, level: LevelIndex) -> Self {
        Self { line, level }
    }

    /// Rail occupied at this point of the descent.
    #[must_use]
    pub const fn line(&self) -> LineIndex {
        self.line
    }

    /// Level reached at this point of the descent.
    #[must_use]
    pub const fn level(&self) -> LevelIndex {
        self.level
    }
}

/// Complete descent of a token from the top of the ladder to the bottom.
///
/// The point sequence starts at `(start_line, 0)`, never decreases in level,
/// and ends at `(final_line, level_count)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    points: Vec<TracePoint>,
    final_line: LineIndex,
}

impl Trace {
    /// Creates a trace from the visited points and the terminal rail.
    #[must_use]
    pub fn new(points: Vec<TracePoint>, final_line: LineIndex) -> Self {
        Self { points, final_line }
    }

    /// Ordered positions visited during the descent.
    #[must_use]
    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    /// Rail on which the token comes to rest.
    #[must_use]
    pub const fn final_line(&self) -> LineIndex {
        self.final_line
    }

    /// Rail on which the descent began.
    #[must_use]
    pub fn start_line(&self) -> Option<LineIndex> {
        self.points.first().map(TracePoint::line)
    }
}

/// Discrete dimensions of the ladder: rail count and interior row count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LadderGrid {
    lines: u32,
    levels: u32,
}

impl LadderGrid {
    /// Fewest rails a playable ladder may have.
    pub const MIN_LINES: u32 = 2;

    /// Most rails a playable ladder may have.
    pub const MAX_LINES: u32 = 12;

    /// Fewest levels a ladder may span.
    pub const MIN_LEVELS: u32 = 1;

    /// Level count used when the caller does not override it.
    pub const DEFAULT_LEVELS: u32 = 20;

    /// Creates a new grid description.
    ///
    /// Returns an error when the rail count falls outside
    /// [`MIN_LINES`](Self::MIN_LINES)`..=`[`MAX_LINES`](Self::MAX_LINES) or
    /// the level count is below [`MIN_LEVELS`](Self::MIN_LEVELS).
    pub fn new(lines: u32, levels: u32) -> Result<Self, GridError> {
        if lines < Self::MIN_LINES {
            return Err(GridError::TooFewLines { lines });
        }
        if lines > Self::MAX_LINES {
            return Err(GridError::TooManyLines { lines });
        }
        if levels < Self::MIN_LEVELS {
            return Err(GridError::NoLevels);
        }

        Ok(Self { lines, levels })
    }

    /// Number of vertical rails, one per participant.
    #[must_use]
    pub const fn lines(&self) -> u32 {
        self.lines
    }

    /// Number of rows between the top and bottom boundaries.
    #[must_use]
    pub const fn levels(&self) -> u32 {
        self.levels
    }

    /// Index of the rightmost rail.
    #[must_use]
    pub const fn last_line(&self) -> LineIndex {
        LineIndex::new(self.lines - 1)
    }

    /// Number of candidate positions a rung may occupy at one level.
    #[must_use]
    pub const fn candidate_count(&self) -> u32 {
        self.lines - 1
    }

    /// Reports whether the provided rail exists on this grid.
    #[must_use]
    pub fn contains_line(&self, line: LineIndex) -> bool {
        line.get() < self.lines
    }

    /// Reports whether rungs may occupy the provided level.
    ///
    /// The top boundary (level `0`) and the terminal row never connect.
    #[must_use]
    pub fn is_interior_level(&self, level: LevelIndex) -> bool {
        level.get() >= 1 && level.get() < self.levels
    }
}

impl Default for LadderGrid {
    fn default() -> Self {
        Self {
            lines: 4,
            levels: Self::DEFAULT_LEVELS,
        }
    }
}

/// Per-level probability that any rung placement attempt occurs at all.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density(f32);

impl Density {
    /// Density used when the caller does not override it.
    pub const DEFAULT: Density = Density(0.7);

    /// Creates a new density value.
    ///
    /// Returns an error unless the value is a finite number in `[0.0, 1.0]`;
    /// out-of-range values are rejected rather than clamped.
    pub fn new(value: f32) -> Result<Self, GridError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(GridError::InvalidDensity { value });
        }

        Ok(Self(value))
    }

    /// Retrieves the probability as a plain float.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }
}

impl Default for Density {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Text shown for the outcome assigned to a participant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutcomeLabel(String);

impl OutcomeLabel {
    /// Placeholder text assigned to participants without a configured prize.
    pub const FILLER: &'static str = "-";

    /// Creates a label from the provided text.
    #[must_use]
    pub fn new<T>(text: T) -> Self
    where
        T: Into<String>,
    {
        Self(text.into())
    }

    /// Creates the filler label used to pad the outcome pool.
    #[must_use]
    pub fn filler() -> Self {
        Self(Self::FILLER.to_owned())
    }

    /// Text content of the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reports whether this is the padding label rather than a real prize.
    #[must_use]
    pub fn is_filler(&self) -> bool {
        self.0 == Self::FILLER
    }
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configured prize: a label and how many participants should receive it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    label: OutcomeLabel,
    count: u32,
}

impl OutcomeEntry {
    /// Creates a new outcome entry.
    #[must_use]
    pub fn new(label: OutcomeLabel, count: u32) -> Self {
        Self { label, count }
    }

    /// Label awarded by this entry.
    #[must_use]
    pub fn label(&self) -> &OutcomeLabel {
        &self.label
    }

    /// Number of participants that should receive this label.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }
}

/// Shuffled mapping from rails to outcome labels, fixed for one ladder.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Assignment {
    labels: Vec<OutcomeLabel>,
}

impl Assignment {
    /// Creates an assignment from per-rail labels in rail order.
    #[must_use]
    pub fn from_labels(labels: Vec<OutcomeLabel>) -> Self {
        Self { labels }
    }

    /// Labels indexed by rail, left to right.
    #[must_use]
    pub fn labels(&self) -> &[OutcomeLabel] {
        &self.labels
    }

    /// Label assigned to the provided rail, if the rail exists.
    #[must_use]
    pub fn label_for(&self, line: LineIndex) -> Option<&OutcomeLabel> {
        self.labels.get(line.get() as usize)
    }

    /// Number of rails covered by the assignment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Reports whether the assignment covers no rails.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Lifecycle phase of the current game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// No ladder exists yet.
    Idle,
    /// A ladder exists and a start rail may be selected.
    Ready,
    /// A trace playback is in flight.
    Animating,
    /// The most recent playback completed and its result is revealed.
    Finished,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Reconfigures the ladder dimensions, discarding any current ladder.
    ConfigureGrid {
        /// Validated rail and level counts to apply.
        grid: LadderGrid,
    },
    /// Updates the per-level rung probability used by future ladders.
    ConfigureDensity {
        /// Validated probability to apply.
        density: Density,
    },
    /// Replaces the configured outcome entries, discarding any current ladder.
    ConfigureOutcomes {
        /// Prize labels and their counts, in display order.
        entries: Vec<OutcomeEntry>,
    },
    /// Generates a fresh ladder and outcome assignment from explicit seeds.
    CreateLadder {
        /// Seed for the rung generation stream.
        ladder_seed: u64,
        /// Seed for the independent outcome shuffle stream.
        outcome_seed: u64,
    },
    /// Installs an externally supplied ladder, validating its invariants.
    InstallLadder {
        /// Rungs composing the imported ladder.
        rungs: Vec<Rung>,
        /// Per-rail outcome labels accompanying the imported ladder.
        labels: Vec<OutcomeLabel>,
    },
    /// Selects the rail a token will descend from on the next run.
    SelectStart {
        /// Rail requested as the starting position.
        line: LineIndex,
    },
    /// Computes the trace for the selected rail and begins playback.
    StartRun,
    /// Advances the playback clock by the provided delta time.
    Tick {
        /// Wall-clock time elapsed since the previous tick.
        dt: Duration,
    },
    /// Discards the current ladder, trace and selection.
    Reset,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that new ladder dimensions were applied.
    GridConfigured {
        /// Dimensions now in effect.
        grid: LadderGrid,
    },
    /// Confirms that a new rung probability was applied.
    DensityConfigured {
        /// Probability now in effect.
        density: Density,
    },
    /// Confirms that the outcome entries were replaced.
    OutcomesConfigured {
        /// Total number of labels the entries expand to.
        total_labels: u32,
    },
    /// Reports that outcome entries were refused because they exceed capacity.
    OutcomesRejected {
        /// Total number of labels requested.
        total: u32,
        /// Number of participants available to receive labels.
        capacity: u32,
    },
    /// Confirms that a fresh ladder and assignment were created.
    LadderCreated {
        /// Number of rungs in the new ladder.
        rung_count: usize,
    },
    /// Reports that an imported ladder failed invariant validation.
    LadderRejected {
        /// Specific invariant the import violated.
        fault: LadderFault,
    },
    /// Confirms that a start rail was selected.
    StartSelected {
        /// Rail now selected as the starting position.
        line: LineIndex,
    },
    /// Reports that a start selection request was refused.
    SelectionRejected {
        /// Rail provided in the request.
        line: LineIndex,
        /// Specific reason the selection failed.
        reason: RejectReason,
    },
    /// Confirms that a trace was computed and playback began.
    RunStarted {
        /// Rail the token descends from.
        start_line: LineIndex,
    },
    /// Reports that a run request was refused.
    RunRejected {
        /// Specific reason the run failed to start.
        reason: RejectReason,
    },
    /// Announces that playback completed and the outcome is revealed.
    RunFinished {
        /// Rail the token descended from.
        start_line: LineIndex,
        /// Rail the token came to rest on.
        final_line: LineIndex,
        /// Outcome label resolved through the assignment.
        label: OutcomeLabel,
    },
    /// Indicates that the playback clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the session returned to its idle state.
    LadderCleared,
}

/// Reasons ladder dimensions or density values may be rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GridError {
    /// The rail count is below the playable minimum.
    TooFewLines {
        /// Provided rail count that failed validation.
        lines: u32,
    },
    /// The rail count is above the playable maximum.
    TooManyLines {
        /// Provided rail count that failed validation.
        lines: u32,
    },
    /// The level count is zero.
    NoLevels,
    /// The density is not a finite probability in `[0.0, 1.0]`.
    InvalidDensity {
        /// Provided value that failed validation.
        value: f32,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewLines { lines } => {
                write!(
                    f,
                    "at least {} lines are required (received {lines})",
                    LadderGrid::MIN_LINES
                )
            }
            Self::TooManyLines { lines } => {
                write!(
                    f,
                    "at most {} lines are supported (received {lines})",
                    LadderGrid::MAX_LINES
                )
            }
            Self::NoLevels => write!(f, "at least one level is required"),
            Self::InvalidDensity { value } => {
                write!(f, "density must be a probability in [0, 1] (received {value})")
            }
        }
    }
}

impl Error for GridError {}

/// Reasons a selection or run request may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// No ladder has been created yet.
    NoLadder,
    /// A playback is already in flight and must finish first.
    AnimationInFlight,
    /// The requested rail does not exist on the current grid.
    OutOfRange {
        /// Rail provided in the request.
        line: u32,
        /// Number of rails on the current grid.
        lines: u32,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLadder => write!(f, "no ladder has been created yet"),
            Self::AnimationInFlight => write!(f, "a run is still animating"),
            Self::OutOfRange { line, lines } => {
                write!(f, "rail {line} does not exist on a {lines}-rail board")
            }
        }
    }
}

/// Structural invariants an imported ladder may violate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LadderFault {
    /// A rung occupies the top boundary or a level past the interior rows.
    RungOutOfBand {
        /// Offending level value.
        level: u32,
    },
    /// A rung's left rail has no right neighbour on the grid.
    RungOffGrid {
        /// Offending left rail value.
        left_line: u32,
    },
    /// Two rungs at one level share or touch a rail.
    AdjacentRungs {
        /// Level at which the conflict occurs.
        level: u32,
    },
    /// The label list does not cover the rails exactly.
    LabelCountMismatch {
        /// Number of labels supplied.
        labels: u32,
        /// Number of rails to cover.
        lines: u32,
    },
}

impl fmt::Display for LadderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RungOutOfBand { level } => {
                write!(f, "a rung occupies the non-connecting level {level}")
            }
            Self::RungOffGrid { left_line } => {
                write!(f, "a rung at rail {left_line} has no right neighbour")
            }
            Self::AdjacentRungs { level } => {
                write!(f, "two rungs share or touch a rail at level {level}")
            }
            Self::LabelCountMismatch { labels, lines } => {
                write!(f, "{labels} labels cannot cover {lines} rails")
            }
        }
    }
}
