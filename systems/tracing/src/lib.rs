#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic path tracing through a ladder's rung set.

use amida_core::{LadderGrid, LevelIndex, LineIndex, Rung, Trace, TracePoint};

/// Computes the full descent of a token released at `start`.
///
/// The tracer walks every level from the top boundary to the terminal row.
/// At each level the token first descends, then crosses at most one rung:
/// a rung whose left rail is the current rail moves it right, a rung whose
/// left rail is the immediate left neighbour moves it left. Should an
/// externally supplied rung set ever offer both (generated ladders cannot),
/// the rightward move wins. Moves that would leave the grid are suppressed.
/// Rungs outside the interior levels are ignored.
///
/// `start` must exist on `grid`; this is a caller contract enforced with a
/// debug assertion rather than a runtime error.
#[must_use]
pub fn trace(start: LineIndex, grid: &LadderGrid, rungs: &[Rung]) -> Trace {
    debug_assert!(
        grid.contains_line(start),
        "start rail must exist on the grid",
    );

    let lookup = LevelLookup::index(grid, rungs);
    let mut line = start;
    let mut points = vec![TracePoint::new(line, LevelIndex::new(0))];

    for level in 1..=grid.levels() {
        let level = LevelIndex::new(level);
        points.push(TracePoint::new(line, level));

        let lefts = lookup.lefts_at(level);
        let move_right = line < grid.last_line() && lefts.contains(&line);
        let move_left = line.get() > 0 && lefts.contains(&LineIndex::new(line.get() - 1));

        let next = if move_right {
            LineIndex::new(line.get() + 1)
        } else if move_left {
            LineIndex::new(line.get() - 1)
        } else {
            line
        };

        if next != line {
            points.push(TracePoint::new(next, level));
            line = next;
        }
    }

    Trace::new(points, line)
}

/// Rung left rails grouped by level for constant-time lookup per descent row.
struct LevelLookup {
    lefts: Vec<Vec<LineIndex>>,
}

impl LevelLookup {
    fn index(grid: &LadderGrid, rungs: &[Rung]) -> Self {
        let mut lefts = vec![Vec::new(); grid.levels() as usize + 1];
        for rung in rungs {
            if grid.is_interior_level(rung.level()) {
                lefts[rung.level().get() as usize].push(rung.left_line());
            }
        }
        Self { lefts }
    }

    fn lefts_at(&self, level: LevelIndex) -> &[LineIndex] {
        self.lefts
            .get(level.get() as usize)
            .map_or(&[], Vec::as_slice)
    }
}
