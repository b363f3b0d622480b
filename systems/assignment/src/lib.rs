#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic outcome assignment for the ladder lottery.

use amida_core::{Assignment, LineIndex, OutcomeEntry, OutcomeLabel};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Builds the shuffled rail-to-outcome mapping for one ladder.
///
/// The configured entries expand into a label multiset in entry order,
/// truncated at `lines` labels and padded with the filler label until every
/// rail is covered. The pool is then shuffled with a ChaCha8 stream
/// (`ChaCha8Rng::seed_from_u64(seed)`) that is seeded independently from the
/// rung generation stream, and zipped positionally with the rails. Callers
/// are expected to validate that the configured counts fit the rail capacity
/// before invoking; excess labels are dropped here rather than reported.
#[must_use]
pub fn assign(entries: &[OutcomeEntry], lines: u32, seed: u64) -> Assignment {
    let capacity = lines as usize;
    let mut pool: Vec<OutcomeLabel> = Vec::with_capacity(capacity);

    'expand: for entry in entries {
        for _ in 0..entry.count() {
            if pool.len() == capacity {
                break 'expand;
            }
            pool.push(entry.label().clone());
        }
    }
    while pool.len() < capacity {
        pool.push(OutcomeLabel::filler());
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    pool.shuffle(&mut rng);
    Assignment::from_labels(pool)
}

/// Total number of labels the configured entries expand to before padding.
#[must_use]
pub fn total_labels(entries: &[OutcomeEntry]) -> u32 {
    entries
        .iter()
        .fold(0u32, |total, entry| total.saturating_add(entry.count()))
}

/// One-based participant number displayed for a rail.
#[must_use]
pub fn participant_number(line: LineIndex) -> u32 {
    line.get() + 1
}
