#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic rung generation for the ladder lottery.

use amida_core::{Density, LadderGrid, LevelIndex, LineIndex, Rung};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generates a structurally valid rung set for a fresh ladder.
///
/// All randomness is drawn from a single ChaCha8 stream
/// (`ChaCha8Rng::seed_from_u64(seed)`), so identical `(grid, density, seed)`
/// inputs reproduce identical rung sequences.
///
/// Each interior level first passes a density gate: one uniform `f32` is
/// drawn, and the level stays empty when the draw reaches `density`. Levels
/// that pass shuffle every candidate left rail on the same stream and pack
/// them greedily, accepting a candidate only while it and both of its
/// neighbours are unused at that level. The packing is maximal for the
/// shuffled order rather than maximum, which keeps ladders varied between
/// seeds. Accepted rungs are returned ordered by ascending level.
#[must_use]
pub fn generate(grid: &LadderGrid, density: Density, seed: u64) -> Vec<Rung> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let candidate_count = grid.candidate_count() as usize;
    let mut candidates: Vec<u32> = Vec::with_capacity(candidate_count);
    let mut used = vec![false; candidate_count];
    let mut rungs = Vec::new();

    for level in 1..grid.levels() {
        if rng.gen::<f32>() >= density.get() {
            continue;
        }

        candidates.clear();
        candidates.extend(0..grid.candidate_count());
        candidates.shuffle(&mut rng);
        used.fill(false);

        for &candidate in &candidates {
            let slot = candidate as usize;
            if accepts(&used, slot) {
                used[slot] = true;
                rungs.push(Rung::new(LevelIndex::new(level), LineIndex::new(candidate)));
            }
        }
    }

    rungs
}

/// A candidate is acceptable while it and both neighbours are unused.
fn accepts(used: &[bool], slot: usize) -> bool {
    if used[slot] {
        return false;
    }
    if slot > 0 && used[slot - 1] {
        return false;
    }
    if slot + 1 < used.len() && used[slot + 1] {
        return false;
    }
    true
}
