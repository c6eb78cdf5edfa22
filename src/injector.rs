//! Swapping popularity-locked animals into an accepted board.

use itertools::Itertools;
use tracing::debug;

use crate::board::Board;
use crate::catalogue::{Animal, Biome, Tagged};
use crate::validation::TierTargets;

/// A copy of `board` with up to `count` unused popularity-locked animals from `animals` swapped in.
///
/// Candidates tagged with a focus biome are preferred when any exist. Each candidate replaces the first unlocked animal
/// of its tier that shares a biome with it, else the first unlocked animal of that tier, else is appended if the tier is
/// below its target. A replaced animal's biome assignment is dropped; the newcomer takes over that biome if it is
/// tagged with it. `board` itself is never touched.
///
/// # Panics
///
/// If `count` is not 1 or 2.
pub fn inject_popularity_locked<'c>(
    board: &Board<'c>,
    animals: &'c [Animal],
    count: usize,
    focus: &[Biome],
    targets: &TierTargets,
) -> Board<'c> {
    assert!(matches!(count, 1 | 2), "can inject 1 or 2 popularity-locked animals (asked for {count})");

    let mut result = board.clone();
    let unused = animals.iter()
        .filter(|a| a.is_popularity_locked && !board.animals().any(|on| on.id == a.id))
        .collect_vec();
    let focused = unused.iter().copied().filter(|a| a.in_any_biome(focus)).collect_vec();
    let candidates = if focus.is_empty() || focused.is_empty() { unused } else { focused };

    for candidate in candidates.into_iter().take(count) {
        let target = targets.get(candidate.level);
        let tier = result.tier_mut(candidate.level);
        let slot = tier.iter()
            .position(|a| !a.is_popularity_locked && a.biomes().iter().any(|b| candidate.has_biome(*b)))
            .or_else(|| tier.iter().position(|a| !a.is_popularity_locked));

        match slot {
            Some(index) => {
                let replaced = std::mem::replace(&mut tier[index], candidate);
                debug!(replaced = replaced.id.as_str(), injected = candidate.id.as_str(), "swapped in popularity-locked animal");
                if let Some(assignments) = result.biome_assignments.as_mut() {
                    if let Some(biome) = assignments.remove(&replaced.id) {
                        if candidate.has_biome(biome) {
                            assignments.insert(candidate.id.clone(), biome);
                        }
                    }
                }
            }
            None if tier.len() < target => {
                tier.push(candidate);
                debug!(injected = candidate.id.as_str(), "appended popularity-locked animal");
            }
            None => debug!(injected = candidate.id.as_str(), "tier is full of locked animals; skipping"),
        }
    }

    result
}
