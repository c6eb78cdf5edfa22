//! Small, scored, biome-cohesive subsets of a board's animals.
//!
//! Each park is built greedily: shuffle the animals of one biome and take those that introduce a category not yet seen,
//! then top up from whatever is left. A biome gets several tries and keeps its best-scoring park.

use std::collections::BTreeSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::catalogue::{Animal, Biome, Category, CoSpecies, GroupSize, Level, Tagged};
use crate::rng::{shuffle, source_for, RandomSource};

/// Tries spent on each biome in the first round; the best of them is kept.
pub const ATTEMPTS_PER_BIOME: usize = 8;
/// Rounds over the biome pool, repeats allowed, when the first round falls short.
pub const EXTRA_ROUNDS: usize = 3;
/// A park with fewer distinct categories than this is discarded.
pub const MIN_CATEGORIES: usize = 3;
/// Size of any park holding a popularity-locked animal.
pub const LOCKED_PARK_SIZE: usize = 4;

/// Animals per park.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ParkSize {
    /// Four animals.
    Four = 4,
    /// Five animals.
    #[default]
    Five = 5,
}

impl TryFrom<u8> for ParkSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            other => Err(format!("park size must be 4 or 5 (got {other})")),
        }
    }
}

impl From<ParkSize> for u8 {
    fn from(value: ParkSize) -> Self {
        value as u8
    }
}

/// What to build parks from, and how many.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParkOptions {
    /// Drives an [`Lcg`](crate::rng::Lcg) when present; host randomness otherwise.
    pub seed: Option<u64>,
    /// Most parks to return.
    pub count: usize,
    /// Animals per park, unless a popularity-locked member forces [`LOCKED_PARK_SIZE`].
    pub size: ParkSize,
    /// Only animals tagged with one of these, and only parks for these biomes.
    pub focus_biomes: Vec<Biome>,
    /// Only animals sharing a group size with this set.
    pub reference_group_sizes: Option<BTreeSet<GroupSize>>,
}

impl Default for ParkOptions {
    fn default() -> Self {
        Self { seed: None, count: 3, size: ParkSize::default(), focus_biomes: Vec::new(), reference_group_sizes: None }
    }
}

impl ParkOptions {
    /// Three parks of five, from every biome present.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the run reproducible.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Stop after this many parks.
    pub fn count(&mut self, count: usize) -> &mut Self {
        self.count = count;
        self
    }

    /// Animals per park.
    pub fn size(&mut self, size: ParkSize) -> &mut Self {
        self.size = size;
        self
    }

    /// Add `biome` to the focus set.
    pub fn focus(&mut self, biome: Biome) -> &mut Self {
        self.focus_biomes.push(biome);
        self
    }

    /// Restrict candidates to animals sharing a group size with `sizes`.
    pub fn reference_group_sizes(&mut self, sizes: BTreeSet<GroupSize>) -> &mut Self {
        self.reference_group_sizes = Some(sizes);
        self
    }
}

/// A generated park.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Park {
    /// `generated-park-<biome slug>-<n>`.
    pub id: String,
    /// `Custom Park (<biome>)`.
    pub name: String,
    /// Every member animal is tagged with this.
    pub biome: Biome,
    /// Member animals in pick order.
    pub animal_ids: Vec<String>,
    /// At most one, and none when the park holds a popularity-locked animal.
    pub co_species_ids: Vec<String>,
    /// Biome cohesion weighted 0.5, category diversity 0.3 and a Level II+ member 0.2, in `[0, 1]`.
    pub score: f64,
}

/// `0.5` x the share of `animals` tagged with `biome`, plus `0.3` x category diversity (capped at four categories),
/// plus `0.2` if any animal is above Level I.
pub fn score_park(animals: &[&Animal], biome: Biome) -> f64 {
    if animals.is_empty() {
        return 0.0;
    }
    let cohesion = animals.iter().filter(|a| a.has_biome(biome)).count() as f64 / animals.len() as f64;
    let diversity = (distinct_categories(animals) as f64 / 4.0).min(1.0);
    let higher_level = if animals.iter().any(|a| a.level >= Level::Two) { 1.0 } else { 0.0 };

    cohesion * 0.5 + diversity * 0.3 + higher_level * 0.2
}

fn distinct_categories(animals: &[&Animal]) -> usize {
    animals.iter().flat_map(|a| a.categories().iter().copied()).collect::<BTreeSet<Category>>().len()
}

struct ParkBuilder<'a, 'c> {
    candidates: Vec<&'c Animal>,
    co_species: &'a [&'c CoSpecies],
    size: usize,
}

impl<'a, 'c> ParkBuilder<'a, 'c> {
    fn try_build(&self, biome: Biome, rng: &mut dyn RandomSource) -> Option<Park> {
        let pool = self.candidates.iter().copied().filter(|a| a.has_biome(biome)).collect_vec();
        if pool.len() < self.size {
            return None;
        }

        let shuffled = shuffle(&pool, rng);
        let mut pick: Vec<&'c Animal> = Vec::with_capacity(self.size);
        let mut seen = BTreeSet::new();
        let mut locked = false;
        for animal in &shuffled {
            let adds_new = animal.categories().iter().any(|c| !seen.contains(c));
            if (adds_new || pick.len() < self.size - 1) && !(locked && animal.is_popularity_locked) {
                pick.push(*animal);
                seen.extend(animal.categories().iter().copied());
                locked |= animal.is_popularity_locked;
                if pick.len() == self.size {
                    break;
                }
            }
        }

        if pick.len() < self.size {
            let shortfall = self.size - pick.len();
            let remaining = shuffled.iter()
                .filter(|a| !pick.iter().any(|p| p.id == a.id))
                .take(shortfall)
                .copied()
                .collect_vec();
            for animal in remaining {
                if locked && animal.is_popularity_locked {
                    continue;
                }
                pick.push(animal);
                locked |= animal.is_popularity_locked;
            }
        }

        if distinct_categories(&pick) < MIN_CATEGORIES {
            return None;
        }

        if locked && pick.len() > LOCKED_PARK_SIZE {
            let (gated, others): (Vec<_>, Vec<_>) = pick.into_iter().partition(|a| a.is_popularity_locked);
            pick = gated.into_iter().take(1).chain(others.into_iter().take(LOCKED_PARK_SIZE - 1)).collect();
        }

        let score = score_park(&pick, biome);
        let co_species_ids = if locked {
            Vec::new()
        } else {
            self.co_species.iter()
                .find(|c| c.has_biome(biome))
                .map(|c| vec![c.id.clone()])
                .unwrap_or_default()
        };

        let suffix = (rng.next_f64() * 1e6).floor() as u64;
        Some(Park {
            id: format!("generated-park-{}-{suffix}", biome.slug()),
            name: format!("Custom Park ({biome})"),
            biome,
            animal_ids: pick.iter().map(|a| a.id.clone()).collect(),
            co_species_ids,
            score,
        })
    }
}

/// Build up to `options.count` parks from `animals`, using host randomness unless `options.seed` is set.
pub fn generate_balanced_parks(animals: &[&Animal], co_species: &[&CoSpecies], options: &ParkOptions) -> Vec<Park> {
    let mut rng = source_for(options.seed);
    generate_balanced_parks_with(animals, co_species, options, rng.as_mut())
}

/// Build up to `options.count` parks from `animals`, drawing every random decision from `rng`.
///
/// Never fails: too few animals, or too little category variety, just means fewer parks.
pub fn generate_balanced_parks_with(
    animals: &[&Animal],
    co_species: &[&CoSpecies],
    options: &ParkOptions,
    rng: &mut dyn RandomSource,
) -> Vec<Park> {
    let focus = options.focus_biomes.iter().copied().unique().collect_vec();
    let candidates = animals.iter()
        .copied()
        .filter(|a| focus.is_empty() || a.in_any_biome(&focus))
        .filter(|a| options.reference_group_sizes.as_ref().map_or(true, |sizes| a.shares_group_size(sizes)))
        .collect_vec();

    let biome_pool = if focus.is_empty() {
        candidates.iter().flat_map(|a| a.biomes().iter().copied()).unique().collect_vec()
    } else {
        focus
    };

    let builder = ParkBuilder { candidates, co_species, size: u8::from(options.size) as usize };
    let mut parks = Vec::new();
    if options.count == 0 {
        return parks;
    }

    for biome in shuffle(&biome_pool, rng) {
        let best = (0..ATTEMPTS_PER_BIOME)
            .filter_map(|_| builder.try_build(biome, rng))
            // first of equals wins
            .fold(None::<Park>, |best, park| match best {
                Some(b) if b.score >= park.score => Some(b),
                _ => Some(park),
            });
        if let Some(park) = best {
            parks.push(park);
            if parks.len() >= options.count {
                return parks;
            }
        }
    }

    if biome_pool.is_empty() {
        return parks;
    }
    for _ in 0..EXTRA_ROUNDS {
        for biome in shuffle(&biome_pool, rng) {
            if let Some(park) = builder.try_build(biome, rng) {
                parks.push(park);
                if parks.len() >= options.count {
                    return parks;
                }
            }
        }
    }

    parks
}
