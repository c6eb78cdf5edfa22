//! Bounded generate-and-test search for boards.
//!
//! Each attempt builds a fresh candidate from shuffled catalogue pools and hands it to an [`Acceptance`] oracle. Attempts
//! that cannot even produce a candidate are abandoned with a typed [`Abandon`] reason. The attempt budget is the only
//! way a search ends without a board; there is no other cancellation.

use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, VariantArray};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::board::{Board, BiomeAssignments, BiomeTally};
use crate::catalogue::{Animal, Biome, Catalogue, CoSpecies, Level, Tagged, REFERENCE_BOARD};
use crate::rng::{shuffle, source_for, RandomSource};
use crate::validation::{Acceptance, ValidationRules, Violation};

/// In strict mode, extra co-species are not added in a category already this well represented.
pub const STRICT_CATEGORY_CAP: usize = 4;

/// What the caller wants from a board.
///
/// Setters chain, so `GenerationOptions::new().seed(1).strict(true)` reads as a description of the run.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationOptions {
    /// Drives an [`Lcg`](crate::rng::Lcg) when present; host randomness otherwise.
    pub seed: Option<u64>,
    /// Larger budget, plus a second co-species pass aimed at viable biomes.
    pub strict: bool,
    /// Animal or co-species ids that must appear on the board.
    pub required_ids: Vec<String>,
    /// Restrict candidates to these biomes, each of which then needs a Level I representative.
    pub focus_biomes: Vec<Biome>,
    /// Restrict candidates to animals sharing a group size with the reference board.
    pub compatible_with_reference: bool,
    /// National-park template ids whose representative ids become required.
    pub preserved_parks: Vec<String>,
    /// Override the attempt budget.
    pub max_attempts: Option<usize>,
}

impl GenerationOptions {
    /// No constraints beyond the board rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the run reproducible.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Toggle strict mode.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Require the animal or co-species `id`.
    pub fn require(&mut self, id: impl Into<String>) -> &mut Self {
        self.required_ids.push(id.into());
        self
    }

    /// Add `biome` to the focus set.
    pub fn focus(&mut self, biome: Biome) -> &mut Self {
        self.focus_biomes.push(biome);
        self
    }

    /// Toggle the reference group-size filter.
    pub fn compatible_with_reference(&mut self, compatible: bool) -> &mut Self {
        self.compatible_with_reference = compatible;
        self
    }

    /// Preserve the national park with id `park`.
    pub fn preserve_park(&mut self, park: impl Into<String>) -> &mut Self {
        self.preserved_parks.push(park.into());
        self
    }

    /// Cap the number of attempts.
    pub fn max_attempts(&mut self, attempts: usize) -> &mut Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// How many attempts a search may spend, and when it starts settling for imperfect boards.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SearchBudget {
    /// Strict searches over every biome.
    pub strict: usize,
    /// Strict searches with fewer focus biomes than exist.
    pub strict_restricted: usize,
    /// Non-strict searches.
    pub loose: usize,
    /// Past this attempt index, a valid board with a few critical warnings is accepted.
    pub lenient_after: usize,
    /// Most critical warnings tolerated once past `lenient_after`.
    pub lenient_critical_limit: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            strict: 2000,
            strict_restricted: 20000,
            loose: 300,
            lenient_after: 1000,
            lenient_critical_limit: 2,
        }
    }
}

impl SearchBudget {
    /// Attempts allowed for a search of this shape.
    pub fn attempts(&self, strict: bool, restricted: bool) -> usize {
        match (strict, restricted) {
            (true, true) => self.strict_restricted,
            (true, false) => self.strict,
            (false, _) => self.loose,
        }
    }
}

/// Why a single attempt produced no acceptable board.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Abandon {
    /// No Level I animal could represent a focus biome.
    FocusBiomeUnrepresented(Biome),
    /// A tier ran out of eligible candidates.
    TierShort {
        /// The tier that came up short.
        level: Level,
        /// Animals placed before the pool ran dry.
        filled: usize,
        /// Animals the tier needs.
        target: usize,
    },
    /// A biome with enough animals to be viable has no Level I animal assigned to it.
    LeaderlessBiome(Biome),
    /// The oracle found hard violations.
    Rejected(Vec<Violation>),
    /// The board was valid but carried too many critical warnings.
    CriticalWarnings(usize),
}

impl Display for Abandon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FocusBiomeUnrepresented(biome) => write!(f, "no Level I animal available for {biome}"),
            Self::TierShort { level, filled, target } => write!(f, "Level {level} filled {filled} of {target}"),
            Self::LeaderlessBiome(biome) => write!(f, "{biome} is viable but has no Level I animal"),
            Self::Rejected(violations) => write!(f, "rejected: {}", violations.iter().join("; ")),
            Self::CriticalWarnings(count) => write!(f, "{count} critical warning(s)"),
        }
    }
}

/// Reasons a search returns no board.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GenerationFailure {
    /// More animals of one level are required than the tier holds. No attempt could succeed.
    #[error("{required} required Level {level} animals exceed the tier capacity of {capacity}")]
    RequiredOverflow {
        /// The overfull tier.
        level: Level,
        /// Required animals of that level.
        required: usize,
        /// The tier's target size.
        capacity: usize,
    },
    /// More small co-species are required than the cap allows. No attempt could succeed.
    #[error("{required} required small co-species exceed the cap of {cap}")]
    RequiredSmallCoSpecies {
        /// Required small co-species.
        required: usize,
        /// The small co-species cap.
        cap: usize,
    },
    /// Every attempt was abandoned.
    #[error("could not satisfy the constraints in {attempts} attempts; try relaxing them")]
    Exhausted {
        /// Attempts spent.
        attempts: usize,
        /// Why the final attempt was abandoned. `None` only when no attempt was made.
        last_abandon: Option<Abandon>,
    },
}

/// Attempt-invariant inputs, resolved once per search.
struct SearchPlan<'c> {
    required_animals: Vec<&'c Animal>,
    required_co_species: Vec<&'c CoSpecies>,
    /// Eligible, non-required candidates per tier.
    pools: [Vec<&'c Animal>; 3],
    co_species_pool: Vec<&'c CoSpecies>,
    focus: Vec<Biome>,
    restricted: bool,
    strict: bool,
}

/// Searches a [`Catalogue`] for boards that an [`Acceptance`] oracle approves.
pub struct Generator<'c, A = ValidationRules>
where
    A: Acceptance,
{
    catalogue: &'c Catalogue,
    acceptance: A,
    budget: SearchBudget,
}

impl<'c> Generator<'c> {
    /// A generator using the default rules and budget.
    pub fn new(catalogue: &'c Catalogue) -> Self {
        Self { catalogue, acceptance: ValidationRules::default(), budget: SearchBudget::default() }
    }
}

impl<'c, A> Generator<'c, A>
where
    A: Acceptance,
{
    /// Judge candidates with `acceptance` instead.
    pub fn with_acceptance<B: Acceptance>(self, acceptance: B) -> Generator<'c, B> {
        Generator { catalogue: self.catalogue, acceptance, budget: self.budget }
    }

    /// Spend attempts according to `budget`.
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Search using the randomness `options` asks for.
    pub fn generate(&self, options: &GenerationOptions) -> Result<Board<'c>, GenerationFailure> {
        let mut rng = source_for(options.seed);
        self.generate_with(options, rng.as_mut())
    }

    /// Search, drawing every random decision from `rng`.
    pub fn generate_with(&self, options: &GenerationOptions, rng: &mut dyn RandomSource) -> Result<Board<'c>, GenerationFailure> {
        let plan = self.plan(options)?;
        let attempts = options.max_attempts
            .unwrap_or_else(|| self.budget.attempts(plan.strict, plan.restricted));

        let mut last_abandon = None;
        for attempt in 0..attempts {
            let reason = match self.attempt(&plan, rng) {
                Ok(board) => {
                    let available = plan.restricted.then_some(plan.co_species_pool.as_slice());
                    let result = self.acceptance.assess(&board, available);
                    let critical = result.critical_warnings();
                    if !result.valid {
                        Abandon::Rejected(result.errors)
                    } else if critical == 0 || (attempt > self.budget.lenient_after && critical <= self.budget.lenient_critical_limit) {
                        debug!(attempt, warnings = result.warnings.len(), critical, "accepted board");
                        return Ok(board);
                    } else {
                        Abandon::CriticalWarnings(critical)
                    }
                }
                Err(reason) => reason,
            };

            trace!(attempt, %reason, "abandoned attempt");
            last_abandon = Some(reason);
        }

        info!(attempts, "no board satisfied the constraints");
        Err(GenerationFailure::Exhausted { attempts, last_abandon })
    }

    fn plan(&self, options: &GenerationOptions) -> Result<SearchPlan<'c>, GenerationFailure> {
        let rules = self.acceptance.rules();
        let focus = options.focus_biomes.iter().copied().unique().collect_vec();
        let restricted = !focus.is_empty() && focus.len() < Biome::COUNT;

        let park_ids = options.preserved_parks.iter()
            .filter_map(|park_id| {
                let park = self.catalogue.find_park(park_id);
                if park.is_none() {
                    warn!(park = park_id.as_str(), "unknown national park; ignoring");
                }
                park
            })
            .flat_map(|park| park.representative_ids());
        let required_ids = options.required_ids.iter().cloned().chain(park_ids).unique().collect_vec();

        let mut required_animals = Vec::new();
        let mut required_co_species = Vec::new();
        for id in &required_ids {
            if let Some(animal) = self.catalogue.find_animal(id) {
                required_animals.push(animal);
            } else if let Some(co_species) = self.catalogue.find_co_species(id) {
                required_co_species.push(co_species);
            } else {
                warn!(id = id.as_str(), "required id is not in the catalogue; ignoring");
            }
        }

        for level in Level::VARIANTS {
            let required = required_animals.iter().filter(|a| a.level == *level).count();
            let capacity = rules.tier_targets.get(*level);
            if required > capacity {
                return Err(GenerationFailure::RequiredOverflow { level: *level, required, capacity });
            }
        }
        let small = required_co_species.iter().filter(|c| c.is_small()).count();
        if small > rules.small_co_species_cap {
            return Err(GenerationFailure::RequiredSmallCoSpecies { required: small, cap: rules.small_co_species_cap });
        }

        let reference_sizes = options.compatible_with_reference
            .then(|| self.catalogue.reference_group_sizes(REFERENCE_BOARD));
        let eligible = |animal: &&'c Animal| {
            (focus.is_empty() || animal.in_any_biome(&focus))
                && reference_sizes.as_ref().map_or(true, |sizes| animal.shares_group_size(sizes))
                && !required_ids.contains(&animal.id)
        };
        let pools = [Level::One, Level::Two, Level::Three].map(|level| {
            self.catalogue.animals.iter()
                .filter(|a| a.level == level)
                .filter(|a| eligible(a))
                .collect_vec()
        });

        let co_species_pool = self.catalogue.co_species.iter()
            .filter(|c| focus.is_empty() || c.in_any_biome(&focus))
            .collect_vec();

        Ok(SearchPlan {
            required_animals,
            required_co_species,
            pools,
            co_species_pool,
            focus,
            restricted,
            strict: options.strict,
        })
    }

    fn attempt(&self, plan: &SearchPlan<'c>, rng: &mut dyn RandomSource) -> Result<Board<'c>, Abandon> {
        let rules = self.acceptance.rules();
        let mut board = Board::default();
        for animal in &plan.required_animals {
            board.tier_mut(animal.level).push(*animal);
        }
        board.co_species.extend(plan.required_co_species.iter().copied());

        let pools = plan.pools.each_ref().map(|pool| shuffle(pool, rng));

        let capacity_1 = rules.tier_targets.get(Level::One);
        for biome in &plan.focus {
            if board.level1.iter().any(|a| a.has_biome(*biome)) {
                continue;
            }
            let pick = pools[Level::One.index()].iter()
                .filter(|a| a.has_biome(*biome))
                .find(|a| !board.contains(&a.id) && requirement_met(a, &board));
            match pick {
                Some(animal) if board.level1.len() < capacity_1 => board.level1.push(*animal),
                _ => return Err(Abandon::FocusBiomeUnrepresented(*biome)),
            }
        }

        for level in Level::VARIANTS {
            let target = rules.tier_targets.get(*level);
            for animal in &pools[level.index()] {
                if board.tier(*level).len() >= target {
                    break;
                }
                if board.contains(&animal.id) || !requirement_met(animal, &board) {
                    continue;
                }
                board.tier_mut(*level).push(*animal);
            }

            let filled = board.tier(*level).len();
            if filled < target {
                return Err(Abandon::TierShort { level: *level, filled, target });
            }
        }

        if let Some(biome) = plan.focus.iter().find(|b| !board.level1.iter().any(|a| a.has_biome(**b))) {
            return Err(Abandon::FocusBiomeUnrepresented(*biome));
        }

        self.fill_co_species(plan, &mut board, rng);

        let (assignments, animal_load, level1_load) = assign_biomes(&board, &plan.focus);
        if let Some((biome, _)) = animal_load.iter()
            .find(|(biome, count)| *count >= rules.viable_biome_size && level1_load[*biome] == 0) {
            return Err(Abandon::LeaderlessBiome(biome));
        }
        board.biome_assignments = Some(assignments);

        Ok(board)
    }

    fn fill_co_species(&self, plan: &SearchPlan<'c>, board: &mut Board<'c>, rng: &mut dyn RandomSource) {
        let rules = self.acceptance.rules();
        let mut species_per_biome = BiomeTally::default();
        board.animals().for_each(|a| species_per_biome.add_all(a));
        let mut co_species_per_biome = BiomeTally::default();
        board.co_species.iter().for_each(|c| co_species_per_biome.add_all(*c));

        let shuffled = shuffle(&plan.co_species_pool, rng);
        let small_room = |board: &Board<'c>, candidate: &CoSpecies| {
            !candidate.is_small() || board.co_species.iter().filter(|c| c.is_small()).count() < rules.small_co_species_cap
        };
        // the validator counts a co-species against every biome it is tagged with
        let biome_room = |tally: &BiomeTally, candidate: &CoSpecies| {
            candidate.biomes().iter().all(|b| tally[*b] < rules.co_species_per_biome_cap)
        };

        for biome in species_per_biome.present().collect_vec() {
            if co_species_per_biome[biome] > 0 {
                continue;
            }
            let current: &Board<'c> = board;
            let pick = shuffled.iter().find(|c| {
                c.has_biome(biome)
                    && !current.contains(&c.id)
                    && small_room(current, c)
                    && biome_room(&co_species_per_biome, c)
            });
            if let Some(co_species) = pick {
                board.co_species.push(*co_species);
                co_species_per_biome.add_all(*co_species);
                species_per_biome.add(biome);
            }
        }

        if !plan.strict {
            return;
        }

        for candidate in &shuffled {
            if board.contains(&candidate.id) || !small_room(board, candidate) || !biome_room(&co_species_per_biome, candidate) {
                continue;
            }
            let crowded = candidate.categories().iter()
                .any(|cat| board.members().filter(|m| m.has_category(*cat)).count() >= STRICT_CATEGORY_CAP);
            if crowded {
                continue;
            }

            let target = candidate.biomes().iter().copied().find(|b| species_per_biome[*b] < rules.viable_biome_size);
            if let Some(biome) = target {
                board.co_species.push(*candidate);
                co_species_per_biome.add_all(*candidate);
                species_per_biome.add(biome);
            }
        }
    }
}

/// Whether `animal`'s unlock requirement is met by what `board` already holds.
fn requirement_met(animal: &Animal, board: &Board<'_>) -> bool {
    animal.requirement.as_ref().map_or(true, |req| req.satisfied_by(board.members()))
}

/// Greedy load-balanced biome assignment for every member of `board`.
///
/// Animals go first, each to whichever of its candidate biomes holds the fewest assigned members so far (earliest
/// declared on ties); co-species follow, balanced against the same load. With a focus set, candidates are limited to it.
/// Returns the assignments with the per-biome animal load and Level I load.
fn assign_biomes(board: &Board<'_>, focus: &[Biome]) -> (BiomeAssignments, BiomeTally, BiomeTally) {
    let mut assignments = BiomeAssignments::new();
    let mut load = BiomeTally::default();
    let mut level1_load = BiomeTally::default();

    let mut assign = |item: &dyn Tagged, load: &mut BiomeTally| -> Option<Biome> {
        let candidates = item.biomes().iter()
            .copied()
            .filter(|b| focus.is_empty() || focus.contains(b))
            .collect_vec();
        let Some(first) = candidates.first().copied() else {
            warn!(id = item.id(), "no candidate biome left after focus restriction; leaving unassigned");
            return None;
        };
        let chosen = candidates.into_iter().fold(first, |best, b| if load[b] < load[best] { b } else { best });
        assignments.insert(item.id().to_owned(), chosen);
        load.add(chosen);
        Some(chosen)
    };

    for animal in board.animals() {
        if let Some(biome) = assign(animal, &mut load) {
            if animal.level == Level::One {
                level1_load.add(biome);
            }
        }
    }
    let animal_load = load;
    for co_species in &board.co_species {
        assign(*co_species, &mut load);
    }

    (assignments, animal_load, level1_load)
}

/// Search `catalogue` under the default rules and budget.
pub fn generate_board<'c>(catalogue: &'c Catalogue, options: &GenerationOptions) -> Result<Board<'c>, GenerationFailure> {
    Generator::new(catalogue).generate(options)
}
