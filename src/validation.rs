//! The board rule set.
//!
//! [`ValidationRules::validate`] is pure: it never mutates the board and draws no randomness, so validating the same
//! board twice always gives the same [`ValidationResult`]. Hard violations make a board invalid; advisories never do.

use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use strum::VariantArray;

use crate::board::{Board, BiomeTally};
use crate::catalogue::{Biome, Category, CoSpecies, Level, Tagged, Tags};

/// Exact animal count required per tier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TierTargets {
    /// Level I animals.
    pub level1: usize,
    /// Level II animals.
    pub level2: usize,
    /// Level III animals.
    pub level3: usize,
}

impl TierTargets {
    /// Target for `level`.
    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::One => self.level1,
            Level::Two => self.level2,
            Level::Three => self.level3,
        }
    }
}

impl Default for TierTargets {
    fn default() -> Self {
        Self { level1: 9, level2: 10, level3: 5 }
    }
}

/// Every tunable of the rule set.
///
/// [`Default`] gives the expansion rules (ten Level II animals, no category-count advisory, no legacy advisories).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationRules {
    /// Exact size of each tier.
    pub tier_targets: TierTargets,
    /// Most co-species of size 1 a board may hold.
    pub small_co_species_cap: usize,
    /// Most co-species tagged with any one biome.
    pub co_species_per_biome_cap: usize,
    /// Fewest species a biome needs, once it has any, to not draw an advisory.
    pub viable_biome_size: usize,
    /// Recommended members per category, if that advisory is enabled.
    pub category_range: Option<RangeInclusive<usize>>,
    /// Recommended Level I animals per populated biome, if that advisory is enabled.
    pub level1_per_biome: Option<RangeInclusive<usize>>,
    /// Advise on categories with neither a co-species nor a Level I member.
    pub category_anchor: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            tier_targets: TierTargets::default(),
            small_co_species_cap: 5,
            co_species_per_biome_cap: 2,
            viable_biome_size: 3,
            category_range: None,
            level1_per_biome: None,
            category_anchor: false,
        }
    }
}

/// A hard constraint violation. Any of these makes a board invalid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation {
    /// A tier does not hold exactly its target count.
    TierCount {
        /// The offending tier.
        level: Level,
        /// Animals on it.
        actual: usize,
        /// Its target.
        expected: usize,
    },
    /// Too many small co-species.
    SmallCoSpecies {
        /// Small co-species on the board.
        actual: usize,
        /// The cap.
        cap: usize,
    },
    /// Too many co-species tagged with one biome.
    CoSpeciesPerBiome {
        /// The crowded biome.
        biome: Biome,
        /// Co-species tagged with it.
        actual: usize,
        /// The cap.
        cap: usize,
    },
    /// A biome has animals but no co-species.
    MissingCoSpecies {
        /// A biome some animal is tagged with.
        biome: Biome,
    },
    /// An animal's unlock requirement is not met by the board.
    UnmetRequirement {
        /// Display name of the gated animal.
        name: String,
        /// Members needed.
        count: usize,
        /// Categories that count.
        categories: Tags<Category>,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TierCount { level, actual, expected } =>
                write!(f, "Level {level} must have exactly {expected} animals (currently {actual})"),
            Self::SmallCoSpecies { actual, cap } =>
                write!(f, "Small co-species limit exceeded: {actual}/{cap}"),
            Self::CoSpeciesPerBiome { biome, actual, cap } =>
                write!(f, "Co-species limit exceeded for {biome}: {actual}/{cap}"),
            Self::MissingCoSpecies { biome } =>
                write!(f, "{biome} has animals but no co-species (needs at least 1 co-species per biome)"),
            Self::UnmetRequirement { name, count, categories } =>
                write!(f, "{name} requires {count} {categories}s"),
        }
    }
}

/// A soft issue. Reported, never blocking.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Advisory {
    /// A biome has some species, but fewer than the viable size.
    UnviableBiome {
        /// The thin biome.
        biome: Biome,
        /// Members assigned to it.
        count: usize,
        /// The viable size.
        needed: usize,
    },
    /// Tiered animals gated behind a popularity threshold.
    PopularityLocked {
        /// Locked animals on the board.
        count: usize,
    },
    /// A category's member count is outside the recommended range.
    CategoryCount {
        /// The category.
        category: Category,
        /// Members carrying it.
        count: usize,
        /// The recommended range.
        range: RangeInclusive<usize>,
    },
    /// A populated biome's Level I count is outside the recommended range.
    Level1Distribution {
        /// The biome.
        biome: Biome,
        /// Level I animals assigned to it.
        count: usize,
        /// The recommended range.
        range: RangeInclusive<usize>,
    },
    /// A category present on the board has no co-species or Level I member.
    UnanchoredCategory {
        /// The category.
        category: Category,
    },
}

impl Advisory {
    /// Whether the generator treats this as blocking acceptance of an otherwise valid board.
    ///
    /// Only popularity locks are: viability and distribution advisories are expected on restricted or small boards.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::PopularityLocked { .. })
    }
}

impl Display for Advisory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnviableBiome { biome, count, needed } =>
                write!(f, "{biome} has {count} species (needs at least {needed} to be viable)"),
            Self::PopularityLocked { count } =>
                write!(f, "{count} animal(s) are locked behind popularity requirement (15+ points)"),
            Self::CategoryCount { category, count, range } =>
                write!(f, "{category} has {count} species (recommended: {}-{})", range.start(), range.end()),
            Self::Level1Distribution { biome, count, range } =>
                write!(f, "{biome} has {count} Level I animals (recommended: {}-{})", range.start(), range.end()),
            Self::UnanchoredCategory { category } =>
                write!(f, "{category} has no co-species or Level I member"),
        }
    }
}

/// Outcome of validating a board. `valid` is exactly `errors.is_empty()`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationResult {
    /// No hard violations.
    pub valid: bool,
    /// Hard violations, in rule order.
    pub errors: Vec<Violation>,
    /// Advisories, in rule order.
    pub warnings: Vec<Advisory>,
}

/// A [`ValidationResult`] rendered to strings for presentation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ValidationReport {
    /// See [`ValidationResult::valid`].
    pub valid: bool,
    /// One message per violation.
    pub errors: Vec<String>,
    /// One message per advisory.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Warnings the generator will not accept a board with.
    pub fn critical_warnings(&self) -> usize {
        self.warnings.iter().filter(|w| w.is_critical()).count()
    }

    /// Render every finding to its human-readable message.
    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            valid: self.valid,
            errors: self.errors.iter().map(ToString::to_string).collect(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Something that can judge a candidate board; the generator's acceptance oracle.
pub trait Acceptance {
    /// The constants the generator should fill boards toward.
    fn rules(&self) -> &ValidationRules;

    /// Judge `board`. `available_co_species`, when given, limits co-species coverage to biomes it could satisfy.
    fn assess(&self, board: &Board<'_>, available_co_species: Option<&[&CoSpecies]>) -> ValidationResult;
}

impl Acceptance for ValidationRules {
    fn rules(&self) -> &ValidationRules {
        self
    }

    fn assess(&self, board: &Board<'_>, available_co_species: Option<&[&CoSpecies]>) -> ValidationResult {
        self.validate(board, available_co_species)
    }
}

impl ValidationRules {
    /// Base game rules: nine Level II animals instead of ten.
    pub fn base_game() -> Self {
        Self {
            tier_targets: TierTargets { level2: 9, ..Default::default() },
            ..Default::default()
        }
    }

    /// Apply every rule to `board`.
    ///
    /// When `available_co_species` is given, a biome missing co-species is only an error if that pool has one for it.
    pub fn validate(&self, board: &Board<'_>, available_co_species: Option<&[&CoSpecies]>) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for level in Level::VARIANTS {
            let (actual, expected) = (board.tier(*level).len(), self.tier_targets.get(*level));
            if actual != expected {
                errors.push(Violation::TierCount { level: *level, actual, expected });
            }
        }

        let small = board.co_species.iter().filter(|c| c.is_small()).count();
        if small > self.small_co_species_cap {
            errors.push(Violation::SmallCoSpecies { actual: small, cap: self.small_co_species_cap });
        }

        let mut co_species_tags = BiomeTally::default();
        board.co_species.iter().for_each(|c| co_species_tags.add_all(*c));
        for (biome, actual) in co_species_tags.iter() {
            if actual > self.co_species_per_biome_cap {
                errors.push(Violation::CoSpeciesPerBiome { biome, actual, cap: self.co_species_per_biome_cap });
            }
        }

        let mut assigned = BiomeTally::default();
        board.members().for_each(|m| assigned.add(board.assigned_biome(m)));
        for (biome, count) in assigned.iter() {
            if count > 0 && count < self.viable_biome_size {
                warnings.push(Advisory::UnviableBiome { biome, count, needed: self.viable_biome_size });
            }
        }

        let mut animal_tags = BiomeTally::default();
        board.animals().for_each(|a| animal_tags.add_all(a));
        let mut available_tags = BiomeTally::default();
        if let Some(pool) = available_co_species {
            pool.iter().for_each(|c| available_tags.add_all(*c));
        }
        for biome in animal_tags.present() {
            let achievable = available_co_species.is_none() || available_tags[biome] > 0;
            if co_species_tags[biome] == 0 && achievable {
                errors.push(Violation::MissingCoSpecies { biome });
            }
        }

        for animal in board.animals() {
            if let Some(requirement) = &animal.requirement {
                if !requirement.satisfied_by(board.members()) {
                    errors.push(Violation::UnmetRequirement {
                        name: animal.name.clone(),
                        count: requirement.count,
                        categories: requirement.category.clone(),
                    });
                }
            }
        }

        let locked = board.animals().filter(|a| a.is_popularity_locked).count();
        if locked > 0 {
            warnings.push(Advisory::PopularityLocked { count: locked });
        }

        if let Some(range) = &self.category_range {
            for category in Category::VARIANTS {
                let count = board.members().filter(|m| m.has_category(*category)).count();
                if count > 0 && !range.contains(&count) {
                    warnings.push(Advisory::CategoryCount { category: *category, count, range: range.clone() });
                }
            }
        }

        if let Some(range) = &self.level1_per_biome {
            let mut level1 = BiomeTally::default();
            board.level1.iter().for_each(|a| level1.add(board.assigned_biome(*a)));
            let mut populated = BiomeTally::default();
            board.animals().for_each(|a| populated.add(board.assigned_biome(a)));
            for biome in populated.present() {
                if !range.contains(&level1[biome]) {
                    warnings.push(Advisory::Level1Distribution { biome, count: level1[biome], range: range.clone() });
                }
            }
        }

        if self.category_anchor {
            for category in Category::VARIANTS {
                let present = board.members().any(|m| m.has_category(*category));
                let anchored = board.level1.iter().any(|a| a.has_category(*category))
                    || board.co_species.iter().any(|c| c.has_category(*category));
                if present && !anchored {
                    warnings.push(Advisory::UnanchoredCategory { category: *category });
                }
            }
        }

        ValidationResult { valid: errors.is_empty(), errors, warnings }
    }
}

/// Validate `board` under the default rules.
pub fn validate_board(board: &Board<'_>, available_co_species: Option<&[&CoSpecies]>) -> ValidationResult {
    ValidationRules::default().validate(board, available_co_species)
}
