//! Boards in borrowed and id form, plus biome assignment.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::ops::Index;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, VariantArray};
use tracing::warn;

use crate::catalogue::{Animal, Biome, Catalogue, CoSpecies, Level, Tagged};

/// Item id to the single biome it counts toward.
pub type BiomeAssignments = BTreeMap<String, Biome>;

/// A candidate or accepted selection: three tiers of animals plus co-species, borrowed from a [`Catalogue`].
///
/// Nothing here enforces the board rules; that is the job of [`ValidationRules`](crate::validation::ValidationRules).
/// `biome_assignments` is owned by the board. Cloning a board copies it, so a derived board never shares it with its source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Board<'c> {
    /// Level I animals.
    pub level1: Vec<&'c Animal>,
    /// Level II animals.
    pub level2: Vec<&'c Animal>,
    /// Level III animals.
    pub level3: Vec<&'c Animal>,
    /// Untiered companions.
    pub co_species: Vec<&'c CoSpecies>,
    /// Member id to the one biome it counts toward. `None` until the generator assigns biomes.
    pub biome_assignments: Option<BiomeAssignments>,
}

impl<'c> Board<'c> {
    /// The list for `level`.
    pub fn tier(&self, level: Level) -> &[&'c Animal] {
        match level {
            Level::One => &self.level1,
            Level::Two => &self.level2,
            Level::Three => &self.level3,
        }
    }

    pub(crate) fn tier_mut(&mut self, level: Level) -> &mut Vec<&'c Animal> {
        match level {
            Level::One => &mut self.level1,
            Level::Two => &mut self.level2,
            Level::Three => &mut self.level3,
        }
    }

    /// Every tiered animal, level 1 first.
    pub fn animals(&self) -> impl Iterator<Item = &'c Animal> + '_ {
        self.level1.iter().chain(&self.level2).chain(&self.level3).copied()
    }

    /// Every member, animals first and co-species last.
    pub fn members(&self) -> impl Iterator<Item = &'c dyn Tagged> + '_ {
        self.animals().map(|a| a as &dyn Tagged)
            .chain(self.co_species.iter().map(|c| *c as &dyn Tagged))
    }

    /// Whether an animal or co-species with `id` is on the board.
    pub fn contains(&self, id: &str) -> bool {
        self.members().any(|m| m.id() == id)
    }

    /// The biome `item` counts toward on this board.
    pub fn assigned_biome(&self, item: &dyn Tagged) -> Biome {
        assigned_biome(item, self.biome_assignments.as_ref())
    }

    /// Resolve an id-form board against `catalogue`.
    ///
    /// Tier lists are resolved against animals and the co-species list against co-species. Unknown ids are skipped.
    pub fn from_ids(catalogue: &'c Catalogue, ids: &BoardIds) -> Self {
        let resolve_tier = |list: &[String]| -> Vec<&'c Animal> {
            list.iter()
                .filter_map(|id| {
                    let found = catalogue.find_animal(id);
                    if found.is_none() {
                        warn!(id = id.as_str(), "board names an unknown animal; skipping");
                    }
                    found
                })
                .collect()
        };

        Self {
            level1: resolve_tier(&ids.level1),
            level2: resolve_tier(&ids.level2),
            level3: resolve_tier(&ids.level3),
            co_species: ids.co_species.iter()
                .filter_map(|id| {
                    let found = catalogue.find_co_species(id);
                    if found.is_none() {
                        warn!(id = id.as_str(), "board names an unknown co-species; skipping");
                    }
                    found
                })
                .collect(),
            biome_assignments: ids.biome_assignments.clone(),
        }
    }

    /// The id form of this board.
    pub fn ids(&self) -> BoardIds {
        let ids = |list: &[&'c Animal]| list.iter().map(|a| a.id.clone()).collect_vec();
        BoardIds {
            level1: ids(&self.level1),
            level2: ids(&self.level2),
            level3: ids(&self.level3),
            co_species: self.co_species.iter().map(|c| c.id.clone()).collect(),
            biome_assignments: self.biome_assignments.clone(),
        }
    }
}

impl Display for Board<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (label, level) in [("Level I", Level::One), ("Level II", Level::Two), ("Level III", Level::Three)] {
            let tier = self.tier(level);
            writeln!(f, "{label} ({}): {}", tier.len(), tier.iter()
                .map(|a| format!("{} [{}]", a.name, self.assigned_biome(*a)))
                .join(", "))?;
        }
        writeln!(f, "Co-species ({}): {}", self.co_species.len(), self.co_species.iter()
            .map(|c| format!("{} [{}]", c.name, self.assigned_biome(*c)))
            .join(", "))
    }
}

/// A board as plain ids, the form exchanged with presentation code and stored in sample boards.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardIds {
    /// Level I animal ids.
    #[serde(default)]
    pub level1: Vec<String>,
    /// Level II animal ids.
    #[serde(default)]
    pub level2: Vec<String>,
    /// Level III animal ids.
    #[serde(default)]
    pub level3: Vec<String>,
    /// Co-species ids.
    #[serde(default)]
    pub co_species: Vec<String>,
    /// See [`Board::biome_assignments`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biome_assignments: Option<BiomeAssignments>,
}

impl BoardIds {
    /// Ids of every tiered animal, level 1 first.
    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.level1.iter().chain(&self.level2).chain(&self.level3).map(String::as_str)
    }
}

/// The biome `item` counts toward.
///
/// Single-biome items always count toward their only biome. Otherwise an explicit entry in `assignments` wins, and
/// failing that [`fallback_biome`] picks one.
pub fn assigned_biome(item: &dyn Tagged, assignments: Option<&BiomeAssignments>) -> Biome {
    let biomes = item.biomes();
    if let [only] = biomes {
        return *only;
    }

    assignments.and_then(|map| map.get(item.id()))
        .copied()
        .unwrap_or_else(|| fallback_biome(item.id(), biomes))
}

/// Stable pick among `biomes` for `id`: the sum of the id's UTF-16 code units, modulo the number of biomes,
/// indexes the list in declared order.
///
/// `biomes` must be non-empty.
pub fn fallback_biome(id: &str, biomes: &[Biome]) -> Biome {
    let hash: usize = id.encode_utf16().map(usize::from).sum();
    biomes[hash % biomes.len()]
}

/// A count per biome, iterated in [`Biome`] declaration order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BiomeTally([usize; Biome::COUNT]);

impl BiomeTally {
    /// Count one more for `biome`.
    #[inline]
    pub fn add(&mut self, biome: Biome) {
        self.0[biome as usize] += 1;
    }

    /// Count one more for every biome `item` is tagged with.
    pub fn add_all(&mut self, item: &dyn Tagged) {
        item.biomes().iter().for_each(|b| self.add(*b));
    }

    /// Every biome with its count, including zeroes.
    pub fn iter(&self) -> impl Iterator<Item = (Biome, usize)> + '_ {
        Biome::VARIANTS.iter().map(|b| (*b, self[*b]))
    }

    /// Biomes with a non-zero count.
    pub fn present(&self) -> impl Iterator<Item = Biome> + '_ {
        self.iter().filter(|(_, count)| *count > 0).map(|(b, _)| b)
    }
}

impl Index<Biome> for BiomeTally {
    type Output = usize;

    fn index(&self, index: Biome) -> &Self::Output {
        &self.0[index as usize]
    }
}
