//! Immutable reference data: animals, co-species, and the closed vocabularies they are tagged with.
//!
//! Records are loaded from JSON once and never mutated. The polymorphic "single value or list" fields of the source data
//! are normalised into [`Tags`] at the deserialisation boundary, so nothing downstream needs to care which form was used.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use itertools::Itertools;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{EnumCount, EnumString, VariantArray};
use thiserror::Error;
use tracing::warn;

use crate::board::BoardIds;
use crate::national_park::NationalPark;

/// Name of the sample board whose group sizes define "compatible with the base game".
pub const REFERENCE_BOARD: &str = "Base Game";

const BUNDLED: &str = include_str!("../data/catalogue.json");

/// A habitat tag.
///
/// Declaration order matters: rules that walk "every known biome" do so in this order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, strum::Display, EnumString, EnumCount, VariantArray, Serialize, Deserialize)]
pub enum Biome {
    /// `"Tundra & Steppe"`
    #[strum(serialize = "Tundra & Steppe")]
    #[serde(rename = "Tundra & Steppe")]
    TundraSteppe,
    /// `"Montane Forest"`
    #[strum(serialize = "Montane Forest")]
    #[serde(rename = "Montane Forest")]
    MontaneForest,
    /// `"Rainforest"`
    Rainforest,
    /// `"Savannah"`
    Savannah,
    /// `"Dry Forest"`
    #[strum(serialize = "Dry Forest")]
    #[serde(rename = "Dry Forest")]
    DryForest,
    /// `"Water"`
    Water,
}

impl Biome {
    /// Lowercase, dash-separated form for use inside generated identifiers.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::TundraSteppe => "tundra-steppe",
            Self::MontaneForest => "montane-forest",
            Self::Rainforest => "rainforest",
            Self::Savannah => "savannah",
            Self::DryForest => "dry-forest",
            Self::Water => "water",
        }
    }
}

/// A taxonomic or gameplay tag, used for diversity and unlock rules.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, strum::Display, EnumString, EnumCount, VariantArray, Serialize, Deserialize)]
pub enum Category {
    /// Meat eaters such as cats and bears.
    Carnivore,
    /// Hoofed animals.
    Ungulate,
    /// The category most unlock requirements name.
    Bird,
    /// Anteaters and their relatives.
    Xenarthran,
    /// Pouched mammals.
    Marsupial,
    /// Monkeys and apes.
    Primate,
    /// Snakes, lizards and their kin.
    Reptile,
    /// Animals without a backbone.
    Invertebrate,
    /// Frogs and salamanders.
    Amphibian,
    /// Marine mammals.
    Aquatic,
    /// Fish and rays.
    Fish,
}

/// The tier an animal belongs to. Fixed per animal; decides which board list it may occupy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, VariantArray, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    /// Entry tier, and the one that anchors a biome.
    One = 1,
    /// Middle tier.
    Two = 2,
    /// Top tier.
    Three = 3,
}

impl Level {
    /// Zero-based position of this tier, for indexing per-tier arrays.
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize - 1
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(format!("level must be 1, 2 or 3 (got {other})")),
        }
    }
}

impl From<Level> for u8 {
    fn from(value: Level) -> Self {
        value as u8
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// A non-empty, order-preserving list of tags.
///
/// Deserialises from either a single value or a non-empty array. Declared order is kept because it drives the
/// deterministic fallback biome assignment (see [`fallback_biome`](crate::board::fallback_biome)).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Tags<T>(Vec<T>);

impl<T> Tags<T> {
    /// A single-tag list.
    pub fn one(tag: T) -> Self {
        Self(vec![tag])
    }

    /// Wrap `tags`, or `None` if it is empty.
    pub fn from_vec(tags: Vec<T>) -> Option<Self> {
        if tags.is_empty() {
            None
        } else {
            Some(Self(tags))
        }
    }

    /// The first declared tag.
    pub fn primary(&self) -> &T {
        // non-empty by construction
        &self.0[0]
    }
}

impl<T> Deref for Tags<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Tags<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(tag) => Ok(Self::one(tag)),
            OneOrMany::Many(tags) => Self::from_vec(tags).ok_or_else(|| D::Error::invalid_length(0, &"at least one tag")),
        }
    }
}

impl<T: Serialize> Serialize for Tags<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [only] => only.serialize(serializer),
            many => many.serialize(serializer),
        }
    }
}

impl<T: Display> Display for Tags<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(" or "))
    }
}

/// One entry of an animal's group-size table.
///
/// The source writes open-ended sizes as the string `"N+"`. These are only ever compared for equality, never evaluated.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "RawGroupSize", into = "RawGroupSize")]
pub enum GroupSize {
    /// A plain number in the source.
    Exact(u32),
    /// `"N+"` in the source.
    AtLeast(u32),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawGroupSize {
    Count(u32),
    Text(String),
}

impl FromStr for GroupSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |digits: &str| digits.trim().parse::<u32>().map_err(|_| format!("invalid group size {s:?}"));
        match s.strip_suffix('+') {
            Some(digits) => parse(digits).map(Self::AtLeast),
            None => parse(s).map(Self::Exact),
        }
    }
}

impl TryFrom<RawGroupSize> for GroupSize {
    type Error = String;

    fn try_from(value: RawGroupSize) -> Result<Self, Self::Error> {
        match value {
            RawGroupSize::Count(n) => Ok(Self::Exact(n)),
            RawGroupSize::Text(text) => text.parse(),
        }
    }
}

impl From<GroupSize> for RawGroupSize {
    fn from(value: GroupSize) -> Self {
        match value {
            GroupSize::Exact(n) => Self::Count(n),
            GroupSize::AtLeast(n) => Self::Text(format!("{n}+")),
        }
    }
}

impl Display for GroupSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "{n}+"),
        }
    }
}

/// A value per enclosure level, any of which may be absent.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PerLevel<T> {
    /// Value for a Level I enclosure.
    pub level1: Option<T>,
    /// Value for a Level II enclosure.
    pub level2: Option<T>,
    /// Value for a Level III enclosure.
    pub level3: Option<T>,
}

impl<T> Default for PerLevel<T> {
    fn default() -> Self {
        Self { level1: None, level2: None, level3: None }
    }
}

impl<T> PerLevel<T> {
    /// The present values, in level order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        [&self.level1, &self.level2, &self.level3].into_iter().flatten()
    }
}

/// An unlock prerequisite: the board must hold at least `count` members tagged with any of `category`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Threshold, inclusive.
    pub count: usize,
    /// Categories that count toward the threshold.
    pub category: Tags<Category>,
}

impl Requirement {
    /// Sum, over every required category, of the members carrying it.
    ///
    /// A member tagged with two of the required categories counts twice.
    pub fn matching<'a>(&self, members: impl IntoIterator<Item = &'a dyn Tagged>) -> usize {
        members.into_iter()
            .map(|member| self.category.iter().filter(|cat| member.has_category(**cat)).count())
            .sum()
    }

    /// Whether `members` meet the threshold.
    pub fn satisfied_by<'a>(&self, members: impl IntoIterator<Item = &'a dyn Tagged>) -> bool {
        self.matching(members) >= self.count
    }
}

/// Shared view over anything carrying an id plus biome and category tags.
pub trait Tagged {
    /// Stable, unique identifier.
    fn id(&self) -> &str;
    /// Habitat tags in declared order.
    fn biomes(&self) -> &[Biome];
    /// Category tags in declared order.
    fn categories(&self) -> &[Category];

    /// Whether this is tagged with `biome`.
    fn has_biome(&self, biome: Biome) -> bool {
        self.biomes().contains(&biome)
    }

    /// Whether this is tagged with `category`.
    fn has_category(&self, category: Category) -> bool {
        self.categories().contains(&category)
    }

    /// Whether this is tagged with at least one of `biomes`.
    fn in_any_biome(&self, biomes: &[Biome]) -> bool {
        self.biomes().iter().any(|b| biomes.contains(b))
    }
}

/// A tiered catalogue animal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    /// Unique within the catalogue's animals.
    pub id: String,
    /// Display name, used in validation messages.
    pub name: String,
    /// Category tags.
    pub category: Tags<Category>,
    /// Habitat tags. The first is the fallback when nothing else decides.
    pub biome: Tags<Biome>,
    /// The only tier this animal may occupy.
    pub level: Level,
    /// Popularity earned per enclosure.
    #[serde(default)]
    pub base_popularity_value: u32,
    /// Education points earned per enclosure.
    #[serde(default)]
    pub education_value: u32,
    /// Conservation points, where the animal grants any.
    #[serde(default)]
    pub conservation_value: Option<u32>,
    /// Absent for animals that are not bought per tile.
    #[serde(default)]
    pub cost_per_tile: Option<u32>,
    /// Most individuals one tile holds.
    #[serde(default)]
    pub max_per_tile: u32,
    /// Experience gained per enclosure level.
    #[serde(default)]
    pub experience: PerLevel<u32>,
    /// Free tiles needed per enclosure level.
    #[serde(default)]
    pub free_space: PerLevel<u32>,
    /// Shelters needed per enclosure level.
    #[serde(default)]
    pub shelters: PerLevel<u32>,
    /// Group sizes per enclosure level. Compared against the reference board for compatibility.
    #[serde(default)]
    pub group_size: PerLevel<GroupSize>,
    /// Unlock prerequisite, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<Requirement>,
    /// Only playable past a popularity threshold.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_popularity_locked: bool,
}

impl Animal {
    /// Whether any of this animal's group sizes appears in `sizes`.
    pub fn shares_group_size(&self, sizes: &BTreeSet<GroupSize>) -> bool {
        self.group_size.values().any(|size| sizes.contains(size))
    }
}

impl Tagged for Animal {
    fn id(&self) -> &str {
        &self.id
    }

    fn biomes(&self) -> &[Biome] {
        &self.biome
    }

    fn categories(&self) -> &[Category] {
        &self.category
    }
}

/// Footprint of a co-species; small ones are globally capped.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CoSpeciesSize {
    /// One tile. Counts against the small co-species cap.
    Small = 1,
    /// Two tiles.
    Large = 2,
}

impl TryFrom<u8> for CoSpeciesSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Small),
            2 => Ok(Self::Large),
            other => Err(format!("co-species size must be 1 or 2 (got {other})")),
        }
    }
}

impl From<CoSpeciesSize> for u8 {
    fn from(value: CoSpeciesSize) -> Self {
        value as u8
    }
}

/// A companion species. Untiered, with no unlock requirement or economics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoSpecies {
    /// Unique within the catalogue's co-species.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Footprint.
    pub size: CoSpeciesSize,
    /// Habitat tags. Each counts toward that biome's co-species cap.
    pub biome: Tags<Biome>,
    /// Category tags.
    pub category: Tags<Category>,
}

impl CoSpecies {
    /// Whether this counts against the small co-species cap.
    #[inline]
    pub fn is_small(&self) -> bool {
        self.size == CoSpeciesSize::Small
    }
}

impl Tagged for CoSpecies {
    fn id(&self) -> &str {
        &self.id
    }

    fn biomes(&self) -> &[Biome] {
        &self.biome
    }

    fn categories(&self) -> &[Category] {
        &self.category
    }
}

/// A named preset board stored as ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleBoard {
    /// Lookup key, e.g. [`REFERENCE_BOARD`].
    pub name: String,
    /// Free text shown alongside the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The preset itself.
    pub board: BoardIds,
}

/// Reasons a catalogue may fail to load.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// The input was not valid catalogue JSON, or a field held an out-of-range value.
    #[error("malformed catalogue: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Two records of the same kind share an id.
    #[error("duplicate {kind} id {id:?}")]
    DuplicateId {
        /// `"animal"` or `"co-species"`.
        kind: &'static str,
        /// The repeated id.
        id: String,
    },
}

/// Every record the core reads from. Loaded once, then shared read-only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogue {
    /// Tiered animals, in catalogue order.
    pub animals: Vec<Animal>,
    /// Companion species.
    #[serde(default)]
    pub co_species: Vec<CoSpecies>,
    /// Preservation templates.
    #[serde(default)]
    pub national_parks: Vec<NationalPark>,
    /// Preset boards, including the reference board.
    #[serde(default)]
    pub sample_boards: Vec<SampleBoard>,
}

impl Catalogue {
    /// Build a catalogue from already-parsed records, rejecting duplicate ids.
    pub fn new(animals: Vec<Animal>, co_species: Vec<CoSpecies>) -> Result<Self, CatalogueError> {
        let catalogue = Self { animals, co_species, ..Default::default() };
        catalogue.check_ids()?;
        Ok(catalogue)
    }

    /// Attach national-park templates.
    pub fn with_national_parks(mut self, parks: Vec<NationalPark>) -> Self {
        self.national_parks = parks;
        self
    }

    /// Attach preset boards.
    pub fn with_sample_boards(mut self, boards: Vec<SampleBoard>) -> Self {
        self.sample_boards = boards;
        self
    }

    /// Parse a catalogue from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, CatalogueError> {
        let catalogue: Self = serde_json::from_str(json)?;
        catalogue.check_ids()?;
        Ok(catalogue)
    }

    /// The reference data compiled into this crate.
    pub fn bundled() -> Result<Self, CatalogueError> {
        Self::from_json(BUNDLED)
    }

    fn check_ids(&self) -> Result<(), CatalogueError> {
        if let Some(id) = self.animals.iter().map(|a| a.id.as_str()).duplicates().next() {
            return Err(CatalogueError::DuplicateId { kind: "animal", id: id.to_owned() });
        }
        if let Some(id) = self.co_species.iter().map(|c| c.id.as_str()).duplicates().next() {
            return Err(CatalogueError::DuplicateId { kind: "co-species", id: id.to_owned() });
        }
        Ok(())
    }

    /// Look up an animal by id.
    pub fn find_animal(&self, id: &str) -> Option<&Animal> {
        self.animals.iter().find(|a| a.id == id)
    }

    /// Look up a co-species by id.
    pub fn find_co_species(&self, id: &str) -> Option<&CoSpecies> {
        self.co_species.iter().find(|c| c.id == id)
    }

    /// Look up a national-park template by id.
    pub fn find_park(&self, id: &str) -> Option<&NationalPark> {
        self.national_parks.iter().find(|p| p.id == id)
    }

    /// Look up a preset board by name.
    pub fn find_sample_board(&self, name: &str) -> Option<&SampleBoard> {
        self.sample_boards.iter().find(|b| b.name == name)
    }

    /// Every group size used by the tiered animals of the sample board `name`.
    ///
    /// Empty if no such board exists. Ids on the board that are not in the catalogue are skipped.
    pub fn reference_group_sizes(&self, name: &str) -> BTreeSet<GroupSize> {
        let Some(sample) = self.find_sample_board(name) else {
            warn!(board = name, "reference board not found; no group sizes are compatible");
            return BTreeSet::new();
        };

        sample.board.tiers()
            .filter_map(|id| {
                let animal = self.find_animal(id);
                if animal.is_none() {
                    warn!(id, board = name, "reference board names an unknown animal");
                }
                animal
            })
            .flat_map(|animal| animal.group_size.values().copied())
            .collect()
    }
}
