//! National-park preservation templates and the completeness check against a board.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::catalogue::Biome;

/// Which box a template comes from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// The base game.
    Base,
    /// The expansion.
    Expansion,
}

/// A named preservation template: ids that must all be present, plus groups of which any one member will do.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalPark {
    /// Lookup key used by preservation requests.
    pub id: String,
    /// Display name.
    pub name: String,
    /// The box this template ships in.
    pub game: Edition,
    /// The biome the park is themed on.
    pub biome: Biome,
    /// Animal and co-species ids that must all be on the board.
    pub required_animals: Vec<String>,
    /// Groups of interchangeable ids. One per group is enough.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_animals: Vec<Vec<String>>,
}

/// How far a board is from completing a [`NationalPark`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkStatus {
    /// Nothing is missing.
    pub complete: bool,
    /// Missing required ids, then one `(a OR b)` entry per unsatisfied alternative group.
    pub missing: Vec<String>,
    /// Per alternative group, whether the board has any of it.
    pub has_alternative: Vec<bool>,
}

impl NationalPark {
    /// The ids that stand for this template when it is preserved: every required id and the first alternative of each group.
    pub fn representative_ids(&self) -> Vec<String> {
        self.required_animals.iter()
            .chain(self.optional_animals.iter().filter_map(|group| group.first()))
            .cloned()
            .collect()
    }

    /// Check `board` against this template. Animals and co-species both count.
    pub fn status(&self, board: &Board<'_>) -> ParkStatus {
        let mut missing = self.required_animals.iter()
            .filter(|id| !board.contains(id))
            .cloned()
            .collect_vec();

        let has_alternative = self.optional_animals.iter()
            .map(|group| {
                let any = group.iter().any(|id| board.contains(id));
                if !any {
                    missing.push(format!("({})", group.iter().join(" OR ")));
                }
                any
            })
            .collect_vec();

        ParkStatus { complete: missing.is_empty(), missing, has_alternative }
    }
}
