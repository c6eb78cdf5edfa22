#![warn(missing_docs)]

//! # `menagerie`
//!
//! A board builder for a zoo-themed tabletop game and its expansion.
//! Load a [`Catalogue`] (the bundled one via [`Catalogue::bundled()`], or your own JSON via [`Catalogue::from_json()`]),
//! describe what you want with [`GenerationOptions`], then hand both to a [`Generator`].
//! The resulting [`Board`] borrows from the catalogue and can be checked again at any time with
//! [`ValidationRules::validate()`](validation::ValidationRules::validate).
//!
//! An accepted board can be post-processed: [`inject_popularity_locked()`](injector::inject_popularity_locked) swaps
//! gated animals in, and [`generate_balanced_parks()`](parks::generate_balanced_parks) carves it into small scored
//! parks. [`NationalPark`](national_park::NationalPark) templates can be preserved during generation or checked
//! against a finished board.
//!
//! # Internals
//! The constraints interact in ways that make a constructive search awkward: a requirement on one animal changes
//! which others may be drawn, biome coverage depends on which co-species survive their caps, and multi-biome animals
//! only count toward a biome once they are assigned one. Instead, each attempt is built cheaply and then judged.
//!
//! A high level overview is as follows:
//!
//! 1. Once per search, resolve required ids and preserved park templates, reject requirements that cannot fit, and
//! filter each tier's candidate pool by focus biomes and group-size compatibility.
//! 2. Per attempt, seed the board with required items, shuffle the pools, guarantee a Level I animal for each focus
//! biome, then fill each tier in shuffled order, skipping animals whose unlock requirement is not yet met.
//! 3. Attach co-species: one per biome in play, then (in strict mode) extras aimed at biomes short of viability.
//! 4. Assign every member to one biome, balancing load, and abandon boards where a viable biome has no Level I animal.
//! 5. Judge the candidate with an [`Acceptance`](validation::Acceptance) oracle, by default the
//! [`ValidationRules`](validation::ValidationRules).
//!
//! Every random decision is drawn from a [`RandomSource`](rng::RandomSource), so a seeded search is reproducible.

pub use board::{Board, BoardIds};
pub use catalogue::{Animal, Biome, Catalogue, Category, CoSpecies, Level};
pub use generator::{generate_board, GenerationFailure, GenerationOptions, Generator};
pub use validation::{validate_board, ValidationResult, ValidationRules};

pub mod board;
pub mod catalogue;
pub mod generator;
pub mod injector;
pub mod national_park;
pub mod parks;
pub mod rng;
pub mod validation;
mod tests;
#[cfg(feature = "wasm")]
mod wasm;
