#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use strum::VariantArray;

    use crate::board::{fallback_biome, Board, BoardIds};
    use crate::catalogue::{
        Animal, Biome, Catalogue, CatalogueError, Category, CoSpecies, CoSpeciesSize, GroupSize, Level, PerLevel,
        Requirement, SampleBoard, Tagged, Tags,
    };
    use crate::generator::{Abandon, GenerationFailure, GenerationOptions, Generator};
    use crate::injector::inject_popularity_locked;
    use crate::national_park::{Edition, NationalPark};
    use crate::parks::{generate_balanced_parks_with, score_park, ParkOptions, ParkSize};
    use crate::rng::{shuffle, FixedSequence, Lcg, RandomSource};
    use crate::validation::{Advisory, TierTargets, ValidationRules, Violation};

    const ROTATION: [Category; 6] = [
        Category::Carnivore,
        Category::Ungulate,
        Category::Bird,
        Category::Primate,
        Category::Reptile,
        Category::Amphibian,
    ];

    fn animal(id: &str, level: Level, biomes: &[Biome], categories: &[Category], group: u32) -> Animal {
        Animal {
            id: id.to_owned(),
            name: id.to_owned(),
            category: Tags::from_vec(categories.to_vec()).unwrap(),
            biome: Tags::from_vec(biomes.to_vec()).unwrap(),
            level,
            base_popularity_value: 2,
            education_value: 2,
            conservation_value: None,
            cost_per_tile: Some(3),
            max_per_tile: 1,
            experience: PerLevel::default(),
            free_space: PerLevel::default(),
            shelters: PerLevel::default(),
            group_size: PerLevel { level1: Some(GroupSize::Exact(group)), level2: None, level3: None },
            requirement: None,
            is_popularity_locked: false,
        }
    }

    fn co_species(id: &str, size: CoSpeciesSize, biomes: &[Biome], category: Category) -> CoSpecies {
        CoSpecies {
            id: id.to_owned(),
            name: id.to_owned(),
            size,
            biome: Tags::from_vec(biomes.to_vec()).unwrap(),
            category: Tags::one(category),
        }
    }

    /// Per biome: five Level I, five Level II and three Level III animals plus one small and one large co-species.
    /// Ids look like `savannah-1-0`. On top of that: a two-biome otter, a requirement-gated owl, two popularity-locked
    /// animals and a two-biome heron.
    fn fixture() -> Catalogue {
        let mut animals = Vec::new();
        let mut co = Vec::new();
        for (b, biome) in Biome::VARIANTS.iter().enumerate() {
            for (level, count) in [(Level::One, 5), (Level::Two, 5), (Level::Three, 3)] {
                for i in 0..count {
                    let category = ROTATION[(b + i + level as usize) % ROTATION.len()];
                    let id = format!("{}-{}-{i}", biome.slug(), level);
                    animals.push(animal(&id, level, &[*biome], &[category], 1 + (i % 3) as u32));
                }
            }
            co.push(co_species(&format!("{}-small", biome.slug()), CoSpeciesSize::Small, &[*biome], Category::Invertebrate));
            co.push(co_species(&format!("{}-large", biome.slug()), CoSpeciesSize::Large, &[*biome], Category::Fish));
        }

        animals.push(animal("river-otter", Level::One, &[Biome::Water, Biome::Rainforest], &[Category::Carnivore, Category::Aquatic], 1));

        let mut owl = animal("eagle-owl", Level::Two, &[Biome::MontaneForest], &[Category::Bird], 1);
        owl.name = "Eagle Owl".to_owned();
        owl.requirement = Some(Requirement { count: 3, category: Tags::one(Category::Bird) });
        animals.push(owl);

        for (id, biome) in [("panda", Biome::MontaneForest), ("pangolin", Biome::DryForest)] {
            let mut locked = animal(id, Level::Two, &[biome], &[Category::Xenarthran], 1);
            locked.is_popularity_locked = true;
            animals.push(locked);
        }

        co.push(co_species("heron", CoSpeciesSize::Small, &[Biome::Water, Biome::Savannah], Category::Bird));

        let park = NationalPark {
            id: "test-park".to_owned(),
            name: "Test Park".to_owned(),
            game: Edition::Base,
            biome: Biome::Savannah,
            required_animals: vec!["savannah-1-0".to_owned(), "savannah-large".to_owned()],
            optional_animals: vec![vec!["water-2-1".to_owned(), "water-2-2".to_owned()]],
        };
        let reference = SampleBoard {
            name: "Base Game".to_owned(),
            description: None,
            board: BoardIds {
                level1: vec!["savannah-1-0".to_owned(), "water-1-1".to_owned()],
                ..Default::default()
            },
        };

        Catalogue::new(animals, co).unwrap()
            .with_national_parks(vec![park])
            .with_sample_boards(vec![reference])
    }

    fn pick<'c>(catalogue: &'c Catalogue, ids: &[&str]) -> Vec<&'c Animal> {
        ids.iter().map(|id| catalogue.find_animal(id).unwrap()).collect()
    }

    fn assert_tier_sizes(board: &Board<'_>, targets: &TierTargets) {
        for level in Level::VARIANTS {
            assert_eq!(board.tier(*level).len(), targets.get(*level), "Level {level}");
            assert!(board.tier(*level).iter().all(|a| a.level == *level));
        }
    }

    #[test]
    fn lcg_follows_recurrence() {
        let mut lcg = Lcg::new(1);
        assert_eq!(lcg.next_f64(), 58598.0 / 233280.0);
        assert_eq!(lcg.next_f64(), 127215.0 / 233280.0);
    }

    #[test]
    fn shuffle_is_fisher_yates() {
        let mut zeros = FixedSequence::new(vec![0.0]);
        assert_eq!(shuffle(&[1, 2, 3, 4], &mut zeros), vec![2, 3, 4, 1]);

        let mut lcg = Lcg::new(9);
        let shuffled = shuffle(&[1, 2, 3, 4, 5, 6], &mut lcg);
        assert_eq!(shuffled.iter().copied().collect::<BTreeSet<_>>(), (1..=6).collect::<BTreeSet<_>>());
    }

    #[test]
    fn fallback_biome_sums_code_units() {
        // 'a' + 'b' = 195
        assert_eq!(fallback_biome("ab", &[Biome::Savannah, Biome::Water]), Biome::Water);
        assert_eq!(fallback_biome("ab", &[Biome::Savannah, Biome::Water, Biome::Rainforest]), Biome::Savannah);
    }

    #[test]
    fn polymorphic_fields_parse() {
        assert_eq!(serde_json::from_str::<GroupSize>("2").unwrap(), GroupSize::Exact(2));
        assert_eq!(serde_json::from_str::<GroupSize>("\"3+\"").unwrap(), GroupSize::AtLeast(3));
        assert!(serde_json::from_str::<GroupSize>("\"many\"").is_err());

        let one: Tags<Biome> = serde_json::from_str("\"Tundra & Steppe\"").unwrap();
        assert_eq!(&*one, &[Biome::TundraSteppe]);
        let many: Tags<Biome> = serde_json::from_str("[\"Water\", \"Savannah\"]").unwrap();
        assert_eq!(*many.primary(), Biome::Water);
        assert!(serde_json::from_str::<Tags<Biome>>("[]").is_err());

        assert!(serde_json::from_str::<Level>("4").is_err());
        assert_eq!(serde_json::from_str::<CoSpeciesSize>("2").unwrap(), CoSpeciesSize::Large);
    }

    #[test]
    fn bundled_catalogue_loads() {
        let catalogue = Catalogue::bundled().unwrap();
        assert_eq!(catalogue.animals.len(), 46);
        assert_eq!(catalogue.co_species.len(), 23);
        assert_eq!(catalogue.national_parks.len(), 10);

        let vulture = catalogue.find_animal("bearded-vulture").unwrap();
        let requirement = vulture.requirement.as_ref().unwrap();
        assert_eq!(requirement.count, 3);
        assert!(requirement.category.contains(&Category::Bird));
        assert_eq!(catalogue.find_animal("walrus").unwrap().cost_per_tile, None);

        assert!(!catalogue.reference_group_sizes("Base Game").is_empty());
        assert!(catalogue.reference_group_sizes("No Such Board").is_empty());

        let pantanal = catalogue.find_park("pantanal").unwrap();
        assert!(pantanal.representative_ids().iter().any(|id| catalogue.find_co_species(id).is_some()));

        // the reference data has a single Level III animal, so no full board can be drawn from it
        assert_eq!(catalogue.animals.iter().filter(|a| a.level == Level::Three).count(), 1);
        let failure = Generator::new(&catalogue)
            .generate(GenerationOptions::new().seed(1).max_attempts(5))
            .unwrap_err();
        assert!(matches!(
            failure,
            GenerationFailure::Exhausted { last_abandon: Some(Abandon::TierShort { level: Level::Three, target: 5, .. }), .. }
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let a = animal("dup", Level::One, &[Biome::Water], &[Category::Fish], 1);
        assert!(matches!(
            Catalogue::new(vec![a.clone(), a], Vec::new()),
            Err(CatalogueError::DuplicateId { kind: "animal", .. })
        ));
    }

    #[test]
    fn seeded_strict_generation_is_valid() {
        let catalogue = fixture();
        let board = Generator::new(&catalogue)
            .generate(GenerationOptions::new().seed(1).strict(true))
            .unwrap();

        assert_tier_sizes(&board, &TierTargets::default());
        let result = ValidationRules::default().validate(&board, None);
        assert!(result.valid, "{:?}", result.errors);
        assert_eq!(result.critical_warnings(), 0);

        let assignments = board.biome_assignments.as_ref().unwrap();
        assert_eq!(assignments.len(), board.members().count());
        assert!(board.members().all(|m| m.has_biome(board.assigned_biome(m))));
        assert!(board.co_species.iter().filter(|c| c.is_small()).count() <= 5);
    }

    #[test]
    fn same_seed_same_board() {
        let catalogue = fixture();
        let generator = Generator::new(&catalogue);
        let options = GenerationOptions::new().seed(42).clone();
        let first = generator.generate(&options).unwrap();
        let second = generator.generate(&options).unwrap();
        assert_eq!(first.ids(), second.ids());
    }

    #[test]
    fn focus_biomes_restrict_and_lead() {
        let catalogue = fixture();
        let focus = [Biome::Savannah, Biome::Water, Biome::DryForest];
        let mut options = GenerationOptions::new();
        options.seed(7);
        focus.iter().for_each(|b| { options.focus(*b); });

        let board = Generator::new(&catalogue).generate(&options).unwrap();
        assert_tier_sizes(&board, &TierTargets::default());
        assert!(board.animals().all(|a| a.in_any_biome(&focus)));
        assert!(board.co_species.iter().all(|c| c.in_any_biome(&focus)));
        for biome in focus {
            assert!(board.level1.iter().any(|a| a.has_biome(biome)), "{biome} has no Level I animal");
        }
        let assignments = board.biome_assignments.as_ref().unwrap();
        assert!(assignments.values().all(|b| focus.contains(b)));
    }

    #[test]
    fn required_overflow_fails_immediately() {
        let catalogue = fixture();
        let mut options = GenerationOptions::new();
        for biome in [Biome::Savannah, Biome::Water] {
            for i in 0..5 {
                options.require(format!("{}-1-{i}", biome.slug()));
            }
        }

        assert_eq!(
            Generator::new(&catalogue).generate(&options),
            Err(GenerationFailure::RequiredOverflow { level: Level::One, required: 10, capacity: 9 })
        );
    }

    #[test]
    fn required_ids_are_placed() {
        let catalogue = fixture();
        let board = Generator::new(&catalogue)
            .generate(GenerationOptions::new().seed(5).require("water-3-0").require("savannah-large").require("no-such-animal"))
            .unwrap();
        assert!(board.level3.iter().any(|a| a.id == "water-3-0"));
        assert!(board.co_species.iter().any(|c| c.id == "savannah-large"));
    }

    #[test]
    fn preserved_park_seeds_representatives() {
        let catalogue = fixture();
        let board = Generator::new(&catalogue)
            .generate(GenerationOptions::new().seed(11).preserve_park("test-park"))
            .unwrap();

        let park = catalogue.find_park("test-park").unwrap();
        for id in park.representative_ids() {
            assert!(board.contains(&id), "{id} missing");
        }
        assert!(park.status(&board).complete);
    }

    #[test]
    fn required_co_species_fill_their_biome() {
        let catalogue = fixture();
        let board = Generator::new(&catalogue)
            .generate(GenerationOptions::new().seed(11).require("savannah-small").require("savannah-large").require("savannah-1-0"))
            .unwrap();

        assert!(board.contains("savannah-small") && board.contains("savannah-large"));
        assert_eq!(board.co_species.iter().filter(|c| c.has_biome(Biome::Savannah)).count(), 2);
        assert!(ValidationRules::default().validate(&board, None).valid);
    }

    fn tiny_rules(level1: usize, level2: usize) -> ValidationRules {
        ValidationRules { tier_targets: TierTargets { level1, level2, level3: 0 }, ..Default::default() }
    }

    #[test]
    fn leaderless_biome_is_abandoned() {
        let catalogue = Catalogue::new(
            vec![
                animal("lead", Level::One, &[Biome::Savannah], &[Category::Carnivore], 1),
                animal("seal-0", Level::Two, &[Biome::Water], &[Category::Aquatic], 1),
                animal("seal-1", Level::Two, &[Biome::Water], &[Category::Aquatic], 1),
                animal("seal-2", Level::Two, &[Biome::Water], &[Category::Aquatic], 1),
            ],
            vec![
                co_species("savannah-small", CoSpeciesSize::Small, &[Biome::Savannah], Category::Invertebrate),
                co_species("water-small", CoSpeciesSize::Small, &[Biome::Water], Category::Fish),
            ],
        ).unwrap();

        let failure = Generator::new(&catalogue)
            .with_acceptance(tiny_rules(1, 3))
            .generate(GenerationOptions::new().seed(1).max_attempts(2))
            .unwrap_err();
        assert_eq!(failure, GenerationFailure::Exhausted {
            attempts: 2,
            last_abandon: Some(Abandon::LeaderlessBiome(Biome::Water)),
        });
    }

    #[test]
    fn critical_warnings_tolerated_late_in_search() {
        let mut locked = animal("locked", Level::Two, &[Biome::Savannah], &[Category::Xenarthran], 1);
        locked.is_popularity_locked = true;
        let catalogue = Catalogue::new(
            vec![animal("lead", Level::One, &[Biome::Savannah], &[Category::Carnivore], 1), locked],
            vec![co_species("savannah-small", CoSpeciesSize::Small, &[Biome::Savannah], Category::Invertebrate)],
        ).unwrap();
        let generator = Generator::new(&catalogue).with_acceptance(tiny_rules(1, 1));

        // attempt 1000 is the last one held to zero critical warnings
        let failure = generator.generate(GenerationOptions::new().seed(1).max_attempts(1001)).unwrap_err();
        assert_eq!(failure, GenerationFailure::Exhausted {
            attempts: 1001,
            last_abandon: Some(Abandon::CriticalWarnings(1)),
        });

        let board = generator.generate(GenerationOptions::new().seed(1).max_attempts(1002)).unwrap();
        assert_eq!(board.level2[0].id, "locked");
        assert_eq!(tiny_rules(1, 1).validate(&board, None).critical_warnings(), 1);
    }

    #[test]
    fn strict_extras_respect_biome_cap() {
        let catalogue = Catalogue::new(
            vec![animal("lead", Level::One, &[Biome::Savannah], &[Category::Carnivore], 1)],
            vec![
                co_species("a", CoSpeciesSize::Small, &[Biome::Savannah], Category::Fish),
                co_species("b", CoSpeciesSize::Small, &[Biome::Savannah], Category::Invertebrate),
                co_species("c", CoSpeciesSize::Large, &[Biome::Savannah], Category::Aquatic),
            ],
        ).unwrap();
        let rules = ValidationRules { viable_biome_size: 5, ..tiny_rules(1, 0) };

        let board = Generator::new(&catalogue)
            .with_acceptance(rules)
            .generate_with(GenerationOptions::new().strict(true), &mut FixedSequence::new(vec![0.0]))
            .unwrap();
        assert_eq!(board.co_species.len(), 2);
    }

    #[test]
    fn strict_extras_skip_crowded_categories() {
        let birds = (0..4)
            .map(|i| animal(&format!("bird-{i}"), Level::One, &[Biome::Savannah], &[Category::Bird], 1))
            .collect();
        let catalogue = Catalogue::new(birds, vec![
            co_species("bird-a", CoSpeciesSize::Small, &[Biome::Savannah], Category::Bird),
            co_species("bird-b", CoSpeciesSize::Small, &[Biome::Savannah], Category::Bird),
            co_species("fish", CoSpeciesSize::Small, &[Biome::Savannah], Category::Fish),
        ]).unwrap();
        let rules = ValidationRules { viable_biome_size: 10, co_species_per_biome_cap: 3, ..tiny_rules(4, 0) };

        // zeros shuffle the co-species to bird-b, fish, bird-a
        let board = Generator::new(&catalogue)
            .with_acceptance(rules)
            .generate_with(GenerationOptions::new().strict(true), &mut FixedSequence::new(vec![0.0]))
            .unwrap();
        assert_eq!(board.co_species.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), ["bird-b", "fish"]);
    }

    #[test]
    fn gated_animals_wait_for_their_requirement() {
        let mut owl = animal("owl", Level::Two, &[Biome::Savannah], &[Category::Bird], 1);
        owl.requirement = Some(Requirement { count: 1, category: Tags::one(Category::Bird) });
        let catalogue_with = |lead: Category| Catalogue::new(
            vec![
                animal("lead", Level::One, &[Biome::Savannah], &[lead], 1),
                animal("plain", Level::Two, &[Biome::Savannah], &[Category::Ungulate], 1),
                owl.clone(),
            ],
            vec![co_species("savannah-small", CoSpeciesSize::Small, &[Biome::Savannah], Category::Invertebrate)],
        ).unwrap();

        // zeros put the owl ahead of the plain animal
        let without_birds = catalogue_with(Category::Carnivore);
        let board = Generator::new(&without_birds)
            .with_acceptance(tiny_rules(1, 1))
            .generate_with(&GenerationOptions::new(), &mut FixedSequence::new(vec![0.0]))
            .unwrap();
        assert_eq!(board.level2[0].id, "plain");

        let with_bird = catalogue_with(Category::Bird);
        let board = Generator::new(&with_bird)
            .with_acceptance(tiny_rules(1, 1))
            .generate_with(&GenerationOptions::new(), &mut FixedSequence::new(vec![0.0]))
            .unwrap();
        assert_eq!(board.level2[0].id, "owl");
    }

    #[test]
    fn focused_strict_search_never_skips_coverage() {
        let full = fixture();
        let co = full.co_species.iter()
            .filter(|c| c.id != "tundra-steppe-small")
            .cloned()
            .collect();
        let catalogue = Catalogue::new(full.animals.clone(), co).unwrap();
        let focus = [Biome::TundraSteppe, Biome::MontaneForest, Biome::Rainforest, Biome::Savannah];
        let mut options = GenerationOptions::new();
        options.seed(21).strict(true).max_attempts(2000);
        focus.iter().for_each(|b| { options.focus(*b); });

        match Generator::new(&catalogue).generate(&options) {
            Ok(board) => {
                let pool = catalogue.co_species.iter().filter(|c| c.in_any_biome(&focus)).collect::<Vec<_>>();
                let result = ValidationRules::default().validate(&board, Some(&pool));
                assert!(result.valid, "{:?}", result.errors);
                for biome in focus.iter().filter(|b| board.animals().any(|a| a.has_biome(**b))) {
                    assert!(board.co_species.iter().any(|c| c.has_biome(*biome)), "{biome} has no co-species");
                }
            }
            Err(failure) => assert!(matches!(failure, GenerationFailure::Exhausted { attempts: 2000, .. })),
        }
    }

    #[test]
    fn compatible_with_reference_filters_pool() {
        let catalogue = fixture();
        let sizes = catalogue.reference_group_sizes("Base Game");
        assert_eq!(sizes, BTreeSet::from([GroupSize::Exact(1), GroupSize::Exact(2)]));

        let board = Generator::new(&catalogue)
            .generate(GenerationOptions::new().seed(3).compatible_with_reference(true))
            .unwrap();
        assert!(board.animals().all(|a| a.shares_group_size(&sizes)));
    }

    #[test]
    fn exhausted_search_reports_last_abandon() {
        let catalogue = fixture();
        let failure = Generator::new(&catalogue)
            .generate(GenerationOptions::new().seed(1).focus(Biome::Savannah).max_attempts(3))
            .unwrap_err();

        match failure {
            GenerationFailure::Exhausted { attempts, last_abandon } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last_abandon, Some(Abandon::TierShort { level: Level::One, filled: 5, target: 9 })));
            }
            other => panic!("unexpected failure {other}"),
        }
    }

    #[test]
    fn unmet_requirement_is_reported() {
        let catalogue = fixture();
        let board = Board { level2: pick(&catalogue, &["eagle-owl"]), ..Default::default() };
        let result = ValidationRules::default().validate(&board, None);

        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| matches!(e, Violation::UnmetRequirement { count: 3, .. })));
        assert!(result.report().errors.contains(&"Eagle Owl requires 3 Birds".to_owned()));
    }

    #[test]
    fn empty_board_misses_every_tier() {
        let result = ValidationRules::default().validate(&Board::default(), None);
        assert!(!result.valid);
        assert_eq!(result.errors, vec![
            Violation::TierCount { level: Level::One, actual: 0, expected: 9 },
            Violation::TierCount { level: Level::Two, actual: 0, expected: 10 },
            Violation::TierCount { level: Level::Three, actual: 0, expected: 5 },
        ]);
        assert!(result.warnings.is_empty());

        let base = ValidationRules::base_game().validate(&Board::default(), None);
        assert!(base.report().errors.contains(&"Level 2 must have exactly 9 animals (currently 0)".to_owned()));
    }

    #[test]
    fn co_species_caps_are_violations() {
        let catalogue = fixture();
        let smalls = Biome::VARIANTS.iter()
            .map(|b| catalogue.find_co_species(&format!("{}-small", b.slug())).unwrap())
            .collect();
        let result = ValidationRules::default().validate(&Board { co_species: smalls, ..Default::default() }, None);
        assert!(result.errors.contains(&Violation::SmallCoSpecies { actual: 6, cap: 5 }));

        let crowded = ["water-small", "water-large", "heron"].iter()
            .map(|id| catalogue.find_co_species(id).unwrap())
            .collect();
        let result = ValidationRules::default().validate(&Board { co_species: crowded, ..Default::default() }, None);
        assert!(result.errors.contains(&Violation::CoSpeciesPerBiome { biome: Biome::Water, actual: 3, cap: 2 }));
    }

    #[test]
    fn missing_co_species_depends_on_available_pool() {
        let catalogue = fixture();
        let board = Board { level1: pick(&catalogue, &["water-1-0"]), ..Default::default() };

        let unrestricted = ValidationRules::default().validate(&board, None);
        assert!(unrestricted.errors.contains(&Violation::MissingCoSpecies { biome: Biome::Water }));

        let restricted = ValidationRules::default().validate(&board, Some(&[]));
        assert!(!restricted.errors.iter().any(|e| matches!(e, Violation::MissingCoSpecies { .. })));
    }

    #[test]
    fn advisories_do_not_invalidate() {
        let catalogue = fixture();
        let board = Board { level2: pick(&catalogue, &["panda"]), ..Default::default() };
        let result = ValidationRules::default().validate(&board, None);

        assert!(result.warnings.contains(&Advisory::PopularityLocked { count: 1 }));
        assert!(result.warnings.contains(&Advisory::UnviableBiome { biome: Biome::MontaneForest, count: 1, needed: 3 }));
        assert_eq!(result.critical_warnings(), 1);
        assert!(result.report().warnings
            .contains(&"Montane Forest has 1 species (needs at least 3 to be viable)".to_owned()));
    }

    #[test]
    fn legacy_advisories_are_opt_in() {
        let catalogue = fixture();
        let board = Board { level2: pick(&catalogue, &["savannah-2-0", "savannah-2-1"]), ..Default::default() };
        assert!(ValidationRules::default().validate(&board, None).warnings.iter()
            .all(|w| matches!(w, Advisory::UnviableBiome { .. })));

        let rules = ValidationRules { level1_per_biome: Some(1..=2), category_anchor: true, ..Default::default() };
        let warnings = rules.validate(&board, None).warnings;
        assert!(warnings.contains(&Advisory::Level1Distribution { biome: Biome::Savannah, count: 0, range: 1..=2 }));
        assert!(warnings.iter().any(|w| matches!(w, Advisory::UnanchoredCategory { .. })));
    }

    #[test]
    fn validation_is_idempotent() {
        let catalogue = fixture();
        let board = Generator::new(&catalogue).generate(GenerationOptions::new().seed(8)).unwrap();
        let snapshot = board.clone();

        let rules = ValidationRules::default();
        assert_eq!(rules.validate(&board, None), rules.validate(&board, None));
        assert_eq!(board, snapshot);
    }

    #[test]
    fn injector_swaps_without_mutating() {
        let catalogue = fixture();
        let mut board = Board {
            level2: pick(&catalogue, &["savannah-2-0", "montane-forest-2-0", "water-2-0"]),
            ..Default::default()
        };
        board.biome_assignments = Some([("montane-forest-2-0".to_owned(), Biome::MontaneForest)].into_iter().collect());
        let snapshot = board.clone();

        let injected = inject_popularity_locked(&board, &catalogue.animals, 1, &[], &TierTargets::default());
        assert_eq!(board, snapshot);
        assert_eq!(injected.level2.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), ["savannah-2-0", "panda", "water-2-0"]);

        let assignments = injected.biome_assignments.as_ref().unwrap();
        assert_eq!(assignments.get("panda"), Some(&Biome::MontaneForest));
        assert!(!assignments.contains_key("montane-forest-2-0"));
    }

    #[test]
    fn injector_prefers_focus_and_appends_when_room() {
        let catalogue = fixture();
        let board = Board { level2: pick(&catalogue, &["savannah-2-0"]), ..Default::default() };

        let focused = inject_popularity_locked(&board, &catalogue.animals, 1, &[Biome::DryForest], &TierTargets::default());
        assert_eq!(focused.level2.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), ["pangolin"]);

        let unmatched_focus = inject_popularity_locked(&board, &catalogue.animals, 1, &[Biome::Water], &TierTargets::default());
        assert!(unmatched_focus.level2.iter().any(|a| a.id == "panda"));

        // the second injection finds only a locked animal left to replace, so it appends
        let both = inject_popularity_locked(&board, &catalogue.animals, 2, &[], &TierTargets::default());
        assert_eq!(both.level2.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), ["panda", "pangolin"]);
    }

    #[test]
    #[should_panic]
    fn injector_rejects_bad_count() {
        let catalogue = fixture();
        inject_popularity_locked(&Board::default(), &catalogue.animals, 3, &[], &TierTargets::default());
    }

    #[test]
    fn parks_of_five_are_diverse() {
        let catalogue = fixture();
        let animals = catalogue.animals.iter().filter(|a| a.has_biome(Biome::Savannah)).collect::<Vec<_>>();
        let co = catalogue.co_species.iter().collect::<Vec<_>>();
        let mut options = ParkOptions::new();
        options.size(ParkSize::Five).focus(Biome::Savannah);

        let parks = generate_balanced_parks_with(&animals, &co, &options, &mut Lcg::new(11));
        assert!(!parks.is_empty() && parks.len() <= 3);
        for park in &parks {
            assert_eq!(park.animal_ids.len(), 5);
            let members = pick(&catalogue, &park.animal_ids.iter().map(String::as_str).collect::<Vec<_>>());
            let categories = members.iter().flat_map(|a| a.categories().iter().copied()).collect::<BTreeSet<_>>();
            assert!(categories.len() >= 3);
            assert_eq!(park.biome, Biome::Savannah);
            assert_eq!(park.name, "Custom Park (Savannah)");
            assert!(park.id.starts_with("generated-park-savannah-"));
            assert_eq!(park.co_species_ids.len(), 1);
            assert!(park.score > 0.5 && park.score <= 1.0);
        }
    }

    #[test]
    fn locked_park_is_trimmed_to_four() {
        let catalogue = fixture();
        let animals = pick(&catalogue, &["panda", "montane-forest-1-0", "montane-forest-1-1", "montane-forest-1-2", "montane-forest-1-3"]);
        let co = vec![catalogue.find_co_species("montane-forest-small").unwrap()];
        let mut options = ParkOptions::new();
        options.count(1).focus(Biome::MontaneForest);

        let parks = generate_balanced_parks_with(&animals, &co, &options, &mut Lcg::new(2));
        assert_eq!(parks.len(), 1);
        assert_eq!(parks[0].animal_ids.len(), 4);
        assert!(parks[0].animal_ids.iter().any(|id| id == "panda"));
        assert!(parks[0].co_species_ids.is_empty());
    }

    #[test]
    fn too_small_pool_yields_no_parks() {
        let catalogue = fixture();
        let animals = pick(&catalogue, &["water-1-0", "water-1-1"]);
        let parks = generate_balanced_parks_with(&animals, &[], &ParkOptions::new(), &mut Lcg::new(4));
        assert!(parks.is_empty());
    }

    #[test]
    fn park_score_weights() {
        let catalogue = fixture();
        // Reptile and Carnivore, half on Savannah, both Level I
        let animals = pick(&catalogue, &["savannah-1-0", "water-1-0"]);
        assert!((score_park(&animals, Biome::Savannah) - 0.4).abs() < 1e-9);

        let higher = pick(&catalogue, &["savannah-1-0", "savannah-3-0"]);
        assert!((score_park(&higher, Biome::Savannah) - 0.85).abs() < 1e-9);
    }

    #[test]
    fn national_park_status_lists_alternatives() {
        let catalogue = fixture();
        let park = catalogue.find_park("test-park").unwrap();
        assert_eq!(park.representative_ids(), ["savannah-1-0", "savannah-large", "water-2-1"]);

        let empty = park.status(&Board::default());
        assert!(!empty.complete);
        assert_eq!(empty.missing, ["savannah-1-0", "savannah-large", "(water-2-1 OR water-2-2)"]);
        assert_eq!(empty.has_alternative, [false]);

        let board = Board {
            level1: pick(&catalogue, &["savannah-1-0"]),
            level2: pick(&catalogue, &["water-2-2"]),
            co_species: vec![catalogue.find_co_species("savannah-large").unwrap()],
            ..Default::default()
        };
        let status = park.status(&board);
        assert!(status.complete);
        assert_eq!(status.has_alternative, [true]);
    }

    #[test]
    fn board_ids_resolve_and_display() {
        let catalogue = fixture();
        let ids = BoardIds {
            level1: vec!["river-otter".to_owned(), "not-an-animal".to_owned()],
            co_species: vec!["heron".to_owned()],
            ..Default::default()
        };
        let board = Board::from_ids(&catalogue, &ids);
        assert_eq!(board.level1.len(), 1);
        assert_eq!(Board::from_ids(&catalogue, &board.ids()), board);

        // no assignments: "river-otter" sums to 1155, odd, so the second biome
        assert_eq!(board.assigned_biome(board.level1[0]), Biome::Rainforest);
        let text = format!("{board}");
        assert!(text.starts_with("Level I (1): river-otter [Rainforest]\n"));
        assert!(text.ends_with("Co-species (1): heron [Water]\n"));
    }
}
