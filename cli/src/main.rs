//! `menagerie` - build, check and carve up zoo boards from the command line.
//!
//! ```bash
//! # A reproducible strict board, restricted to two biomes
//! menagerie generate --seed 7 --strict --focus savannah --focus water
//!
//! # Keep a national park intact, swap in one popularity-locked animal, then suggest parks
//! menagerie generate --preserve pantanal --inject 1 --parks 3 --json > board.json
//!
//! # Check a saved board
//! menagerie validate board.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use strum::VariantArray;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use menagerie::catalogue::REFERENCE_BOARD;
use menagerie::injector::inject_popularity_locked;
use menagerie::parks::{generate_balanced_parks, Park, ParkOptions, ParkSize};
use menagerie::validation::ValidationReport;
use menagerie::{Biome, Board, BoardIds, Catalogue, GenerationOptions, Generator, ValidationRules};

/// Zoo board builder
#[derive(Parser)]
#[command(name = "menagerie")]
#[command(about = "Generate and validate zoo boards")]
#[command(version)]
struct Cli {
    /// Catalogue JSON to use instead of the bundled one
    #[arg(long, global = true)]
    catalogue: Option<PathBuf>,
    /// Log search progress (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a board that satisfies every rule
    Generate(GenerateArgs),
    /// Check a board saved as JSON
    Validate {
        /// Board JSON file (level1, level2, level3, coSpecies)
        board: PathBuf,
        /// Use the base game's tier sizes
        #[arg(long)]
        base_game: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show national-park completeness for a board saved as JSON
    Parks {
        /// Board JSON file
        board: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Seed for a reproducible search
    #[arg(long)]
    seed: Option<u64>,
    /// Spend a larger budget and chase viable biomes
    #[arg(long)]
    strict: bool,
    /// Animal or co-species id that must appear (repeatable)
    #[arg(long = "require", value_name = "ID")]
    required: Vec<String>,
    /// Only use this biome (repeatable)
    #[arg(long, value_parser = parse_biome)]
    focus: Vec<Biome>,
    /// Only use animals whose group sizes appear on the base game board
    #[arg(long)]
    compatible: bool,
    /// National park id to keep intact (repeatable)
    #[arg(long = "preserve", value_name = "PARK")]
    preserved: Vec<String>,
    /// Use the base game's tier sizes
    #[arg(long)]
    base_game: bool,
    /// Swap in this many popularity-locked animals afterwards
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    inject: Option<u8>,
    /// Suggest this many parks from the finished board
    #[arg(long)]
    parks: Option<usize>,
    /// Animals per suggested park
    #[arg(long, default_value = "5", value_parser = parse_park_size)]
    park_size: ParkSize,
    /// Give up after this many attempts
    #[arg(long)]
    max_attempts: Option<usize>,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateOutput {
    board: BoardIds,
    validation: ValidationReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parks: Vec<Park>,
}

fn parse_biome(s: &str) -> Result<Biome, String> {
    let wanted = s.trim().to_lowercase();
    Biome::VARIANTS.iter()
        .copied()
        .find(|b| b.slug() == wanted || b.to_string().to_lowercase() == wanted)
        .ok_or_else(|| format!("unknown biome {s:?}"))
}

fn parse_park_size(s: &str) -> Result<ParkSize, String> {
    s.parse::<u8>().map_err(|e| e.to_string())?.try_into()
}

fn rules(base_game: bool) -> ValidationRules {
    if base_game { ValidationRules::base_game() } else { ValidationRules::default() }
}

fn load_catalogue(path: Option<&Path>) -> Result<Catalogue> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Catalogue::from_json(&json).with_context(|| format!("loading catalogue {}", path.display()))
        }
        None => Catalogue::bundled().context("loading the bundled catalogue"),
    }
}

fn load_board<'c>(catalogue: &'c Catalogue, path: &Path) -> Result<Board<'c>> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let ids: BoardIds = serde_json::from_str(&json).with_context(|| format!("parsing board {}", path.display()))?;
    Ok(Board::from_ids(catalogue, &ids))
}

fn generate(catalogue: &Catalogue, args: &GenerateArgs) -> Result<()> {
    let rules = rules(args.base_game);
    let mut options = GenerationOptions::new();
    options.strict(args.strict).compatible_with_reference(args.compatible);
    if let Some(seed) = args.seed {
        options.seed(seed);
    }
    if let Some(attempts) = args.max_attempts {
        options.max_attempts(attempts);
    }
    args.required.iter().for_each(|id| { options.require(id.as_str()); });
    args.focus.iter().for_each(|biome| { options.focus(*biome); });
    args.preserved.iter().for_each(|park| { options.preserve_park(park.as_str()); });
    debug!(?options, "generating");

    let mut board = Generator::new(catalogue)
        .with_acceptance(rules.clone())
        .generate(&options)?;

    if let Some(count) = args.inject {
        board = inject_popularity_locked(&board, &catalogue.animals, usize::from(count), &args.focus, &rules.tier_targets);
    }

    let parks = match args.parks {
        Some(count) => {
            let mut park_options = ParkOptions::new();
            park_options.count(count).size(args.park_size);
            if let Some(seed) = args.seed {
                park_options.seed(seed);
            }
            args.focus.iter().for_each(|biome| { park_options.focus(*biome); });
            if args.compatible {
                park_options.reference_group_sizes(catalogue.reference_group_sizes(REFERENCE_BOARD));
            }
            let animals: Vec<_> = board.animals().collect();
            generate_balanced_parks(&animals, &board.co_species, &park_options)
        }
        None => Vec::new(),
    };

    let validation = rules.validate(&board, None).report();
    if args.json {
        let output = GenerateOutput { board: board.ids(), validation, parks };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{board}");
    print_report(&validation);
    for park in &parks {
        println!("{} (score {:.2}): {}", park.name, park.score, park.animal_ids.iter().chain(&park.co_species_ids).cloned().collect::<Vec<_>>().join(", "));
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("{}", if report.valid { "valid" } else { "INVALID" });
    report.errors.iter().for_each(|e| println!("  error: {e}"));
    report.warnings.iter().for_each(|w| println!("  warning: {w}"));
}

fn run(cli: Cli) -> Result<()> {
    let catalogue = load_catalogue(cli.catalogue.as_deref())?;

    match &cli.command {
        Commands::Generate(args) => generate(&catalogue, args),
        Commands::Validate { board, base_game, json } => {
            let board = load_board(&catalogue, board)?;
            let report = rules(*base_game).validate(&board, None).report();
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if !report.valid {
                bail!("board is invalid");
            }
            Ok(())
        }
        Commands::Parks { board, json } => {
            let board = load_board(&catalogue, board)?;
            if *json {
                let statuses: Vec<_> = catalogue.national_parks.iter()
                    .map(|park| serde_json::json!({ "id": park.id, "name": park.name, "status": park.status(&board) }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&statuses)?);
                return Ok(());
            }
            for park in &catalogue.national_parks {
                let status = park.status(&board);
                if status.complete {
                    println!("{}: complete", park.name);
                } else {
                    println!("{}: missing {}", park.name, status.missing.join(", "));
                }
            }
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}
