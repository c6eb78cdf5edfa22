//! JavaScript bindings. Every value crosses the boundary as JSON in the catalogue's camelCase field names.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::board::{Board, BoardIds};
use crate::catalogue::{Biome, Catalogue, REFERENCE_BOARD};
use crate::generator::{GenerationOptions, Generator};
use crate::injector::inject_popularity_locked;
use crate::national_park::ParkStatus;
use crate::parks::{generate_balanced_parks, Park, ParkOptions};
use crate::validation::{ValidationReport, ValidationRules};

fn from_js<T: DeserializeOwned + Default>(value: &JsValue) -> Result<T, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    let text: String = js_sys::JSON::stringify(value)
        .map_err(|_| JsError::new("argument is not JSON-serialisable"))?
        .into();
    Ok(serde_json::from_str(&text)?)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    let text = serde_json::to_string(value)?;
    js_sys::JSON::parse(&text).map_err(|_| JsError::new("could not hand the result back to JavaScript"))
}

fn rules(base_game: bool) -> ValidationRules {
    if base_game { ValidationRules::base_game() } else { ValidationRules::default() }
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(flatten)]
    options: GenerationOptions,
    base_game: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    board: Option<BoardIds>,
    validation: Option<ValidationReport>,
    failure: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ParksRequest {
    board: BoardIds,
    #[serde(flatten)]
    options: ParkOptions,
    compatible_with_base_game: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NamedParkStatus<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(flatten)]
    status: ParkStatus,
}

/// A loaded catalogue, kept on the Rust side so each call does not re-parse it.
#[wasm_bindgen(js_name = Catalogue)]
pub struct CatalogueHandle {
    catalogue: Catalogue,
}

#[wasm_bindgen(js_class = Catalogue)]
impl CatalogueHandle {
    /// Parse a catalogue from its JSON text.
    #[wasm_bindgen(constructor)]
    pub fn new(json: &str) -> Result<CatalogueHandle, JsError> {
        Ok(Self { catalogue: Catalogue::from_json(json)? })
    }

    /// The reference data compiled into the module.
    pub fn bundled() -> Result<CatalogueHandle, JsError> {
        Ok(Self { catalogue: Catalogue::bundled()? })
    }

    /// Search for a board. A search that runs out of attempts is reported in `failure`, not thrown.
    #[wasm_bindgen(js_name = generateBoard)]
    pub fn generate_board(&self, request: JsValue) -> Result<JsValue, JsError> {
        let request: GenerateRequest = from_js(&request)?;
        let rules = rules(request.base_game);
        let generator = Generator::new(&self.catalogue).with_acceptance(rules.clone());
        let response = match generator.generate(&request.options) {
            Ok(board) => GenerateResponse {
                validation: Some(rules.validate(&board, None).report()),
                board: Some(board.ids()),
                failure: None,
            },
            Err(failure) => GenerateResponse { board: None, validation: None, failure: Some(failure.to_string()) },
        };
        to_js(&response)
    }

    /// Validate an id-form board.
    #[wasm_bindgen(js_name = validateBoard)]
    pub fn validate_board(&self, board: JsValue, base_game: bool) -> Result<JsValue, JsError> {
        let ids: BoardIds = from_js(&board)?;
        let board = Board::from_ids(&self.catalogue, &ids);
        to_js(&rules(base_game).validate(&board, None).report())
    }

    /// Parks built from the animals and co-species of `request.board`.
    #[wasm_bindgen(js_name = generateBalancedParks)]
    pub fn generate_balanced_parks(&self, request: JsValue) -> Result<JsValue, JsError> {
        let mut request: ParksRequest = from_js(&request)?;
        if request.compatible_with_base_game {
            request.options.reference_group_sizes = Some(self.catalogue.reference_group_sizes(REFERENCE_BOARD));
        }
        let board = Board::from_ids(&self.catalogue, &request.board);
        let animals: Vec<_> = board.animals().collect();
        let parks: Vec<Park> = generate_balanced_parks(&animals, &board.co_species, &request.options);
        to_js(&parks)
    }

    /// A copy of `board` with one or two popularity-locked animals swapped in.
    #[wasm_bindgen(js_name = injectPopularityLocked)]
    pub fn inject_popularity_locked(&self, board: JsValue, count: usize, focus: JsValue, base_game: bool) -> Result<JsValue, JsError> {
        if !matches!(count, 1 | 2) {
            return Err(JsError::new("count must be 1 or 2"));
        }
        let ids: BoardIds = from_js(&board)?;
        let focus: Vec<Biome> = from_js(&focus)?;
        let board = Board::from_ids(&self.catalogue, &ids);
        let injected = inject_popularity_locked(&board, &self.catalogue.animals, count, &focus, &rules(base_game).tier_targets);
        to_js(&injected.ids())
    }

    /// Completeness of every national-park template against `board`.
    #[wasm_bindgen(js_name = nationalParkStatus)]
    pub fn national_park_status(&self, board: JsValue) -> Result<JsValue, JsError> {
        let ids: BoardIds = from_js(&board)?;
        let board = Board::from_ids(&self.catalogue, &ids);
        let statuses: Vec<_> = self.catalogue.national_parks.iter()
            .map(|park| NamedParkStatus { id: &park.id, name: &park.name, status: park.status(&board) })
            .collect();
        to_js(&statuses)
    }
}
