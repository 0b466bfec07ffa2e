// Place resolution: turns hotel and restaurant names from an itinerary into
// geocoded places. All Maps calls go through the `PlacesApi` trait.

pub mod extract;
pub mod google;
pub mod resolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use extract::{extract_candidates, PlaceCandidate};
pub use resolver::resolve_candidates;

/// Place id used when none is known.
pub const ID_NOT_AVAILABLE: &str = "ID not available";

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {}", message.as_deref().unwrap_or("no error message"))]
    Api {
        status: String,
        message: Option<String>,
    },

    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    pub place_id: String,
    pub location: LatLng,
    pub formatted_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyPlace {
    pub place_id: String,
    pub location: LatLng,
    pub vicinity: Option<String>,
}

/// The four Maps operations place resolution needs.
#[async_trait]
pub trait PlacesApi: Send + Sync {
    /// Coordinates of the best match for `address`, if any.
    async fn geocode(&self, address: &str) -> Result<Option<LatLng>, PlacesError>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError>;

    /// Id of the first text-search candidate within `radius_m` of `near`.
    async fn find_place(
        &self,
        input: &str,
        near: LatLng,
        radius_m: u32,
    ) -> Result<Option<String>, PlacesError>;

    /// First keyword match within `radius_m` of `location`.
    async fn nearby_search(
        &self,
        location: LatLng,
        radius_m: u32,
        keyword: &str,
    ) -> Result<Option<NearbyPlace>, PlacesError>;
}

/// Outcome of resolving one name. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlace {
    pub name: String,
    pub place_id: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: String,
}

impl ResolvedPlace {
    pub fn found(name: &str, place_id: String, at: LatLng, address: String) -> Self {
        Self {
            name: name.to_string(),
            place_id,
            lat: Some(at.lat),
            lng: Some(at.lng),
            address,
        }
    }

    /// "ID not available" with no coordinates; `address` says why.
    pub fn unavailable(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            place_id: ID_NOT_AVAILABLE.to_string(),
            lat: None,
            lng: None,
            address: address.to_string(),
        }
    }

    pub fn failed(name: &str, error: &PlacesError) -> Self {
        Self {
            name: name.to_string(),
            place_id: format!("Error: {error}"),
            lat: None,
            lng: None,
            address: "Error".to_string(),
        }
    }
}

/// Resolved hotels and restaurants for one itinerary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaceLookup {
    pub hotels: Vec<ResolvedPlace>,
    pub restaurants: Vec<ResolvedPlace>,
}

/// Extracts every candidate from `payload` and resolves them one after another.
pub async fn resolve_itinerary_places(
    places: &dyn PlacesApi,
    payload: &serde_json::Value,
) -> PlaceLookup {
    let (hotels, restaurants) = extract_candidates(payload);
    tracing::info!(
        "Resolving {} hotels and {} restaurants",
        hotels.len(),
        restaurants.len()
    );
    PlaceLookup {
        hotels: resolve_candidates(places, &hotels).await,
        restaurants: resolve_candidates(places, &restaurants).await,
    }
}
