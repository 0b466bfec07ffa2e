//! Best-effort name → place resolution with an ordered fallback chain.
//!
//! stoplist → geocode context → existing id details → text search → nearby search → not found.
//! `resolve_place` always returns a record; errors become `Error: ...` place ids.

use tracing::{debug, warn};

use super::{PlaceCandidate, PlacesApi, PlacesError, ResolvedPlace, ID_NOT_AVAILABLE};

/// Search radius around the context location, in metres.
pub const SEARCH_RADIUS_METERS: u32 = 15_000;

/// Names that describe an activity rather than a place.
const STOPLIST: &[&str] = &["none", "relax", "drive", "journey"];

const ADDRESS_NOT_AVAILABLE: &str = "Address not available";

pub async fn resolve_place(
    places: &dyn PlacesApi,
    name: &str,
    context_location: &str,
    existing_place_id: Option<&str>,
) -> ResolvedPlace {
    let trimmed = name.trim();
    if trimmed.is_empty() || STOPLIST.contains(&trimmed.to_lowercase().as_str()) {
        return ResolvedPlace::unavailable(name, "Not applicable");
    }

    match resolve_chain(places, trimmed, context_location, existing_place_id).await {
        Ok(place) => place,
        Err(e) => {
            warn!("Place lookup failed for '{trimmed}' in '{context_location}': {e}");
            ResolvedPlace::failed(name, &e)
        }
    }
}

async fn resolve_chain(
    places: &dyn PlacesApi,
    name: &str,
    context_location: &str,
    existing_place_id: Option<&str>,
) -> Result<ResolvedPlace, PlacesError> {
    let Some(anchor) = places.geocode(context_location).await? else {
        warn!("Failed to geocode context location: {context_location}");
        return Ok(ResolvedPlace::unavailable(name, "Context not geocoded"));
    };

    if let Some(place_id) = existing_place_id
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != ID_NOT_AVAILABLE)
    {
        match places.place_details(place_id).await {
            Ok(details) => {
                return Ok(ResolvedPlace::found(
                    name,
                    place_id.to_string(),
                    details.location,
                    details
                        .formatted_address
                        .unwrap_or_else(|| ADDRESS_NOT_AVAILABLE.to_string()),
                ));
            }
            Err(PlacesError::Api { status, .. }) => {
                debug!("Existing place id {place_id} for '{name}' rejected ({status}), searching anew");
            }
            Err(e) => return Err(e),
        }
    }

    let query = format!("{name}, {context_location}");
    if let Some(place_id) = places
        .find_place(&query, anchor, SEARCH_RADIUS_METERS)
        .await?
    {
        let details = places.place_details(&place_id).await?;
        return Ok(ResolvedPlace::found(
            name,
            place_id,
            details.location,
            details
                .formatted_address
                .unwrap_or_else(|| ADDRESS_NOT_AVAILABLE.to_string()),
        ));
    }

    if let Some(nearby) = places
        .nearby_search(anchor, SEARCH_RADIUS_METERS, name)
        .await?
    {
        return Ok(ResolvedPlace::found(
            name,
            nearby.place_id,
            nearby.location,
            nearby
                .vicinity
                .unwrap_or_else(|| ADDRESS_NOT_AVAILABLE.to_string()),
        ));
    }

    Ok(ResolvedPlace::unavailable(name, "Not found"))
}

/// Resolves candidates in order, one chain at a time.
pub async fn resolve_candidates(
    places: &dyn PlacesApi,
    candidates: &[PlaceCandidate],
) -> Vec<ResolvedPlace> {
    let mut resolved = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        resolved.push(
            resolve_place(
                places,
                &candidate.name,
                &candidate.context,
                Some(candidate.place_id.as_str()),
            )
            .await,
        );
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::testing::FakePlaces;
    use crate::places::LatLng;

    const OOTY: LatLng = LatLng {
        lat: 11.4102,
        lng: 76.695,
    };

    #[tokio::test]
    async fn test_stoplist_name_makes_no_calls() {
        let places = FakePlaces::default();
        let result = resolve_place(&places, "Relax", "Ooty", None).await;

        assert_eq!(result.place_id, ID_NOT_AVAILABLE);
        assert_eq!(result.address, "Not applicable");
        assert_eq!(result.lat, None);
        assert_eq!(places.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_name_makes_no_calls() {
        let places = FakePlaces::default();
        let result = resolve_place(&places, "  ", "Ooty", None).await;
        assert_eq!(result.address, "Not applicable");
        assert_eq!(places.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_ungeocodable_context_is_a_sentinel() {
        let places = FakePlaces::default();
        let result = resolve_place(&places, "Hotel Lakeview", "Atlantis", None).await;

        assert_eq!(result.place_id, ID_NOT_AVAILABLE);
        assert_eq!(result.address, "Context not geocoded");
        assert_eq!(places.find_calls(), 0);
    }

    #[tokio::test]
    async fn test_existing_place_id_is_used_directly() {
        let places = FakePlaces::default()
            .with_geocode("Ooty", OOTY)
            .with_details("ChIJlake", OOTY, "Lake Rd, Ooty");

        let result = resolve_place(&places, "Hotel Lakeview", "Ooty", Some("ChIJlake")).await;

        assert_eq!(result.place_id, "ChIJlake");
        assert_eq!(result.address, "Lake Rd, Ooty");
        assert_eq!(places.find_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejected_place_id_falls_through_to_text_search() {
        let places = FakePlaces::default()
            .with_geocode("Ooty", OOTY)
            .with_details("ChIJreal", OOTY, "Charing Cross, Ooty")
            .with_find("Hotel Lakeview, Ooty", "ChIJreal");

        let result = resolve_place(&places, "Hotel Lakeview", "Ooty", Some("ChIJbogus")).await;

        assert_eq!(result.place_id, "ChIJreal");
        assert_eq!(result.address, "Charing Cross, Ooty");
        assert_eq!(places.find_calls(), 1);
    }

    #[tokio::test]
    async fn test_sentinel_place_id_is_not_looked_up() {
        let places = FakePlaces::default()
            .with_geocode("Ooty", OOTY)
            .with_details("ChIJreal", OOTY, "Charing Cross, Ooty")
            .with_find("Hotel Lakeview, Ooty", "ChIJreal");

        resolve_place(&places, "Hotel Lakeview", "Ooty", Some(ID_NOT_AVAILABLE)).await;

        assert_eq!(places.detail_calls(), 1);
    }

    #[tokio::test]
    async fn test_nearby_search_is_last_resort() {
        let places = FakePlaces::default()
            .with_geocode("Ooty", OOTY)
            .with_nearby("Nahar Sidewalk Cafe", "ChIJnahar", OOTY, None);

        let result = resolve_place(&places, "Nahar Sidewalk Cafe", "Ooty", None).await;

        assert_eq!(result.place_id, "ChIJnahar");
        assert_eq!(result.address, "Address not available");
        assert_eq!(result.lat, Some(OOTY.lat));
    }

    #[tokio::test]
    async fn test_nothing_found_is_a_sentinel() {
        let places = FakePlaces::default().with_geocode("Ooty", OOTY);
        let result = resolve_place(&places, "Imaginary Inn", "Ooty", None).await;
        assert_eq!(result.address, "Not found");
        assert_eq!(result.place_id, ID_NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn test_lookup_failure_becomes_error_record() {
        let places = FakePlaces::default().failing_geocode();
        let result = resolve_place(&places, "Hotel Lakeview", "Ooty", None).await;

        assert!(result.place_id.starts_with("Error: "));
        assert_eq!(result.address, "Error");
        assert_eq!(result.lat, None);
    }

    #[tokio::test]
    async fn test_same_lookup_twice_is_identical() {
        let places = FakePlaces::default()
            .with_geocode("Ooty", OOTY)
            .with_details("ChIJreal", OOTY, "Charing Cross, Ooty")
            .with_find("Hotel Lakeview, Ooty", "ChIJreal");

        let first = resolve_place(&places, "Hotel Lakeview", "Ooty", None).await;
        let second = resolve_place(&places, "Hotel Lakeview", "Ooty", None).await;
        assert_eq!(first, second);
    }
}
