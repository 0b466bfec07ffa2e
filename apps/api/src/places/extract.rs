//! Pulls hotel and restaurant names out of an itinerary document.

use std::collections::HashSet;

use serde_json::Value;

use super::ID_NOT_AVAILABLE;

const MEAL_PHRASES: &[&str] = &["breakfast at ", "lunch at ", "dinner at "];
const UNKNOWN_LOCATION: &str = "Unknown Location";

/// A name to resolve, with the location to search around.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub name: String,
    pub place_id: String,
    pub context: String,
}

/// Returns `(hotels, restaurants)`, each de-duplicated case-insensitively.
pub fn extract_candidates(payload: &Value) -> (Vec<PlaceCandidate>, Vec<PlaceCandidate>) {
    let destination = non_empty_str(payload.get("destination"))
        .or_else(|| non_empty_str(payload.get("startPoint")))
        .unwrap_or(UNKNOWN_LOCATION);

    let mut hotels = Vec::new();
    for rec in hotel_recommendations(payload) {
        let place_id = place_id_of(rec);
        for option in rec.get("options").and_then(Value::as_array).into_iter().flatten() {
            let name = option
                .as_str()
                .or_else(|| non_empty_str(option.get("name")))
                .map(str::trim)
                .unwrap_or_default();
            if name.is_empty() || name.eq_ignore_ascii_case("none") {
                continue;
            }
            hotels.push(PlaceCandidate {
                name: name.to_string(),
                place_id: place_id.clone(),
                context: destination.to_string(),
            });
        }
    }

    let mut restaurants = Vec::new();
    for day in array_at(payload, "itinerary") {
        let context = non_empty_str(day.get("location")).unwrap_or(destination);
        for entry in array_at(day, "schedule") {
            let Some(activity) = entry.get("activity").and_then(Value::as_str) else {
                continue;
            };
            let Some(named) = restaurant_after_meal_phrase(activity) else {
                continue;
            };
            let place_id = place_id_of(entry);
            for name in named.split(" or ").map(str::trim).filter(|n| !n.is_empty()) {
                restaurants.push(PlaceCandidate {
                    name: name.to_string(),
                    place_id: place_id.clone(),
                    context: context.to_string(),
                });
            }
        }
    }

    for restaurant in array_at(payload, "restaurants") {
        if let Some(name) = non_empty_str(restaurant.get("name")) {
            restaurants.push(PlaceCandidate {
                name: name.trim().to_string(),
                place_id: place_id_of(restaurant),
                context: destination.to_string(),
            });
        }
    }

    (dedup(hotels), dedup(restaurants))
}

/// Hotel recommendations sit at the top level in older payloads and under
/// `accommodation` in newer ones.
fn hotel_recommendations(payload: &Value) -> impl Iterator<Item = &Value> {
    let top = array_at(payload, "hotelRecommendations");
    let nested = payload
        .get("accommodation")
        .map(|a| array_at(a, "hotelRecommendations"))
        .unwrap_or_default();
    top.into_iter().chain(nested)
}

/// "Lunch at Nahar Sidewalk Cafe (₹200)." → "Nahar Sidewalk Cafe".
fn restaurant_after_meal_phrase(activity: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `activity`.
    let lower = activity.to_ascii_lowercase();
    let end = MEAL_PHRASES
        .iter()
        .filter_map(|phrase| lower.find(phrase).map(|at| at + phrase.len()))
        .min()?;
    let rest = &activity[end..];
    let rest = rest.split('(').next().unwrap_or(rest);
    let name = rest.trim().trim_end_matches(['.', ',', ';', '!']).trim();
    (!name.is_empty()).then_some(name)
}

fn array_at<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn place_id_of(value: &Value) -> String {
    non_empty_str(value.get("placeId"))
        .unwrap_or(ID_NOT_AVAILABLE)
        .to_string()
}

fn dedup(candidates: Vec<PlaceCandidate>) -> Vec<PlaceCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.name.to_lowercase()))
        .collect()
}
