//! Google Maps web-service client (Geocoding and Places).
//!
//! Every endpoint answers HTTP 200 with a `status` field; `OK` carries data,
//! `ZERO_RESULTS` means nothing matched, anything else is an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{LatLng, NearbyPlace, PlaceDetails, PlacesApi, PlacesError};

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    error_message: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct GeocodeBody {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct DetailsBody {
    result: Option<DetailsResult>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    place_id: Option<String>,
    geometry: Option<Geometry>,
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindPlaceBody {
    #[serde(default)]
    candidates: Vec<FindPlaceCandidate>,
}

#[derive(Debug, Deserialize)]
struct FindPlaceCandidate {
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyBody {
    #[serde(default)]
    results: Vec<NearbyResult>,
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    place_id: Option<String>,
    geometry: Option<Geometry>,
    vicinity: Option<String>,
}

/// Splits an envelope into its body, `None` for zero results, or an API error.
fn into_body<T>(envelope: Envelope<T>) -> Result<Option<T>, PlacesError> {
    match envelope.status.as_str() {
        STATUS_OK => Ok(Some(envelope.body)),
        STATUS_ZERO_RESULTS => Ok(None),
        _ => Err(PlacesError::Api {
            status: envelope.status,
            message: envelope.error_message,
        }),
    }
}

#[derive(Clone)]
pub struct GoogleMapsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleMapsClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, PlacesError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>, PlacesError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", &self.api_key)])
            .send()
            .await?
            .error_for_status()?;

        let envelope: Envelope<T> = response.json().await?;
        debug!("Maps {path} returned status {}", envelope.status);
        into_body(envelope)
    }
}

#[async_trait]
impl PlacesApi for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Option<LatLng>, PlacesError> {
        let body: Option<GeocodeBody> = self
            .get("geocode/json", &[("address", address.to_string())])
            .await?;
        Ok(body
            .and_then(|b| b.results.into_iter().next())
            .map(|r| r.geometry.location))
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let body: Option<DetailsBody> = self
            .get(
                "place/details/json",
                &[
                    ("place_id", place_id.to_string()),
                    ("fields", "place_id,geometry,formatted_address".to_string()),
                ],
            )
            .await?;
        let result = body.and_then(|b| b.result).ok_or_else(|| PlacesError::Api {
            status: STATUS_ZERO_RESULTS.to_string(),
            message: Some(format!("no details for {place_id}")),
        })?;
        let geometry = result
            .geometry
            .ok_or_else(|| PlacesError::Decode(format!("details for {place_id} lack geometry")))?;

        Ok(PlaceDetails {
            place_id: result.place_id.unwrap_or_else(|| place_id.to_string()),
            location: geometry.location,
            formatted_address: result.formatted_address,
        })
    }

    async fn find_place(
        &self,
        input: &str,
        near: LatLng,
        radius_m: u32,
    ) -> Result<Option<String>, PlacesError> {
        let body: Option<FindPlaceBody> = self
            .get(
                "place/findplacefromtext/json",
                &[
                    ("input", input.to_string()),
                    ("inputtype", "textquery".to_string()),
                    (
                        "locationbias",
                        format!("circle:{radius_m}@{},{}", near.lat, near.lng),
                    ),
                    ("fields", "place_id".to_string()),
                ],
            )
            .await?;
        Ok(body.and_then(|b| b.candidates.into_iter().find_map(|c| c.place_id)))
    }

    async fn nearby_search(
        &self,
        location: LatLng,
        radius_m: u32,
        keyword: &str,
    ) -> Result<Option<NearbyPlace>, PlacesError> {
        let body: Option<NearbyBody> = self
            .get(
                "place/nearbysearch/json",
                &[
                    ("location", format!("{},{}", location.lat, location.lng)),
                    ("radius", radius_m.to_string()),
                    ("keyword", keyword.to_string()),
                ],
            )
            .await?;
        Ok(body.and_then(|b| {
            b.results.into_iter().find_map(|r| {
                Some(NearbyPlace {
                    place_id: r.place_id?,
                    location: r.geometry?.location,
                    vicinity: r.vicinity,
                })
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<T: DeserializeOwned>(raw: &str) -> Envelope<T> {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_ok_geocode_yields_first_location() {
        let envelope: Envelope<GeocodeBody> = parse(
            r#"{"status":"OK","results":[
                {"geometry":{"location":{"lat":11.41,"lng":76.69}}},
                {"geometry":{"location":{"lat":0.0,"lng":0.0}}}
            ]}"#,
        );
        let body = into_body(envelope).unwrap().unwrap();
        assert_eq!(body.results[0].geometry.location, LatLng { lat: 11.41, lng: 76.69 });
    }

    #[test]
    fn test_zero_results_is_none() {
        let envelope: Envelope<FindPlaceBody> =
            parse(r#"{"status":"ZERO_RESULTS","candidates":[]}"#);
        assert!(into_body(envelope).unwrap().is_none());
    }

    #[test]
    fn test_other_status_is_api_error() {
        let envelope: Envelope<GeocodeBody> = parse(
            r#"{"status":"REQUEST_DENIED","error_message":"The provided API key is invalid.","results":[]}"#,
        );
        match into_body(envelope) {
            Err(PlacesError::Api { status, message }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message.as_deref(), Some("The provided API key is invalid."));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_details_body_tolerates_missing_fields() {
        let envelope: Envelope<DetailsBody> = parse(
            r#"{"status":"OK","result":{"geometry":{"location":{"lat":1.5,"lng":2.5}}}}"#,
        );
        let result = into_body(envelope).unwrap().unwrap().result.unwrap();
        assert!(result.place_id.is_none());
        assert!(result.formatted_address.is_none());
        assert_eq!(result.geometry.unwrap().location.lng, 2.5);
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base_url() {
        let client = GoogleMapsClient::new(
            "key".to_string(),
            "https://maps.example.test/api/".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://maps.example.test/api");
    }
}
