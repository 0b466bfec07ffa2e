use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::itinerary::ItineraryRow;
use crate::models::preference::PreferenceInput;
use crate::places::{resolve_itinerary_places, ResolvedPlace};
use crate::planning::pipeline::{generate_itinerary, PipelineOutcome};
use crate::planning::prompts::TripBrief;
use crate::state::AppState;

/// A stored itinerary with its hotels and restaurants resolved on the way out.
#[derive(Serialize)]
pub struct GeneratedItinerary {
    #[serde(flatten)]
    pub itinerary: ItineraryRow,
    pub hotels: Vec<ResolvedPlace>,
    pub restaurants: Vec<ResolvedPlace>,
}

#[derive(Serialize)]
pub struct ItineraryDetail {
    pub itinerary: ItineraryRow,
    pub hotels: Vec<ResolvedPlace>,
    pub restaurants: Vec<ResolvedPlace>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItineraryQuery {
    pub id: Option<Uuid>,
    pub latest: Option<String>,
    pub detail: Option<String>,
}

/// Query flags count as set unless they are empty, `false` or `0`.
fn flag(value: &Option<String>) -> bool {
    match value.as_deref().map(str::trim) {
        None => false,
        Some(v) => !(v.is_empty() || v.eq_ignore_ascii_case("false") || v == "0"),
    }
}

/// POST /generate-itinerary/
pub async fn handle_generate_itinerary(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<PreferenceInput>, JsonRejection>,
) -> Result<(StatusCode, Json<GeneratedItinerary>), AppError> {
    let Json(input) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let preference = input
        .validate(Utc::now().date_naive())
        .map_err(AppError::InvalidFields)?;

    let preference = state
        .store
        .create_preference(user.user_id, user.email.as_deref(), &preference)
        .await?;
    info!(
        "Saved preference {} for user {}, generating itinerary",
        preference.id, user.user_id
    );

    let brief = TripBrief::from_preference(&preference);
    let document = match generate_itinerary(state.generator.as_ref(), &brief).await {
        Ok(PipelineOutcome::Complete(document)) => document,
        Ok(PipelineOutcome::Incomplete(sentinel)) => {
            return Err(AppError::IncompleteGeneration(sentinel));
        }
        Err(e) => return Err(AppError::Llm(e.to_string())),
    };

    let itinerary = state
        .store
        .create_itinerary(user.user_id, preference.id, &document)
        .await?;
    info!("Stored itinerary {} for user {}", itinerary.id, user.user_id);

    let lookup = resolve_itinerary_places(state.places.as_ref(), &itinerary.payload).await;

    Ok((
        StatusCode::CREATED,
        Json(GeneratedItinerary {
            itinerary,
            hotels: lookup.hotels,
            restaurants: lookup.restaurants,
        }),
    ))
}

/// GET /itineraries/ and GET /user-itineraries/
pub async fn handle_list_itineraries(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ItineraryQuery>,
) -> Result<Response, AppError> {
    let detail = flag(&query.detail);

    let selected = if let Some(id) = query.id {
        Some(
            state
                .store
                .find_itinerary(user.user_id, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Itinerary {id} not found")))?,
        )
    } else if flag(&query.latest) {
        Some(
            state
                .store
                .latest_itinerary(user.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("No itineraries found".to_string()))?,
        )
    } else {
        None
    };

    match selected {
        Some(itinerary) if detail => {
            let lookup = resolve_itinerary_places(state.places.as_ref(), &itinerary.payload).await;
            Ok(Json(ItineraryDetail {
                itinerary,
                hotels: lookup.hotels,
                restaurants: lookup.restaurants,
            })
            .into_response())
        }
        Some(itinerary) => Ok(Json(itinerary).into_response()),
        None => {
            let itineraries = state.store.list_itineraries(user.user_id).await?;
            if itineraries.is_empty() {
                return Err(AppError::NotFound("No itineraries found".to_string()));
            }
            Ok(Json(itineraries).into_response())
        }
    }
}
