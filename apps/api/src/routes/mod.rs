pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::planning::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/generate-itinerary/",
            post(handlers::handle_generate_itinerary),
        )
        // Both paths serve the same listing; the frontend uses either.
        .route("/itineraries/", get(handlers::handle_list_itineraries))
        .route(
            "/user-itineraries/",
            get(handlers::handle_list_itineraries),
        )
        .with_state(state)
}
