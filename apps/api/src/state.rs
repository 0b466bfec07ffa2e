use std::sync::Arc;

use crate::config::Config;
use crate::db::TripStore;
use crate::llm_client::TextGenerator;
use crate::places::PlacesApi;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TripStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub places: Arc<dyn PlacesApi>,
    pub config: Config,
}
