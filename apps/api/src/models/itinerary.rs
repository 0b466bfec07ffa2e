use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted itinerary. Serialized with the field names the frontend reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ItineraryRow {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "preference")]
    pub preference_id: Uuid,
    #[serde(rename = "itinerary_data")]
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}
