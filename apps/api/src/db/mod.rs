//! Persistence for preferences and generated itineraries.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::itinerary::ItineraryRow;
use crate::models::preference::{NewPreference, PreferenceRow};

#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Creates a PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Storage for the two trip tables. Every read is scoped to one user.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Inserts a preference, creating the owning user row on first use.
    async fn create_preference(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        preference: &NewPreference,
    ) -> Result<PreferenceRow, StoreError>;

    async fn create_itinerary(
        &self,
        user_id: Uuid,
        preference_id: Uuid,
        payload: &Value,
    ) -> Result<ItineraryRow, StoreError>;

    /// All of a user's itineraries, most recent first.
    async fn list_itineraries(&self, user_id: Uuid) -> Result<Vec<ItineraryRow>, StoreError>;

    async fn find_itinerary(
        &self,
        user_id: Uuid,
        itinerary_id: Uuid,
    ) -> Result<Option<ItineraryRow>, StoreError>;

    async fn latest_itinerary(&self, user_id: Uuid) -> Result<Option<ItineraryRow>, StoreError>;
}

#[derive(Clone)]
pub struct PgTripStore {
    pool: PgPool,
}

impl PgTripStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripStore for PgTripStore {
    async fn create_preference(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        preference: &NewPreference,
    ) -> Result<PreferenceRow, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET email = COALESCE(EXCLUDED.email, users.email)
            "#,
        )
        .bind(user_id)
        .bind(email)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, PreferenceRow>(
            r#"
            INSERT INTO preferences
                (id, user_id, departure, destination, budget, start_date, end_date,
                 travel_style, activities, transportation, health_issues)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&preference.departure)
        .bind(&preference.destination)
        .bind(&preference.budget)
        .bind(preference.start_date)
        .bind(preference.end_date)
        .bind(&preference.travel_style)
        .bind(&preference.activities)
        .bind(&preference.transportation)
        .bind(&preference.health_issues)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Stored preference {} for user {}", row.id, user_id);
        Ok(row)
    }

    async fn create_itinerary(
        &self,
        user_id: Uuid,
        preference_id: Uuid,
        payload: &Value,
    ) -> Result<ItineraryRow, StoreError> {
        let row = sqlx::query_as::<_, ItineraryRow>(
            r#"
            INSERT INTO itineraries (id, user_id, preference_id, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(preference_id)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        info!("Stored itinerary {} for user {}", row.id, user_id);
        Ok(row)
    }

    async fn list_itineraries(&self, user_id: Uuid) -> Result<Vec<ItineraryRow>, StoreError> {
        Ok(sqlx::query_as::<_, ItineraryRow>(
            "SELECT * FROM itineraries WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_itinerary(
        &self,
        user_id: Uuid,
        itinerary_id: Uuid,
    ) -> Result<Option<ItineraryRow>, StoreError> {
        Ok(sqlx::query_as::<_, ItineraryRow>(
            "SELECT * FROM itineraries WHERE id = $1 AND user_id = $2",
        )
        .bind(itinerary_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn latest_itinerary(&self, user_id: Uuid) -> Result<Option<ItineraryRow>, StoreError> {
        Ok(sqlx::query_as::<_, ItineraryRow>(
            r#"
            SELECT * FROM itineraries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
