//! In-memory `TripStore` for tests that don't need PostgreSQL.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::{StoreError, TripStore};
use crate::models::itinerary::ItineraryRow;
use crate::models::preference::{NewPreference, PreferenceRow};

#[derive(Default)]
pub struct InMemoryTripStore {
    preferences: Mutex<Vec<PreferenceRow>>,
    itineraries: Mutex<Vec<ItineraryRow>>,
}

impl InMemoryTripStore {
    pub fn preference_count(&self) -> usize {
        self.preferences.lock().unwrap().len()
    }

    fn sorted_for(&self, user_id: Uuid) -> Vec<ItineraryRow> {
        // Reverse insertion order first so equal timestamps still come out newest-first.
        let mut rows: Vec<ItineraryRow> = self
            .itineraries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn create_preference(
        &self,
        user_id: Uuid,
        _email: Option<&str>,
        preference: &NewPreference,
    ) -> Result<PreferenceRow, StoreError> {
        let now = Utc::now();
        let row = PreferenceRow {
            id: Uuid::new_v4(),
            user_id,
            departure: preference.departure.clone(),
            destination: preference.destination.clone(),
            budget: preference.budget.clone(),
            start_date: preference.start_date,
            end_date: preference.end_date,
            travel_style: preference.travel_style.clone(),
            activities: preference.activities.clone(),
            transportation: preference.transportation.clone(),
            health_issues: preference.health_issues.clone(),
            created_at: now,
            updated_at: now,
        };
        self.preferences.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn create_itinerary(
        &self,
        user_id: Uuid,
        preference_id: Uuid,
        payload: &Value,
    ) -> Result<ItineraryRow, StoreError> {
        let row = ItineraryRow {
            id: Uuid::new_v4(),
            user_id,
            preference_id,
            payload: payload.clone(),
            created_at: Utc::now(),
        };
        self.itineraries.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_itineraries(&self, user_id: Uuid) -> Result<Vec<ItineraryRow>, StoreError> {
        Ok(self.sorted_for(user_id))
    }

    async fn find_itinerary(
        &self,
        user_id: Uuid,
        itinerary_id: Uuid,
    ) -> Result<Option<ItineraryRow>, StoreError> {
        Ok(self
            .sorted_for(user_id)
            .into_iter()
            .find(|row| row.id == itinerary_id))
    }

    async fn latest_itinerary(&self, user_id: Uuid) -> Result<Option<ItineraryRow>, StoreError> {
        Ok(self.sorted_for(user_id).into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn preference() -> NewPreference {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        NewPreference {
            departure: Some("Palakkad".to_string()),
            destination: Some("Ooty".to_string()),
            budget: Some("6000 Rupees".to_string()),
            start_date: day,
            end_date: day,
            travel_style: None,
            activities: vec![],
            transportation: None,
            health_issues: vec![],
        }
    }

    #[tokio::test]
    async fn test_itinerary_listed_once_for_owner_only() {
        let store = InMemoryTripStore::default();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let pref = store
            .create_preference(owner, None, &preference())
            .await
            .unwrap();
        let first = store
            .create_itinerary(owner, pref.id, &json!({"n": 1}))
            .await
            .unwrap();
        let second = store
            .create_itinerary(owner, pref.id, &json!({"n": 2}))
            .await
            .unwrap();

        let listed = store.list_itineraries(owner).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert!(store.list_itineraries(stranger).await.unwrap().is_empty());
        assert!(store
            .find_itinerary(stranger, first.id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store.latest_itinerary(owner).await.unwrap().map(|r| r.id),
            Some(second.id)
        );
    }
}
