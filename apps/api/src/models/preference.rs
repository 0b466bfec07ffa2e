use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Field name → list of messages, returned to the client as-is on a 400.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MAX_PLACE_LEN: usize = 255;
const MAX_SHORT_LEN: usize = 100;

/// Raw request body for `POST /generate-itinerary/`.
///
/// Dates stay as strings here so a bad value becomes a field error
/// instead of a body-level rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceInput {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub departure: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub budget: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub travel_style: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tag_list")]
    pub activities: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub transportation: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tag_list")]
    pub health_issues: Vec<String>,
}

/// A validated preference, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPreference {
    pub departure: Option<String>,
    pub destination: Option<String>,
    pub budget: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travel_style: Option<String>,
    pub activities: Vec<String>,
    pub transportation: Option<String>,
    pub health_issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PreferenceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub departure: Option<String>,
    pub destination: Option<String>,
    pub budget: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travel_style: Option<String>,
    pub activities: Vec<String>,
    pub transportation: Option<String>,
    pub health_issues: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PreferenceInput {
    /// Validates the request. Missing dates default to `today`.
    pub fn validate(self, today: NaiveDate) -> Result<NewPreference, FieldErrors> {
        let mut errors = FieldErrors::new();

        let departure = clean_text(&mut errors, "departure", self.departure, MAX_PLACE_LEN);
        let destination = clean_text(&mut errors, "destination", self.destination, MAX_PLACE_LEN);
        let budget = clean_text(&mut errors, "budget", self.budget, MAX_SHORT_LEN);
        let travel_style =
            clean_text(&mut errors, "travel_style", self.travel_style, MAX_SHORT_LEN);
        let transportation = clean_text(
            &mut errors,
            "transportation",
            self.transportation,
            MAX_SHORT_LEN,
        );

        let start_date = parse_date(&mut errors, "start_date", self.start_date, today);
        let end_date = parse_date(&mut errors, "end_date", self.end_date, today);

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                push_error(&mut errors, "end_date", "End date must not be before start date.");
            }
        }

        match (start_date, end_date) {
            (Some(start_date), Some(end_date)) if errors.is_empty() => Ok(NewPreference {
                departure,
                destination,
                budget,
                start_date,
                end_date,
                travel_style,
                activities: self.activities,
                transportation,
                health_issues: self.health_issues,
            }),
            _ => Err(errors),
        }
    }
}

fn clean_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    if value.chars().count() > max_len {
        push_error(
            errors,
            field,
            &format!("Ensure this field has no more than {max_len} characters."),
        );
    }
    Some(value)
}

fn parse_date(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Some(today),
        Some(raw) => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                push_error(errors, field, "Date has wrong format. Use YYYY-MM-DD.");
                None
            }
        },
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Text fields also accept bare numbers, e.g. `"budget": 6000`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Text(String),
    Number(serde_json::Number),
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextRepr>::deserialize(deserializer)?.map(|raw| match raw {
        TextRepr::Text(text) => text,
        TextRepr::Number(number) => number.to_string(),
    }))
}

/// Tag lists arrive either as a JSON array or as one comma-delimited string.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagListRepr {
    List(Vec<String>),
    Delimited(String),
}

fn deserialize_tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<TagListRepr>::deserialize(deserializer)?;
    Ok(match raw {
        None => Vec::new(),
        Some(TagListRepr::List(items)) => normalize_tags(items.iter().map(String::as_str)),
        Some(TagListRepr::Delimited(text)) => normalize_tags(text.split(',')),
    })
}

/// Trims each tag and drops empties, preserving order.
pub fn normalize_tags<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn test_activities_accept_list_and_delimited_string() {
        let from_list: PreferenceInput = serde_json::from_value(json!({
            "activities": [" hiking ", "", "museums"]
        }))
        .unwrap();
        let from_text: PreferenceInput = serde_json::from_value(json!({
            "activities": "hiking, , museums"
        }))
        .unwrap();

        assert_eq!(from_list.activities, vec!["hiking", "museums"]);
        assert_eq!(from_text.activities, from_list.activities);
    }

    #[test]
    fn test_text_fields_accept_numbers() {
        let input: PreferenceInput = serde_json::from_value(json!({
            "destination": "Ooty",
            "budget": 6000,
            "travel_style": null
        }))
        .unwrap();
        assert_eq!(input.budget.as_deref(), Some("6000"));
        assert_eq!(input.destination.as_deref(), Some("Ooty"));
        assert_eq!(input.travel_style, None);
    }

    #[test]
    fn test_text_fields_reject_other_shapes() {
        let result = serde_json::from_value::<PreferenceInput>(json!({ "budget": {"max": 6000} }));
        assert!(result.is_err());
    }

    #[test]
    fn test_null_health_issues_become_empty_list() {
        let input: PreferenceInput =
            serde_json::from_value(json!({ "health_issues": null })).unwrap();
        assert!(input.health_issues.is_empty());
    }

    #[test]
    fn test_missing_dates_default_to_today() {
        let pref = PreferenceInput::default().validate(today()).unwrap();
        assert_eq!(pref.start_date, today());
        assert_eq!(pref.end_date, today());
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let input = PreferenceInput {
            start_date: Some("2025-06-03".to_string()),
            end_date: Some("2025-06-01".to_string()),
            ..Default::default()
        };
        let errors = input.validate(today()).unwrap_err();
        assert!(errors.contains_key("end_date"));
        assert!(!errors.contains_key("start_date"));
    }

    #[test]
    fn test_bad_date_format_is_a_field_error() {
        let input = PreferenceInput {
            start_date: Some("06/01/2025".to_string()),
            ..Default::default()
        };
        let errors = input.validate(today()).unwrap_err();
        assert_eq!(
            errors["start_date"],
            vec!["Date has wrong format. Use YYYY-MM-DD.".to_string()]
        );
    }

    #[test]
    fn test_blank_text_fields_are_stored_as_none() {
        let input = PreferenceInput {
            departure: Some("   ".to_string()),
            destination: Some(" Ooty ".to_string()),
            ..Default::default()
        };
        let pref = input.validate(today()).unwrap();
        assert_eq!(pref.departure, None);
        assert_eq!(pref.destination.as_deref(), Some("Ooty"));
    }

    #[test]
    fn test_overlong_budget_is_rejected() {
        let input = PreferenceInput {
            budget: Some("9".repeat(101)),
            ..Default::default()
        };
        let errors = input.validate(today()).unwrap_err();
        assert!(errors.contains_key("budget"));
    }
}
