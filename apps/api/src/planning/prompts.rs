//! Prompt builders for the four planning stages.
//!
//! Every builder is pure: a `TripBrief` (plus earlier stage output) in, prompt text out.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::llm_client::prompts::{COST_INSTRUCTION, PLACE_ID_INSTRUCTION};
use crate::models::preference::{PreferenceRow, DATE_FORMAT};
use crate::planning::budget::{budget_currency, parse_budget_ceiling};

/// Used when either trip date is missing or unparseable.
pub const DEFAULT_TRIP_DAYS: u32 = 2;

pub const DEFAULT_LOCATION: &str = "unspecified location";
pub const DEFAULT_BUDGET: &str = "6000 Rupees";
pub const DEFAULT_TRAVEL_STYLE: &str = "Solo";
pub const DEFAULT_TRANSPORTATION: &str = "public transport";

/// Preference fields with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TripBrief {
    pub departure: String,
    pub destination: String,
    pub budget: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub travel_style: String,
    pub activities: Vec<String>,
    pub transportation: String,
    pub health_issues: Vec<String>,
}

impl Default for TripBrief {
    fn default() -> Self {
        Self {
            departure: DEFAULT_LOCATION.to_string(),
            destination: DEFAULT_LOCATION.to_string(),
            budget: DEFAULT_BUDGET.to_string(),
            start_date: None,
            end_date: None,
            travel_style: DEFAULT_TRAVEL_STYLE.to_string(),
            activities: Vec::new(),
            transportation: DEFAULT_TRANSPORTATION.to_string(),
            health_issues: Vec::new(),
        }
    }
}

impl TripBrief {
    pub fn from_preference(pref: &PreferenceRow) -> Self {
        let defaults = Self::default();
        Self {
            departure: pref.departure.clone().unwrap_or(defaults.departure),
            destination: pref.destination.clone().unwrap_or(defaults.destination),
            budget: pref.budget.clone().unwrap_or(defaults.budget),
            start_date: Some(pref.start_date.format(DATE_FORMAT).to_string()),
            end_date: Some(pref.end_date.format(DATE_FORMAT).to_string()),
            travel_style: pref.travel_style.clone().unwrap_or(defaults.travel_style),
            activities: pref.activities.clone(),
            transportation: pref
                .transportation
                .clone()
                .unwrap_or(defaults.transportation),
            health_issues: pref.health_issues.clone(),
        }
    }

    pub fn days(&self) -> u32 {
        trip_duration_days(self.start_date.as_deref(), self.end_date.as_deref())
    }

    /// "1 day", "3 days".
    pub fn duration_label(&self) -> String {
        match self.days() {
            1 => "1 day".to_string(),
            n => format!("{n} days"),
        }
    }

    pub fn budget_ceiling(&self) -> f64 {
        parse_budget_ceiling(&self.budget)
    }

    pub fn currency(&self) -> String {
        budget_currency(&self.budget)
    }

    fn activities_text(&self) -> String {
        if self.activities.is_empty() {
            "various activities".to_string()
        } else {
            self.activities.join(", ")
        }
    }

    fn health_text(&self) -> String {
        if self.health_issues.is_empty() {
            "no specific health issues".to_string()
        } else {
            self.health_issues.join(", ")
        }
    }

    fn dates_text(&self) -> String {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => format!("from {start} to {end}"),
            _ => "on flexible dates".to_string(),
        }
    }

    /// Renders `template` in one pass. `extra` holds stage-specific
    /// placeholders; unknown tokens are left as written.
    fn fill(&self, template: &str, extra: &[(&str, String)]) -> String {
        let days = self.days();
        placeholder().replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            if let Some((_, value)) = extra.iter().find(|(name, _)| *name == key) {
                return value.clone();
            }
            match key {
                "departure" => self.departure.clone(),
                "destination" => self.destination.clone(),
                "budget" => self.budget.clone(),
                "currency" => self.currency(),
                "ceiling" => format!("{:.0}", self.budget_ceiling()),
                "dates" => self.dates_text(),
                "duration" => self.duration_label(),
                "days" => days.to_string(),
                "nights" => days.saturating_sub(1).to_string(),
                "travel_style" => self.travel_style.clone(),
                "transportation" => self.transportation.clone(),
                "activities" => self.activities_text(),
                "health_issues" => self.health_text(),
                "place_id_instruction" => PLACE_ID_INSTRUCTION.to_string(),
                "cost_instruction" => COST_INSTRUCTION.to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"))
}

/// `(end - start).days + 1`, never below 1; `DEFAULT_TRIP_DAYS` if a date is unusable.
pub fn trip_duration_days(start: Option<&str>, end: Option<&str>) -> u32 {
    let parse = |raw: Option<&str>| {
        raw.and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok())
    };
    match (parse(start), parse(end)) {
        (Some(start), Some(end)) => {
            let days = (end - start).num_days() + 1;
            u32::try_from(days.max(1)).unwrap_or(DEFAULT_TRIP_DAYS)
        }
        _ => DEFAULT_TRIP_DAYS,
    }
}

const TRANSPORT_PROMPT_TEMPLATE: &str = r#"Plan only the transportation for a {travel_style} trip of {duration} from {departure} to {destination}, {dates}.

Preferred mode of transportation: {transportation}
Total budget for the whole trip: {budget}
Health considerations: {health_issues}

Return a JSON object with this EXACT schema:
{
  "outbound": {"mode": "Bus", "from": "{departure}", "to": "{destination}", "departureTime": "07:00", "durationHours": 4, "costPerPerson": 350},
  "return": {"mode": "Bus", "from": "{destination}", "to": "{departure}", "departureTime": "16:00", "durationHours": 4, "costPerPerson": 350},
  "local": [
    {"mode": "Auto-rickshaw", "description": "Getting around {destination}", "costPerPerson": 400}
  ],
  "totalCost": 1100,
  "notes": ["Book the outbound bus a day in advance"]
}

{cost_instruction}"#;

const LODGING_DINING_PROMPT_TEMPLATE: &str = r#"Recommend accommodation and restaurants in {destination} for a {travel_style} traveller staying {nights} night(s), {dates}.

Total budget for the whole trip: {budget}
Preferred activities: {activities}
Health considerations: {health_issues}

Return a JSON object with this EXACT schema:
{
  "hotelRecommendations": [
    {"category": "Budget-Friendly", "options": ["<Hotel Name>"], "costPerNight": 1500, "placeId": "<Google Maps Place ID>"}
  ],
  "restaurants": [
    {"name": "<Restaurant Name>", "meal": "breakfast", "cuisine": "South Indian", "costPerPerson": 150, "placeId": "<Google Maps Place ID>"}
  ],
  "totalHotelCost": 3000,
  "totalFoodCost": 1500
}

Rules:
- Give real, currently operating places in {destination}.
- Cover breakfast, lunch and dinner for every one of the {days} day(s).
- If no overnight stay is needed, return an empty "hotelRecommendations" list.

{place_id_instruction}

{cost_instruction}"#;

const DAY_PLAN_PROMPT_TEMPLATE: &str = r#"Build a day-by-day plan for a {travel_style} trip of {duration} from {departure} to {destination}, {dates}.

Preferred activities: {activities}
Health considerations: {health_issues}

TRANSPORTATION already chosen (use it, do not change it):
{transport_json}

ACCOMMODATION AND RESTAURANTS already chosen (use them, do not change them):
{lodging_json}

Return a JSON object with this EXACT schema:
{
  "tripName": "{travel_style} {destination} Trip from {departure}",
  "destination": "{destination}",
  "startPoint": "{departure}",
  "endPoint": "{departure}",
  "itinerary": [
    {
      "day": 1,
      "title": "Journey to {destination} and Initial Exploration",
      "location": "<City, Region, Country where this day is spent>",
      "schedule": [
        {"time": "07:00-11:00", "activity": "Depart from {departure} to {destination}", "costPerPerson": 350, "placeId": "ID not available"},
        {"time": "13:00-14:00", "activity": "Lunch at <Restaurant Name>", "costPerPerson": 200, "placeId": "<Google Maps Place ID>"}
      ]
    }
  ],
  "importantNotesAndTips": ["<Note>"]
}

Rules:
- "itinerary" has exactly {days} entries.
- The first activity of day 1 is exactly "Depart from {departure} to {destination}".
- Write meals as "Breakfast at <name>", "Lunch at <name>" or "Dinner at <name>" using the restaurants above.
- Mention the chosen hotel when checking in.

{place_id_instruction}

{cost_instruction}"#;

const BUDGET_PROMPT_TEMPLATE: &str = r#"Produce a realistic budget for this {duration} trip from {departure} to {destination}.
The traveller's maximum budget is {ceiling} {currency}.

TRANSPORTATION:
{transport_json}

ACCOMMODATION AND RESTAURANTS:
{lodging_json}

DAY-BY-DAY PLAN:
{plan_json}

Return a JSON object with this EXACT schema:
{
  "currency": "{currency}",
  "total": 5800,
  "breakdown": {"transport": 1100, "hotel": 3000, "food": 1500, "activities": 200},
  "notes": "<One sentence on whether the plan fits the budget>"
}

Rules:
- "total" is the sum of the four breakdown lines.
- "total" must not exceed {ceiling}. If the plan cannot fit, say so in "notes".

{cost_instruction}"#;

/// Stage 1: transportation only.
pub fn build_transport_prompt(brief: &TripBrief) -> String {
    brief.fill(TRANSPORT_PROMPT_TEMPLATE, &[])
}

/// Stage 2: hotels and restaurants.
pub fn build_lodging_dining_prompt(brief: &TripBrief) -> String {
    brief.fill(LODGING_DINING_PROMPT_TEMPLATE, &[])
}

/// Stage 3: day plan, given stages 1 and 2.
pub fn build_day_plan_prompt(brief: &TripBrief, transport: &Value, lodging: &Value) -> String {
    brief.fill(
        DAY_PLAN_PROMPT_TEMPLATE,
        &[
            ("transport_json", pretty(transport)),
            ("lodging_json", pretty(lodging)),
        ],
    )
}

/// Stage 4: budget roll-up, given stages 1 to 3.
pub fn build_budget_prompt(
    brief: &TripBrief,
    transport: &Value,
    lodging: &Value,
    plan: &Value,
) -> String {
    brief.fill(
        BUDGET_PROMPT_TEMPLATE,
        &[
            ("transport_json", pretty(transport)),
            ("lodging_json", pretty(lodging)),
            ("plan_json", pretty(plan)),
        ],
    )
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
