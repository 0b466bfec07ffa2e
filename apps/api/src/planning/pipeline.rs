//! Itinerary pipeline: four sequential model stages, then post-merge rules.
//!
//! Flow: transportation → lodging & dining → day plan (1, 2) → budget (1, 2, 3)
//!       → merge → departure rule → budget ceiling.
//!
//! A stage whose output cannot be parsed yields a sentinel object. The sentinel
//! stops the pipeline and becomes the result; transport and API failures abort it.

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{generate_json, LlmError, TextGenerator};
use crate::planning::budget::BudgetSummary;
use crate::planning::prompts::{
    build_budget_prompt, build_day_plan_prompt, build_lodging_dining_prompt,
    build_transport_prompt, TripBrief,
};

pub const INVALID_RESPONSE_FORMAT: &str = "Invalid response format";

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The merged itinerary document.
    Complete(Value),
    /// A stage's sentinel, returned as-is.
    Incomplete(Value),
}

enum StageOutput {
    Parsed(Value),
    Sentinel(Value),
}

/// Runs the stage and converts unparseable output into a sentinel.
async fn run_stage(
    generator: &dyn TextGenerator,
    stage: &str,
    prompt: &str,
) -> Result<StageOutput, LlmError> {
    info!("Running itinerary stage '{stage}'");
    match generate_json(generator, prompt, JSON_ONLY_SYSTEM).await {
        Ok(value @ Value::Object(_)) => Ok(StageOutput::Parsed(value)),
        Ok(other) => {
            warn!("Stage '{stage}' returned non-object JSON");
            Ok(StageOutput::Sentinel(sentinel(stage, &other.to_string())))
        }
        Err(LlmError::InvalidModelOutput { raw }) => {
            warn!("Stage '{stage}' returned unparseable output");
            Ok(StageOutput::Sentinel(sentinel(stage, &raw)))
        }
        Err(e) => Err(e),
    }
}

/// `{error, stage, raw_response}`, the shape callers check for.
pub fn sentinel(stage: &str, raw: &str) -> Value {
    json!({
        "error": INVALID_RESPONSE_FORMAT,
        "stage": stage,
        "raw_response": raw,
    })
}

macro_rules! stage {
    ($generator:expr, $name:expr, $prompt:expr) => {
        match run_stage($generator, $name, &$prompt).await? {
            StageOutput::Parsed(value) => value,
            StageOutput::Sentinel(value) => return Ok(PipelineOutcome::Incomplete(value)),
        }
    };
}

/// Generates a complete itinerary for `brief`.
pub async fn generate_itinerary(
    generator: &dyn TextGenerator,
    brief: &TripBrief,
) -> Result<PipelineOutcome, LlmError> {
    let transport = stage!(generator, "transportation", build_transport_prompt(brief));
    let lodging = stage!(generator, "lodging", build_lodging_dining_prompt(brief));
    let plan = stage!(
        generator,
        "day_plan",
        build_day_plan_prompt(brief, &transport, &lodging)
    );
    let budget = stage!(
        generator,
        "budget",
        build_budget_prompt(brief, &transport, &lodging, &plan)
    );

    let mut document = merge_stages(brief, transport, lodging, plan, &budget);

    if enforce_departure(&mut document, brief) {
        warn!(
            "Rewrote first activity to depart from '{}'",
            brief.departure
        );
    }

    let mut summary = BudgetSummary::from_model(&budget, &brief.currency());
    if summary.enforce_ceiling(brief.budget_ceiling()) {
        warn!(
            "Budget total capped at {:.0} for trip to {}",
            summary.total, brief.destination
        );
    }
    document["budget"] = serde_json::to_value(&summary)?;

    info!(
        "Itinerary generated for {} → {} ({})",
        brief.departure,
        brief.destination,
        brief.duration_label()
    );
    Ok(PipelineOutcome::Complete(document))
}

fn take(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Combines the stage outputs into one document.
fn merge_stages(
    brief: &TripBrief,
    transport: Value,
    lodging: Value,
    plan: Value,
    budget: &Value,
) -> Value {
    let mut plan = into_map(plan);
    let mut lodging = into_map(lodging);

    let default_name = format!(
        "{} {} Trip from {}",
        brief.travel_style, brief.destination, brief.departure
    );

    let hotel_cost = take(&mut lodging, "totalHotelCost");
    let food_cost = take(&mut lodging, "totalFoodCost");

    json!({
        "tripName": take(&mut plan, "tripName").unwrap_or_else(|| json!(default_name)),
        "destination": take(&mut plan, "destination").unwrap_or_else(|| json!(brief.destination)),
        "startPoint": brief.departure,
        "endPoint": take(&mut plan, "endPoint").unwrap_or_else(|| json!(brief.departure)),
        "duration": brief.duration_label(),
        "travelStyle": brief.travel_style,
        "itinerary": take(&mut plan, "itinerary").unwrap_or_else(|| json!([])),
        "transportation": transport,
        "accommodation": {
            "hotelRecommendations": take(&mut lodging, "hotelRecommendations").unwrap_or_else(|| json!([])),
            "totalHotelCost": hotel_cost,
        },
        "restaurants": take(&mut lodging, "restaurants").unwrap_or_else(|| json!([])),
        "budget": budget,
        "foodCostEstimate": food_cost,
        "importantNotesAndTips": take(&mut plan, "importantNotesAndTips").unwrap_or_else(|| json!([])),
    })
}

/// The trip starts at the user's departure: `startPoint` is the literal
/// departure and day 1 opens with "Depart from {departure} to {destination}".
/// Returns whether the first activity had to be rewritten.
pub fn enforce_departure(document: &mut Value, brief: &TripBrief) -> bool {
    document["startPoint"] = json!(brief.departure);

    let expected_prefix = format!("Depart from {}", brief.departure).to_lowercase();
    let departure_activity = format!("Depart from {} to {}", brief.departure, brief.destination);

    let Some(schedule) = document
        .get_mut("itinerary")
        .and_then(Value::as_array_mut)
        .and_then(|days| days.first_mut())
        .and_then(|day| {
            let day = day.as_object_mut()?;
            Some(
                day.entry("schedule")
                    .or_insert_with(|| json!([]))
                    .as_array_mut()?,
            )
        })
    else {
        return false;
    };

    match schedule.first_mut() {
        Some(first) => {
            let current = first
                .get("activity")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if current.trim().to_lowercase().starts_with(&expected_prefix) {
                return false;
            }
            match first.as_object_mut() {
                Some(entry) => {
                    entry.insert("activity".to_string(), json!(departure_activity));
                }
                None => {
                    *first = departure_entry(&departure_activity);
                }
            }
            true
        }
        None => {
            schedule.push(departure_entry(&departure_activity));
            true
        }
    }
}

fn departure_entry(activity: &str) -> Value {
    json!({
        "time": "",
        "activity": activity,
        "costPerPerson": 0,
        "placeId": "ID not available",
    })
}
