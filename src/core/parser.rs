//! Tolerant extraction of plan JSON from model completions.
//!
//! Model output is not schema-guaranteed: it may be wrapped in prose, carry a
//! reasoning preamble, quote prices as currency strings or leave out whole
//! sections. The functions here make a best-effort valid [`TripPlan`] and only
//! fail when no JSON document can be recovered at all.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::{
    error::{PlannerError, Result},
    types::{
        Accommodation, Attraction, BudgetEstimate, DayPlan, Destination, IdealTripLength,
        Restaurant, TravelAdvisory, TripPlan,
    },
};

const REASONING_END_TAG: &str = "</think>";

const RECOMMENDATION_LISTS: [&str; 5] = [
    "mustSee",
    "hiddenGems",
    "photospots",
    "familyFriendly",
    "soloTraveler",
];

/// Drop a `<think>...</think>` reasoning preamble, if present
pub fn strip_reasoning(text: &str) -> &str {
    match text.rfind(REASONING_END_TAG) {
        Some(idx) => &text[idx + REASONING_END_TAG.len()..],
        None => text,
    }
}

/// Parse the span from the first `{` to the last `}` as a JSON object
pub fn extract_json_object(text: &str) -> Result<Value> {
    let span = bracket_span(text, '{', '}')
        .ok_or_else(|| PlannerError::MalformedPlan("no JSON object in completion".to_string()))?;

    let value: Value = serde_json::from_str(span)
        .map_err(|err| PlannerError::MalformedPlan(format!("invalid JSON: {err}")))?;

    if !value.is_object() {
        return Err(PlannerError::MalformedPlan(
            "completion JSON is not an object".to_string(),
        ));
    }
    Ok(value)
}

/// Parse the span from the first `[` to the last `]` as a JSON array
pub fn extract_json_array(text: &str) -> Result<Value> {
    let span = bracket_span(text, '[', ']').ok_or_else(|| {
        PlannerError::MalformedItinerary("no JSON array in completion".to_string())
    })?;

    serde_json::from_str(span)
        .map_err(|err| PlannerError::MalformedItinerary(format!("invalid JSON: {err}")))
}

fn bracket_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Turn raw completion text into a [`TripPlan`] for `query`
pub fn parse_trip_plan(text: &str, query: &str) -> Result<TripPlan> {
    let mut value = extract_json_object(strip_reasoning(text))?;
    normalize_plan(&mut value, query);

    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        PlannerError::MalformedPlan(format!("at {}: {}", location, err.inner()))
    })
}

/// Coerce and back-fill a parsed plan object in place.
///
/// Loose scalars become text, a bare string becomes a one-element string
/// list, and list sections keep only the entries that deserialize. Fields
/// the model supplied correctly are left alone.
pub fn normalize_plan(value: &mut Value, query: &str) {
    drop_nulls(value);
    let Some(plan) = value.as_object_mut() else {
        return;
    };

    coerce_text_fields(plan, &["executiveSummary"]);
    coerce_text_lists(plan, &["localCustoms", "packingRecommendations"]);

    normalize_destination(plan, query);
    normalize_trip_length(plan);
    normalize_recommendations(plan);

    retain_entries::<Accommodation, _>(plan, "topAccommodations", |entry| {
        coerce_text_fields(entry, &["name", "type", "priceRange", "description"]);
        coerce_text_lists(entry, &["highlights", "bestFor"]);
    });
    retain_entries::<Attraction, _>(plan, "topAttractions", |entry| {
        coerce_text_fields(
            entry,
            &["name", "category", "description", "idealVisitLength", "bestTimeToVisit"],
        );
        coerce_text_lists(entry, &["travelTips"]);
    });
    retain_entries::<Restaurant, _>(plan, "topRestaurants", |entry| {
        coerce_text_fields(
            entry,
            &["name", "cuisine", "priceRange", "specialty", "atmosphere"],
        );
        if let Some(flag) = entry.get_mut("localRecommendation") {
            *flag = Value::Bool(coerce_bool(flag));
        }
    });
    retain_entries::<DayPlan, _>(plan, "itinerary", normalize_day_entry);
    retain_entries::<TravelAdvisory, _>(plan, "travelAdvisories", |entry| {
        coerce_text_fields(entry, &["type", "description", "recommendation"]);
        if let Some(severity) = entry.get_mut("severity") {
            *severity = json!(normalize_severity(severity));
        }
    });
    retain_entries::<BudgetEstimate, _>(plan, "budgetEstimates", |entry| {
        coerce_text_fields(entry, &["category", "notes"]);
        normalize_budget(entry);
    });
}

/// Coerce the fields of a single itinerary entry
pub fn normalize_day(day: &mut Value) {
    drop_nulls(day);
    if let Some(entry) = day.as_object_mut() {
        normalize_day_entry(entry);
    }
}

fn normalize_day_entry(day: &mut Map<String, Value>) {
    if let Some(number) = day.get_mut("day") {
        *number = json!(clamp_u32(coerce_integer(number)));
    }
    if let Some(Value::Object(activities)) = day.get_mut("activities") {
        coerce_text_fields(activities, &["morning", "afternoon", "evening"]);
    }
    if let Some(Value::Object(meals)) = day.get_mut("meals") {
        coerce_text_fields(meals, &["breakfast", "lunch", "dinner"]);
    }
    coerce_text_fields(day, &["transportation"]);
    coerce_text_lists(day, &["tips"]);
}

/// Replace `field` with the array of its entries that normalize into a `T`.
/// Anything other than an array becomes empty.
fn retain_entries<T, F>(plan: &mut Map<String, Value>, field: &str, normalize: F)
where
    T: DeserializeOwned,
    F: Fn(&mut Map<String, Value>),
{
    let entries = match plan.remove(field) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            debug!(target: "trip_planner::parser", field, "section is not a list, discarding");
            Vec::new()
        }
        None => Vec::new(),
    };

    let total = entries.len();
    let kept: Vec<Value> = entries
        .into_iter()
        .filter_map(|mut entry| {
            normalize(entry.as_object_mut()?);
            serde_json::from_value::<T>(entry.clone())
                .is_ok()
                .then_some(entry)
        })
        .collect();

    let dropped = total - kept.len();
    if dropped > 0 {
        warn!(target: "trip_planner::parser", field, dropped, "dropped unusable entries");
    }
    plan.insert(field.to_string(), Value::Array(kept));
}

fn normalize_destination(plan: &mut Map<String, Value>, query: &str) {
    let destination = plan.entry("destination").or_insert(Value::Null);

    if !destination.is_object() {
        let name = match destination.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => query.to_string(),
        };
        *destination = serde_json::to_value(Destination::placeholder(name))
            .unwrap_or_else(|_| json!({ "name": query }));
    }

    if let Some(destination) = destination.as_object_mut() {
        coerce_text_fields(
            destination,
            &["name", "overview", "climate", "culture", "currency"],
        );
        coerce_text_lists(destination, &["bestTimeToVisit", "language"]);

        let nameless = destination
            .get("name")
            .and_then(|name| name.as_str())
            .map_or(true, |name| name.trim().is_empty());
        if nameless {
            debug!(target: "trip_planner::parser", query, "destination name missing, using query");
            destination.insert("name".to_string(), json!(query));
        }
    }
}

fn normalize_trip_length(plan: &mut Map<String, Value>) {
    match plan.get_mut("idealTripLength") {
        Some(Value::Object(length)) => {
            for key in ["minimum", "optimal", "extended"] {
                if let Some(days) = length.get_mut(key) {
                    *days = json!(clamp_u32(coerce_integer(days)));
                }
            }
        }
        _ => {
            let defaults = IdealTripLength::default();
            plan.insert(
                "idealTripLength".to_string(),
                json!({
                    "minimum": defaults.minimum,
                    "optimal": defaults.optimal,
                    "extended": defaults.extended,
                }),
            );
        }
    }
}

fn normalize_recommendations(plan: &mut Map<String, Value>) {
    match plan.get_mut("recommendations") {
        Some(Value::Object(recommendations)) => {
            coerce_text_lists(recommendations, &RECOMMENDATION_LISTS);
        }
        Some(_) => {
            plan.remove("recommendations");
        }
        None => {}
    }
}

fn normalize_budget(estimate: &mut Map<String, Value>) {
    let mut ranges = [0u64; 2];
    for (slot, key) in ranges.iter_mut().zip(["lowRange", "highRange"]) {
        if let Some(amount) = estimate.get_mut(key) {
            *slot = coerce_integer(amount);
            *amount = json!(*slot);
        }
    }

    let [low, high] = ranges;
    if low > high {
        let category = estimate
            .get("category")
            .and_then(|category| category.as_str())
            .unwrap_or_default();
        warn!(
            target: "trip_planner::parser",
            category,
            low,
            high,
            "budget estimate has lowRange above highRange"
        );
    }
}

/// Integer value of a loosely typed JSON number.
///
/// Strings keep only their ASCII digits (`"₹5,000"` becomes 5000); floats are
/// rounded; negatives and anything unparsable become 0.
pub fn coerce_integer(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().map(|float| float.max(0.0).round() as u64))
            .unwrap_or(0),
        Value::String(text) => {
            let digits: String = text.chars().filter(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

fn clamp_u32(value: u64) -> u64 {
    value.min(u32::MAX as u64)
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => matches!(text.trim().to_lowercase().as_str(), "true" | "yes" | "y"),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn normalize_severity(value: &Value) -> &'static str {
    let text = value.as_str().unwrap_or_default().trim().to_lowercase();
    match text.as_str() {
        "low" => "low",
        "high" => "high",
        _ => "medium",
    }
}

/// Numbers and booleans become strings; a list of strings is joined
fn coerce_text_fields(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        let Some(value) = map.get_mut(*field) else {
            continue;
        };
        let text = match value {
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => continue,
        };
        *value = Value::String(text);
    }
}

/// A bare scalar becomes a one-element list; non-text list items are dropped
fn coerce_text_lists(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        if let Some(value) = map.get_mut(*field) {
            let items = match value.take() {
                Value::Array(items) => items,
                Value::Object(_) => Vec::new(),
                scalar => vec![scalar],
            };
            *value = Value::Array(items.into_iter().filter_map(text_item).collect());
        }
    }
}

fn text_item(value: Value) -> Option<Value> {
    match value {
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(Value::String(text)),
        Value::Number(number) => Some(Value::String(number.to_string())),
        Value::Bool(flag) => Some(Value::String(flag.to_string())),
        _ => None,
    }
}

/// Remove `null` members recursively so serde defaults apply
fn drop_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, member| !member.is_null());
            map.values_mut().for_each(drop_nulls);
        }
        Value::Array(items) => {
            items.retain(|item| !item.is_null());
            items.iter_mut().for_each(drop_nulls);
        }
        _ => {}
    }
}
