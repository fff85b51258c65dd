use serde_json::Value;
use tracing::{debug, info};

use super::parser::{extract_json_array, extract_json_object, normalize_day, strip_reasoning};
use crate::{
    error::{PlannerError, Result},
    schemas::{day_plan_schema, validate_payload},
    services::{first_choice_content, prompts, CompletionClient},
    types::{Activities, DayPlan, Meals, TripPlan},
};

const FILLER_MORNING: &str = "Explore a neighbourhood you have not visited yet";
const FILLER_AFTERNOON: &str = "Revisit a favourite attraction or join a local guided tour";
const FILLER_EVENING: &str = "Relax over dinner at a recommended local restaurant";
const FILLER_TRANSPORT: &str = "Walk or use local transport between nearby sights";
const FILLER_TIP: &str = "Keep this day flexible for anything you missed earlier";
const DEFAULT_BREAKFAST: &str = "Breakfast at your accommodation or a nearby café";
const DEFAULT_LUNCH: &str = "Lunch at a local eatery near the day's sights";
const DEFAULT_DINNER: &str = "Dinner at a well-reviewed local restaurant";
const DEFAULT_TIP: &str = "Carry water and check opening hours before heading out";

/// Regenerates an itinerary for a different trip length
#[derive(Debug)]
pub struct ItineraryAdjuster<'a> {
    client: &'a CompletionClient,
    max_tokens: u32,
}

impl<'a> ItineraryAdjuster<'a> {
    pub fn new(client: &'a CompletionClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    /// Itinerary of exactly `num_days` days for `plan`.
    ///
    /// An itinerary that already has the requested length is returned as is
    /// without contacting the completion API.
    pub async fn adjust(&self, plan: &TripPlan, num_days: usize) -> Result<Vec<DayPlan>> {
        if plan.itinerary.len() == num_days {
            debug!(
                target: "trip_planner::itinerary",
                num_days,
                "itinerary already has requested length"
            );
            return Ok(plan.itinerary.clone());
        }

        let messages = prompts::itinerary_messages(plan, num_days)?;
        let payload = self.client.complete(messages, self.max_tokens, false).await?;
        let content = first_choice_content(&payload)?;
        let days = parse_itinerary_reply(&content)?;

        info!(
            target: "trip_planner::itinerary",
            requested = num_days,
            returned = days.len(),
            "received adjusted itinerary"
        );
        Ok(conform_itinerary(days, num_days))
    }
}

/// Recover day plans from a completion that holds either a JSON array of
/// days or an object with an `itinerary` array.
///
/// Entries that do not look like a day plan are skipped; the call fails only
/// if nothing usable remains.
pub fn parse_itinerary_reply(text: &str) -> Result<Vec<DayPlan>> {
    let text = strip_reasoning(text);
    let object_first = match (text.find('{'), text.find('[')) {
        (Some(brace), Some(bracket)) => brace < bracket,
        (Some(_), None) => true,
        _ => false,
    };

    let from_object = || {
        extract_json_object(text)
            .ok()
            .and_then(|mut value| value.get_mut("itinerary").map(Value::take))
            .and_then(|value| match value {
                Value::Array(items) => Some(items),
                _ => None,
            })
    };
    let from_array = || match extract_json_array(text) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    };

    let items = if object_first {
        from_object().or_else(from_array)
    } else {
        from_array().or_else(from_object)
    }
    .ok_or_else(|| {
        PlannerError::MalformedItinerary("no itinerary array in completion".to_string())
    })?;

    let days: Vec<DayPlan> = items.into_iter().filter_map(parse_day).collect();
    if days.is_empty() {
        return Err(PlannerError::MalformedItinerary(
            "completion contained no usable day plans".to_string(),
        ));
    }
    Ok(days)
}

fn parse_day(mut item: Value) -> Option<DayPlan> {
    if !item.is_object() {
        return None;
    }
    normalize_day(&mut item);

    if let Err(err) = validate_payload(day_plan_schema(), &item) {
        debug!(target: "trip_planner::itinerary", error = %err, "skipping day plan");
        return None;
    }
    serde_json::from_value(item).ok()
}

/// Force `days` to exactly `num_days` entries numbered `1..=num_days`, with
/// every activity, meal and tip filled in.
pub fn conform_itinerary(mut days: Vec<DayPlan>, num_days: usize) -> Vec<DayPlan> {
    days.truncate(num_days);

    let template = days.last().cloned();
    while days.len() < num_days {
        days.push(filler_day(template.as_ref()));
    }

    for (idx, day) in days.iter_mut().enumerate() {
        day.day = (idx + 1) as u32;
        fill_missing(day);
    }
    days
}

/// Resize an itinerary without the completion API, repeating existing days
/// in order when the trip gets longer.
pub fn resize_locally(existing: &[DayPlan], num_days: usize) -> Vec<DayPlan> {
    let days = existing
        .iter()
        .cycle()
        .take(num_days)
        .enumerate()
        .map(|(idx, day)| {
            let mut day = day.clone();
            if idx >= existing.len() {
                day.tips.push(format!(
                    "Repeats day {} of the original plan; swap in anything you missed",
                    idx % existing.len() + 1
                ));
            }
            day
        })
        .collect();

    conform_itinerary(days, num_days)
}

fn filler_day(template: Option<&DayPlan>) -> DayPlan {
    DayPlan {
        day: 0,
        activities: Activities {
            morning: FILLER_MORNING.to_string(),
            afternoon: FILLER_AFTERNOON.to_string(),
            evening: FILLER_EVENING.to_string(),
        },
        meals: template.map(|day| day.meals.clone()).unwrap_or_default(),
        transportation: template
            .map(|day| day.transportation.clone())
            .unwrap_or_default(),
        tips: vec![FILLER_TIP.to_string()],
    }
}

fn fill_missing(day: &mut DayPlan) {
    fill_text(&mut day.activities.morning, FILLER_MORNING);
    fill_text(&mut day.activities.afternoon, FILLER_AFTERNOON);
    fill_text(&mut day.activities.evening, FILLER_EVENING);
    fill_text(&mut day.transportation, FILLER_TRANSPORT);

    let Meals {
        breakfast,
        lunch,
        dinner,
    } = &mut day.meals;
    fill_meal(breakfast, DEFAULT_BREAKFAST);
    fill_meal(lunch, DEFAULT_LUNCH);
    fill_meal(dinner, DEFAULT_DINNER);

    day.tips.retain(|tip| !tip.trim().is_empty());
    if day.tips.is_empty() {
        day.tips.push(DEFAULT_TIP.to_string());
    }
}

fn fill_text(slot: &mut String, fallback: &str) {
    if slot.trim().is_empty() {
        *slot = fallback.to_string();
    }
}

fn fill_meal(slot: &mut Option<String>, fallback: &str) {
    if slot.as_deref().map_or(true, |meal| meal.trim().is_empty()) {
        *slot = Some(fallback.to_string());
    }
}
