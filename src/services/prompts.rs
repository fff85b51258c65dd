use serde_json::{json, Value};

use super::completion_client::ChatMessage;
use crate::{
    error::Result,
    types::{SearchResult, TripPlan},
};

const OVERVIEW_CONTEXT_CHARS: usize = 400;
const CONTEXT_ATTRACTIONS: usize = 5;
const CONTEXT_RESTAURANTS: usize = 5;
const CONTEXT_SAMPLE_DAYS: usize = 2;

pub const TRIP_PLANNING_PROMPT: &str = r#"You are an expert travel planner. Using the search results provided, write a complete trip planning guide for the destination as a single JSON object. Balance well-known sights with local experiences and keep every recommendation practical.

Respond with exactly this structure:
{
  "executiveSummary": "HTML-formatted overview of the destination and the trip",
  "destination": {
    "name": "Full destination name",
    "overview": "HTML-formatted overview",
    "bestTimeToVisit": ["Seasonal recommendation with reasoning"],
    "climate": "Climate information",
    "culture": "Cultural insights",
    "language": ["Main languages spoken"],
    "currency": "Local currency"
  },
  "idealTripLength": { "minimum": 3, "optimal": 5, "extended": 7 },
  "topAccommodations": [
    { "name": "", "type": "Hotel/Hostel/Resort", "priceRange": "Budget/Mid-range/Luxury", "description": "", "highlights": [""], "bestFor": [""] }
  ],
  "topAttractions": [
    { "name": "", "category": "Natural/Historical/Cultural", "description": "", "idealVisitLength": "", "bestTimeToVisit": "", "travelTips": [""] }
  ],
  "topRestaurants": [
    { "name": "", "cuisine": "", "priceRange": "Budget/Mid-range/Luxury", "specialty": "", "atmosphere": "", "localRecommendation": true }
  ],
  "itinerary": [
    {
      "day": 1,
      "activities": { "morning": "", "afternoon": "", "evening": "" },
      "meals": { "breakfast": "", "lunch": "", "dinner": "" },
      "transportation": "",
      "tips": [""]
    }
  ],
  "travelAdvisories": [
    { "type": "", "description": "", "severity": "low/medium/high", "recommendation": "" }
  ],
  "localCustoms": [""],
  "packingRecommendations": [""],
  "budgetEstimates": [
    { "category": "", "lowRange": 0, "highRange": 0, "notes": "" }
  ],
  "recommendations": {
    "mustSee": [""],
    "hiddenGems": [""],
    "photospots": [""],
    "familyFriendly": [""],
    "soloTraveler": [""]
  }
}

Guidelines:
- All budget amounts are plain integers in Indian Rupees (₹), never USD or another currency
- Include 5 accommodations across price points, 8 attractions and 6 restaurants
- The itinerary covers the optimal trip length, one entry per day
- Give transportation advice between attractions and note seasonal events
- Include safety advisories, cultural etiquette and destination-specific packing advice
- Suggest activities for families, solo travelers and couples"#;

pub const ITINERARY_PROMPT: &str = r#"You are an expert travel planner revising an existing trip. Produce a day-by-day itinerary as a JSON array with exactly the requested number of entries, numbered from 1. Each entry has this shape:
{ "day": 1, "activities": { "morning": "", "afternoon": "", "evening": "" }, "meals": { "breakfast": "", "lunch": "", "dinner": "" }, "transportation": "", "tips": [""] }
Reuse the listed attractions and restaurants where they fit, pace the days for the new length, and return ONLY the JSON array."#;

/// Messages asking for a full trip plan grounded on `results`
pub fn plan_messages(destination: &str, results: &[SearchResult]) -> Result<Vec<ChatMessage>> {
    let results_json = serde_json::to_string_pretty(results)?;
    Ok(vec![
        ChatMessage::system(TRIP_PLANNING_PROMPT),
        ChatMessage::user(format!(
            "Analyze these search results for a trip to {destination} and provide a comprehensive travel guide with all budget estimates ONLY in Indian Rupees (₹). Return ONLY valid JSON with no explanatory text:\n{results_json}"
        )),
    ])
}

/// Messages asking for an itinerary of exactly `num_days` days
pub fn itinerary_messages(plan: &TripPlan, num_days: usize) -> Result<Vec<ChatMessage>> {
    let context = serde_json::to_string_pretty(&itinerary_context(plan))?;
    Ok(vec![
        ChatMessage::system(ITINERARY_PROMPT),
        ChatMessage::user(format!(
            "Create a {num_days}-day itinerary for {}. Return exactly {num_days} day entries.\nTrip context:\n{context}",
            plan.destination.name
        )),
    ])
}

/// Reduced view of a plan that keeps the adjustment prompt small
pub fn itinerary_context(plan: &TripPlan) -> Value {
    let attractions: Vec<Value> = plan
        .top_attractions
        .iter()
        .take(CONTEXT_ATTRACTIONS)
        .map(|attraction| json!({ "name": attraction.name, "category": attraction.category }))
        .collect();

    let restaurants: Vec<Value> = plan
        .top_restaurants
        .iter()
        .take(CONTEXT_RESTAURANTS)
        .map(|restaurant| json!({ "name": restaurant.name, "cuisine": restaurant.cuisine }))
        .collect();

    let sample_days = &plan.itinerary[..plan.itinerary.len().min(CONTEXT_SAMPLE_DAYS)];

    json!({
        "destination": {
            "name": plan.destination.name,
            "overview": plan
                .destination
                .overview
                .chars()
                .take(OVERVIEW_CONTEXT_CHARS)
                .collect::<String>(),
        },
        "attractions": attractions,
        "restaurants": restaurants,
        "sampleDays": sample_days,
    })
}
