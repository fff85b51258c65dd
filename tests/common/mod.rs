#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use std::time::Duration;
use trip_planner::PlannerConfig;

pub const SEARCH_PATH: &str = "/customsearch/v1";
pub const COMPLETION_PATH: &str = "/chat/completions";

pub fn config_for(server: &ServerGuard) -> PlannerConfig {
    PlannerConfig::new()
        .with_search_credentials("test-key", "test-cx")
        .with_completion_api_key("test-token")
        .with_search_base_url(format!("{}{}", server.url(), SEARCH_PATH))
        .with_completion_base_url(server.url())
        .with_timeout(Duration::from_secs(5))
        .with_backoff_base(Duration::from_millis(1))
        .with_booking_latency(Duration::ZERO)
        .with_booking_failure_rate(0.0)
}

pub fn search_body() -> String {
    json!({
        "items": [
            {
                "title": "Top things to do",
                "snippet": "Museums, food and river walks.",
                "link": "https://example.com/guide"
            },
            { "title": "Where to stay" }
        ]
    })
    .to_string()
}

pub fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

pub fn day(number: u32) -> Value {
    json!({
        "day": number,
        "activities": {
            "morning": format!("Morning walk {number}"),
            "afternoon": format!("Museum {number}"),
            "evening": format!("River cruise {number}")
        },
        "meals": { "lunch": format!("Bistro {number}") },
        "transportation": "Metro",
        "tips": ["Book ahead"]
    })
}

pub fn days(count: u32) -> Value {
    Value::Array((1..=count).map(day).collect())
}

/// Plan text the way a chatty model returns it: prose around the JSON and
/// budgets as currency strings.
pub fn plan_text(destination: &str, itinerary_days: u32) -> String {
    let plan = json!({
        "executiveSummary": format!("<p>{destination} in a nutshell</p>"),
        "destination": { "name": destination, "overview": "A lovely city", "currency": "EUR" },
        "idealTripLength": { "minimum": 2, "optimal": itinerary_days, "extended": 7 },
        "topAttractions": [{ "name": "Old Town", "category": "Historical" }],
        "topRestaurants": [{ "name": "Chez Test", "cuisine": "French", "localRecommendation": true }],
        "itinerary": days(itinerary_days),
        "budgetEstimates": [
            { "category": "Accommodation", "lowRange": "₹5,000", "highRange": "₹15,000", "notes": "per night" },
            { "category": "Food", "lowRange": 1200, "highRange": "2,500" }
        ]
    });
    format!("Here is your plan:\n{plan}\nHope that helps!")
}

pub async fn mock_search(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_body())
        .expect(hits)
        .create_async()
        .await
}

/// Completion mock answering full-plan requests only
pub async fn mock_plan_completion(
    server: &mut ServerGuard,
    destination: &str,
    itinerary_days: u32,
    hits: usize,
) -> Mock {
    server
        .mock("POST", COMPLETION_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("Analyze these search results".to_string()),
            Matcher::Regex(format!("trip to {destination}")),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(&plan_text(destination, itinerary_days)))
        .expect(hits)
        .create_async()
        .await
}

/// Completion mock answering itinerary requests for `requested` days with
/// `content`
pub async fn mock_itinerary_completion(
    server: &mut ServerGuard,
    requested: u32,
    content: &str,
    hits: usize,
) -> Mock {
    server
        .mock("POST", COMPLETION_PATH)
        .match_body(Matcher::Regex(format!("Create a {requested}-day itinerary")))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(content))
        .expect(hits)
        .create_async()
        .await
}
