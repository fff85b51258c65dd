use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured travel guide produced by the completion API.
///
/// Every field is defaulted so that a partially filled model response still
/// deserializes; the parser back-fills the parts callers rely on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TripPlan {
    /// HTML-formatted overview of the destination and trip
    pub executive_summary: String,
    pub destination: Destination,
    pub ideal_trip_length: IdealTripLength,
    pub top_accommodations: Vec<Accommodation>,
    pub top_attractions: Vec<Attraction>,
    pub top_restaurants: Vec<Restaurant>,
    /// Day-by-day itinerary, numbered from 1
    pub itinerary: Vec<DayPlan>,
    pub travel_advisories: Vec<TravelAdvisory>,
    pub local_customs: Vec<String>,
    pub packing_recommendations: Vec<String>,
    /// Budget ranges in Indian Rupees
    pub budget_estimates: Vec<BudgetEstimate>,
    pub recommendations: Recommendations,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Destination {
    pub name: String,
    pub overview: String,
    pub best_time_to_visit: Vec<String>,
    pub climate: String,
    pub culture: String,
    pub language: Vec<String>,
    pub currency: String,
}

impl Destination {
    /// Placeholder used when the model omits the destination block or gives
    /// only a name
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Recommended trip lengths in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct IdealTripLength {
    pub minimum: u32,
    pub optimal: u32,
    pub extended: u32,
}

impl Default for IdealTripLength {
    fn default() -> Self {
        Self {
            minimum: 3,
            optimal: 5,
            extended: 7,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Accommodation {
    pub name: String,
    /// Hotel, hostel, resort...
    #[serde(rename = "type")]
    pub kind: String,
    pub price_range: String,
    pub description: String,
    pub highlights: Vec<String>,
    pub best_for: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Attraction {
    pub name: String,
    pub category: String,
    pub description: String,
    pub ideal_visit_length: String,
    pub best_time_to_visit: String,
    pub travel_tips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Restaurant {
    pub name: String,
    pub cuisine: String,
    pub price_range: String,
    pub specialty: String,
    pub atmosphere: String,
    pub local_recommendation: bool,
}

/// A single day of the itinerary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DayPlan {
    /// 1-based day counter within the itinerary
    pub day: u32,
    pub activities: Activities,
    pub meals: Meals,
    /// Transportation advice for the day
    pub transportation: String,
    /// Day-specific travel tips
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Activities {
    pub morning: String,
    pub afternoon: String,
    pub evening: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Meals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lunch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dinner: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TravelAdvisory {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub severity: Severity,
    pub recommendation: String,
}

/// Budget range for one expense category, in Indian Rupees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BudgetEstimate {
    pub category: String,
    pub low_range: u64,
    pub high_range: u64,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Recommendations {
    pub must_see: Vec<String>,
    pub hidden_gems: Vec<String>,
    pub photospots: Vec<String>,
    pub family_friendly: Vec<String>,
    pub solo_traveler: Vec<String>,
}
