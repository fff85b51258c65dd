use super::{search::SearchResult, trip_types::TripPlan};
use crate::error::PlannerError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Payload of a successful planning call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningData {
    /// Search hits the plan was grounded on
    pub results: Vec<SearchResult>,
    pub trip_plan: TripPlan,
    pub timestamp: DateTime<Utc>,
}

impl PlanningData {
    pub fn new(results: Vec<SearchResult>, trip_plan: TripPlan) -> Self {
        Self {
            results,
            trip_plan,
            timestamp: Utc::now(),
        }
    }
}

/// Uniform envelope returned by every public planning operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PlanningData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlanningResult {
    pub fn success(data: PlanningData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn from_error(error: &PlannerError) -> Self {
        Self::failure(error.user_message())
    }

    /// Access the trip plan, if the call succeeded
    pub fn trip_plan(&self) -> Option<&TripPlan> {
        self.data.as_ref().map(|data| &data.trip_plan)
    }
}

/// Booking request as submitted by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub destination: String,
    pub start_date: NaiveDate,
    pub duration_days: u32,
    pub travelers: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BookingResult {
    pub fn confirmed(booking_id: String) -> Self {
        Self {
            success: true,
            booking_id: Some(booking_id),
            error: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            booking_id: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_envelope_serialization() {
        let result = PlanningResult::failure("Destination query cannot be empty");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Destination query cannot be empty");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_success_envelope_exposes_plan() {
        let result = PlanningResult::success(PlanningData::new(Vec::new(), TripPlan::default()));
        let value = serde_json::to_value(&result).unwrap();

        assert!(result.trip_plan().is_some());
        assert!(value["data"]["tripPlan"].is_object());
        assert!(value["data"]["timestamp"].is_string());
    }

    #[test]
    fn test_from_error_uses_user_message() {
        let result =
            PlanningResult::from_error(&PlannerError::NoSearchResults("Atlantis".to_string()));
        assert_eq!(
            result.error.as_deref(),
            Some("No search results found for this destination")
        );
    }
}
