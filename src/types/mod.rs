pub mod result;
pub mod search;
pub mod trip_types;

pub use result::{BookingDetails, BookingResult, PlanningData, PlanningResult};
pub use search::SearchResult;
pub use trip_types::{
    Accommodation, Activities, Attraction, BudgetEstimate, DayPlan, Destination, IdealTripLength,
    Meals, Recommendations, Restaurant, Severity, TravelAdvisory, TripPlan,
};
