pub mod booking;
pub mod config;
pub mod itinerary;
pub mod parser;
pub mod planner;

pub use config::PlannerConfig;
pub use itinerary::{conform_itinerary, resize_locally, ItineraryAdjuster};
pub use parser::{extract_json_array, extract_json_object, parse_trip_plan};
pub use planner::{duration_key, TripPlanner};
