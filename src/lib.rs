//! trip-planner: search-grounded trip planning on top of an LLM completion API
//!
//! A [`TripPlanner`] searches the web for a destination, asks a chat
//! completion model for a structured travel guide, and tolerantly parses the
//! reply into a typed [`TripPlan`]. Identical concurrent requests share one
//! upstream round trip, transient upstream failures are retried with
//! exponential backoff, and successful plans are cached in memory.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trip_planner::{PlannerConfig, TripPlanner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = PlannerConfig::new()
//!         .with_search_credentials("google-key", "engine-id")
//!         .with_completion_api_key("groq-key");
//!     let planner = TripPlanner::new(config);
//!
//!     let result = planner.plan_trip("Jaipur").await;
//!     if let Some(plan) = result.trip_plan() {
//!         println!("{} days planned", plan.itinerary.len());
//!     }
//!
//!     let shorter = planner.adjust_trip_duration("Jaipur", 3).await;
//!     println!("{}", serde_json::to_string_pretty(&shorter).unwrap());
//! }
//! ```

pub mod core;
pub mod error;
pub mod schemas;
pub mod services;
pub mod types;

pub use crate::core::{duration_key, PlannerConfig, TripPlanner};
pub use error::{PlannerError, Result};
pub use types::{
    BookingDetails, BookingResult, BudgetEstimate, DayPlan, PlanningData, PlanningResult,
    SearchResult, TripPlan,
};

#[cfg(feature = "cli")]
pub mod cli;
