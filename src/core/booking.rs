use chrono::NaiveDate;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    error::{PlannerError, Result},
    types::BookingDetails,
};

pub const MAX_TRIP_DAYS: u32 = 30;
pub const MAX_TRAVELERS: u32 = 50;

/// Check a booking request against the mock provider's limits
pub fn validate_booking(details: &BookingDetails, today: NaiveDate) -> Result<()> {
    if details.destination.trim().is_empty() {
        return Err(PlannerError::Validation(
            "Destination is required".to_string(),
        ));
    }

    if !(1..=MAX_TRIP_DAYS).contains(&details.duration_days) {
        return Err(PlannerError::Validation(format!(
            "Trip duration must be between 1 and {MAX_TRIP_DAYS} days"
        )));
    }

    if details.start_date < today {
        return Err(PlannerError::Validation(
            "Start date cannot be in the past".to_string(),
        ));
    }

    if !(1..=MAX_TRAVELERS).contains(&details.travelers) {
        return Err(PlannerError::Validation(format!(
            "Number of travelers must be between 1 and {MAX_TRAVELERS}"
        )));
    }

    Ok(())
}

pub fn generate_booking_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();
    format!("TRIP-{suffix}")
}

/// Whether the simulated provider rejects this booking
pub fn simulated_failure(failure_rate: f64) -> bool {
    if failure_rate.is_nan() || failure_rate <= 0.0 {
        return false;
    }
    rand::thread_rng().gen_bool(failure_rate.min(1.0))
}
