use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tracing::{debug, error, info, warn};

use super::{
    booking::{generate_booking_id, simulated_failure, validate_booking, MAX_TRIP_DAYS},
    config::PlannerConfig,
    itinerary::{resize_locally, ItineraryAdjuster},
    parser::parse_trip_plan,
};
use crate::{
    error::{PlannerError, Result},
    services::{first_choice_content, prompts, CompletionClient, SearchClient},
    types::{BookingDetails, BookingResult, PlanningData, PlanningResult},
};

type SharedOutcome = Shared<BoxFuture<'static, PlanningResult>>;

const EMPTY_DESTINATION: &str = "Destination query cannot be empty";

/// Trip planning service.
///
/// Cloning is cheap and every clone shares the same cache and in-flight
/// map, so one instance can serve any number of concurrent callers.
#[derive(Clone)]
pub struct TripPlanner {
    inner: Arc<PlannerInner>,
}

struct PlannerInner {
    config: PlannerConfig,
    search: SearchClient,
    completion: CompletionClient,
    cache: Mutex<HashMap<String, PlanningData>>,
    in_flight: Mutex<HashMap<String, SharedOutcome>>,
}

/// Removes an in-flight marker once its task settles, however it settles
struct InFlightGuard {
    inner: Arc<PlannerInner>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.inner.in_flight).remove(&self.key);
        debug!(target: "trip_planner::planner", key = %self.key, "request settled");
    }
}

impl fmt::Debug for TripPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = lock(&self.inner.cache).len();
        let in_flight = lock(&self.inner.in_flight).len();
        f.debug_struct("TripPlanner")
            .field("config", &self.inner.config)
            .field("cached", &cached)
            .field("in_flight", &in_flight)
            .finish()
    }
}

impl TripPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            inner: Arc::new(PlannerInner {
                search: SearchClient::from_config(&config),
                completion: CompletionClient::from_config(&config),
                config,
                cache: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(PlannerConfig::from_env()?))
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.inner.config
    }

    /// Produce a trip plan for `destination`.
    ///
    /// Concurrent calls for the same destination share a single search and
    /// completion round trip. Successful plans are cached for the lifetime of
    /// the planner; failures are not.
    pub async fn plan_trip(&self, destination: &str) -> PlanningResult {
        let key = destination.trim();
        if key.is_empty() {
            return PlanningResult::failure(EMPTY_DESTINATION);
        }

        if let Some(data) = self.cached(key) {
            debug!(target: "trip_planner::planner", destination = key, "cache hit");
            return PlanningResult::success(data);
        }

        if let Some(pending) = self.pending(key) {
            debug!(target: "trip_planner::planner", destination = key, "joining in-flight request");
            return pending.await;
        }

        if let Err(err) = self.inner.config.validate_credentials() {
            error!(target: "trip_planner::planner", error = %err, "refusing to plan trip");
            return PlanningResult::from_error(&err);
        }

        let inner = Arc::clone(&self.inner);
        let destination = key.to_string();
        self.coalesce(key.to_string(), async move {
            inner.generate_plan(&destination).await
        })
        .await
    }

    /// Re-plan the itinerary of `destination` for `num_days` days.
    ///
    /// Falls back to resizing the existing itinerary locally when the
    /// completion API cannot produce a usable one.
    pub async fn adjust_trip_duration(&self, destination: &str, num_days: u32) -> PlanningResult {
        let key = destination.trim();
        if key.is_empty() {
            return PlanningResult::failure(EMPTY_DESTINATION);
        }
        if !(1..=MAX_TRIP_DAYS).contains(&num_days) {
            return PlanningResult::failure(format!(
                "Trip duration must be between 1 and {MAX_TRIP_DAYS} days"
            ));
        }

        let variant_key = duration_key(key, num_days);
        if let Some(data) = self.cached(&variant_key) {
            debug!(target: "trip_planner::planner", key = %variant_key, "cache hit");
            return PlanningResult::success(data);
        }

        let base = match self.cached(key) {
            Some(data) => data,
            None => {
                let result = self.plan_trip(key).await;
                if !result.success {
                    return result;
                }
                match result.data {
                    Some(data) => data,
                    None => {
                        return PlanningResult::from_error(&PlannerError::Unknown(
                            "base plan missing from successful result".to_string(),
                        ))
                    }
                }
            }
        };

        let inner = Arc::clone(&self.inner);
        let cache_key = variant_key.clone();
        self.coalesce(variant_key, async move {
            inner.adjust_plan(base, num_days, cache_key).await
        })
        .await
    }

    /// Submit a mock booking. Nothing is reserved anywhere.
    pub async fn book_trip(&self, details: &BookingDetails) -> BookingResult {
        let today = chrono::Local::now().date_naive();
        if let Err(err) = validate_booking(details, today) {
            return BookingResult::rejected(err.user_message());
        }

        tokio::time::sleep(self.inner.config.booking_latency).await;

        if simulated_failure(self.inner.config.booking_failure_rate) {
            warn!(target: "trip_planner::planner", destination = %details.destination, "simulated booking failure");
            return BookingResult::rejected(
                "Booking service is temporarily unavailable, please try again",
            );
        }

        let booking_id = generate_booking_id();
        info!(target: "trip_planner::planner", %booking_id, destination = %details.destination, "trip booked");
        BookingResult::confirmed(booking_id)
    }

    /// Evict one destination together with its duration variants, or
    /// everything when `destination` is `None`.
    pub fn clear_cache(&self, destination: Option<&str>) {
        let mut cache = lock(&self.inner.cache);
        match destination.map(str::trim) {
            Some(base) => {
                cache.retain(|key, _| key != base && !is_duration_variant(key, base));
                info!(target: "trip_planner::planner", destination = base, "cache cleared");
            }
            None => {
                cache.clear();
                info!(target: "trip_planner::planner", "cache cleared");
            }
        }
    }

    /// Keys currently held in the cache, sorted
    pub fn cached_destinations(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.inner.cache).keys().cloned().collect();
        keys.sort();
        keys
    }

    fn cached(&self, key: &str) -> Option<PlanningData> {
        lock(&self.inner.cache).get(key).cloned()
    }

    fn pending(&self, key: &str) -> Option<SharedOutcome> {
        lock(&self.inner.in_flight).get(key).cloned()
    }

    /// Join the in-flight request for `key`, or start `work` as that request.
    ///
    /// The work runs as its own task so that callers dropping their future do
    /// not cancel it; its result still lands in the cache. The cache is
    /// checked again under the in-flight lock: a request that settled since
    /// the caller's own lookup has already cached its result.
    fn coalesce<F>(&self, key: String, work: F) -> SharedOutcome
    where
        F: Future<Output = PlanningResult> + Send + 'static,
    {
        let mut in_flight = lock(&self.inner.in_flight);
        if let Some(existing) = in_flight.get(&key) {
            return existing.clone();
        }
        if let Some(data) = self.cached(&key) {
            debug!(target: "trip_planner::planner", key = %key, "settled while waiting, cache hit");
            return future::ready(PlanningResult::success(data)).boxed().shared();
        }

        let guard = InFlightGuard {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
        };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });

        let task_key = key.clone();
        let shared = async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => {
                    error!(target: "trip_planner::planner", key = %task_key, error = %err, "planning task aborted");
                    PlanningResult::from_error(&PlannerError::Unknown(err.to_string()))
                }
            }
        }
        .boxed()
        .shared();

        in_flight.insert(key, shared.clone());
        shared
    }
}

impl PlannerInner {
    async fn generate_plan(&self, destination: &str) -> PlanningResult {
        info!(target: "trip_planner::planner", destination, "planning trip");
        match self.try_generate_plan(destination).await {
            Ok(data) => {
                lock(&self.cache).insert(destination.to_string(), data.clone());
                info!(
                    target: "trip_planner::planner",
                    destination,
                    days = data.trip_plan.itinerary.len(),
                    "trip plan ready"
                );
                PlanningResult::success(data)
            }
            Err(err) => {
                error!(
                    target: "trip_planner::planner",
                    destination,
                    code = err.error_code(),
                    error = %err,
                    "trip planning failed"
                );
                PlanningResult::from_error(&err)
            }
        }
    }

    async fn try_generate_plan(&self, destination: &str) -> Result<PlanningData> {
        let results = self.search.search(destination).await?;
        if results.is_empty() {
            return Err(PlannerError::NoSearchResults(destination.to_string()));
        }

        let messages = prompts::plan_messages(destination, &results)?;
        let payload = self
            .completion
            .complete(messages, self.config.max_tokens, true)
            .await?;
        let content = first_choice_content(&payload)?;
        let trip_plan = parse_trip_plan(&content, destination)?;

        Ok(PlanningData::new(results, trip_plan))
    }

    async fn adjust_plan(
        &self,
        base: PlanningData,
        num_days: u32,
        cache_key: String,
    ) -> PlanningResult {
        let num_days = num_days as usize;
        let adjuster = ItineraryAdjuster::new(&self.completion, self.config.max_tokens);

        let itinerary = match adjuster.adjust(&base.trip_plan, num_days).await {
            Ok(days) => days,
            Err(err) => {
                warn!(
                    target: "trip_planner::planner",
                    key = %cache_key,
                    error = %err,
                    "itinerary adjustment failed, resizing locally"
                );
                resize_locally(&base.trip_plan.itinerary, num_days)
            }
        };

        let PlanningData {
            results,
            mut trip_plan,
            ..
        } = base;
        trip_plan.itinerary = itinerary;

        let data = PlanningData::new(results, trip_plan);
        lock(&self.cache).insert(cache_key, data.clone());
        PlanningResult::success(data)
    }
}

/// Cache key of a duration variant, e.g. `Paris_5days`
pub fn duration_key(destination: &str, num_days: u32) -> String {
    format!("{destination}_{num_days}days")
}

fn is_duration_variant(key: &str, destination: &str) -> bool {
    key.strip_prefix(destination)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix("days"))
        .is_some_and(|days| !days.is_empty() && days.chars().all(|c| c.is_ascii_digit()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
